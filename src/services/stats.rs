//! Per-reviewer assignment counts, derived on demand.

use crate::db::pool::DbPool;
use crate::db::pull_requests;
use crate::error::AppError;
use crate::models::{PullRequest, ReviewerStat};
use std::collections::{BTreeMap, HashSet};

/// Read-only aggregator over every persisted reviewer set.
///
/// Takes no lock; under concurrent reassignments it may see a mix of
/// before and after states.
#[derive(Clone, Debug)]
pub struct StatsAggregator {
    db: DbPool,
}

impl StatsAggregator {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    /// Count, for every user id, the PRs (any status) that list it as a reviewer.
    pub async fn get_reviewer_stats(&self) -> Result<Vec<ReviewerStat>, AppError> {
        let mut conn = self.db.acquire().await?;
        let prs = pull_requests::find_all_prs(&mut conn).await?;
        Ok(count_reviewers(&prs))
    }
}

/// Tally reviewer appearances across `prs`, sorted by user id.
///
/// An unreadable reviewer set counts as empty.
pub fn count_reviewers(prs: &[PullRequest]) -> Vec<ReviewerStat> {
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();

    for pr in prs {
        let reviewers = match pr.try_reviewers() {
            Ok(reviewers) => reviewers,
            Err(e) => {
                log::debug!(
                    "[stats] Skipping unreadable reviewer set on PR {}: {}",
                    pr.pull_request_id,
                    e
                );
                continue;
            }
        };

        // A PR counts once per reviewer even if the set repeats an id.
        let unique: HashSet<String> = reviewers.into_iter().collect();
        for user_id in unique {
            *counts.entry(user_id).or_default() += 1;
        }
    }

    counts
        .into_iter()
        .map(|(user_id, count)| ReviewerStat { user_id, count })
        .collect()
}
