//! Replacing one reviewer on an open pull request.

use crate::db::pool::DbPool;
use crate::db::{self, pull_requests, roster};
use crate::error::AppError;
use crate::models::PullRequest;
use crate::services::reviewer_selector::ReviewerSelector;
use crate::services::{active_only, require_non_empty, user_ids};

/// Outcome of a successful reassignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reassignment {
    /// The PR as persisted after the swap.
    pub pull_request: PullRequest,
    /// Id of the reviewer who took the old reviewer's slot.
    pub replaced_by: String,
}

/// Swaps a single reviewer for a random eligible teammate.
#[derive(Clone, Debug)]
pub struct ReassignmentEngine {
    db: DbPool,
    selector: ReviewerSelector,
}

impl ReassignmentEngine {
    pub fn new(db: DbPool, selector: ReviewerSelector) -> Self {
        Self { db, selector }
    }

    /// Replace `old_reviewer_id` on `pull_request_id` with a random active
    /// member of the old reviewer's current team.
    ///
    /// The replacement is never the author or anyone already on the PR
    /// (including the old reviewer). It takes the old reviewer's position;
    /// the other entries keep theirs.
    ///
    /// Checks run in this order, each aborting the transaction:
    /// 1. `NotFound(PR_NOT_FOUND)` - no such PR
    /// 2. `Conflict(PR_MERGED)` - the PR is merged
    /// 3. `Conflict(NOT_ASSIGNED)` - the old reviewer is not on the PR
    /// 4. `NotFound(REVIEWER_INVALID)` - the old reviewer is unknown or now inactive
    /// 5. `Conflict(NO_CANDIDATE)` - nobody eligible to take over
    ///
    /// Only the old reviewer's liveness is re-checked; an author who went
    /// inactive after opening the PR does not block reassignment.
    pub async fn reassign_reviewer(
        &self,
        pull_request_id: &str,
        old_reviewer_id: &str,
    ) -> Result<Reassignment, AppError> {
        require_non_empty(pull_request_id, "pull_request_id")?;
        require_non_empty(old_reviewer_id, "old_reviewer_id")?;

        let mut tx = db::begin_write(&self.db).await?;

        let mut pr = pull_requests::find_pr(&mut tx, pull_request_id)
            .await?
            .ok_or_else(AppError::pr_not_found)?;

        if !pr.is_open() {
            log::debug!("[reassignment] PR {} is merged", pull_request_id);
            return Err(AppError::pr_merged());
        }

        let mut reviewers = pr.try_reviewers().map_err(|e| {
            AppError::internal(format!(
                "Reviewer set of PR {} is unreadable: {}",
                pull_request_id, e
            ))
        })?;

        let position = reviewers
            .iter()
            .position(|id| id == old_reviewer_id)
            .ok_or_else(AppError::not_assigned)?;

        let old_reviewer = active_only(roster::find_user(&mut tx, old_reviewer_id).await?)
            .ok_or_else(AppError::reviewer_invalid)?;

        let mut exclude = reviewers.clone();
        exclude.push(pr.author_id.clone());

        let candidates = user_ids(
            roster::find_users_by_team_and_active(&mut tx, &old_reviewer.team_name, true, &exclude)
                .await?,
        );

        let replaced_by = self
            .selector
            .select(&candidates, &exclude, 1)
            .into_iter()
            .next()
            .ok_or_else(|| {
                log::debug!(
                    "[reassignment] No candidate to replace {} on PR {}",
                    old_reviewer_id,
                    pull_request_id
                );
                AppError::no_candidate()
            })?;

        reviewers[position] = replaced_by.clone();
        pr.set_reviewers(&reviewers)?;

        if !pull_requests::save_pr(&mut tx, &pr).await? {
            return Err(AppError::pr_not_found());
        }

        tx.commit().await?;

        log::info!(
            "[reassignment] PR {}: {} replaced by {}",
            pr.pull_request_id,
            old_reviewer_id,
            replaced_by
        );

        Ok(Reassignment {
            pull_request: pr,
            replaced_by,
        })
    }
}
