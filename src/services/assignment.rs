//! Pull request creation with automatic reviewer assignment, and merging.

use crate::db::pool::DbPool;
use crate::db::{self, pull_requests, roster};
use crate::error::AppError;
use crate::models::PullRequest;
use crate::services::reviewer_selector::{ReviewerSelector, MAX_REVIEWERS};
use crate::services::{active_only, require_non_empty, user_ids};

/// Creates pull requests and assigns their initial reviewers.
#[derive(Clone, Debug)]
pub struct AssignmentEngine {
    db: DbPool,
    selector: ReviewerSelector,
}

impl AssignmentEngine {
    pub fn new(db: DbPool, selector: ReviewerSelector) -> Self {
        Self { db, selector }
    }

    /// Create an OPEN pull request and assign up to two reviewers.
    ///
    /// Reviewers are active members of the author's team other than the
    /// author. A team with nobody eligible still gets its PR, with an empty
    /// reviewer set.
    ///
    /// # Errors
    /// * `Conflict(PR_EXISTS)` - the id is taken, whatever the payload
    /// * `NotFound(AUTHOR_INVALID)` - the author is unknown or inactive
    pub async fn create_pull_request(
        &self,
        pull_request_id: &str,
        title: &str,
        author_id: &str,
    ) -> Result<PullRequest, AppError> {
        require_non_empty(pull_request_id, "pull_request_id")?;
        require_non_empty(title, "pull_request_name")?;
        require_non_empty(author_id, "author_id")?;

        let mut tx = db::begin_write(&self.db).await?;

        if pull_requests::find_pr(&mut tx, pull_request_id).await?.is_some() {
            log::debug!("[assignment] PR {} already exists", pull_request_id);
            return Err(AppError::pr_exists());
        }

        let author = active_only(roster::find_user(&mut tx, author_id).await?)
            .ok_or_else(AppError::author_invalid)?;

        let exclude = vec![author.user_id.clone()];
        let candidates = user_ids(
            roster::find_users_by_team_and_active(&mut tx, &author.team_name, true, &exclude)
                .await?,
        );
        let reviewers = self.selector.select(&candidates, &exclude, MAX_REVIEWERS);

        let pr = PullRequest::new_open(pull_request_id, title, author_id, &reviewers, db::now())?;

        if let Err(err) = pull_requests::create_pr(&mut tx, &pr).await {
            // Lost a race with a concurrent creator of the same id.
            if pull_requests::is_unique_violation(&err) {
                return Err(AppError::pr_exists());
            }
            return Err(err.into());
        }

        tx.commit().await?;

        log::info!(
            "[assignment] Created PR {} by {} with reviewers {:?}",
            pr.pull_request_id,
            pr.author_id,
            reviewers
        );
        Ok(pr)
    }

    /// Mark a pull request MERGED.
    ///
    /// Merging an already merged PR returns it unchanged, keeping the
    /// original merge time.
    ///
    /// # Errors
    /// * `NotFound(PR_NOT_FOUND)` - no PR with this id
    pub async fn merge_pull_request(&self, pull_request_id: &str) -> Result<PullRequest, AppError> {
        require_non_empty(pull_request_id, "pull_request_id")?;

        let mut tx = db::begin_write(&self.db).await?;

        let mut pr = pull_requests::find_pr(&mut tx, pull_request_id)
            .await?
            .ok_or_else(AppError::pr_not_found)?;

        if !pr.is_open() {
            return Ok(pr);
        }

        pr.mark_merged(db::now());
        if !pull_requests::save_pr(&mut tx, &pr).await? {
            return Err(AppError::pr_not_found());
        }

        tx.commit().await?;

        log::info!("[assignment] Merged PR {}", pr.pull_request_id);
        Ok(pr)
    }
}
