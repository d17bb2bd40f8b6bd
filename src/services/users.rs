//! User activation and review listings.

use crate::db::pool::DbPool;
use crate::db::{self, pull_requests, roster};
use crate::error::AppError;
use crate::models::{PullRequestShort, User, UserReviews};
use crate::services::require_non_empty;

#[derive(Clone, Debug)]
pub struct UserService {
    db: DbPool,
}

impl UserService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    /// Set a user's active flag.
    ///
    /// Reviewer sets that already name the user are not touched.
    pub async fn set_user_active(&self, user_id: &str, is_active: bool) -> Result<User, AppError> {
        require_non_empty(user_id, "user_id")?;

        let mut conn = self.db.acquire().await?;
        let user = roster::set_user_active(&mut conn, user_id, is_active, db::now())
            .await?
            .ok_or_else(AppError::user_not_found)?;

        log::info!("[users] User {} is_active={}", user.user_id, user.is_active);
        Ok(user)
    }

    /// Every PR, merged or open, whose reviewer set contains `user_id`.
    pub async fn get_user_reviews(&self, user_id: &str) -> Result<UserReviews, AppError> {
        require_non_empty(user_id, "user_id")?;

        let mut conn = self.db.acquire().await?;

        if roster::find_user(&mut conn, user_id).await?.is_none() {
            return Err(AppError::user_not_found());
        }

        let pull_requests = pull_requests::find_all_prs(&mut conn)
            .await?
            .iter()
            .filter(|pr| pr.reviewers_vec().iter().any(|id| id == user_id))
            .map(PullRequestShort::from)
            .collect();

        Ok(UserReviews {
            user_id: user_id.to_string(),
            pull_requests,
        })
    }
}
