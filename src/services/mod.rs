//! Business logic services.
//!
//! Every mutating operation runs in a single SQLite transaction. Returning
//! early with `?` drops the uncommitted transaction, which rolls it back, so
//! a failed precondition never leaves a partial write.
//!
//! Services are independent of the HTTP layer and take their store handle
//! and random source at construction.

pub mod assignment;
pub mod reassignment;
pub mod reviewer_selector;
pub mod stats;
pub mod teams;
pub mod users;

pub use assignment::AssignmentEngine;
pub use reassignment::{Reassignment, ReassignmentEngine};
pub use reviewer_selector::ReviewerSelector;
pub use stats::StatsAggregator;
pub use teams::TeamService;
pub use users::UserService;

use crate::db::pool::DbPool;
use crate::error::AppError;
use crate::models::User;

/// All services, wired to one pool and one random source.
#[derive(Clone, Debug)]
pub struct Services {
    pub assignment: AssignmentEngine,
    pub reassignment: ReassignmentEngine,
    pub stats: StatsAggregator,
    pub teams: TeamService,
    pub users: UserService,
}

impl Services {
    pub fn new(db: DbPool, selector: ReviewerSelector) -> Self {
        Self {
            assignment: AssignmentEngine::new(db.clone(), selector.clone()),
            reassignment: ReassignmentEngine::new(db.clone(), selector),
            stats: StatsAggregator::new(db.clone()),
            teams: TeamService::new(db.clone()),
            users: UserService::new(db),
        }
    }
}

/// Reject blank identifiers and names.
pub(crate) fn require_non_empty(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::invalid_input_field(
            format!("{} is required", field),
            field,
        ));
    }
    Ok(())
}

/// Keep `user` only if it is active.
pub(crate) fn active_only(user: Option<User>) -> Option<User> {
    user.filter(|u| u.is_active)
}

/// Ids of the given users, in order.
pub(crate) fn user_ids(users: Vec<User>) -> Vec<String> {
    users.into_iter().map(|u| u.user_id).collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Roster fixtures shared by service tests.

    use crate::db::{self, pool::DbPool, roster};
    use crate::models::TeamMember;

    /// In-memory database with `team` holding `(id, active)` members.
    pub async fn pool_with_team(team: &str, members: &[(&str, bool)]) -> DbPool {
        let pool = db::initialize_in_memory().await.unwrap();
        add_team(&pool, team, members).await;
        pool
    }

    pub async fn add_team(pool: &DbPool, team: &str, members: &[(&str, bool)]) {
        let mut conn = pool.acquire().await.unwrap();
        roster::insert_team(&mut conn, team, 1).await.unwrap();
        for (id, active) in members {
            let member = TeamMember {
                user_id: id.to_string(),
                username: format!("User {}", id),
                is_active: *active,
            };
            roster::upsert_user(&mut conn, &member, team, 1).await.unwrap();
        }
    }
}
