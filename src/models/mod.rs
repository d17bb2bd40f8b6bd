//! Data models for the application.
//!
//! These models represent the entities stored in SQLite and the shapes
//! returned to callers. Row models derive `FromRow` for SQLx queries and
//! `Serialize` for the HTTP layer.

pub mod pull_request;
pub mod reviewer_stat;
pub mod team;
pub mod user;

// Re-exports for convenient access
pub use pull_request::{PullRequest, PullRequestShort, PullRequestStatus};
pub use reviewer_stat::{ReviewerStat, StatsResponse, UserReviews};
pub use team::{Team, TeamMember, TeamRecord};
pub use user::User;
