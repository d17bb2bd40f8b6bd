//! Derived reviewer statistics and review listings. Never persisted.

use crate::models::PullRequestShort;
use serde::Serialize;

/// Number of PRs whose reviewer set contains `user_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewerStat {
    pub user_id: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsResponse {
    pub reviewer_stats: Vec<ReviewerStat>,
}

/// PRs a user is assigned to review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserReviews {
    pub user_id: String,
    pub pull_requests: Vec<PullRequestShort>,
}
