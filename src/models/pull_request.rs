//! Pull request model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Lifecycle status of a pull request. `Merged` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PullRequestStatus {
    Open,
    Merged,
}

impl PullRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Merged => "MERGED",
        }
    }
}

impl From<&str> for PullRequestStatus {
    fn from(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "MERGED" => Self::Merged,
            _ => Self::Open,
        }
    }
}

impl std::fmt::Display for PullRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pull request row.
///
/// Note: `assigned_reviewers` is stored as a JSON array string in SQLite
/// and parsed on demand. It holds user ids only, never user data.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct PullRequest {
    /// Unique PR identifier.
    pub pull_request_id: String,

    /// PR title.
    pub pull_request_name: String,

    /// Author's user id.
    pub author_id: String,

    /// Current status: `OPEN` or `MERGED`.
    pub status: String,

    /// JSON array of reviewer user ids, at most two.
    pub assigned_reviewers: String,

    /// Creation timestamp (Unix).
    pub created_at: i64,

    /// Merge timestamp (Unix, if merged).
    pub merged_at: Option<i64>,
}

impl PullRequest {
    /// Build a new OPEN pull request with the given reviewers.
    pub fn new_open(
        pull_request_id: impl Into<String>,
        pull_request_name: impl Into<String>,
        author_id: impl Into<String>,
        reviewers: &[String],
        created_at: i64,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            pull_request_id: pull_request_id.into(),
            pull_request_name: pull_request_name.into(),
            author_id: author_id.into(),
            status: PullRequestStatus::Open.to_string(),
            assigned_reviewers: serde_json::to_string(reviewers)?,
            created_at,
            merged_at: None,
        })
    }

    /// Parse the status string into an enum.
    pub fn status_enum(&self) -> PullRequestStatus {
        PullRequestStatus::from(self.status.as_str())
    }

    /// Check if the PR is open.
    pub fn is_open(&self) -> bool {
        self.status_enum() == PullRequestStatus::Open
    }

    /// Parse reviewers from JSON, treating a corrupt value as no reviewers.
    pub fn reviewers_vec(&self) -> Vec<String> {
        self.try_reviewers().unwrap_or_default()
    }

    /// Parse reviewers from JSON, surfacing corruption.
    pub fn try_reviewers(&self) -> Result<Vec<String>, serde_json::Error> {
        serde_json::from_str(&self.assigned_reviewers)
    }

    /// Replace the stored reviewer set.
    pub fn set_reviewers(&mut self, reviewers: &[String]) -> Result<(), serde_json::Error> {
        self.assigned_reviewers = serde_json::to_string(reviewers)?;
        Ok(())
    }

    /// Transition to MERGED at `merged_at`.
    pub fn mark_merged(&mut self, merged_at: i64) {
        self.status = PullRequestStatus::Merged.to_string();
        self.merged_at = Some(merged_at);
    }
}

/// Condensed PR view used in per-user review listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequestShort {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: PullRequestStatus,
}

impl From<&PullRequest> for PullRequestShort {
    fn from(pr: &PullRequest) -> Self {
        Self {
            pull_request_id: pr.pull_request_id.clone(),
            pull_request_name: pr.pull_request_name.clone(),
            author_id: pr.author_id.clone(),
            status: pr.status_enum(),
        }
    }
}
