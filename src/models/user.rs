//! Roster user model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A roster member. Users are never deleted; they move between teams and
/// toggle their active flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Stable user identifier.
    pub user_id: String,

    /// Display name.
    pub username: String,

    /// Team the user currently belongs to.
    pub team_name: String,

    /// Whether the user can author PRs and be picked as a reviewer.
    pub is_active: bool,

    /// Creation timestamp (Unix).
    #[serde(skip)]
    pub created_at: i64,

    /// Last update timestamp (Unix).
    #[serde(skip)]
    pub updated_at: i64,
}
