//! Team model.
//!
//! Teams carry no membership list in storage; members are the users whose
//! `team_name` points at the team.

use serde::{Deserialize, Serialize};

/// A team member as submitted on registration and returned on lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub user_id: String,
    pub username: String,
    pub is_active: bool,
}

impl From<crate::models::User> for TeamMember {
    fn from(user: crate::models::User) -> Self {
        Self {
            user_id: user.user_id,
            username: user.username,
            is_active: user.is_active,
        }
    }
}

/// A team together with its members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub team_name: String,
    pub members: Vec<TeamMember>,
}

/// A team row. The team itself carries no mutable state.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct TeamRecord {
    pub team_name: String,
    pub created_at: i64,
}
