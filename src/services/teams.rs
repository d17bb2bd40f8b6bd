//! Team registration and lookup.

use crate::db::pool::DbPool;
use crate::db::{self, pull_requests, roster};
use crate::error::AppError;
use crate::models::{Team, TeamMember};
use crate::services::require_non_empty;
use std::collections::HashSet;

#[derive(Clone, Debug)]
pub struct TeamService {
    db: DbPool,
}

impl TeamService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    /// Register a team and upsert its members.
    ///
    /// Members that already exist are moved into this team and get the
    /// submitted name and active flag. Existing reviewer sets that mention
    /// them are left as they are.
    ///
    /// # Errors
    /// * `InvalidInput` - blank name, no members, blank or repeated member id
    /// * `Conflict(TEAM_EXISTS)` - a team with this name exists
    pub async fn create_team(&self, team: Team) -> Result<Team, AppError> {
        validate_team(&team)?;

        let mut tx = db::begin_write(&self.db).await?;

        if roster::find_team(&mut tx, &team.team_name).await?.is_some() {
            return Err(AppError::team_exists());
        }

        let now = db::now();
        if let Err(err) = roster::insert_team(&mut tx, &team.team_name, now).await {
            if pull_requests::is_unique_violation(&err) {
                return Err(AppError::team_exists());
            }
            return Err(err.into());
        }

        for member in &team.members {
            roster::upsert_user(&mut tx, member, &team.team_name, now).await?;
        }

        tx.commit().await?;

        log::info!(
            "[teams] Created team {} with {} members",
            team.team_name,
            team.members.len()
        );
        Ok(team)
    }

    /// Fetch a team with the users currently on it.
    pub async fn get_team(&self, team_name: &str) -> Result<Team, AppError> {
        require_non_empty(team_name, "team_name")?;

        let mut conn = self.db.acquire().await?;

        let record = roster::find_team(&mut conn, team_name)
            .await?
            .ok_or_else(AppError::team_not_found)?;

        let members = roster::find_team_members(&mut conn, &record.team_name)
            .await?
            .into_iter()
            .map(TeamMember::from)
            .collect();

        Ok(Team {
            team_name: record.team_name,
            members,
        })
    }
}

fn validate_team(team: &Team) -> Result<(), AppError> {
    require_non_empty(&team.team_name, "team_name")?;

    if team.members.is_empty() {
        return Err(AppError::invalid_input_field(
            "Team must have at least one member",
            "members",
        ));
    }

    let mut seen = HashSet::new();
    for member in &team.members {
        require_non_empty(&member.user_id, "user_id")?;
        if !seen.insert(member.user_id.as_str()) {
            return Err(AppError::invalid_input_field(
                format!("Duplicate member {}", member.user_id),
                "members",
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn team(name: &str, members: &[(&str, bool)]) -> Team {
        Team {
            team_name: name.to_string(),
            members: members
                .iter()
                .map(|(id, active)| TeamMember {
                    user_id: id.to_string(),
                    username: format!("User {}", id),
                    is_active: *active,
                })
                .collect(),
        }
    }

    async fn service() -> TeamService {
        TeamService::new(db::initialize_in_memory().await.unwrap())
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let service = service().await;
        let created = service
            .create_team(team("backend", &[("u2", true), ("u1", false)]))
            .await
            .unwrap();
        assert_eq!(created.members.len(), 2);

        let fetched = service.get_team("backend").await.unwrap();
        let ids: Vec<&str> = fetched.members.iter().map(|m| m.user_id.as_str()).collect();
        assert_eq!(ids, vec!["u1", "u2"]);
        assert!(!fetched.members[0].is_active);
    }

    #[tokio::test]
    async fn test_duplicate_team_conflicts() {
        let service = service().await;
        service.create_team(team("backend", &[("u1", true)])).await.unwrap();

        let err = service
            .create_team(team("backend", &[("u9", true)]))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::TeamExists));

        // The rejected registration must not have created u9.
        let fetched = service.get_team("backend").await.unwrap();
        assert_eq!(fetched.members.len(), 1);
    }

    #[tokio::test]
    async fn test_reregistration_moves_members() {
        let service = service().await;
        service
            .create_team(team("backend", &[("u1", true), ("u2", true)]))
            .await
            .unwrap();
        service.create_team(team("frontend", &[("u2", false)])).await.unwrap();

        let backend = service.get_team("backend").await.unwrap();
        assert_eq!(backend.members.len(), 1);
        let frontend = service.get_team("frontend").await.unwrap();
        assert_eq!(frontend.members[0].user_id, "u2");
        assert!(!frontend.members[0].is_active);
    }

    #[tokio::test]
    async fn test_missing_team() {
        let err = service().await.get_team("ghost").await.unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::TeamNotFound));
    }

    #[tokio::test]
    async fn test_validation() {
        let service = service().await;

        for bad in [
            team("", &[("u1", true)]),
            team("backend", &[]),
            team("backend", &[("u1", true), ("u1", false)]),
            team("backend", &[(" ", true)]),
        ] {
            let err = service.create_team(bad).await.unwrap_err();
            assert!(matches!(err, AppError::InvalidInput { .. }));
        }
    }
}
