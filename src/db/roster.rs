//! Roster store: users and teams.

use crate::models::{TeamMember, TeamRecord, User};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

const USER_COLUMNS: &str = "user_id, username, team_name, is_active, created_at, updated_at";

/// Look up a user by id.
pub async fn find_user(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE user_id = ?",
        USER_COLUMNS
    ))
    .bind(user_id)
    .fetch_optional(conn)
    .await
}

/// Users on `team_name` with the given active flag, minus `exclude`.
///
/// Results are ordered by user id so that a fixed random source yields a
/// reproducible selection.
pub async fn find_users_by_team_and_active(
    conn: &mut SqliteConnection,
    team_name: &str,
    is_active: bool,
    exclude: &[String],
) -> Result<Vec<User>, sqlx::Error> {
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
        "SELECT {} FROM users WHERE team_name = ",
        USER_COLUMNS
    ));
    builder.push_bind(team_name);
    builder.push(" AND is_active = ");
    builder.push_bind(is_active);

    if !exclude.is_empty() {
        builder.push(" AND user_id NOT IN (");
        let mut separated = builder.separated(", ");
        for id in exclude {
            separated.push_bind(id.as_str());
        }
        separated.push_unseparated(")");
    }

    builder.push(" ORDER BY user_id");

    let users = builder.build_query_as::<User>().fetch_all(conn).await?;
    Ok(users)
}

/// Insert a user or overwrite an existing one's name, team and active flag.
///
/// Team membership is replaced, never merged.
pub async fn upsert_user(
    conn: &mut SqliteConnection,
    member: &TeamMember,
    team_name: &str,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO users (user_id, username, team_name, is_active, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(user_id) DO UPDATE SET
            username = excluded.username,
            team_name = excluded.team_name,
            is_active = excluded.is_active,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&member.user_id)
    .bind(&member.username)
    .bind(team_name)
    .bind(member.is_active)
    .bind(now)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(())
}

/// Set a user's active flag, returning the updated user if it exists.
pub async fn set_user_active(
    conn: &mut SqliteConnection,
    user_id: &str,
    is_active: bool,
    now: i64,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET is_active = ?, updated_at = ? WHERE user_id = ? RETURNING {}",
        USER_COLUMNS
    ))
    .bind(is_active)
    .bind(now)
    .bind(user_id)
    .fetch_optional(conn)
    .await
}

/// Insert a new team row.
pub async fn insert_team(
    conn: &mut SqliteConnection,
    team_name: &str,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO teams (team_name, created_at) VALUES (?, ?)")
        .bind(team_name)
        .bind(now)
        .execute(conn)
        .await?;

    Ok(())
}

/// Look up a team by name.
pub async fn find_team(
    conn: &mut SqliteConnection,
    team_name: &str,
) -> Result<Option<TeamRecord>, sqlx::Error> {
    sqlx::query_as::<_, TeamRecord>("SELECT team_name, created_at FROM teams WHERE team_name = ?")
        .bind(team_name)
        .fetch_optional(conn)
        .await
}

/// All users whose current team is `team_name`, active or not.
pub async fn find_team_members(
    conn: &mut SqliteConnection,
    team_name: &str,
) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE team_name = ? ORDER BY user_id",
        USER_COLUMNS
    ))
    .bind(team_name)
    .fetch_all(conn)
    .await
}
