//! Pull request store.

use crate::models::PullRequest;
use sqlx::SqliteConnection;

const PR_COLUMNS: &str = "pull_request_id, pull_request_name, author_id, status, assigned_reviewers, created_at, merged_at";

/// Look up a pull request by id.
pub async fn find_pr(
    conn: &mut SqliteConnection,
    pull_request_id: &str,
) -> Result<Option<PullRequest>, sqlx::Error> {
    sqlx::query_as::<_, PullRequest>(&format!(
        "SELECT {} FROM pull_requests WHERE pull_request_id = ?",
        PR_COLUMNS
    ))
    .bind(pull_request_id)
    .fetch_optional(conn)
    .await
}

/// Insert a new pull request.
///
/// Fails with a unique violation if the id is taken.
pub async fn create_pr(conn: &mut SqliteConnection, pr: &PullRequest) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO pull_requests (pull_request_id, pull_request_name, author_id, status, assigned_reviewers, created_at, merged_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&pr.pull_request_id)
    .bind(&pr.pull_request_name)
    .bind(&pr.author_id)
    .bind(&pr.status)
    .bind(&pr.assigned_reviewers)
    .bind(pr.created_at)
    .bind(pr.merged_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Persist the mutable fields (status, reviewers, merge time) of an existing PR.
///
/// Returns `false` if no row matched.
pub async fn save_pr(conn: &mut SqliteConnection, pr: &PullRequest) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE pull_requests SET status = ?, assigned_reviewers = ?, merged_at = ? WHERE pull_request_id = ?",
    )
    .bind(&pr.status)
    .bind(&pr.assigned_reviewers)
    .bind(pr.merged_at)
    .bind(&pr.pull_request_id)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Every persisted pull request, oldest first.
pub async fn find_all_prs(conn: &mut SqliteConnection) -> Result<Vec<PullRequest>, sqlx::Error> {
    sqlx::query_as::<_, PullRequest>(&format!(
        "SELECT {} FROM pull_requests ORDER BY created_at, pull_request_id",
        PR_COLUMNS
    ))
    .fetch_all(conn)
    .await
}

/// Whether `err` is a primary key / unique constraint violation.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{self, roster};
    use crate::models::TeamMember;

    async fn seed_author(conn: &mut SqliteConnection) {
        roster::insert_team(conn, "core", 1).await.unwrap();
        let author = TeamMember {
            user_id: "u1".into(),
            username: "Alice".into(),
            is_active: true,
        };
        roster::upsert_user(conn, &author, "core", 1).await.unwrap();
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let pool = db::initialize_in_memory().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        seed_author(&mut conn).await;

        let pr = PullRequest::new_open("pr-1", "Add search", "u1", &["u2".to_string()], 10).unwrap();
        create_pr(&mut conn, &pr).await.unwrap();

        let found = find_pr(&mut conn, "pr-1").await.unwrap().unwrap();
        assert_eq!(found, pr);
        assert!(find_pr(&mut conn, "pr-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_id_is_unique_violation() {
        let pool = db::initialize_in_memory().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        seed_author(&mut conn).await;

        let pr = PullRequest::new_open("pr-1", "First", "u1", &[], 10).unwrap();
        create_pr(&mut conn, &pr).await.unwrap();

        let dup = PullRequest::new_open("pr-1", "Second", "u1", &[], 11).unwrap();
        let err = create_pr(&mut conn, &dup).await.unwrap_err();
        assert!(is_unique_violation(&err));
    }

    #[tokio::test]
    async fn test_save_updates_mutable_fields() {
        let pool = db::initialize_in_memory().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        seed_author(&mut conn).await;

        let mut pr = PullRequest::new_open("pr-1", "First", "u1", &[], 10).unwrap();
        create_pr(&mut conn, &pr).await.unwrap();

        pr.mark_merged(20);
        assert!(save_pr(&mut conn, &pr).await.unwrap());

        let all = find_all_prs(&mut conn).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].status, "MERGED");
        assert_eq!(all[0].merged_at, Some(20));

        let ghost = PullRequest::new_open("ghost", "x", "u1", &[], 1).unwrap();
        assert!(!save_pr(&mut conn, &ghost).await.unwrap());
    }
}
