//! HTTP routes.
//!
//! Deserializes each call into a service operation and serializes the
//! result, or the failure as a stable `{"error": {"code", "message"}}` body
//! with a status matching its kind.

use crate::db::pool::DbPool;
use crate::error::AppError;
use crate::models::{PullRequest, PullRequestStatus, StatsResponse, Team, User, UserReviews};
use crate::services::Services;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Shared state for the axum routes.
#[derive(Clone, Debug)]
pub struct AppState {
    pub db: DbPool,
    pub services: Services,
}

impl AppState {
    pub fn new(db: DbPool, services: Services) -> Self {
        Self { db, services }
    }
}

// ── Error handling ───────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

/// Wrapper to make AppError usable as an axum error response.
pub struct ApiErr(AppError);

impl ApiErr {
    fn status_and_body(&self) -> (StatusCode, ErrorBody) {
        let (status, code, message) = match &self.0 {
            AppError::Conflict { code, message } => {
                (StatusCode::CONFLICT, code.as_str(), message.clone())
            }
            AppError::NotFound { code, message } => {
                (StatusCode::NOT_FOUND, code.as_str(), message.clone())
            }
            AppError::InvalidInput { message, .. } => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", message.clone())
            }
            AppError::Database { .. } | AppError::Internal { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                "internal server error".to_string(),
            ),
        };
        (
            status,
            ErrorBody {
                code: code.to_string(),
                message,
            },
        )
    }
}

impl IntoResponse for ApiErr {
    fn into_response(self) -> Response {
        if !self.0.is_expected() {
            log::error!("[api] {}", self.0);
        }
        let (status, error) = self.status_and_body();
        (status, Json(ErrorResponse { error })).into_response()
    }
}

impl From<AppError> for ApiErr {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiErr {
    fn from(rejection: JsonRejection) -> Self {
        Self(AppError::invalid_input(format!(
            "Invalid JSON data: {}",
            rejection.body_text()
        )))
    }
}

impl From<QueryRejection> for ApiErr {
    fn from(rejection: QueryRejection) -> Self {
        Self(AppError::invalid_input(format!(
            "Invalid query parameters: {}",
            rejection.body_text()
        )))
    }
}

// ── Request types ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreatePrRequest {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
}

#[derive(Debug, Deserialize)]
pub struct MergePrRequest {
    pub pull_request_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ReassignRequest {
    pub pull_request_id: String,
    pub old_reviewer_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SetUserActiveRequest {
    pub user_id: String,
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
struct TeamQuery {
    team_name: String,
}

#[derive(Debug, Deserialize)]
struct UserQuery {
    user_id: String,
}

// ── Response types ───────────────────────────────────────────────────────────

/// Pull request as returned to callers; the reviewer set is always a list.
#[derive(Debug, Serialize)]
pub struct PullRequestResponse {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: PullRequestStatus,
    pub assigned_reviewers: Vec<String>,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(rename = "mergedAt", skip_serializing_if = "Option::is_none")]
    pub merged_at: Option<String>,
}

fn rfc3339(timestamp: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp(timestamp, 0)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
}

impl From<PullRequest> for PullRequestResponse {
    fn from(pr: PullRequest) -> Self {
        Self {
            assigned_reviewers: pr.reviewers_vec(),
            status: pr.status_enum(),
            created_at: rfc3339(pr.created_at).unwrap_or_default(),
            merged_at: pr.merged_at.and_then(rfc3339),
            pull_request_id: pr.pull_request_id,
            pull_request_name: pr.pull_request_name,
            author_id: pr.author_id,
        }
    }
}

#[derive(Serialize)]
struct PrEnvelope {
    pr: PullRequestResponse,
}

#[derive(Serialize)]
struct ReassignResponse {
    pr: PullRequestResponse,
    replaced_by: String,
}

#[derive(Serialize)]
struct TeamEnvelope {
    team: Team,
}

#[derive(Serialize)]
struct UserEnvelope {
    user: User,
}

// ── Route builder ────────────────────────────────────────────────────────────

/// Build the full router with request tracing.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/team/add", post(add_team))
        .route("/team/get", get(get_team))
        .route("/users/setIsActive", post(set_user_active))
        .route("/users/getReview", get(get_user_reviews))
        .route("/pullRequest/create", post(create_pull_request))
        .route("/pullRequest/merge", post(merge_pull_request))
        .route("/pullRequest/reassign", post(reassign_reviewer))
        .route("/stats/reviewers", get(get_reviewer_stats))
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /health — liveness plus a database round-trip.
async fn health(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiErr> {
    let _: (i64,) = sqlx::query_as("SELECT 1")
        .fetch_one(&state.db)
        .await
        .map_err(AppError::from)?;

    Ok(Json(serde_json::json!({ "status": "healthy" })))
}

/// POST /team/add — register a team and upsert its members.
async fn add_team(
    State(state): State<AppState>,
    payload: Result<Json<Team>, JsonRejection>,
) -> Result<(StatusCode, Json<TeamEnvelope>), ApiErr> {
    let Json(team) = payload?;
    let team = state.services.teams.create_team(team).await?;
    Ok((StatusCode::CREATED, Json(TeamEnvelope { team })))
}

/// GET /team/get?team_name=X — team with its current members.
async fn get_team(
    State(state): State<AppState>,
    query: Result<Query<TeamQuery>, QueryRejection>,
) -> Result<Json<Team>, ApiErr> {
    let Query(params) = query?;
    let team = state.services.teams.get_team(&params.team_name).await?;
    Ok(Json(team))
}

/// POST /users/setIsActive — toggle a user's active flag.
async fn set_user_active(
    State(state): State<AppState>,
    payload: Result<Json<SetUserActiveRequest>, JsonRejection>,
) -> Result<Json<UserEnvelope>, ApiErr> {
    let Json(request) = payload?;
    let user = state
        .services
        .users
        .set_user_active(&request.user_id, request.is_active)
        .await?;
    Ok(Json(UserEnvelope { user }))
}

/// GET /users/getReview?user_id=X — PRs the user is reviewing.
async fn get_user_reviews(
    State(state): State<AppState>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> Result<Json<UserReviews>, ApiErr> {
    let Query(params) = query?;
    let reviews = state.services.users.get_user_reviews(&params.user_id).await?;
    Ok(Json(reviews))
}

/// POST /pullRequest/create — create a PR and assign reviewers.
async fn create_pull_request(
    State(state): State<AppState>,
    payload: Result<Json<CreatePrRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PrEnvelope>), ApiErr> {
    let Json(request) = payload?;
    let pr = state
        .services
        .assignment
        .create_pull_request(
            &request.pull_request_id,
            &request.pull_request_name,
            &request.author_id,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(PrEnvelope { pr: pr.into() })))
}

/// POST /pullRequest/merge — idempotent merge.
async fn merge_pull_request(
    State(state): State<AppState>,
    payload: Result<Json<MergePrRequest>, JsonRejection>,
) -> Result<Json<PrEnvelope>, ApiErr> {
    let Json(request) = payload?;
    let pr = state
        .services
        .assignment
        .merge_pull_request(&request.pull_request_id)
        .await?;
    Ok(Json(PrEnvelope { pr: pr.into() }))
}

/// POST /pullRequest/reassign — replace one reviewer.
async fn reassign_reviewer(
    State(state): State<AppState>,
    payload: Result<Json<ReassignRequest>, JsonRejection>,
) -> Result<Json<ReassignResponse>, ApiErr> {
    let Json(request) = payload?;
    let reassignment = state
        .services
        .reassignment
        .reassign_reviewer(&request.pull_request_id, &request.old_reviewer_id)
        .await?;
    Ok(Json(ReassignResponse {
        pr: reassignment.pull_request.into(),
        replaced_by: reassignment.replaced_by,
    }))
}

/// GET /stats/reviewers — assignment counts per reviewer.
async fn get_reviewer_stats(
    State(state): State<AppState>,
) -> Result<Json<StatsResponse>, ApiErr> {
    let reviewer_stats = state.services.stats.get_reviewer_stats().await?;
    Ok(Json(StatsResponse { reviewer_stats }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_errors_hide_details() {
        let (status, body) = ApiErr(AppError::database("disk I/O error")).status_and_body();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.code, "INTERNAL");
        assert!(!body.message.contains("disk"));
    }

    #[test]
    fn test_conflict_and_not_found_statuses() {
        let (status, body) = ApiErr(AppError::no_candidate()).status_and_body();
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body.code, "NO_CANDIDATE");

        let (status, body) = ApiErr(AppError::author_invalid()).status_and_body();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.code, "AUTHOR_INVALID");
    }

    #[test]
    fn test_pull_request_response_shape() {
        let mut pr = PullRequest::new_open("pr-1", "Fix", "a", &["b".to_string()], 0).unwrap();
        let open = serde_json::to_value(PullRequestResponse::from(pr.clone())).unwrap();
        assert_eq!(open["status"], "OPEN");
        assert_eq!(open["assigned_reviewers"], serde_json::json!(["b"]));
        assert_eq!(open["createdAt"], "1970-01-01T00:00:00Z");
        assert!(open.get("mergedAt").is_none());

        pr.mark_merged(60);
        let merged = serde_json::to_value(PullRequestResponse::from(pr)).unwrap();
        assert_eq!(merged["mergedAt"], "1970-01-01T00:01:00Z");
    }
}
