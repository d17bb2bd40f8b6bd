//! Application error types.
//!
//! These errors are serializable so the HTTP layer can hand callers a stable
//! `(code, message)` pair for every expected failure kind.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Stable, machine-readable failure codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    PrExists,
    PrMerged,
    NotAssigned,
    NoCandidate,
    TeamExists,
    PrNotFound,
    AuthorInvalid,
    ReviewerInvalid,
    UserNotFound,
    TeamNotFound,
}

impl ErrorCode {
    /// Wire representation of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PrExists => "PR_EXISTS",
            Self::PrMerged => "PR_MERGED",
            Self::NotAssigned => "NOT_ASSIGNED",
            Self::NoCandidate => "NO_CANDIDATE",
            Self::TeamExists => "TEAM_EXISTS",
            Self::PrNotFound => "PR_NOT_FOUND",
            Self::AuthorInvalid => "AUTHOR_INVALID",
            Self::ReviewerInvalid => "REVIEWER_INVALID",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::TeamNotFound => "TEAM_NOT_FOUND",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application-level errors returned by the engines and services.
///
/// All variants serialize to a structured JSON object.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum AppError {
    /// The operation conflicts with current state (duplicate id, merged PR, ...).
    #[error("Conflict ({code}): {message}")]
    Conflict { code: ErrorCode, message: String },

    /// A referenced entity is missing or not eligible.
    #[error("Not found ({code}): {message}")]
    NotFound { code: ErrorCode, message: String },

    /// Invalid input provided.
    #[error("Invalid input: {message}")]
    InvalidInput {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        field: Option<String>,
    },

    /// Database operation failed.
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        operation: Option<String>,
    },

    /// Internal application error.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AppError {
    /// Create a conflict error.
    pub fn conflict(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Conflict {
            code,
            message: message.into(),
        }
    }

    /// Create a not found error.
    pub fn not_found(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::NotFound {
            code,
            message: message.into(),
        }
    }

    pub fn pr_exists() -> Self {
        Self::conflict(ErrorCode::PrExists, "PR id already exists")
    }

    pub fn pr_merged() -> Self {
        Self::conflict(ErrorCode::PrMerged, "cannot reassign on merged PR")
    }

    pub fn not_assigned() -> Self {
        Self::conflict(ErrorCode::NotAssigned, "reviewer is not assigned to this PR")
    }

    pub fn no_candidate() -> Self {
        Self::conflict(
            ErrorCode::NoCandidate,
            "no active replacement candidate in team",
        )
    }

    pub fn team_exists() -> Self {
        Self::conflict(ErrorCode::TeamExists, "team_name already exists")
    }

    pub fn pr_not_found() -> Self {
        Self::not_found(ErrorCode::PrNotFound, "PR not found")
    }

    pub fn author_invalid() -> Self {
        Self::not_found(ErrorCode::AuthorInvalid, "author not found or inactive")
    }

    pub fn reviewer_invalid() -> Self {
        Self::not_found(ErrorCode::ReviewerInvalid, "reviewer not found or inactive")
    }

    pub fn user_not_found() -> Self {
        Self::not_found(ErrorCode::UserNotFound, "user not found")
    }

    pub fn team_not_found() -> Self {
        Self::not_found(ErrorCode::TeamNotFound, "team not found")
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            field: None,
        }
    }

    /// Create an invalid input error with field name.
    pub fn invalid_input_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            operation: None,
        }
    }

    /// Create a database error with operation context.
    pub fn database_with_op(message: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            operation: Some(operation.into()),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// The failure code, for conflict and not-found errors.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Conflict { code, .. } | Self::NotFound { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Whether this error is an expected precondition failure rather than a fault.
    pub fn is_expected(&self) -> bool {
        !matches!(self, Self::Database { .. } | Self::Internal { .. })
    }
}

// Conversions from common error types

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::database(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::internal(format!("JSON error: {}", err))
    }
}

impl From<crate::db::DbError> for AppError {
    fn from(err: crate::db::DbError) -> Self {
        match err {
            crate::db::DbError::Sqlite(e) => Self::from(e),
            crate::db::DbError::Migration(message) => Self::database_with_op(message, "migration"),
        }
    }
}
