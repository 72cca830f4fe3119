//! Learning Error Types
//!
//! This module provides the error taxonomy of the learning engine and
//! integrates it with the unified `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

use crate::domain::repository::StoreError;
use crate::domain::value_objects::VisibilityError;

/// Learning-specific result type alias
pub type LearningResult<T> = Result<T, LearningError>;

/// Message shared by `NotFound` and `Forbidden` so payloads do not reveal
/// whether a hidden object exists
pub const NOT_AVAILABLE: &str = "object not available";

#[derive(Debug, Error)]
pub enum LearningError {
    /// Id does not resolve
    #[error("{}", NOT_AVAILABLE)]
    NotFound {
        entity: &'static str,
        id: Option<i64>,
    },

    /// Object exists but the actor may not use it
    #[error("{}", NOT_AVAILABLE)]
    Forbidden {
        entity: &'static str,
        id: i64,
    },

    /// Duplicate membership, selection or login
    #[error("{0}")]
    AlreadyExists(String),

    /// State change not allowed from the current state
    #[error("{0}")]
    InvalidTransition(String),

    /// Malformed input
    #[error("{0}")]
    InvalidInput(String),

    #[error("invalid session token")]
    InvalidToken,

    #[error("session token is expired")]
    ExpiredToken,

    /// Bad credentials
    #[error("invalid login or password")]
    Unauthorized,

    /// Transaction or store failure
    #[error("internal error: {0}")]
    Internal(String),
}

impl LearningError {
    pub fn not_found(entity: &'static str, id: impl Into<i64>) -> Self {
        Self::NotFound {
            entity,
            id: Some(id.into()),
        }
    }

    pub fn forbidden(entity: &'static str, id: impl Into<i64>) -> Self {
        Self::Forbidden {
            entity,
            id: id.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            LearningError::NotFound { .. } => ErrorKind::NotFound,
            LearningError::Forbidden { .. } => ErrorKind::Forbidden,
            LearningError::AlreadyExists(_) => ErrorKind::Conflict,
            LearningError::InvalidTransition(_) => ErrorKind::UnprocessableEntity,
            LearningError::InvalidInput(_) => ErrorKind::BadRequest,
            LearningError::InvalidToken
            | LearningError::ExpiredToken
            | LearningError::Unauthorized => ErrorKind::Unauthorized,
            LearningError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        let err = AppError::new(self.kind(), self.to_string());
        match self {
            LearningError::InvalidToken | LearningError::ExpiredToken => {
                err.with_action("Sign in again")
            }
            _ => err,
        }
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        match self {
            LearningError::Internal(msg) => {
                tracing::error!(message = %msg, "Learning internal error");
            }
            LearningError::Forbidden { entity, id } => {
                tracing::warn!(entity, id, "Access to unavailable object rejected");
            }
            LearningError::InvalidTransition(msg) => {
                tracing::warn!(message = %msg, "Invalid transition rejected");
            }
            LearningError::Unauthorized => {
                tracing::warn!("Invalid sign in attempt");
            }
            LearningError::NotFound { entity, id } => {
                tracing::debug!(entity, id = ?id, "Object not found");
            }
            _ => {
                tracing::debug!(error = %self, "Learning error");
            }
        }
    }
}

impl From<StoreError> for LearningError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(entity) => LearningError::NotFound { entity, id: None },
            StoreError::UniqueViolation(what) => {
                LearningError::AlreadyExists(format!("{what} already exists"))
            }
            // Use cases check references before writing, so a violation
            // here means the store and the engine disagree.
            StoreError::ForeignKeyViolation(_) | StoreError::Backend(_) | StoreError::Closed => {
                LearningError::Internal(err.to_string())
            }
        }
    }
}

impl From<VisibilityError> for LearningError {
    fn from(err: VisibilityError) -> Self {
        LearningError::Internal(err.to_string())
    }
}

impl From<LearningError> for AppError {
    fn from(err: LearningError) -> Self {
        err.log();
        err.to_app_error()
    }
}

impl IntoResponse for LearningError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}
