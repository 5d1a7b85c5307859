use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::{error, warn};

/// Every failure a request can end with. Each variant maps to one status code.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Email already registered")]
    Conflict,

    #[error("{0}")]
    Unauthorized(&'static str),

    /// Absence and foreign ownership are reported the same way.
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Habit already completed today")]
    AlreadyCompleted,

    #[error("Failed to update habit")]
    PersistenceConflict,

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::Conflict | AppError::AlreadyCompleted => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::PersistenceConflict | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::Internal(e) => error!(error = ?e, "internal error"),
            AppError::PersistenceConflict => error!("update modified no rows"),
            other => warn!(%status, error = %other, "request rejected"),
        }

        let body = Json(serde_json::json!({ "detail": self.to_string() }));
        if status == StatusCode::UNAUTHORIZED {
            (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}
