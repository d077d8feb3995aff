use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;
use tracing::error;

#[derive(Debug, ThisError)]
pub enum DeskError {
    #[error("Validation failed")]
    Validation(Vec<String>),

    #[error("{0}")]
    BadRequest(String),

    /// Rejection carrying an i18n key the browser can translate.
    #[error("{message}")]
    BadRequestKey { message: String, key: &'static str },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Current password is incorrect")]
    WrongPassword,

    #[error("Forbidden")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("Database error: {0}")]
    Database(#[from] SqlxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Password hash error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

impl DeskError {
    pub fn status(&self) -> StatusCode {
        match self {
            DeskError::Validation(_) | DeskError::BadRequest(_) | DeskError::BadRequestKey { .. } => {
                StatusCode::BAD_REQUEST
            }
            DeskError::Unauthorized | DeskError::InvalidCredentials | DeskError::WrongPassword => {
                StatusCode::UNAUTHORIZED
            }
            DeskError::Forbidden => StatusCode::FORBIDDEN,
            DeskError::NotFound(_) => StatusCode::NOT_FOUND,
            DeskError::Conflict(_) => StatusCode::CONFLICT,
            DeskError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            DeskError::Reqwest(_) => StatusCode::BAD_GATEWAY,
            DeskError::Database(_)
            | DeskError::Io(_)
            | DeskError::PasswordHash(_)
            | DeskError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            DeskError::Validation(_) => "VALIDATION_FAILED",
            DeskError::BadRequest(_) | DeskError::BadRequestKey { .. } => "BAD_REQUEST",
            DeskError::Unauthorized => "UNAUTHORIZED",
            DeskError::InvalidCredentials => "INVALID_CREDENTIALS",
            DeskError::WrongPassword => "WRONG_PASSWORD",
            DeskError::Forbidden => "FORBIDDEN",
            DeskError::NotFound(_) => "NOT_FOUND",
            DeskError::Conflict(_) => "CONFLICT",
            DeskError::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            DeskError::Reqwest(_) => "BAD_GATEWAY",
            DeskError::Database(_)
            | DeskError::Io(_)
            | DeskError::PasswordHash(_)
            | DeskError::Task(_) => "INTERNAL_ERROR",
        }
    }

    /// True when the unique constraint on a column was violated.
    pub fn is_unique_violation(err: &SqlxError) -> bool {
        matches!(err, SqlxError::Database(db) if db.is_unique_violation())
    }
}

impl IntoResponse for DeskError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let body = match self {
            DeskError::Validation(details) => ApiErrorResponse {
                code: "VALIDATION_FAILED",
                error: "Validation failed".to_string(),
                details: Some(details),
                error_key: None,
            },
            DeskError::BadRequestKey { message, key } => ApiErrorResponse {
                code: "BAD_REQUEST",
                error: message,
                details: None,
                error_key: Some(key),
            },
            DeskError::WrongPassword => ApiErrorResponse {
                code: "WRONG_PASSWORD",
                error: DeskError::WrongPassword.to_string(),
                details: None,
                error_key: Some("profile.currentPasswordIncorrect"),
            },
            ref internal if status.is_server_error() => {
                error!(error = %internal, "request failed");
                let message = if status == StatusCode::BAD_GATEWAY {
                    "Upstream service is unavailable."
                } else {
                    "An internal server error occurred."
                };
                ApiErrorResponse {
                    code: internal.code(),
                    error: message.to_string(),
                    details: None,
                    error_key: None,
                }
            }
            other => ApiErrorResponse {
                code: other.code(),
                error: other.to_string(),
                details: None,
                error_key: None,
            },
        };
        (status, Json(body)).into_response()
    }
}

/// Error body understood by the browser pages: `error` is always a readable
/// message, `details` lists validation failures.
#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    pub code: &'static str,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
    #[serde(rename = "errorKey", skip_serializing_if = "Option::is_none")]
    pub error_key: Option<&'static str>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(err: DeskError) -> (StatusCode, serde_json::Value) {
        let resp = err.into_response();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn validation_errors_list_every_detail() {
        let (status, body) = body_of(DeskError::Validation(vec![
            "first_name is required".into(),
            "last_name is required".into(),
        ]))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Validation failed");
        assert_eq!(body["details"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn internal_errors_hide_their_cause() {
        let (status, body) = body_of(DeskError::Database(SqlxError::RowNotFound)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "INTERNAL_ERROR");
        assert!(!body["error"].as_str().unwrap().contains("row"));
    }

    #[tokio::test]
    async fn wrong_password_carries_translation_key() {
        let (status, body) = body_of(DeskError::WrongPassword).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["errorKey"], "profile.currentPasswordIncorrect");
    }

    #[tokio::test]
    async fn panicked_background_tasks_are_internal_errors() {
        let join_err = tokio::spawn(async { panic!("boom") }).await.unwrap_err();
        let err = DeskError::from(join_err);
        assert!(matches!(err, DeskError::Task(_)));
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "INTERNAL_ERROR");
        assert!(!body["error"].as_str().unwrap().contains("boom"));
    }
}
