use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Messages returned to API clients.
pub mod messages {
    pub const UNEXPECTED: &str = "Unexpected error";
    pub const UNAUTHORIZED: &str = "User is not allowed to perform this operation";
    pub const FORBIDDEN: &str = "Invalid credentials";
    pub const INVALID_PARAMETER: &str = "Invalid parameter";
    pub const INVALID_REQUEST_BODY: &str = "Invalid request body";

    pub const LOGIN_CANNOT_BE_EMPTY: &str = "Login cannot be empty";
    pub const EMPTY_NAME_FIELD: &str = "Name cannot be empty";
    pub const EMPTY_EMAIL_FIELD: &str = "Email cannot be empty";
    pub const INVALID_EMAIL_FIELD: &str = "Email is not valid";
    pub const EMPTY_DOCUMENT_FIELD: &str = "Document cannot be empty";
    pub const DOCUMENT_NOT_VALID: &str = "Document is not valid";
    pub const EMPTY_PASSWORD_FIELD: &str = "Password cannot be empty";
    pub const PASSWORD_NOT_VALID: &str = "Password does not meet the requirements";
    pub const PASSWORD_DOES_NOT_MATCH: &str = "Password and confirmation do not match";
    pub const EMAIL_EXISTS: &str = "Email is already registered";
    pub const DOCUMENT_EXISTS: &str = "Document is already registered";
    pub const RECOVERY_TOKEN_NOT_FOUND: &str = "Recovery token not found";
    pub const RECOVERY_TOKEN_EXPIRED: &str = "Recovery token has expired";
    pub const USER_NOT_FOUND: &str = "User not found";

    pub const EMPTY_IMAGE: &str = "Image cannot be empty";
    pub const EMPTY_CERTIFICATE_NAME: &str = "Certificate name cannot be empty";
    pub const CERTIFICATE_NOT_FOUND: &str = "Certificate not found";
    pub const INVALID_METADATA: &str = "Invalid file metadata";
    pub const INVALID_IMAGE_EXTENSION: &str = "Invalid image extension";
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Unexpected: {0}")]
    Unexpected(String),

    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        AppError::BadRequest(msg.to_string())
    }

    pub fn unexpected() -> Self {
        AppError::Unexpected(messages::UNEXPECTED.to_string())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) | AppError::Unexpected(_) | AppError::Anyhow(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                messages::UNEXPECTED.to_string()
            }
            AppError::Anyhow(e) => {
                tracing::error!("Anyhow error: {:?}", e);
                messages::UNEXPECTED.to_string()
            }
            AppError::Unexpected(msg) => {
                tracing::error!("Unexpected error: {}", msg);
                msg
            }
            AppError::BadRequest(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg) => msg,
        };

        let body = Json(json!({
            "code": status.as_u16(),
            "message": message
        }));

        (status, body).into_response()
    }
}
