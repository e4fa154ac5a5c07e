use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

impl From<serde_json::Error> for FormFlowError {
    fn from(err: serde_json::Error) -> Self {
        Self::DatabaseError(format!("JSON serialization error: {}", err))
    }
}

impl From<sqlx::Error> for FormFlowError {
    fn from(err: sqlx::Error) -> Self {
        Self::DatabaseError(format!("Database error: {}", err))
    }
}

impl From<sqlx::migrate::MigrateError> for FormFlowError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Self::DatabaseError(format!("Migration error: {}", err))
    }
}

impl From<jsonwebtoken::errors::Error> for FormFlowError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::TokenError(err.to_string())
    }
}

impl From<JsonRejection> for FormFlowError {
    fn from(rejection: JsonRejection) -> Self {
        Self::ValidationError(rejection.body_text())
    }
}

impl From<config::ConfigError> for FormFlowError {
    fn from(err: config::ConfigError) -> Self {
        Self::ConfigError(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum FormFlowError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Required questions are unanswered: {0:?}")]
    IncompleteSubmission(Vec<i64>),

    #[error("Authentication required: {0}")]
    Unauthorized(String),

    #[error("Invalid session token: {0}")]
    TokenError(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Mail error: {0}")]
    MailError(String),

    #[error("Export error: {0}")]
    ExportError(String),

    #[error("Password hashing error: {0}")]
    PasswordError(String),
}

impl FormFlowError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn forbidden() -> Self {
        Self::Forbidden("you do not have permission for this form".to_string())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError(_) | Self::IncompleteSubmission(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) | Self::TokenError(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::ConfigError(_)
            | Self::DatabaseError(_)
            | Self::MailError(_)
            | Self::ExportError(_)
            | Self::PasswordError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to API clients. Internal failures are logged and
    /// replaced with a generic message.
    fn public_message(&self) -> String {
        match self {
            Self::ValidationError(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::Conflict(msg) => msg.clone(),
            Self::NotFound(what) => format!("{} not found", what),
            Self::IncompleteSubmission(_) => "please answer all required questions".to_string(),
            Self::TokenError(_) => "invalid or expired session token".to_string(),
            Self::ConfigError(_)
            | Self::DatabaseError(_)
            | Self::MailError(_)
            | Self::ExportError(_)
            | Self::PasswordError(_) => "internal server error".to_string(),
        }
    }
}

impl IntoResponse for FormFlowError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("{}", self);
        }

        let mut body = serde_json::json!({ "error": self.public_message() });
        if let Self::IncompleteSubmission(missing) = &self {
            body["missing"] = serde_json::json!(missing);
        }

        (status, Json(body)).into_response()
    }
}

pub type Result<T, E = FormFlowError> = std::result::Result<T, E>;
