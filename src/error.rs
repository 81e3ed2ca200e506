//! Unified application error model and mapping helpers.
//! Every handler returns `AppResult<T>`; the variant decides the HTTP status and
//! the message is sent back as plain text.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use std::fmt::{Display, Formatter};
use tracing::error;

use crate::blob::BlobError;

pub const LOGIN_PATH: &str = "/login";

#[derive(Debug, Clone)]
pub enum AppError {
    UserInput { code: String, message: String },
    NotFound { code: String, message: String },
    /// Request body over the configured upload limit.
    TooLarge { code: String, message: String },
    /// Missing session or a role the route does not allow. Rendered as a
    /// redirect to the login page rather than an error body.
    LoginRequired { code: String, message: String },
    Config { code: String, message: String },
    Upstream { code: String, message: String },
    Internal { code: String, message: String },
}

impl AppError {
    pub fn code_str(&self) -> &str {
        match self {
            AppError::UserInput { code, .. }
            | AppError::NotFound { code, .. }
            | AppError::TooLarge { code, .. }
            | AppError::LoginRequired { code, .. }
            | AppError::Config { code, .. }
            | AppError::Upstream { code, .. }
            | AppError::Internal { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::UserInput { message, .. }
            | AppError::NotFound { message, .. }
            | AppError::TooLarge { message, .. }
            | AppError::LoginRequired { message, .. }
            | AppError::Config { message, .. }
            | AppError::Upstream { message, .. }
            | AppError::Internal { message, .. } => message.as_str(),
        }
    }

    pub fn user<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self { AppError::UserInput { code: code.into(), message: msg.into() } }
    pub fn not_found<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self { AppError::NotFound { code: code.into(), message: msg.into() } }
    pub fn login_required<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self { AppError::LoginRequired { code: code.into(), message: msg.into() } }
    pub fn config<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self { AppError::Config { code: code.into(), message: msg.into() } }
    pub fn internal<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self { AppError::Internal { code: code.into(), message: msg.into() } }

    /// Map to HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            AppError::UserInput { .. } => 400,
            AppError::NotFound { .. } => 404,
            AppError::TooLarge { .. } => 413,
            AppError::LoginRequired { .. } => 302,
            AppError::Config { .. } => 500,
            AppError::Upstream { .. } => 502,
            AppError::Internal { .. } => 500,
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::LoginRequired { .. } = self {
            return (StatusCode::FOUND, [(header::LOCATION, LOGIN_PATH)]).into_response();
        }
        let status = StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!(target: "certportal::http", code = self.code_str(), "{}", self.message());
        }
        (status, self.message().to_string()).into_response()
    }
}

impl From<BlobError> for AppError {
    fn from(err: BlobError) -> Self {
        match err {
            BlobError::InvalidName(_) => AppError::UserInput { code: "invalid_filename".into(), message: format!("Upload failed: {err}") },
            _ => AppError::Upstream { code: "blob_error".into(), message: format!("Upload failed: {err}") },
        }
    }
}

impl From<axum::extract::multipart::MultipartError> for AppError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return AppError::TooLarge { code: "upload_too_large".into(), message: format!("Upload too large: {}", err.body_text()) };
        }
        AppError::UserInput { code: "bad_multipart".into(), message: format!("Malformed upload: {}", err.body_text()) }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal { code: "internal_error".into(), message: err.to_string() }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
