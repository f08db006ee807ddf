use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Load context missing from request")]
    MissingLoadContext,

    #[error("Not found: {0}")]
    NotFound(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Config(e) => (StatusCode::INTERNAL_SERVER_ERROR, format!("Configuration error: {}", e)),
            AppError::Io(e) => (StatusCode::INTERNAL_SERVER_ERROR, format!("I/O error: {}", e)),
            AppError::MissingLoadContext => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            AppError::NotFound(path) => (StatusCode::NOT_FOUND, format!("Not found: {}", path)),
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
