//! Helper types and utility functions for handlers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use crate::models::Language;
use crate::repository::RepositoryError;

/// Query params for cursor pagination.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedParams {
    pub last_word_id: Option<String>,
    pub limit: Option<usize>,
}

/// Query params for offset pagination.
#[derive(Debug, Deserialize)]
pub struct LazyParams {
    #[serde(default)]
    pub offset: usize,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct QuizParams {
    pub count: Option<usize>,
}

/// Body of a progress update.
#[derive(Debug, Deserialize)]
pub struct ProgressRequest {
    pub correct: Option<bool>,
}

pub fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

/// Resolve the language path segment, rejecting anything but `en` and `es`.
pub fn parse_language(language: &str) -> Result<Language, Response> {
    Language::from_str(language).ok_or_else(|| {
        json_error(
            StatusCode::BAD_REQUEST,
            format!("Unsupported language '{}'", language),
        )
    })
}

pub fn error_status(err: &RepositoryError) -> StatusCode {
    match err {
        RepositoryError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        RepositoryError::NotFound(_) => StatusCode::NOT_FOUND,
        RepositoryError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        RepositoryError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Map a repository error onto an HTTP status and JSON body.
pub fn error_response(err: RepositoryError) -> Response {
    let status = error_status(&err);
    if status.is_server_error() {
        tracing::error!(error = %err, "Request failed");
    }
    json_error(status, err.to_string())
}
