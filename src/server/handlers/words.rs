//! Word API handlers.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use super::super::AppState;
use super::helpers::{
    error_response, error_status, json_error, parse_language, LazyParams, PaginatedParams,
    ProgressRequest, QuizParams,
};
use crate::models::NewWord;

/// Generates a handler for a parameterless list query.
macro_rules! list_handler {
    ($name:ident, $method:ident, $doc:literal) => {
        #[doc = $doc]
        pub async fn $name(
            State(state): State<AppState>,
            Path(language): Path<String>,
        ) -> impl IntoResponse {
            let lang = match parse_language(&language) {
                Ok(lang) => lang,
                Err(resp) => return resp,
            };
            match state.words.$method(lang).await {
                Ok(words) => Json(words).into_response(),
                Err(e) => error_response(e),
            }
        }
    };
}

list_handler!(list_words, get_all, "List up to the all-words cap.");
list_handler!(list_unknown, get_unknown, "Words with few correct answers.");
list_handler!(list_new, get_new, "Words never studied.");
list_handler!(list_favorites, get_favorites, "Favorite words.");

pub async fn list_paginated(
    State(state): State<AppState>,
    Path(language): Path<String>,
    params: Result<Query<PaginatedParams>, QueryRejection>,
) -> impl IntoResponse {
    let lang = match parse_language(&language) {
        Ok(lang) => lang,
        Err(resp) => return resp,
    };
    let Query(params) = match params {
        Ok(params) => params,
        Err(e) => return json_error(e.status(), e.body_text()),
    };
    match state
        .words
        .get_paginated(lang, params.last_word_id.as_deref(), params.limit)
        .await
    {
        Ok(page) => Json(page).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn list_lazy(
    State(state): State<AppState>,
    Path(language): Path<String>,
    params: Result<Query<LazyParams>, QueryRejection>,
) -> impl IntoResponse {
    let lang = match parse_language(&language) {
        Ok(lang) => lang,
        Err(resp) => return resp,
    };
    let Query(params) = match params {
        Ok(params) => params,
        Err(e) => return json_error(e.status(), e.body_text()),
    };
    match state.words.get_lazy(lang, params.offset, params.limit).await {
        Ok(words) => Json(words).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn quiz(
    State(state): State<AppState>,
    Path(language): Path<String>,
    params: Result<Query<QuizParams>, QueryRejection>,
) -> impl IntoResponse {
    let lang = match parse_language(&language) {
        Ok(lang) => lang,
        Err(resp) => return resp,
    };
    let Query(params) = match params {
        Ok(params) => params,
        Err(e) => return json_error(e.status(), e.body_text()),
    };
    match state.words.get_quiz(lang, params.count).await {
        Ok(words) => Json(words).into_response(),
        Err(e) => error_response(e),
    }
}

/// Statistics always answer 200; failures come back flagged in the body.
pub async fn statistics(
    State(state): State<AppState>,
    Path(language): Path<String>,
) -> impl IntoResponse {
    let lang = match parse_language(&language) {
        Ok(lang) => lang,
        Err(resp) => return resp,
    };
    Json(state.words.statistics(lang).await).into_response()
}

pub async fn get_word(
    State(state): State<AppState>,
    Path((language, id)): Path<(String, String)>,
) -> impl IntoResponse {
    let lang = match parse_language(&language) {
        Ok(lang) => lang,
        Err(resp) => return resp,
    };
    match state.words.get_word(lang, &id).await {
        Ok(word) => Json(word).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn add_word(
    State(state): State<AppState>,
    Path(language): Path<String>,
    body: Result<Json<NewWord>, JsonRejection>,
) -> impl IntoResponse {
    let lang = match parse_language(&language) {
        Ok(lang) => lang,
        Err(resp) => return resp,
    };
    let Json(body) = match body {
        Ok(body) => body,
        Err(e) => return json_error(e.status(), e.body_text()),
    };
    match state.words.add(lang, body).await {
        Ok(word) => Json(word).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn update_word(
    State(state): State<AppState>,
    Path((language, id)): Path<(String, String)>,
    body: Result<Json<NewWord>, JsonRejection>,
) -> impl IntoResponse {
    let lang = match parse_language(&language) {
        Ok(lang) => lang,
        Err(resp) => return resp,
    };
    let Json(body) = match body {
        Ok(body) => body,
        Err(e) => return json_error(e.status(), e.body_text()),
    };
    match state.words.update(lang, &id, body).await {
        Ok(word) => Json(word).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn delete_word(
    State(state): State<AppState>,
    Path((language, id)): Path<(String, String)>,
) -> impl IntoResponse {
    let lang = match parse_language(&language) {
        Ok(lang) => lang,
        Err(resp) => return resp,
    };
    match state.words.delete(lang, &id).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn update_progress(
    State(state): State<AppState>,
    Path((language, id)): Path<(String, String)>,
    body: Result<Json<ProgressRequest>, JsonRejection>,
) -> impl IntoResponse {
    let lang = match parse_language(&language) {
        Ok(lang) => lang,
        Err(resp) => return resp,
    };
    let Json(body) = match body {
        Ok(body) => body,
        Err(e) => return json_error(e.status(), e.body_text()),
    };
    let Some(correct) = body.correct else {
        return json_error(StatusCode::BAD_REQUEST, "Missing 'correct' field");
    };
    match state.words.update_progress(lang, &id, correct).await {
        Ok(word) => Json(word).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn toggle_favorite(
    State(state): State<AppState>,
    Path((language, id)): Path<(String, String)>,
) -> impl IntoResponse {
    let lang = match parse_language(&language) {
        Ok(lang) => lang,
        Err(resp) => return resp,
    };
    match state.words.toggle_favorite(lang, &id).await {
        Ok(word) => Json(word).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn migrate(
    State(state): State<AppState>,
    Path(language): Path<String>,
) -> impl IntoResponse {
    let lang = match parse_language(&language) {
        Ok(lang) => lang,
        Err(resp) => return resp,
    };
    tracing::info!(language = %lang, "Migrating words");
    match state.words.migrate(lang).await {
        Ok(report) => Json(serde_json::json!({
            "status": "success",
            "message": "Migration completed successfully",
            "scanned": report.scanned,
            "updated": report.updated,
            "batches": report.batches,
        }))
        .into_response(),
        Err(e) => {
            tracing::error!(language = %lang, error = %e, "Migration failed");
            (
                error_status(&e),
                Json(serde_json::json!({ "status": "error", "message": e.to_string() })),
            )
                .into_response()
        }
    }
}
