//! Router configuration for the web server.

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers;
use super::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    let words = Router::new()
        .route("/test", get(handlers::api_test))
        .route(
            "/:language",
            get(handlers::list_words).post(handlers::add_word),
        )
        // Filtered views
        .route("/:language/unknown", get(handlers::list_unknown))
        .route("/:language/new", get(handlers::list_new))
        .route("/:language/favorites", get(handlers::list_favorites))
        .route("/:language/paginated", get(handlers::list_paginated))
        .route("/:language/lazy", get(handlers::list_lazy))
        .route("/:language/quiz", get(handlers::quiz))
        .route("/:language/statistics", get(handlers::statistics))
        .route("/:language/migrate", post(handlers::migrate))
        // Single word
        .route(
            "/:language/:id",
            get(handlers::get_word)
                .put(handlers::update_word)
                .delete(handlers::delete_word),
        )
        .route("/:language/:id/progress", put(handlers::update_progress))
        .route("/:language/:id/favorite", put(handlers::toggle_favorite));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/words", words)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
