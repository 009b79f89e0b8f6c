//! Web server exposing the vocabulary API.
//!
//! Every word route is scoped by a language segment (`en` or `es`) and
//! answers JSON. Store failures are mapped to status codes per request;
//! nothing a handler does can take the process down.

mod handlers;
mod routes;

pub use routes::create_router;

use std::net::SocketAddr;

use crate::config::Settings;
use crate::models::Language;
use crate::repository::WordRepository;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub words: WordRepository,
}

impl AppState {
    pub async fn new(settings: &Settings) -> Self {
        Self {
            words: settings.word_repository().await,
        }
    }
}

/// Backfill every language, logging failures without stopping.
pub async fn migrate_all(words: &WordRepository) {
    for lang in Language::ALL {
        match words.migrate(lang).await {
            Ok(report) => tracing::info!(
                language = %lang,
                scanned = report.scanned,
                updated = report.updated,
                "Startup migration finished"
            ),
            Err(e) => tracing::error!(language = %lang, error = %e, "Startup migration failed"),
        }
    }
}

/// Start the web server.
pub async fn serve(settings: &Settings, addr: SocketAddr) -> anyhow::Result<()> {
    let state = AppState::new(settings).await;

    if settings.migrate_on_startup && state.words.is_available() {
        migrate_all(&state.words).await;
    }

    let app = create_router(state);

    tracing::info!("Starting server at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::repository::QueryLimits;
    use crate::store::testing::FlakyStore;
    use crate::store::{DocumentStore, Fields, InMemoryDocumentStore};

    fn setup_test_app() -> axum::Router {
        let store = InMemoryDocumentStore::new();
        let words = WordRepository::new(Arc::new(store), QueryLimits::default());
        create_router(AppState { words })
    }

    async fn send(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap_or(Value::Null)
        };
        (status, json)
    }

    #[tokio::test]
    async fn test_health_and_api_test() {
        let app = setup_test_app();

        let (status, _) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, json) = send(&app, "GET", "/api/words/test", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "OK");
        assert_eq!(json["store"], "available");
    }

    #[tokio::test]
    async fn test_add_and_list_words() {
        let app = setup_test_app();

        let (status, created) = send(
            &app,
            "POST",
            "/api/words/es",
            Some(json!({"word": "casa", "translation": "house"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(!created["id"].as_str().unwrap().is_empty());
        assert_eq!(created["difficulty"], "medium");
        assert_eq!(created["category"], "other");
        assert_eq!(created["tags"], json!(["general"]));
        assert!(!created["imageUrl"].as_str().unwrap().is_empty());
        assert_eq!(created["correctCount"], 0);
        assert_eq!(created["isFavorite"], false);

        let (status, list) = send(&app, "GET", "/api/words/es", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().unwrap().len(), 1);

        let (_, english) = send(&app, "GET", "/api/words/en", None).await;
        assert!(english.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_language() {
        let app = setup_test_app();
        let (status, json) = send(&app, "GET", "/api/words/fr", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("fr"));

        let (status, _) = send(&app, "GET", "/api/words/de/statistics", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_progress_favorite_and_statistics() {
        let app = setup_test_app();
        let (_, created) = send(
            &app,
            "POST",
            "/api/words/es",
            Some(json!({"word": "hablar", "translation": "to speak"})),
        )
        .await;
        let id = created["id"].as_str().unwrap().to_string();
        assert_eq!(created["category"], "verb");

        for _ in 0..3 {
            let (status, _) = send(
                &app,
                "PUT",
                &format!("/api/words/es/{}/progress", id),
                Some(json!({"correct": true})),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, word) = send(&app, "PUT", &format!("/api/words/es/{}/favorite", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(word["correctCount"], 3);
        assert_eq!(word["studyCount"], 3);
        assert_eq!(word["isFavorite"], true);

        let (status, stats) = send(&app, "GET", "/api/words/es/statistics", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["total"], 1);
        assert_eq!(stats["learning"], 1);
        assert_eq!(stats["favorites"], 1);
        assert_eq!(stats["estimated"], false);
    }

    #[tokio::test]
    async fn test_progress_requires_correct_field() {
        let app = setup_test_app();
        let (_, created) = send(
            &app,
            "POST",
            "/api/words/en",
            Some(json!({"word": "dog", "translation": "perro"})),
        )
        .await;
        let id = created["id"].as_str().unwrap();

        let (status, _) = send(
            &app,
            "PUT",
            &format!("/api/words/en/{}/progress", id),
            Some(json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let app = setup_test_app();
        let (_, created) = send(
            &app,
            "POST",
            "/api/words/en",
            Some(json!({"word": "cat", "translation": "gato"})),
        )
        .await;
        let id = created["id"].as_str().unwrap().to_string();

        let (status, updated) = send(
            &app,
            "PUT",
            &format!("/api/words/en/{}", id),
            Some(json!({"word": "cat", "translation": "gata", "difficulty": "easy", "correctCount": 99})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["translation"], "gata");
        assert_eq!(updated["difficulty"], "easy");
        assert_eq!(updated["correctCount"], 0);

        let (status, _) = send(&app, "DELETE", &format!("/api/words/en/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, "DELETE", &format!("/api/words/en/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, "GET", &format!("/api/words/en/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, "PUT", &format!("/api/words/en/{}/favorite", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_paginated_lazy_and_quiz() {
        let app = setup_test_app();
        for word in ["uno", "dos", "tres"] {
            send(
                &app,
                "POST",
                "/api/words/es",
                Some(json!({"word": word, "translation": word})),
            )
            .await;
        }

        let (status, page) = send(&app, "GET", "/api/words/es/paginated?limit=2", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["words"].as_array().unwrap().len(), 2);
        assert_eq!(page["hasMore"], true);
        let cursor = page["lastWordId"].as_str().unwrap().to_string();

        let (_, next) = send(
            &app,
            "GET",
            &format!("/api/words/es/paginated?lastWordId={}&limit=2", cursor),
            None,
        )
        .await;
        assert_eq!(next["words"].as_array().unwrap().len(), 1);
        assert_eq!(next["hasMore"], false);

        let (_, lazy) = send(&app, "GET", "/api/words/es/lazy?offset=0&limit=10", None).await;
        let words: Vec<_> = lazy
            .as_array()
            .unwrap()
            .iter()
            .map(|w| w["word"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(words, ["dos", "tres", "uno"]);

        let (_, quiz) = send(&app, "GET", "/api/words/es/quiz?count=2", None).await;
        assert_eq!(quiz.as_array().unwrap().len(), 2);

        let (_, new_words) = send(&app, "GET", "/api/words/es/new", None).await;
        assert_eq!(new_words.as_array().unwrap().len(), 3);
        let (_, unknown) = send(&app, "GET", "/api/words/es/unknown", None).await;
        assert_eq!(unknown.as_array().unwrap().len(), 3);
        let (_, favorites) = send(&app, "GET", "/api/words/es/favorites", None).await;
        assert!(favorites.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_requests_get_json_errors() {
        let app = setup_test_app();

        let (status, json) = send(&app, "GET", "/api/words/es/paginated?limit=-1", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].is_string());

        let (status, json) = send(&app, "GET", "/api/words/es/lazy?offset=abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].is_string());

        let (status, json) = send(&app, "GET", "/api/words/es/quiz?count=x", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].is_string());

        let (status, json) = send(&app, "POST", "/api/words/es", Some(json!({"word": 5}))).await;
        assert!(status.is_client_error());
        assert!(json["error"].is_string());

        let (status, json) = send(
            &app,
            "PUT",
            "/api/words/es/abc/progress",
            Some(json!({"correct": "yes"})),
        )
        .await;
        assert!(status.is_client_error());
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn test_migrate_endpoint() {
        let app = setup_test_app();
        let (status, json) = send(&app, "POST", "/api/words/es/migrate", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "success");
        assert_eq!(json["message"], "Migration completed successfully");
        assert_eq!(json["scanned"], 0);
    }

    #[tokio::test]
    async fn test_store_unavailable() {
        let words = WordRepository::unavailable(QueryLimits::default());
        let app = create_router(AppState { words });

        let (status, json) = send(&app, "GET", "/api/words/es", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["error"], "Store unavailable");

        let (status, stats) = send(&app, "GET", "/api/words/es/statistics", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["total"], 0);
        assert_eq!(stats["error"], "Store unavailable");

        let (status, json) = send(&app, "POST", "/api/words/es/migrate", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "Store unavailable");

        let (status, json) = send(&app, "GET", "/api/words/test", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["store"], "unavailable");
    }

    #[tokio::test]
    async fn test_transient_store_failure_is_500() {
        let flaky = FlakyStore::new(InMemoryDocumentStore::new());
        flaky.fail_everything(true);
        let words = WordRepository::new(Arc::new(flaky), QueryLimits::default());
        let app = create_router(AppState { words });

        let (status, _) = send(&app, "GET", "/api/words/en/favorites", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let (status, stats) = send(&app, "GET", "/api/words/en/statistics", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(stats["error"].is_string());
    }

    #[tokio::test]
    async fn test_startup_migration_fills_legacy_words() {
        let store = InMemoryDocumentStore::new();
        let mut fields = Fields::new();
        fields.insert("word".into(), json!("rápidamente"));
        fields.insert("translation".into(), json!("quickly"));
        store.insert_with_id("spanishWords", "legacy", fields).await;

        let words = WordRepository::new(Arc::new(store.clone()), QueryLimits::default());
        migrate_all(&words).await;

        let doc = store.get("spanishWords", "legacy").await.unwrap().unwrap();
        assert_eq!(doc.get("category"), Some(&json!("adverb")));
        assert_eq!(doc.get("studyCount"), Some(&json!(0)));
    }
}
