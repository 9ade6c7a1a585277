mod stories;
mod upload;

use std::sync::Arc;

use axum::{Json, Router, extract::DefaultBodyLimit, routing::get, routing::post};
use serde_json::{Value, json};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::config::Config;
use crate::orchestrator::UploadOrchestrator;
use crate::storage::MediaStorage;
use crate::stories::{InMemoryStoryStore, StoryStore};
use crate::transport::{FallbackTransport, PrimaryTransport};

#[derive(Clone)]
pub struct AppState {
    pub storage: MediaStorage,
    pub primary: Arc<PrimaryTransport>,
    pub fallback: Arc<FallbackTransport>,
    pub orchestrator: UploadOrchestrator,
    pub stories: Arc<dyn StoryStore>,
    pub body_limit: usize,
}

impl AppState {
    pub fn from_config(config: &Config) -> Self {
        let storage = MediaStorage::new(&config.public_dir);
        let primary = Arc::new(
            PrimaryTransport::new(storage.clone()).with_settle_delay(config.settle_delay),
        );
        let fallback = Arc::new(FallbackTransport::new(storage.clone()));
        let orchestrator =
            UploadOrchestrator::new(config.normalizer(), primary.clone(), fallback.clone())
                .with_policy(config.fallback_policy);
        Self {
            storage,
            primary,
            fallback,
            orchestrator,
            stories: Arc::new(InMemoryStoryStore::new(config.story_ttl)),
            body_limit: config.body_limit,
        }
    }

    pub fn with_story_store(mut self, stories: Arc<dyn StoryStore>) -> Self {
        self.stories = stories;
        self
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub fn router(state: AppState) -> Router {
    let uploads_root = state.storage.uploads_root().to_path_buf();
    Router::new()
        .route("/health", get(health))
        .route("/api/upload", post(upload::upload_primary))
        .route("/api/upload-fallback", post(upload::upload_fallback))
        .route("/api/media", post(upload::upload_orchestrated))
        .route(
            "/api/stories",
            get(stories::list_stories).post(stories::create_story),
        )
        .route(
            "/api/stories/{id}",
            get(stories::get_story).delete(stories::delete_story),
        )
        .route("/api/stories/{id}/view", post(stories::view_story))
        .nest_service("/uploads", ServeDir::new(uploads_root))
        .layer(DefaultBodyLimit::max(state.body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
