use std::time::Duration;

use anyhow::Result;
use chrono::Utc;

use social_media_uploads::{
    config::Config,
    routes::{self, AppState},
};

const STORY_PURGE_INTERVAL: Duration = Duration::from_secs(10 * 60);

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    let bind_address = config.bind_address();
    let state = AppState::from_config(&config);

    let stories = state.stories.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(STORY_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            let removed = stories.purge_expired(Utc::now()).await;
            if removed > 0 {
                tracing::debug!(removed, "purged expired stories");
            }
        }
    });

    let router = routes::router(state);
    let tcp_listener = tokio::net::TcpListener::bind(&bind_address).await?;

    tracing::info!(
        address = %bind_address,
        public_dir = %config.public_dir.display(),
        fallback_on_validation_error = config.fallback_policy.fallback_on_validation_error,
        "media upload server started"
    );

    axum::serve(tcp_listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}
