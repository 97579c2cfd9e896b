use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use otaku_oracle::{
    config::Config,
    db::JsonCache,
    routes::{create_router, AppState},
    services::{
        providers::{AniListProvider, AnimeCatalog, FallbackCatalog, JikanProvider},
        Recommender,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "otaku_oracle=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let catalog = Arc::new(JikanProvider::new(
        JsonCache::new(config.genre_cache_path()),
        config.jikan_api_url.clone(),
    ));
    let fallback = Arc::new(AniListProvider::new(
        JsonCache::new(config.anilist_cache_path()),
        config.anilist_api_url.clone(),
    ));

    // The genre directory is required; without it the parser cannot match anything
    let genres = catalog
        .fetch_genres()
        .await
        .context("Failed to load genre directory")?;

    tracing::info!(
        catalog = catalog.name(),
        fallback = fallback.name(),
        genres = genres.len(),
        cache_dir = %config.cache_dir.display(),
        "Catalogs ready"
    );

    let recommender = Recommender::new(catalog, fallback, Arc::new(genres));
    let app = create_router(Arc::new(AppState::new(recommender)));

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    tracing::info!("Server running on http://{}", address);

    axum::serve(listener, app).await?;

    Ok(())
}
