use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use rendezvous_api::{
    api::{create_router, AppState},
    config::Config,
    services::{
        providers::{ChatCompletionProvider, GooglePlacesProvider},
        AiRecommender, CuisineTable, Normalizer, PhotoUrlBuilder, RecommendationEngine,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let places = Arc::new(
        GooglePlacesProvider::new(
            config.google_maps_api_key.clone(),
            config.geocode_api_url.clone(),
            config.places_api_url.clone(),
            config.http_timeout(),
            config.max_retries,
        )
        .context("Failed to build places client")?,
    );

    let llm = ChatCompletionProvider::new(
        config.llm_api_key.clone(),
        config.llm_api_url.clone(),
        config.llm_model.clone(),
        config.llm_timeout(),
    )
    .context("Failed to build chat completion client")?;

    let normalizer = Normalizer::new(
        CuisineTable::default(),
        PhotoUrlBuilder::new(
            &config.places_api_url,
            config.google_maps_api_key.clone(),
            config.photo_max_width,
        )
        .context("Failed to build photo url builder")?,
    );

    let mut engine = RecommendationEngine::new(
        places.clone(),
        places,
        normalizer,
        AiRecommender::new(Arc::new(llm), config.llm_timeout()),
    );
    if config.place_details_enabled {
        engine = engine.with_place_details(config.place_details_concurrency);
    }

    let app = create_router(AppState::new(engine));

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    tracing::info!(
        address = %address,
        llm_model = %config.llm_model,
        place_details = config.place_details_enabled,
        "Server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
