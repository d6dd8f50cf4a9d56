use std::sync::Arc;

use axum_helpers::server::{create_app, create_router, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_profiles::{
    OpenAIProvider, OpenAISummaryGenerator, PineconeIndex, ProfileIndex, ProfileService,
    QdrantIndex,
};
use tracing::{info, warn};

mod api;
mod config;

use config::{Config, VectorBackend};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output (before any fallible operations)
    install_color_eyre();

    let config = Config::from_env()?;

    init_tracing(&config.environment);
    info!(
        environment = ?config.environment,
        backend = config.backend.name(),
        "Configuration loaded"
    );

    let index: Arc<dyn ProfileIndex> = match config.backend.clone() {
        VectorBackend::Pinecone(pinecone) => {
            Arc::new(PineconeIndex::new(pinecone, config.index.clone())?)
        }
        VectorBackend::Qdrant(qdrant) => Arc::new(QdrantIndex::new(qdrant, config.index.clone())?),
    };
    info!(
        backend = index.backend(),
        index = %config.index.name,
        dimension = config.index.dimension,
        "Vector index configured"
    );

    let service = Arc::new(
        ProfileService::new(
            index,
            Arc::new(OpenAIProvider::new(config.openai.clone())?),
            Arc::new(OpenAISummaryGenerator::new(config.openai.clone())?),
        )
        .with_config(config.service.clone()),
    );

    // The index is created lazily on first use if this fails
    match service.ensure_index().await {
        Ok(description) => info!(
            index = %description.name,
            metric = %description.metric,
            "Vector index ready"
        ),
        Err(e) => warn!(error = %e, "Vector index not ready at startup"),
    }

    let router = create_router::<api::ApiDoc>(api::routes(service.clone()), &config.cors)?;

    // - /health: liveness with app name/version
    // - /ready: vector index reachable and ready
    let app = router
        .merge(health_router(config.app))
        .merge(api::ready_router(service));

    info!("Starting {} v{}", config.app.name, config.app.version);

    create_app(app, &config.server)
        .await
        .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Search API shutdown complete");
    Ok(())
}
