use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use hunter::config::Config;
use hunter::llm_client;
use hunter::logging::{init_tracing, LogTarget};
use hunter::pipeline::Pipeline;
use hunter::routes::build_router;
use hunter::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    init_tracing(&config.rust_log, LogTarget::Stdout);

    info!("Starting Hunter API v{}", env!("CARGO_PKG_VERSION"));

    let pipeline = Pipeline::from_config(&config)?;
    info!(
        "Pipeline ready (model: {}, profile: {}, max results: {}, stage timeout: {:?})",
        llm_client::MODEL,
        config.profile_path.display(),
        config.scout_max_results,
        config.stage_timeout
    );

    let state = AppState {
        pipeline: Arc::new(pipeline),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
