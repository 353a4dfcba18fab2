mod handlers;
mod types;

pub use handlers::AppState;
pub use types::{HealthResponse, RootResponse};

use crate::{
    Result,
    analysis::Analyzer,
    config::{Config, ServerConfig},
    llm::OpenAiVisionClient,
    render::RendererChain,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

pub async fn run(config: Config) -> Result<()> {
    let client = OpenAiVisionClient::new(config.llm.clone())?;
    info!(
        "Vision model {} at {}",
        client.model(),
        config.llm.base_url
    );

    let analyzer = Analyzer::new(Arc::new(client), &config.llm);
    let renderer = RendererChain::from_config(&config.render);
    info!("PDF renderer tiers: {}", renderer.tier_names().join(" -> "));

    let app_state = AppState {
        analyzer: Arc::new(analyzer),
        renderer: Arc::new(renderer),
    };

    let app = router(app_state, &config.server);

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/api/medical/analyze", post(handlers::analyze))
        .route("/api/cbc/analyze", post(handlers::analyze_cbc))
        .route("/api/medical/generate-pdf", post(handlers::generate_pdf_detailed))
        .route("/generate-pdf", post(handlers::generate_pdf_compact))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(cors_layer(&config.cors_allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(allowed))
}
