use anyhow::Result;
use axum::{
    extract::Extension,
    middleware,
    routing::{get, put},
    Router,
};
use inbox_core::InboxContext;
use std::env;
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing;

use crate::auth;
use crate::handlers;
use crate::state::ApiState;

fn cors_layer() -> CorsLayer {
    if let Ok(origins) = env::var("CORS_ORIGINS") {
        let mut cors = CorsLayer::new();
        for origin in origins.split(',').map(|s| s.trim()) {
            if let Ok(parsed) = origin.parse::<axum::http::HeaderValue>() {
                cors = cors.allow_origin(parsed);
            }
        }
        cors.allow_methods(Any).allow_headers(Any)
    } else {
        tracing::warn!("CORS_ORIGINS not set, using permissive CORS. Set CORS_ORIGINS for production!");
        CorsLayer::permissive()
    }
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/v1/inbox", get(handlers::get_inbox))
        .route("/api/v1/messages", get(handlers::get_messages))
        .route("/api/v1/preferences", get(handlers::get_preferences))
        .route("/api/v1/preferences/:id", put(handlers::update_preference))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer())
                .layer(Extension(state))
                .layer(middleware::from_fn(auth::auth_middleware)),
        )
}

pub async fn run(ctx: InboxContext) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", ctx.config.server.host, ctx.config.server.api_port).parse()?;
    let app = router(ApiState::new(ctx));

    tracing::info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
