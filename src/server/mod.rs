//! HTTP surface over a [`GeneratorHandle`].
//!
//! Routes:
//! * `GET /generate` - one texture per class plus configured transitions.
//! * `GET /tex/{name}` - one texture.
//! * `POST /mix` - texture from a blend of two class conditions.
//! * `GET /classes`, `GET /health` - introspection.

mod error;
mod handlers;
mod types;
mod worker;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::{ServerConfig, TransitionConfig};

pub use error::ServerError;
pub use types::{
    ErrorBody, HealthResponse, MixRequest, MixResponse, MixResult, TextureResponse,
    UNKNOWN_TEXTURE,
};
pub use worker::GeneratorHandle;

#[derive(Clone)]
pub struct AppState {
    pub generator: GeneratorHandle,
    pub transitions: Arc<Vec<TransitionConfig>>,
    /// Ratio used when a mix request omits one.
    pub default_mix_ratio: f32,
}

impl AppState {
    pub fn new(generator: GeneratorHandle, config: &ServerConfig) -> Self {
        let classes = generator.metadata().class_map();
        for transition in &config.transitions {
            for source in [&transition.top, &transition.bottom] {
                if !classes.contains(source) {
                    warn!(
                        "transition {} uses {source}, which the model does not know; it will be skipped",
                        transition.name
                    );
                }
            }
        }
        Self {
            generator,
            transitions: Arc::new(config.transitions.clone()),
            default_mix_ratio: config.default_mix_ratio.clamp(0.0, 1.0),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/classes", get(handlers::classes))
        .route("/generate", get(handlers::generate_all))
        .route("/tex/{name}", get(handlers::generate_one))
        .route("/mix", post(handlers::mix))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Serve `state` on `bind` until SIGINT or SIGTERM.
pub async fn serve(bind: &str, state: AppState) -> Result<()> {
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    let addr = listener.local_addr().context("listener has no local address")?;
    info!("texture server listening on http://{addr}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("texture server stopped");
    Ok(())
}

/// Resolves when SIGINT (Ctrl-C) or SIGTERM is received.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to install CTRL+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received; draining requests");
}
