//! Axum-based HTTP gateway for the adventure engine.
//!
//! - Request body size limit (64KB max)
//! - Request timeout sized to cover a full generation with retries
//! - JSON error bodies with statuses derived from the failure
//! - Permissive CORS so a browser frontend can be served from elsewhere

mod error;
mod handlers;

pub use error::{ApiError, status_for};
pub use handlers::{ActBody, ImageQuery};

use crate::app::{Services, build_services};
use crate::config::Config;
use anyhow::{Context, Result};
use axum::{
    Router,
    http::StatusCode,
    routing::{get, post},
};
use handlers::{
    handle_act, handle_continuation, handle_health, handle_image, handle_start, handle_state,
    handle_stats,
};
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

/// Maximum request body size (64KB)
pub const MAX_BODY_SIZE: usize = 65_536;
/// Floor for the request timeout
pub const MIN_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Shared state for all axum handlers
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
}

fn is_public_bind(host: &str) -> bool {
    !matches!(
        host,
        "127.0.0.1" | "localhost" | "::1" | "[::1]" | "0:0:0:0:0:0:0:1"
    )
}

/// Long enough for the slowest turn: every retry timing out, plus the one
/// regeneration of a malformed reply.
pub fn request_timeout(config: &Config) -> Duration {
    let narrative = config
        .narrative
        .timeout_secs
        .saturating_mul(u64::from(config.narrative.max_retries) + 1)
        .saturating_mul(2);
    let image = config
        .image
        .timeout_secs
        .saturating_mul(u64::from(config.image.max_retries) + 1);
    Duration::from_secs(
        narrative
            .max(image)
            .saturating_add(MIN_REQUEST_TIMEOUT_SECS),
    )
}

pub fn build_router(state: AppState, timeout: Duration, permissive_cors: bool) -> Router {
    let router = Router::new()
        .route("/health", get(handle_health))
        .route("/start", post(handle_start))
        .route("/act", post(handle_act))
        .route("/state/{session_id}", get(handle_state))
        .route("/image/{file}", get(handle_image))
        .route("/api/continuations/{fingerprint}", get(handle_continuation))
        .route("/stats", get(handle_stats))
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            timeout,
        ));

    if permissive_cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

/// Run the HTTP gateway.
pub async fn run_gateway(host: &str, port: u16, config: Config) -> Result<()> {
    // ── Security: refuse public bind without explicit opt-in ──
    if is_public_bind(host) && !config.gateway.allow_public_bind {
        anyhow::bail!(
            "Refusing to bind to {host}: the gateway has no authentication.\n\
             Fix: use --host 127.0.0.1 (default), or set\n\
             [gateway] allow_public_bind = true in config.toml."
        );
    }

    let listener = bind_listener(host, port).await?;

    run_gateway_with_listener(host, listener, config).await
}

/// Bind `host:port`, resolving names like `localhost`. IPv6 literals may be
/// given with or without brackets.
pub async fn bind_listener(host: &str, port: u16) -> Result<tokio::net::TcpListener> {
    let bare = host.trim_start_matches('[').trim_end_matches(']');
    tokio::net::TcpListener::bind((bare, port))
        .await
        .with_context(|| format!("failed to bind {host}:{port}"))
}

/// Run the HTTP gateway from a pre-bound listener.
pub async fn run_gateway_with_listener(
    host: &str,
    listener: tokio::net::TcpListener,
    config: Config,
) -> Result<()> {
    let services = build_services(&config).await?;
    let actual_port = listener.local_addr()?.port();

    println!("◆ Adventure gateway listening on http://{host}:{actual_port}");
    println!("  POST /start            → new session");
    println!("  POST /act              → use item on object");
    println!("  GET  /state/{{id}}       → current state");
    println!("  GET  /image/{{fp}}.png   → scene art");
    println!("  GET  /stats            → cache and session counts");
    println!("  Press Ctrl+C to stop.\n");

    serve(listener, services, &config).await
}

/// Serve prepared services until Ctrl+C.
pub async fn serve(
    listener: tokio::net::TcpListener,
    services: Services,
    config: &Config,
) -> Result<()> {
    let app = build_router(
        AppState { services },
        request_timeout(config),
        config.gateway.permissive_cors,
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await?;

    Ok(())
}
