//! HTTP front end.
//!
//! The asset interception runs as middleware in front of every route and
//! the fallback, so extension and theme paths never reach the static files.

use std::path::PathBuf;

use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{
        header::{CACHE_CONTROL, CONTENT_TYPE},
        HeaderValue, StatusCode,
    },
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::channel::{ChannelClosed, ChannelHandle, Command};
use crate::router::{AssetResponse, AssetRouter};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub assets: AssetRouter,
    pub channel: ChannelHandle,
}

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Unavailable(m) => (StatusCode::SERVICE_UNAVAILABLE, m.clone()),
        };

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

impl From<ChannelClosed> for ApiError {
    fn from(err: ChannelClosed) -> Self {
        tracing::error!("Control request dropped: {}", err);
        ApiError::Unavailable(err.to_string())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// JSON envelope allowance on top of the base64-encoded bundle.
const CONTROL_ENVELOPE_SLACK: usize = 64 * 1024;

/// Largest control request body that can carry a bundle of `max_bundle_size`
/// raw bytes, base64-encoded inside a JSON message.
pub fn control_body_limit(max_bundle_size: usize) -> usize {
    max_bundle_size
        .div_ceil(3)
        .saturating_mul(4)
        .saturating_add(CONTROL_ENVELOPE_SLACK)
}

/// Build the application router.
///
/// `control_limit` caps the body of `POST /internal/control`.
pub fn app(state: AppState, static_dir: Option<PathBuf>, control_limit: usize) -> Router {
    let router = Router::new()
        .route("/health", get(|| async { "OK" }))
        .route(
            "/internal/control",
            post(control).layer(DefaultBodyLimit::max(control_limit)),
        );

    let router = match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router.fallback(|| async { StatusCode::NOT_FOUND }),
    };

    router
        .layer(middleware::from_fn_with_state(state.clone(), intercept))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Answer extension and theme paths from the store; pass everything else on.
async fn intercept(State(state): State<AppState>, request: Request, next: Next) -> Response {
    match state.assets.serve(request.uri().path()).await {
        Some(asset) => asset_response(asset),
        None => next.run(request).await,
    }
}

fn asset_response(asset: AssetResponse) -> Response {
    let status = StatusCode::from_u16(asset.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response = (status, asset.body).into_response();

    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(asset.content_type));
    if let Some(value) = asset
        .cache_control
        .and_then(|v| HeaderValue::from_str(&v).ok())
    {
        headers.insert(CACHE_CONTROL, value);
    }
    response
}

/// `POST /internal/control`: JSON reply, or 204 when the command has none.
async fn control(
    State(state): State<AppState>,
    Json(command): Json<Command>,
) -> Result<Response, ApiError> {
    let reply = state.channel.request(command).await?;
    Ok(match reply {
        Some(reply) => Json(reply).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

/// Bind `listen` and serve until Ctrl-C.
pub async fn serve(listen: &str, app: Router) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(listen).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
