//! Application setup and server configuration.

use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Extension, Request},
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Instrument};
use uuid::Uuid;

use crate::config::Config;
use crate::data::{Instructions, SnapshotStore};
use crate::domains::intake::IntakeService;
use crate::kernel::{BaseEmr, ServerDeps};
use crate::server::error::panic_response;
use crate::server::routes::{
    chat_handler, diag_handler, health_handler, providers_handler, schedule_handler, Diagnostics,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub intake: IntakeService,
    pub emr: Option<Arc<dyn BaseEmr>>,
    pub diagnostics: Arc<Diagnostics>,
}

/// Wire config, data files and external clients into the app state.
pub async fn build_state(config: &Config, deps: ServerDeps) -> Result<AppState> {
    let instructions = Instructions::load(&config.config_dir).await;
    let store = SnapshotStore::new(config.providers_path(), config.schedule_path(), config.data_reload);

    // Surface unreadable data files at startup rather than on the first chat
    let snapshot = store.load().await?;
    info!(
        providers = snapshot.providers.len(),
        slots = snapshot.slots.len(),
        reload = ?config.data_reload,
        "Directory data loaded"
    );
    if snapshot.providers.is_empty() {
        warn!(path = %config.providers_path().display(), "Provider directory is empty or missing");
    }

    let builder = IntakeService::builder()
        .store(Arc::new(store))
        .instructions(Arc::new(instructions))
        .settings(config.chat.clone())
        .timezone(config.timezone)
        .completion_timeout(config.completion_timeout);

    let intake = match (deps.completion, deps.retrieval) {
        (Some(c), Some(r)) => builder.completion(c).retrieval(r).build(),
        (Some(c), None) => builder.completion(c).build(),
        (None, Some(r)) => builder.retrieval(r).build(),
        (None, None) => builder.build(),
    };

    Ok(AppState {
        intake,
        emr: deps.emr,
        diagnostics: Arc::new(Diagnostics::from_config(config)),
    })
}

/// Tag every request with an id so its log lines can be grouped.
async fn request_span(request: Request, next: Next) -> Response {
    let span = tracing::info_span!(
        "request",
        request_id = %Uuid::new_v4(),
        method = %request.method(),
        path = %request.uri().path(),
    );
    next.run(request).instrument(span).await
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    if allowed_origins.is_empty() {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(origins))
}

/// Build the Axum application router
pub fn build_app(state: AppState, allowed_origins: &[String]) -> Router {
    let routes = Router::new()
        .route("/api/chat", post(chat_handler))
        .route("/api/providers", get(providers_handler))
        .route("/api/schedule", get(schedule_handler))
        .route("/api/diag", get(diag_handler))
        .route("/health", get(health_handler));

    apply_layers(routes, state, allowed_origins)
}

/// Shared state, panic capture, request ids, CORS and tracing.
pub fn apply_layers(routes: Router, state: AppState, allowed_origins: &[String]) -> Router {
    routes
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(Extension(state))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn(request_span))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
}
