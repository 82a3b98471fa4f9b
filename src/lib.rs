//! Stocktake API Library
//!
//! Core of the stock-count reconciliation service: session lifecycle,
//! optimistic per-record updates, and reconciliation reporting.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod models;
pub mod openapi;
pub mod services;

use axum::{extract::State, response::Json, routing::get, Router};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use utoipa::ToSchema;

use crate::services::updates::NotesPolicy;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<db::DbPool>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub notes_policy: NotesPolicy,
    pub sessions: services::sessions::SessionService,
    pub snapshots: services::snapshots::SnapshotService,
    pub updates: services::updates::UpdateService,
    pub reconciliation: services::reconciliation::ReconciliationService,
}

impl AppState {
    pub fn new(
        db: Arc<db::DbPool>,
        config: config::AppConfig,
        event_sender: events::EventSender,
    ) -> Self {
        let notes_policy =
            handlers::records::notes_policy_from_config(config.require_discrepancy_notes);
        let sessions = services::sessions::SessionService::new(
            db.clone(),
            event_sender.clone(),
            config.import_chunk_size,
        );
        let snapshots = services::snapshots::SnapshotService::new(db.clone());
        let updates = services::updates::UpdateService::new(db.clone(), event_sender.clone());
        let reconciliation = services::reconciliation::ReconciliationService::new(db.clone());
        Self {
            db,
            config,
            event_sender,
            notes_policy,
            sessions,
            snapshots,
            updates,
            reconciliation,
        }
    }
}

// Common response wrapper
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    /// A failed request that still carries a payload, such as a conflict
    /// report naming the competing actor.
    pub fn failure(data: T, message: String) -> Self {
        Self {
            success: false,
            data: Some(data),
            message: Some(message),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", axum::routing::post(handlers::sessions::start_session))
        .route(
            "/sessions/append",
            axum::routing::post(handlers::sessions::append_to_session),
        )
        .route(
            "/sessions/active",
            get(handlers::sessions::active_session)
                .delete(handlers::sessions::clear_active_session),
        )
        .route("/records", get(handlers::records::list_records))
        .route(
            "/records/:id",
            get(handlers::records::get_record).put(handlers::records::update_record),
        )
        .route("/reports/summary", get(handlers::reports::summary))
        .route(
            "/reports/summary/:batch_id",
            get(handlers::reports::batch_summary),
        )
        .route("/status", get(api_status))
        .route("/health", get(health_check))
}

/// Assembles the full application router. Shared by the binary and the
/// integration tests so both exercise the same middleware stack.
pub fn build_router(state: AppState) -> Router {
    let cors_layer = build_cors_layer(&state.config);
    Router::new()
        .route("/", get(|| async { "stocktake-api up" }))
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        .nest("/api/v1", api_v1_routes())
        .merge(openapi::swagger_ui())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors_layer)
        .layer(axum::middleware::from_fn(request_logging_middleware))
        .with_state(state)
}

fn build_cors_layer(config: &config::AppConfig) -> CorsLayer {
    use axum::http::HeaderValue;
    use tower_http::cors::Any;

    let configured_origins: Option<Vec<HeaderValue>> = config
        .cors_allowed_origins
        .as_ref()
        .map(|raw| {
            raw.split(',')
                .filter_map(|origin| {
                    let trimmed = origin.trim();
                    if trimmed.is_empty() {
                        None
                    } else {
                        HeaderValue::from_str(trimmed).ok()
                    }
                })
                .collect::<Vec<_>>()
        })
        .filter(|origins| !origins.is_empty());

    if let Some(origins) = configured_origins {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    } else if config.cors_allow_any_origin || config.is_development() {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    }
}

async fn api_status() -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let status_data = json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "stocktake-api",
        "timestamp": Utc::now().to_rfc3339(),
    });
    Ok(Json(ApiResponse::success(status_data)))
}

async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let db_status = match state.db.ping().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let health_data = json!({
        "status": db_status,
        "checks": {
            "database": db_status,
        },
        "timestamp": Utc::now().to_rfc3339(),
    });
    Ok(Json(ApiResponse::success(health_data)))
}

// Request logging middleware
async fn request_logging_middleware(
    request: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    let response = next.run(request).await;

    tracing::info!(
        method = %method,
        uri = %uri,
        status = response.status().as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Request completed"
    );

    response
}
