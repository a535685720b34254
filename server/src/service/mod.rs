//! HTTP service: routing, request/response schemas, and conversions from
//! the engine data model.

mod converters;
mod routes;
mod schemas;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use engine::EngineRegistry;

use crate::config::Settings;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<EngineRegistry>,
    pub settings: Arc<Settings>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/analyze", post(routes::analyze))
        .route("/health", get(routes::health))
        .route("/engines", get(routes::engines))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
