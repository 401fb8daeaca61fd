use axum::Router;
use tower_http::cors::CorsLayer;

use crate::config::database::Connection;

pub mod config;
pub mod modules;

#[derive(Clone)]
pub struct AppState {
    pub connection: Connection,
}

impl AppState {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }
}

/// Task and health routes with a permissive CORS layer for the browser frontend.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(modules::task::routes::routes())
        .merge(modules::health::routes::routes())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
