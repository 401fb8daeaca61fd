use axum::{extract::State, http::StatusCode, Json};
use tracing::warn;

use crate::config::database::Liveness;
use crate::modules::health::schema::HealthResponse;
use crate::AppState;

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let connection = &state.connection;
    let database = connection.database().name().to_string();
    let collection = connection.collection().name().to_string();

    match connection.ping().await {
        Liveness::Connected => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok".to_string(),
                database,
                collection,
                error: None,
            }),
        ),
        Liveness::Unreachable { reason } => {
            warn!("Health check failed: {}", reason);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unavailable".to_string(),
                    database,
                    collection,
                    error: Some(reason),
                }),
            )
        }
    }
}
