use crate::AppState;
use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use serde_json::{Value, json};
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    pub storage: String,
    pub version: String,
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service banner")
    ),
    tag = "system"
)]
pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "contact onboarding service is listening"
    }))
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "System health status", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = if sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(&state.db)
        .await
        .is_ok()
    {
        "connected"
    } else {
        "disconnected"
    };

    let storage = if state.store.ensure_bucket().await.is_ok() {
        "connected"
    } else {
        "disconnected"
    };

    let status = if database == "connected" && storage == "connected" {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status: status.to_string(),
        database: database.to_string(),
        storage: storage.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
