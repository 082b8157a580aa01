pub mod api;
pub mod config;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

use crate::services::contacts::ContactService;
use crate::services::store::ObjectStore;
use axum::{
    Router,
    routing::{get, post},
};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::contacts::add_contact,
        api::handlers::contacts::list_contacts,
        api::handlers::health::root,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            models::ContactInput,
            models::ContactRecord,
            api::handlers::health::HealthResponse,
        )
    ),
    tags(
        (name = "contacts", description = "Contact onboarding endpoints"),
        (name = "system", description = "Service status endpoints")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub store: Arc<dyn ObjectStore>,
    pub contacts: Arc<ContactService>,
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/", get(api::handlers::health::root))
        .route("/health", get(api::handlers::health::health_check))
        .route(
            "/contacts",
            post(api::handlers::contacts::add_contact).get(api::handlers::contacts::list_contacts),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
