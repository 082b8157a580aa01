use axum::middleware::from_fn;
use contacts_backend::api::middleware::request_id::request_id_middleware;
use contacts_backend::config::AppConfig;
use contacts_backend::infrastructure::{database, storage};
use contacts_backend::services::contacts::ContactService;
use contacts_backend::services::image_pipeline::ImagePipeline;
use contacts_backend::{AppState, create_app};
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // Initialize tracing with EnvFilter
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "contacts_backend=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Starting Contacts Backend...");

    let config = AppConfig::from_env();
    info!(
        "🖼️  Image Config: Thumbnails={}x{}, Folders={}/{}, Max Upload={}MB",
        config.thumbnail_width,
        config.thumbnail_height,
        config.fullsize_folder,
        config.thumbnail_folder,
        config.max_upload_size / 1024 / 1024
    );

    // Setup Infrastructure
    let db = database::setup_database(&config).await?;
    let store = storage::setup_storage(&config).await;

    let pipeline = ImagePipeline::new(store.clone(), &config);
    let contacts = Arc::new(ContactService::new(db.clone(), pipeline, &config));

    let state = AppState {
        db,
        store,
        contacts,
    };

    let app = create_app(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    let request_id = request
                        .headers()
                        .get("x-request-id")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("unknown");
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id,
                    )
                })
                .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
                    info!("📥 {} {}", request.method(), request.uri());
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        info!(
                            "📤 Finished in {:?} with status {}",
                            latency,
                            response.status()
                        );
                    },
                ),
        )
        .layer(from_fn(request_id_middleware))
        .layer(axum::extract::DefaultBodyLimit::max(config.max_upload_size));

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    info!("✅ Server ready at http://{}", addr);
    info!("📖 Swagger UI: http://{}/swagger-ui", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("🛑 Server shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("⌨️  Ctrl+C received, starting graceful shutdown...");
        },
        _ = terminate => {
            info!("💤 SIGTERM received, starting graceful shutdown...");
        },
    }
}
