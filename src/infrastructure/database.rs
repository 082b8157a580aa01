use crate::config::AppConfig;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use std::time::Duration;
use tracing::info;

pub async fn setup_database(config: &AppConfig) -> anyhow::Result<SqlitePool> {
    info!("📂 Database: {}", config.database_url);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.database_max_connections)
        .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
        .connect(&config.database_url)
        .await?;

    info!("🔄 Running migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;

    info!("✅ Database connected successfully");
    Ok(pool)
}
