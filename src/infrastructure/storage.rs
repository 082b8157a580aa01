use crate::config::AppConfig;
use crate::services::store::{LocalObjectStore, ObjectStore, S3ObjectStore};
use aws_sdk_s3::config::{Credentials, Region};
use std::sync::Arc;
use tracing::info;

pub async fn setup_storage(config: &AppConfig) -> Arc<dyn ObjectStore> {
    if config.storage_backend == "local" {
        info!(
            "📁 Local object store: {} (Bucket: {})",
            config.local_storage_root, config.s3_bucket
        );
        return Arc::new(LocalObjectStore::new(
            config.local_storage_root.clone(),
            config.s3_bucket.clone(),
            config.public_base_url.clone(),
        ));
    }

    info!(
        "☁️  S3 Storage: {} (Bucket: {})",
        config.s3_endpoint, config.s3_bucket
    );

    let aws_config = aws_config::from_env()
        .endpoint_url(&config.s3_endpoint)
        .region(Region::new(config.s3_region.clone()))
        .credentials_provider(Credentials::new(
            config.s3_access_key.clone(),
            config.s3_secret_key.clone(),
            None,
            None,
            "static",
        ))
        .load()
        .await;

    let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
        .force_path_style(true)
        .build();

    let s3_client = aws_sdk_s3::Client::from_conf(s3_config);
    Arc::new(S3ObjectStore::new(
        s3_client,
        config.s3_bucket.clone(),
        config.public_base_url.clone(),
    ))
}
