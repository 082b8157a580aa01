use std::env;

/// Runtime configuration for the contact onboarding service
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Relational store URL (default: local SQLite file)
    pub database_url: String,

    /// Connection pool bound (default: 50)
    pub database_max_connections: u32,

    /// Pool acquire timeout in seconds (default: 10)
    pub database_connect_timeout_secs: u64,

    /// Object store backend: "s3" or "local" (default: "s3")
    pub storage_backend: String,

    /// S3/MinIO endpoint (default: "http://localhost:9000")
    pub s3_endpoint: String,

    /// Region handed to the SDK (default: "us-east-1")
    pub s3_region: String,

    /// Static credentials (default: "minioadmin"/"minioadmin")
    pub s3_access_key: String,
    pub s3_secret_key: String,

    /// Bucket/container holding both image variants (default: "contacts")
    pub s3_bucket: String,

    /// Base of the composed public URLs (default: the endpoint)
    pub public_base_url: String,

    /// Logical folder for original images (default: "fullsize")
    pub fullsize_folder: String,

    /// Logical folder for derived thumbnails (default: "thumbnail")
    pub thumbnail_folder: String,

    /// Root directory for the "local" backend (default: "./object-store")
    pub local_storage_root: String,

    /// Image URLs written when no picture is uploaded
    pub default_img_url: String,
    pub default_thumbnail_url: String,

    /// Derived thumbnail dimensions (default: 128x128)
    pub thumbnail_width: u32,
    pub thumbnail_height: u32,

    /// Request body cap in bytes (default: 50 MB)
    pub max_upload_size: usize,

    /// Listen port (default: 3000)
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://contacts.db?mode=rwc".to_string(),
            database_max_connections: 50,
            database_connect_timeout_secs: 10,
            storage_backend: "s3".to_string(),
            s3_endpoint: "http://localhost:9000".to_string(),
            s3_region: "us-east-1".to_string(),
            s3_access_key: "minioadmin".to_string(),
            s3_secret_key: "minioadmin".to_string(),
            s3_bucket: "contacts".to_string(),
            public_base_url: "http://localhost:9000".to_string(),
            fullsize_folder: "fullsize".to_string(),
            thumbnail_folder: "thumbnail".to_string(),
            local_storage_root: "./object-store".to_string(),
            default_img_url: "https://placehold.co/512.png".to_string(),
            default_thumbnail_url: "https://placehold.co/128.png".to_string(),
            thumbnail_width: 128,
            thumbnail_height: 128,
            max_upload_size: 50 * 1024 * 1024, // 50 MB
            port: 3000,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            database_url: env::var("DATABASE_URL").unwrap_or(default.database_url),

            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.database_max_connections),

            database_connect_timeout_secs: env::var("DATABASE_CONNECT_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.database_connect_timeout_secs),

            storage_backend: env::var("STORAGE_BACKEND").unwrap_or(default.storage_backend),

            s3_endpoint: env::var("S3_ENDPOINT").unwrap_or(default.s3_endpoint),

            s3_region: env::var("S3_REGION").unwrap_or(default.s3_region),

            s3_access_key: env::var("S3_ACCESS_KEY").unwrap_or(default.s3_access_key),

            s3_secret_key: env::var("S3_SECRET_KEY").unwrap_or(default.s3_secret_key),

            s3_bucket: env::var("S3_BUCKET").unwrap_or(default.s3_bucket),

            public_base_url: env::var("S3_PUBLIC_BASE_URL").unwrap_or(default.public_base_url),

            fullsize_folder: env::var("S3_FULLSIZE_FOLDER").unwrap_or(default.fullsize_folder),

            thumbnail_folder: env::var("S3_THUMBNAIL_FOLDER").unwrap_or(default.thumbnail_folder),

            local_storage_root: env::var("LOCAL_STORAGE_ROOT")
                .unwrap_or(default.local_storage_root),

            default_img_url: env::var("DEFAULT_IMG_URL").unwrap_or(default.default_img_url),

            default_thumbnail_url: env::var("DEFAULT_THUMBNAIL_URL")
                .unwrap_or(default.default_thumbnail_url),

            thumbnail_width: env::var("THUMBNAIL_WIDTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.thumbnail_width),

            thumbnail_height: env::var("THUMBNAIL_HEIGHT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.thumbnail_height),

            max_upload_size: env::var("MAX_UPLOAD_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_upload_size),

            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.port),
        }
    }

    /// Create config for development and tests (local backend, in-memory store)
    pub fn development() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            storage_backend: "local".to_string(),
            ..Self::default()
        }
    }
}
