use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("bucket ensure failed: {0}")]
    Bucket(String),

    #[error("object upload failed: {0}")]
    Upload(String),

    #[error("invalid object key: {0}")]
    InvalidKey(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where an uploaded object can be fetched from. Immutable once returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadDescriptor {
    pub public_url: String,
    pub storage_key: String,
}

/// Durable object storage the pipeline uploads through.
///
/// Implementations must be safe for concurrent use; the pipeline calls
/// `ensure_bucket` before every upload and relies on it being idempotent.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Create the bucket if it does not exist. "Already exists" is success.
    async fn ensure_bucket(&self) -> Result<(), StoreError>;

    /// Store `data` under `key` with public-read visibility and return the
    /// public retrieval descriptor.
    async fn put_public(
        &self,
        key: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<UploadDescriptor, StoreError>;
}

fn compose_public_url(base_url: &str, bucket: &str, key: &str) -> String {
    format!("{}/{}/{}", base_url.trim_end_matches('/'), bucket, key)
}

/// S3-compatible backend (AWS or MinIO via a custom endpoint).
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
    public_base_url: String,
}

impl S3ObjectStore {
    pub fn new(client: Client, bucket: String, public_base_url: String) -> Self {
        Self {
            client,
            bucket,
            public_base_url,
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn ensure_bucket(&self) -> Result<(), StoreError> {
        match self
            .client
            .create_bucket()
            .bucket(&self.bucket)
            .send()
            .await
        {
            Ok(_) => {
                tracing::info!("🪣 Created bucket: {}", self.bucket);
                Ok(())
            }
            Err(err) => {
                let service_error = err.into_service_error();
                if service_error.is_bucket_already_owned_by_you()
                    || service_error.is_bucket_already_exists()
                {
                    Ok(())
                } else {
                    Err(StoreError::Bucket(service_error.to_string()))
                }
            }
        }
    }

    async fn put_public(
        &self,
        key: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<UploadDescriptor, StoreError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .acl(ObjectCannedAcl::PublicRead)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| StoreError::Upload(e.to_string()))?;

        Ok(UploadDescriptor {
            public_url: compose_public_url(&self.public_base_url, &self.bucket, key),
            storage_key: key.to_string(),
        })
    }
}

/// Filesystem backend for development and hermetic tests. Objects land under
/// `{root}/{bucket}/{key}`; URLs are composed exactly like the S3 backend's.
pub struct LocalObjectStore {
    root: PathBuf,
    bucket: String,
    public_base_url: String,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>, bucket: String, public_base_url: String) -> Self {
        Self {
            root: root.into(),
            bucket,
            public_base_url,
        }
    }

    /// Rejects keys that would escape the bucket directory.
    fn key_to_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        if key.is_empty() || key.split('/').any(|part| part.is_empty() || part == "..") {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(&self.bucket).join(key))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn ensure_bucket(&self) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(self.root.join(&self.bucket)).await?;
        Ok(())
    }

    async fn put_public(
        &self,
        key: &str,
        _content_type: &str,
        data: Vec<u8>,
    ) -> Result<UploadDescriptor, StoreError> {
        let path = self.key_to_path(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &data).await?;

        Ok(UploadDescriptor {
            public_url: compose_public_url(&self.public_base_url, &self.bucket, key),
            storage_key: key.to_string(),
        })
    }
}
