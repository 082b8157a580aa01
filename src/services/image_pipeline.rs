use crate::config::AppConfig;
use crate::models::ImageUpload;
use crate::services::staging::StagedImage;
use crate::services::store::{ObjectStore, StoreError, UploadDescriptor};
use crate::services::thumbnail::{self, ThumbnailError};
use chrono::Utc;
use rand::Rng;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Which of the two uploads a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Original,
    Thumbnail,
}

impl fmt::Display for UploadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadKind::Original => write!(f, "original image"),
            UploadKind::Thumbnail => write!(f, "thumbnail"),
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("image staging failed: {0}")]
    Staging(#[from] std::io::Error),

    #[error("thumbnail derivation failed: {0}")]
    Thumbnail(#[from] ThumbnailError),

    #[error("{kind} upload failed: {source}")]
    Upload {
        kind: UploadKind,
        source: StoreError,
    },
}

impl PipelineError {
    /// Pipeline step the failure is attributed to, for log correlation.
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Staging(_) => "staging",
            PipelineError::Thumbnail(_) => "thumbnail",
            PipelineError::Upload {
                kind: UploadKind::Original,
                ..
            } => "upload-original",
            PipelineError::Upload {
                kind: UploadKind::Thumbnail,
                ..
            } => "upload-thumbnail",
        }
    }
}

/// Public URLs of a fully processed contact image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedImage {
    pub img_url: String,
    pub thumbnail_url: String,
}

/// Runs one upload through stage -> upload original -> derive thumbnail ->
/// upload thumbnail, in that order. The first failing step aborts the run,
/// so the caller never sees a partial URL pair. Every run gets a fresh run
/// id that names its staging directory and tags its log lines.
pub struct ImagePipeline {
    store: Arc<dyn ObjectStore>,
    fullsize_folder: String,
    thumbnail_folder: String,
    thumbnail_width: u32,
    thumbnail_height: u32,
}

impl ImagePipeline {
    pub fn new(store: Arc<dyn ObjectStore>, config: &AppConfig) -> Self {
        Self {
            store,
            fullsize_folder: config.fullsize_folder.clone(),
            thumbnail_folder: config.thumbnail_folder.clone(),
            thumbnail_width: config.thumbnail_width,
            thumbnail_height: config.thumbnail_height,
        }
    }

    pub async fn run(&self, upload: &ImageUpload) -> Result<ProcessedImage, PipelineError> {
        let run_id = Uuid::new_v4();
        tracing::info!("🔄 Image pipeline {} started for '{}'", run_id, upload.name);

        let staged = StagedImage::stage(upload, run_id).await?;

        // Both objects of a run share one prefix so they can be matched up
        // in the bucket later.
        let prefix = name_prefix();

        let original = self
            .upload(
                &self.fullsize_folder,
                &prefix,
                staged.file_name(),
                staged.original_path(),
            )
            .await
            .map_err(|source| PipelineError::Upload {
                kind: UploadKind::Original,
                source,
            })?;

        let thumbnail_name = format!("t-{}", staged.file_name());
        let thumbnail_path = thumbnail::derive(
            staged.thumbnail_source_path().to_path_buf(),
            staged.path_for(&thumbnail_name),
            self.thumbnail_width,
            self.thumbnail_height,
        )
        .await?;

        let thumbnail = self
            .upload(
                &self.thumbnail_folder,
                &prefix,
                &thumbnail_name,
                &thumbnail_path,
            )
            .await
            .map_err(|source| PipelineError::Upload {
                kind: UploadKind::Thumbnail,
                source,
            })?;

        tracing::info!("✅ Image pipeline {} finished for '{}'", run_id, staged.file_name());

        Ok(ProcessedImage {
            img_url: original.public_url,
            thumbnail_url: thumbnail.public_url,
        })
    }

    async fn upload(
        &self,
        folder: &str,
        prefix: &str,
        file_name: &str,
        path: &Path,
    ) -> Result<UploadDescriptor, StoreError> {
        let data = tokio::fs::read(path).await?;
        let content_type = infer::get(&data)
            .map(|kind| kind.mime_type())
            .unwrap_or("application/octet-stream");
        let key = format!("{}/{}{}", folder, prefix, file_name);

        self.store.ensure_bucket().await?;
        let descriptor = self.store.put_public(&key, content_type, data).await?;

        tracing::info!("📤 Uploaded {} ({})", descriptor.storage_key, content_type);
        Ok(descriptor)
    }
}

/// Run-scoped object name prefix: millisecond-of-second and a random
/// discriminant below 2500, each followed by `-`.
fn name_prefix() -> String {
    let millis = Utc::now().timestamp_subsec_millis();
    let discriminant = rand::thread_rng().gen_range(0..2500);
    format!("{}-{}-", millis, discriminant)
}
