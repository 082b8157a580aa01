use crate::models::ImageUpload;
use crate::utils::validation::sanitize_file_name;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use uuid::Uuid;

/// A contact image staged on local disk for a single pipeline run.
///
/// Each run gets its own directory, named after the run id, so concurrent
/// uploads of files with the same name never collide. The directory is
/// removed when the value drops, which covers both the success path and
/// every early return.
pub struct StagedImage {
    dir: TempDir,
    file_name: String,
    original_path: PathBuf,
    thumbnail_source_path: PathBuf,
}

impl StagedImage {
    /// Writes the upload into a fresh staging directory twice: once under its
    /// sanitized original name, and once as the working copy the thumbnail
    /// step reads from, so the derive step never touches the upload artifact.
    pub async fn stage(upload: &ImageUpload, run_id: Uuid) -> std::io::Result<Self> {
        let file_name = sanitize_file_name(&upload.name);
        let dir = tempfile::Builder::new()
            .prefix(&format!("onboard-{}-", run_id))
            .tempdir()?;

        let original_path = dir.path().join(&file_name);
        let thumbnail_source_path = dir.path().join(format!("thumb-src-{}", file_name));

        tokio::fs::write(&original_path, &upload.data).await?;
        tokio::fs::write(&thumbnail_source_path, &upload.data).await?;

        tracing::debug!(
            "📂 Staged image '{}' at {:?}",
            file_name,
            dir.path()
        );

        Ok(Self {
            dir,
            file_name,
            original_path,
            thumbnail_source_path,
        })
    }

    /// Sanitized name the object store key is built from.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn original_path(&self) -> &Path {
        &self.original_path
    }

    pub fn thumbnail_source_path(&self) -> &Path {
        &self.thumbnail_source_path
    }

    /// A path inside the staging directory for files derived during the run.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}
