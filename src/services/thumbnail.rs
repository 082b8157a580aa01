use image::imageops::FilterType;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ThumbnailError {
    #[error("image decode or encode failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("thumbnail task aborted: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Derives a thumbnail with exactly `width` x `height` pixels from the image
/// at `src` and writes it to `dst`, returning `dst` on success.
///
/// The source is scaled to cover the target box and center-cropped, never
/// padded or distorted. Decoding and resizing run on the blocking pool.
pub async fn derive(
    src: PathBuf,
    dst: PathBuf,
    width: u32,
    height: u32,
) -> Result<PathBuf, ThumbnailError> {
    let written = tokio::task::spawn_blocking(move || -> Result<PathBuf, ThumbnailError> {
        let img = image::io::Reader::open(&src)?
            .with_guessed_format()?
            .decode()?;
        let thumbnail = img.resize_to_fill(width, height, FilterType::Lanczos3);
        thumbnail.save(&dst)?;
        Ok(dst)
    })
    .await??;

    tracing::debug!("🖼️ Derived {}x{} thumbnail at {:?}", width, height, written);
    Ok(written)
}
