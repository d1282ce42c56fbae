//! Event image storage.
//!
//! Images are written to the configured upload directory, which is served
//! under `/static/img`. The stored reference is the public path.

use std::path::Path;

use axum::body::Bytes;
use thiserror::Error;
use uuid::Uuid;

use foodievent_core::validation::image_filename;

/// Public prefix the upload directory is served under.
pub const PUBLIC_PREFIX: &str = "/static/img";

/// An image received from a multipart form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// Filename as sent by the browser.
    pub filename: String,
    pub bytes: Bytes,
}

/// Errors that can occur while storing an image.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Filename or extension rejected.
    #[error("{0}")]
    Rejected(&'static str),

    /// The image could not be written.
    #[error("failed to store image: {0}")]
    Io(#[from] std::io::Error),
}

impl ImageUpload {
    /// Sanitized name the image will be stored under.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::Rejected` for names that are empty after
    /// sanitizing or whose extension is not PNG, JPG or JPEG.
    pub fn stored_name(&self) -> Result<String, UploadError> {
        image_filename(&self.filename).map_err(UploadError::Rejected)
    }
}

/// Write `upload` into `dir` and return its public path.
///
/// The sanitized filename gets a random prefix so two events uploading
/// `poster.jpg` do not overwrite each other.
///
/// # Errors
///
/// Returns `UploadError::Rejected` for a bad filename and `UploadError::Io`
/// if the directory or file cannot be written.
pub async fn save_image(dir: &Path, upload: &ImageUpload) -> Result<String, UploadError> {
    let name = format!("{}-{}", Uuid::new_v4().simple(), upload.stored_name()?);

    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(dir.join(&name), &upload.bytes).await?;

    tracing::debug!(file = %name, bytes = upload.bytes.len(), "Stored event image");
    Ok(format!("{PUBLIC_PREFIX}/{name}"))
}

/// Delete an image written by [`save_image`] whose event was never stored.
///
/// Paths outside [`PUBLIC_PREFIX`] are ignored. A failed delete is only
/// logged.
pub async fn remove_image(dir: &Path, public_path: &str) {
    let Some(name) = public_path
        .strip_prefix(PUBLIC_PREFIX)
        .and_then(|rest| rest.strip_prefix('/'))
        .filter(|name| !name.is_empty() && !name.contains(['/', '\\']))
    else {
        return;
    };

    match tokio::fs::remove_file(dir.join(name)).await {
        Ok(()) => tracing::debug!(file = %name, "Removed orphaned event image"),
        Err(e) => tracing::warn!(file = %name, error = %e, "Failed to remove event image"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn upload(name: &str) -> ImageUpload {
        ImageUpload {
            filename: name.to_string(),
            bytes: Bytes::from_static(b"\x89PNG"),
        }
    }

    #[test]
    fn test_stored_name_sanitizes() {
        assert_eq!(upload("../Tacos Night.PNG").stored_name().unwrap(), "Tacos_Night.PNG");
        assert!(matches!(
            upload("menu.gif").stored_name(),
            Err(UploadError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn test_save_image_writes_under_dir() {
        let dir = std::env::temp_dir().join(format!("fv-upload-{}", Uuid::new_v4().simple()));
        let path = save_image(&dir, &upload("poster.jpg")).await.unwrap();

        assert!(path.starts_with("/static/img/"));
        assert!(path.ends_with("-poster.jpg"));

        let name = path.trim_start_matches("/static/img/");
        let written = tokio::fs::read(dir.join(name)).await.unwrap();
        assert_eq!(written, b"\x89PNG");

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_remove_image_deletes_only_uploads() {
        let dir = std::env::temp_dir().join(format!("fv-upload-{}", Uuid::new_v4().simple()));
        let path = save_image(&dir, &upload("poster.png")).await.unwrap();
        let name = path.trim_start_matches("/static/img/").to_string();

        remove_image(&dir, "/static/css/main.css").await;
        remove_image(&dir, "/static/img/../main.css").await;
        assert!(dir.join(&name).exists());

        remove_image(&dir, &path).await;
        assert!(!dir.join(&name).exists());

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
