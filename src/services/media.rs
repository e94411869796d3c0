//! On-disk storage for item images

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::{
    config::MediaConfig,
    error::{AppError, AppResult},
};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Sub-directory of the media root holding item images
const ITEMS_DIR: &str = "items";

#[derive(Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            root: PathBuf::from(&config.root),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Pick the stored extension for an upload, or reject it
    pub fn image_extension(file_name: Option<&str>, content_type: Option<&str>) -> AppResult<String> {
        if let Some(content_type) = content_type {
            if !content_type.starts_with("image/") {
                return Err(AppError::Validation(format!(
                    "Unsupported content type {}",
                    content_type
                )));
            }
        }

        let extension = file_name
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .ok_or_else(|| AppError::Validation("Image file name has no extension".to_string()))?;

        if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
            Ok(extension)
        } else {
            Err(AppError::Validation(format!(
                "Unsupported image type .{} (allowed: {})",
                extension,
                IMAGE_EXTENSIONS.join(", ")
            )))
        }
    }

    /// Write image bytes under a random name; returns the relative path
    pub async fn save_image(&self, extension: &str, bytes: &[u8]) -> AppResult<String> {
        if bytes.is_empty() {
            return Err(AppError::Validation("Image file is empty".to_string()));
        }

        let relative = format!("{}/{}.{}", ITEMS_DIR, Uuid::new_v4(), extension);
        let path = self.root.join(&relative);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Internal(format!("Failed to create media directory: {}", e)))?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to store image: {}", e)))?;

        Ok(relative)
    }

    /// Best-effort removal of a stored image
    pub async fn remove(&self, relative: &str) {
        // Only paths we generated are ever removed
        if !relative.starts_with(ITEMS_DIR) || relative.contains("..") {
            tracing::warn!(path = relative, "Refusing to remove unexpected media path");
            return;
        }
        if let Err(e) = tokio::fs::remove_file(self.root.join(relative)).await {
            tracing::warn!(path = relative, error = %e, "Failed to remove media file");
        }
    }
}
