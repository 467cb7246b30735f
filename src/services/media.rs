// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local storage for uploaded memory images, served under `/media`.

use std::path::{Path, PathBuf};

use crate::error::AppError;

/// Folder (under the media root) that holds memory images.
const MEMORIES_FOLDER: &str = "memories";

/// Accepted image types and the extension each is stored with.
const ALLOWED_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/webp", "webp"),
    ("image/gif", "gif"),
];

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// File extension for an accepted image content type.
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    ALLOWED_TYPES
        .iter()
        .find(|(ty, _)| *ty == content_type)
        .map(|(_, ext)| *ext)
}

/// Media store rooted at a local directory.
#[derive(Clone)]
pub struct MediaStore {
    root: PathBuf,
    public_base: String,
}

impl MediaStore {
    /// `public_base` is the API's public URL; files are served from
    /// `{public_base}/media/...`.
    pub fn new(root: impl Into<PathBuf>, public_base: &str) -> Self {
        Self {
            root: root.into(),
            public_base: public_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store a memory image and return its public URL.
    pub async fn save_memory_image(
        &self,
        id: &str,
        extension: &str,
        bytes: &[u8],
    ) -> Result<String, AppError> {
        let dir = self.root.join(MEMORIES_FOLDER);
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            AppError::Internal(anyhow::anyhow!("Failed to create media directory: {}", e))
        })?;

        let file_name = format!("{}.{}", id, extension);
        tokio::fs::write(dir.join(&file_name), bytes)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to write upload: {}", e)))?;

        tracing::debug!(file = %file_name, size = bytes.len(), "Stored memory image");
        Ok(format!(
            "{}/media/{}/{}",
            self.public_base, MEMORIES_FOLDER, file_name
        ))
    }

    /// Remove the file behind a public URL returned by
    /// [`MediaStore::save_memory_image`]. URLs that do not point into the
    /// store are ignored.
    pub async fn delete_by_url(&self, src: &str) -> Result<(), AppError> {
        let Some(path) = self.path_for_url(src) else {
            tracing::warn!(src, "Not a media store URL, nothing to delete");
            return Ok(());
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Internal(anyhow::anyhow!(
                "Failed to delete {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn path_for_url(&self, src: &str) -> Option<PathBuf> {
        let prefix = format!("{}/media/{}/", self.public_base, MEMORIES_FOLDER);
        let file_name = src.strip_prefix(&prefix)?;
        if file_name.is_empty() || file_name.contains('/') || file_name.contains("..") {
            return None;
        }
        Some(self.root.join(MEMORIES_FOLDER).join(file_name))
    }
}
