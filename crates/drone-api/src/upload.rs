//! Medication picture uploads.
//!
//! Pictures are accepted only when their leading bytes identify a PNG or a
//! JPEG image. Each one is stored under a fresh random name in the upload
//! directory and exposed under `/static/`.

use std::io;
use std::path::{Path, PathBuf};

use uuid::Uuid;

/// URL prefix the upload directory is served under
pub const STATIC_PREFIX: &str = "/static";

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";
const JPEG_SIGNATURE: &[u8] = &[0xFF, 0xD8, 0xFF];

/// Accepted picture formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
}

impl ImageKind {
    /// Detect the format from the file's magic bytes
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(PNG_SIGNATURE) {
            Some(Self::Png)
        } else if bytes.starts_with(JPEG_SIGNATURE) {
            Some(Self::Jpeg)
        } else {
            None
        }
    }

    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }
}

/// Location reserved for one uploaded picture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    /// Where the bytes go on disk
    pub file_path: PathBuf,
    /// Reference handed to the domain and returned to clients
    pub public_path: String,
}

/// Writes pictures into the upload directory.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Pick a fresh name for a picture of `kind`; nothing is written yet.
    pub fn reserve(&self, kind: ImageKind) -> StoredImage {
        let file_name = format!("{}.{}", Uuid::new_v4(), kind.extension());
        StoredImage {
            file_path: self.dir.join(&file_name),
            public_path: format!("{STATIC_PREFIX}/{file_name}"),
        }
    }

    pub async fn write(&self, image: &StoredImage, bytes: &[u8]) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&image.file_path, bytes).await?;

        tracing::debug!(
            path = %image.file_path.display(),
            size = bytes.len(),
            "Medication picture stored"
        );
        Ok(())
    }

    /// Best-effort removal of a picture that ended up unused
    pub async fn discard(&self, image: &StoredImage) {
        if let Err(e) = tokio::fs::remove_file(&image.file_path).await {
            tracing::warn!(
                path = %image.file_path.display(),
                error = %e,
                "Failed to remove unused medication picture"
            );
        }
    }
}
