//! Upload policy shared by every upload path.
//!
//! Both the per-step evidence upload and the single-file upload run the same
//! [`UploadPolicy::validate`] before any request is built. Files on disk go
//! through [`UploadPolicy::load`], which checks the size before reading.

use std::path::Path;

use thiserror::Error;

use crate::{
    error::{IoResultExt, PodError, Result},
    models::UploadFile,
};

/// Default size cap for uploaded evidence (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Extensions accepted by default.
pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &["pdf", "jpg", "jpeg", "png"];

/// Why a file was refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadViolation {
    /// Zero-byte file
    #[error("file is empty")]
    Empty,

    /// Larger than the configured limit
    #[error("file is {size} bytes, limit is {limit} bytes")]
    TooLarge { size: u64, limit: u64 },

    /// File name has no extension
    #[error("file has no extension")]
    MissingExtension,

    /// Extension is not in the allow-list
    #[error("file type '.{extension}' is not allowed")]
    DisallowedExtension { extension: String },
}

/// Size and type limits for uploads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    pub max_bytes: u64,

    /// Lower-case extensions without the dot
    pub allowed_extensions: Vec<String>,
}

impl UploadPolicy {
    pub fn new(max_bytes: u64, allowed_extensions: &[&str]) -> Self {
        Self {
            max_bytes,
            allowed_extensions: allowed_extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    /// Checks a file against the policy. Extension matching ignores case.
    pub fn validate(&self, file: &UploadFile) -> std::result::Result<(), UploadViolation> {
        if file.bytes.is_empty() {
            return Err(UploadViolation::Empty);
        }

        if file.size() > self.max_bytes {
            return Err(UploadViolation::TooLarge {
                size: file.size(),
                limit: self.max_bytes,
            });
        }

        let extension = file.extension().ok_or(UploadViolation::MissingExtension)?;
        if !self.allowed_extensions.iter().any(|allowed| *allowed == extension) {
            return Err(UploadViolation::DisallowedExtension { extension });
        }

        Ok(())
    }

    /// [`UploadPolicy::validate`] with the violation wrapped as
    /// `PodError::InvalidUpload`.
    pub fn check(&self, file: &UploadFile) -> Result<()> {
        self.validate(file)
            .map_err(|violation| PodError::InvalidUpload {
                file_name: file.file_name.clone(),
                violation,
            })
    }

    /// Reads a file from disk and checks it against the policy.
    ///
    /// The size is taken from the file's metadata first, so an oversized file
    /// is refused without reading its contents.
    ///
    /// # Errors
    ///
    /// `PodError::InvalidUpload` for any violation, `PodError::FileSystem` if
    /// the file cannot be inspected or read.
    pub async fn load(&self, path: impl AsRef<Path>) -> Result<UploadFile> {
        let path = path.as_ref();
        let size = tokio::fs::metadata(path).await.fs_context(path)?.len();

        if size > self.max_bytes {
            return Err(PodError::InvalidUpload {
                file_name: UploadFile::name_of(path),
                violation: UploadViolation::TooLarge {
                    size,
                    limit: self.max_bytes,
                },
            });
        }

        let file = UploadFile::from_path(path).await?;
        self.check(&file)?;
        Ok(file)
    }
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_ALLOWED_EXTENSIONS)
    }
}
