//! Files on their way to the authority.

use std::path::Path;

use crate::error::{IoResultExt, Result};

/// An in-memory file ready to be sent as a multipart part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// Original file name, used for the extension check and the part name
    pub file_name: String,

    /// MIME type, if known
    pub content_type: Option<String>,

    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = content_type_for(&file_name).map(String::from);
        Self {
            file_name,
            content_type,
            bytes,
        }
    }

    /// Reads a whole file from disk without any size check; see
    /// [`UploadPolicy::load`](crate::validation::UploadPolicy::load).
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.fs_context(path)?;
        Ok(Self::new(Self::name_of(path), bytes))
    }

    /// File name component of `path`, as sent to the authority.
    pub(crate) fn name_of(path: &Path) -> String {
        path.file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Lower-cased extension, without the dot.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.file_name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .filter(|ext| !ext.is_empty())
    }
}

fn content_type_for(file_name: &str) -> Option<&'static str> {
    let ext = Path::new(file_name).extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "pdf" => Some("application/pdf"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        _ => None,
    }
}
