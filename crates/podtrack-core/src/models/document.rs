//! Evidence document model.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// A file stored by the authority and attached to one step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Identifier assigned by the authority
    pub id: String,

    /// Key of the step this document is evidence for. Not validated against
    /// the catalog.
    pub step_key: String,

    /// Where the stored file can be fetched
    pub url: String,

    /// File type as reported at upload time (usually the extension)
    pub file_type: String,

    /// Timestamp when the document was stored (UTC)
    pub uploaded_at: Timestamp,
}
