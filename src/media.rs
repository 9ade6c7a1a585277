use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::{category::Category, error::UploadError};

/// Hard ceiling on a single upload. Payloads at or above it are rejected.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// One upload attempt. Lives only for the duration of the call.
#[derive(Clone, Debug)]
pub struct UploadRequest {
    pub bytes: Bytes,
    pub media_type: String,
    pub category: Category,
    pub original_filename: String,
}

impl UploadRequest {
    pub fn new(
        bytes: impl Into<Bytes>,
        media_type: impl Into<String>,
        category: Category,
        original_filename: impl Into<String>,
    ) -> Self {
        Self {
            bytes: bytes.into(),
            media_type: media_type.into(),
            category,
            original_filename: original_filename.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// A file that has been written under `uploads/<category>/`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredMedia {
    pub relative_path: String,
    pub category: Category,
    pub generated_filename: String,
    pub size_bytes: u64,
    pub original_filename: String,
    pub media_type: String,
}

pub type UploadOutcome = Result<StoredMedia, UploadError>;

/// Success body shared by every upload endpoint.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub file_path: String,
    pub original_name: String,
    pub size: u64,
}

impl From<&StoredMedia> for UploadResponse {
    fn from(media: &StoredMedia) -> Self {
        Self {
            success: true,
            file_path: media.relative_path.clone(),
            original_name: media.original_filename.clone(),
            size: media.size_bytes,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
