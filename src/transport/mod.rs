//! Upload transports: the in-process primary and fallback paths, and an
//! HTTP client that drives the same paths on a remote server.

pub mod fallback;
pub mod http;
pub mod primary;

use async_trait::async_trait;

use crate::error::UploadError;
use crate::media::{MAX_UPLOAD_BYTES, UploadOutcome, UploadRequest};

pub use fallback::FallbackTransport;
pub use http::HttpTransport;
pub use primary::PrimaryTransport;

/// One way of getting an [`UploadRequest`] onto disk.
#[async_trait]
pub trait UploadTransport: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    async fn upload(&self, request: &UploadRequest) -> UploadOutcome;
}

/// Only `image/*` and `video/*` are accepted, and only below the ceiling.
pub fn validate(request: &UploadRequest) -> Result<(), UploadError> {
    let media_type = request.media_type.trim().to_lowercase();
    if !(media_type.starts_with("image/") || media_type.starts_with("video/")) {
        return Err(UploadError::unsupported_type(&request.media_type));
    }
    if request.len() >= MAX_UPLOAD_BYTES {
        return Err(UploadError::too_large(MAX_UPLOAD_BYTES));
    }
    Ok(())
}
