use std::fmt;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::media::ErrorResponse;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UploadErrorKind {
    /// Declared media type is neither an image nor a video.
    UnsupportedType,
    /// Payload is at or above the upload ceiling.
    TooLarge,
    /// Malformed multipart body or missing `file` field.
    InvalidRequest,
    /// Category directory could not be created or is not writable.
    DirectoryUnavailable,
    /// The write call itself failed.
    WriteFailed,
    /// The written file could not be found or stat'ed after the settling delay.
    WriteVerificationFailed,
    /// The written file is zero bytes long.
    EmptyFile,
    /// The fallback transport failed; no further attempts are made.
    FallbackExhausted,
    /// Format conversion failed. Never fatal to an upload.
    ConversionFailed,
    /// Network or decode error talking to a remote upload endpoint.
    TransportFailed,
}

impl UploadErrorKind {
    /// Content-level rejections that a different transport cannot fix.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            UploadErrorKind::UnsupportedType
                | UploadErrorKind::TooLarge
                | UploadErrorKind::InvalidRequest
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UploadErrorKind::UnsupportedType => "unsupported_type",
            UploadErrorKind::TooLarge => "too_large",
            UploadErrorKind::InvalidRequest => "invalid_request",
            UploadErrorKind::DirectoryUnavailable => "directory_unavailable",
            UploadErrorKind::WriteFailed => "write_failed",
            UploadErrorKind::WriteVerificationFailed => "write_verification_failed",
            UploadErrorKind::EmptyFile => "empty_file",
            UploadErrorKind::FallbackExhausted => "fallback_exhausted",
            UploadErrorKind::ConversionFailed => "conversion_failed",
            UploadErrorKind::TransportFailed => "transport_failed",
        }
    }
}

impl fmt::Display for UploadErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure half of an upload outcome: a kind plus a human-readable message.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct UploadError {
    kind: UploadErrorKind,
    message: String,
    cause: Option<UploadErrorKind>,
}

impl UploadError {
    pub fn new(kind: UploadErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            cause: None,
        }
    }

    pub fn unsupported_type(media_type: &str) -> Self {
        Self::new(
            UploadErrorKind::UnsupportedType,
            format!("Only image and video files are allowed (got {media_type})"),
        )
    }

    pub fn too_large(limit: usize) -> Self {
        Self::new(
            UploadErrorKind::TooLarge,
            format!("File too large (max: {limit} bytes)"),
        )
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(UploadErrorKind::InvalidRequest, message)
    }

    /// Wraps a fallback-path failure. Already-exhausted errors pass through.
    pub fn exhausted(inner: UploadError) -> Self {
        if inner.kind == UploadErrorKind::FallbackExhausted {
            return inner;
        }
        Self {
            kind: UploadErrorKind::FallbackExhausted,
            message: format!("Fallback upload failed: {}", inner.message),
            cause: Some(inner.kind),
        }
    }

    pub fn kind(&self) -> UploadErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Underlying kind for wrapped failures.
    pub fn cause(&self) -> Option<UploadErrorKind> {
        self.cause
    }

    pub fn is_validation(&self) -> bool {
        self.kind.is_validation()
    }

    pub fn status_code(&self) -> StatusCode {
        let kind = self.cause.unwrap_or(self.kind);
        if kind.is_validation() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(ErrorResponse { error: self.message })).into_response()
    }
}
