//! Single entry point for "store this file": normalize, try the primary
//! transport, and hand off to the fallback once.

use std::sync::Arc;

use url::Url;

use crate::error::UploadError;
use crate::media::{UploadOutcome, UploadRequest};
use crate::normalizer::FormatNormalizer;
use crate::storage::MediaStorage;
use crate::transport::{FallbackTransport, HttpTransport, PrimaryTransport, UploadTransport};

/// Controls whether a validation rejection from the primary transport still
/// triggers the fallback attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FallbackPolicy {
    pub fallback_on_validation_error: bool,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            fallback_on_validation_error: true,
        }
    }
}

#[derive(Clone)]
pub struct UploadOrchestrator {
    normalizer: FormatNormalizer,
    primary: Arc<dyn UploadTransport>,
    fallback: Arc<dyn UploadTransport>,
    policy: FallbackPolicy,
}

impl UploadOrchestrator {
    pub fn new(
        normalizer: FormatNormalizer,
        primary: Arc<dyn UploadTransport>,
        fallback: Arc<dyn UploadTransport>,
    ) -> Self {
        Self {
            normalizer,
            primary,
            fallback,
            policy: FallbackPolicy::default(),
        }
    }

    /// In-process orchestration over a local public directory.
    pub fn local(storage: MediaStorage, normalizer: FormatNormalizer) -> Self {
        Self::new(
            normalizer,
            Arc::new(PrimaryTransport::new(storage.clone())),
            Arc::new(FallbackTransport::new(storage)),
        )
    }

    /// Orchestration against a remote server's upload endpoints.
    pub fn remote(base_url: &Url, normalizer: FormatNormalizer) -> Result<Self, url::ParseError> {
        let client = reqwest::Client::new();
        Ok(Self::new(
            normalizer,
            Arc::new(HttpTransport::primary(client.clone(), base_url)?),
            Arc::new(HttpTransport::fallback(client, base_url)?),
        ))
    }

    pub fn with_policy(mut self, policy: FallbackPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> FallbackPolicy {
        self.policy
    }

    /// Full outcome. At most two transport attempts; the fallback's failure
    /// is the one reported when both fail.
    pub async fn upload(&self, request: UploadRequest) -> UploadOutcome {
        let request = self.normalizer.normalize(request).await;

        let primary_err = match self.primary.upload(&request).await {
            Ok(stored) => return Ok(stored),
            Err(err) => err,
        };
        if primary_err.is_validation() && !self.policy.fallback_on_validation_error {
            tracing::warn!(
                transport = self.primary.name(),
                kind = %primary_err.kind(),
                error = %primary_err,
                "upload rejected"
            );
            return Err(primary_err);
        }

        tracing::warn!(
            transport = self.primary.name(),
            kind = %primary_err.kind(),
            error = %primary_err,
            "primary upload failed, trying fallback"
        );
        match self.fallback.upload(&request).await {
            Ok(stored) => Ok(stored),
            Err(err) => {
                let err = UploadError::exhausted(err);
                tracing::error!(
                    transport = self.fallback.name(),
                    error = %err,
                    "fallback upload failed"
                );
                Err(err)
            }
        }
    }

    /// Relative public path of the stored file, or `None` on failure.
    pub async fn save_file(&self, request: UploadRequest) -> Option<String> {
        self.upload(request).await.ok().map(|stored| stored.relative_path)
    }
}
