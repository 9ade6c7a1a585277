use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use url::Url;

use crate::error::{UploadError, UploadErrorKind};
use crate::media::{StoredMedia, UploadOutcome, UploadRequest};
use crate::transport::UploadTransport;

pub const PRIMARY_ENDPOINT: &str = "/api/upload";
pub const FALLBACK_ENDPOINT: &str = "/api/upload-fallback";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadEnvelope {
    #[serde(default)]
    success: bool,
    file_path: Option<String>,
    original_name: Option<String>,
    size: Option<u64>,
    error: Option<String>,
}

/// Posts the `file`/`type` multipart form to a remote upload endpoint.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: Url,
    name: &'static str,
}

impl HttpTransport {
    pub fn new(client: reqwest::Client, endpoint: Url, name: &'static str) -> Self {
        Self {
            client,
            endpoint,
            name,
        }
    }

    pub fn primary(client: reqwest::Client, base_url: &Url) -> Result<Self, url::ParseError> {
        Ok(Self::new(client, base_url.join(PRIMARY_ENDPOINT)?, "remote-primary"))
    }

    pub fn fallback(client: reqwest::Client, base_url: &Url) -> Result<Self, url::ParseError> {
        Ok(Self::new(client, base_url.join(FALLBACK_ENDPOINT)?, "remote-fallback"))
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

fn transport_failed(message: String) -> UploadError {
    UploadError::new(UploadErrorKind::TransportFailed, message)
}

#[async_trait]
impl UploadTransport for HttpTransport {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn upload(&self, request: &UploadRequest) -> UploadOutcome {
        let part = Part::bytes(request.bytes.to_vec())
            .file_name(request.original_filename.clone())
            .mime_str(&request.media_type)
            .map_err(|_| UploadError::unsupported_type(&request.media_type))?;
        let form = Form::new()
            .text("type", request.category.as_str())
            .part("file", part);

        let response = self
            .client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|err| transport_failed(format!("upload request failed: {err}")))?;
        let status = response.status();
        let envelope: UploadEnvelope = response
            .json()
            .await
            .map_err(|err| transport_failed(format!("invalid upload response: {err}")))?;

        if !status.is_success() || !envelope.success {
            let message = envelope
                .error
                .unwrap_or_else(|| format!("upload failed with HTTP {status}"));
            let kind = if status.is_client_error() {
                UploadErrorKind::InvalidRequest
            } else {
                UploadErrorKind::WriteFailed
            };
            return Err(UploadError::new(kind, message));
        }

        let relative_path = envelope
            .file_path
            .ok_or_else(|| transport_failed("upload response missing filePath".to_string()))?;
        let generated_filename = relative_path
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();
        Ok(StoredMedia {
            generated_filename,
            category: request.category,
            size_bytes: envelope.size.unwrap_or(request.len() as u64),
            original_filename: envelope
                .original_name
                .unwrap_or_else(|| request.original_filename.clone()),
            media_type: request.media_type.clone(),
            relative_path,
        })
    }
}
