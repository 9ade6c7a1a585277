use std::time::Duration;

use async_trait::async_trait;
use tokio::fs;

use crate::error::{UploadError, UploadErrorKind};
use crate::media::{StoredMedia, UploadOutcome, UploadRequest};
use crate::storage::{MediaStorage, generate_filename};
use crate::transport::{UploadTransport, validate};

pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Main upload path: validate, write, then re-stat after a settling delay.
#[derive(Clone, Debug)]
pub struct PrimaryTransport {
    storage: MediaStorage,
    settle_delay: Duration,
}

impl PrimaryTransport {
    pub fn new(storage: MediaStorage) -> Self {
        Self {
            storage,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }

    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }
}

#[async_trait]
impl UploadTransport for PrimaryTransport {
    fn name(&self) -> &'static str {
        "primary"
    }

    async fn upload(&self, request: &UploadRequest) -> UploadOutcome {
        validate(request)?;
        let dir = self
            .storage
            .directories()
            .ensure_directory(request.category)
            .await?;

        let file_name = generate_filename(&request.original_filename, &request.media_type);
        let path = dir.join(&file_name);
        fs::write(&path, &request.bytes).await.map_err(|err| {
            UploadError::new(
                UploadErrorKind::WriteFailed,
                format!("Failed to save file: {err}"),
            )
        })?;

        tokio::time::sleep(self.settle_delay).await;

        let metadata = fs::metadata(&path).await.map_err(|err| {
            tracing::error!(path = %path.display(), error = %err, "written file not found");
            UploadError::new(
                UploadErrorKind::WriteVerificationFailed,
                "File was not saved correctly",
            )
        })?;
        if metadata.len() == 0 {
            tracing::error!(path = %path.display(), "written file is empty");
            return Err(UploadError::new(
                UploadErrorKind::EmptyFile,
                "Uploaded file is empty",
            ));
        }

        tracing::info!(
            category = %request.category,
            filename = %file_name,
            size = metadata.len(),
            "file uploaded"
        );
        Ok(StoredMedia {
            relative_path: MediaStorage::public_path(request.category, &file_name),
            category: request.category,
            generated_filename: file_name,
            size_bytes: metadata.len(),
            original_filename: request.original_filename.clone(),
            media_type: request.media_type.clone(),
        })
    }
}
