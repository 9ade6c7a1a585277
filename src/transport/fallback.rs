use async_trait::async_trait;
use tokio::fs;

use crate::error::{UploadError, UploadErrorKind};
use crate::media::{StoredMedia, UploadOutcome, UploadRequest};
use crate::storage::{MediaStorage, generate_filename};
use crate::transport::{UploadTransport, validate};

/// Secondary upload path. Writes to a hidden staging file in the category
/// directory and moves it into place; success is reported as soon as the
/// move returns. Every failure comes back as `FallbackExhausted`.
#[derive(Clone, Debug)]
pub struct FallbackTransport {
    storage: MediaStorage,
}

impl FallbackTransport {
    pub fn new(storage: MediaStorage) -> Self {
        Self { storage }
    }

    async fn store(&self, request: &UploadRequest) -> UploadOutcome {
        validate(request)?;
        if request.is_empty() {
            return Err(UploadError::new(
                UploadErrorKind::EmptyFile,
                "Uploaded file is empty",
            ));
        }
        let dir = self
            .storage
            .directories()
            .ensure_directory(request.category)
            .await?;

        let file_name = generate_filename(&request.original_filename, &request.media_type);
        let staging = dir.join(format!(".{file_name}.part"));
        let destination = dir.join(&file_name);

        if let Err(err) = fs::write(&staging, &request.bytes).await {
            let _ = fs::remove_file(&staging).await;
            return Err(write_failed(err));
        }
        if let Err(err) = fs::rename(&staging, &destination).await {
            let _ = fs::remove_file(&staging).await;
            return Err(write_failed(err));
        }

        tracing::info!(
            category = %request.category,
            filename = %file_name,
            size = request.len(),
            "file uploaded via fallback"
        );
        Ok(StoredMedia {
            relative_path: MediaStorage::public_path(request.category, &file_name),
            category: request.category,
            generated_filename: file_name,
            size_bytes: request.len() as u64,
            original_filename: request.original_filename.clone(),
            media_type: request.media_type.clone(),
        })
    }
}

fn write_failed(err: std::io::Error) -> UploadError {
    UploadError::new(
        UploadErrorKind::WriteFailed,
        format!("Failed to move file into place: {err}"),
    )
}

#[async_trait]
impl UploadTransport for FallbackTransport {
    fn name(&self) -> &'static str {
        "fallback"
    }

    async fn upload(&self, request: &UploadRequest) -> UploadOutcome {
        self.store(request).await.map_err(UploadError::exhausted)
    }
}
