use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use uuid::Uuid;

use crate::category::Category;
use crate::error::{UploadError, UploadErrorKind};

#[cfg(unix)]
const DIRECTORY_MODE: u32 = 0o755;

/// Makes sure a category directory exists and accepts writes before any
/// transport touches it.
#[derive(Clone, Debug)]
pub struct DirectoryManager {
    uploads_root: PathBuf,
}

impl DirectoryManager {
    pub fn new(uploads_root: impl Into<PathBuf>) -> Self {
        Self {
            uploads_root: uploads_root.into(),
        }
    }

    pub fn uploads_root(&self) -> &Path {
        &self.uploads_root
    }

    pub fn category_dir(&self, category: Category) -> PathBuf {
        self.uploads_root.join(category.as_str())
    }

    pub async fn ensure_directory(&self, category: Category) -> Result<PathBuf, UploadError> {
        let dir = self.category_dir(category);
        create_dir(&dir)
            .await
            .map_err(|err| unavailable(&dir, &format!("create failed: {err}")))?;
        probe_writable(&dir).await?;
        Ok(dir)
    }
}

async fn create_dir(dir: &Path) -> std::io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(DIRECTORY_MODE);
    builder.create(dir).await
}

/// Writes and deletes a marker file. The marker is removed even when the
/// write fails part-way.
async fn probe_writable(dir: &Path) -> Result<(), UploadError> {
    let probe = dir.join(format!(".write-probe-{}", Uuid::new_v4()));
    let written = fs::write(&probe, b"ok").await;
    let removed = match fs::remove_file(&probe).await {
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        other => other,
    };
    if let Err(err) = written {
        return Err(unavailable(dir, &format!("not writable: {err}")));
    }
    if let Err(err) = removed {
        return Err(unavailable(dir, &format!("probe cleanup failed: {err}")));
    }
    Ok(())
}

fn unavailable(dir: &Path, detail: &str) -> UploadError {
    tracing::error!(dir = %dir.display(), detail, "upload directory unavailable");
    UploadError::new(
        UploadErrorKind::DirectoryUnavailable,
        format!("Upload directory {} is unavailable: {detail}", dir.display()),
    )
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[tokio::test]
    async fn creates_missing_directory_and_leaves_no_probe() {
        let temp_dir = TempDir::new().unwrap();
        let manager = DirectoryManager::new(temp_dir.path().join("uploads"));

        let dir = manager.ensure_directory(Category::Stories).await.unwrap();
        assert_eq!(dir, temp_dir.path().join("uploads").join("stories"));
        assert!(dir.is_dir());
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn existing_directory_is_reused() {
        let temp_dir = TempDir::new().unwrap();
        let manager = DirectoryManager::new(temp_dir.path());
        let first = manager.ensure_directory(Category::Posts).await.unwrap();
        std::fs::write(first.join("keep.jpg"), b"x").unwrap();

        let second = manager.ensure_directory(Category::Posts).await.unwrap();
        assert_eq!(first, second);
        assert!(second.join("keep.jpg").exists());
    }

    #[tokio::test]
    async fn root_that_is_a_file_is_unavailable() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("uploads");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let manager = DirectoryManager::new(&blocker);

        let err = manager.ensure_directory(Category::Profiles).await.unwrap_err();
        assert_eq!(err.kind(), UploadErrorKind::DirectoryUnavailable);
    }

    #[tokio::test]
    async fn concurrent_creation_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let manager = DirectoryManager::new(temp_dir.path().join("uploads"));
        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let manager = manager.clone();
                tokio::spawn(async move { manager.ensure_directory(Category::Posts).await })
            })
            .collect();
        for task in tasks {
            assert!(task.await.unwrap().is_ok());
        }
    }
}
