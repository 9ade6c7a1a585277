pub mod directory;
pub mod naming;

use std::path::{Path, PathBuf};

use anyhow::Result;
use tokio::fs;

use crate::category::Category;

pub use directory::DirectoryManager;
pub use naming::{extension_for_media_type, generate_filename, resolve_extension};

pub const UPLOADS_DIR: &str = "uploads";

/// Layout of the public directory: stored media lives at
/// `<public_dir>/uploads/<category>/<file>` and is served as
/// `/uploads/<category>/<file>`.
#[derive(Clone, Debug)]
pub struct MediaStorage {
    public_dir: PathBuf,
    directories: DirectoryManager,
}

impl MediaStorage {
    pub fn new(public_dir: impl Into<PathBuf>) -> Self {
        let public_dir = public_dir.into();
        let directories = DirectoryManager::new(public_dir.join(UPLOADS_DIR));
        Self {
            public_dir,
            directories,
        }
    }

    pub fn uploads_root(&self) -> &Path {
        self.directories.uploads_root()
    }

    pub fn directories(&self) -> &DirectoryManager {
        &self.directories
    }

    pub fn public_path(category: Category, file_name: &str) -> String {
        format!("/{UPLOADS_DIR}/{}/{file_name}", category.as_str())
    }

    /// Maps a `/uploads/...` path back onto disk.
    pub fn resolve_path(&self, public_path: &str) -> PathBuf {
        let normalized = public_path.trim_start_matches('/');
        self.public_dir.join(Path::new(normalized))
    }

    pub async fn get(&self, public_path: &str) -> Result<Option<Vec<u8>>> {
        let path = self.resolve_path(public_path);
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Every file currently stored for a category, hidden files excluded.
    pub async fn list(&self, category: Category) -> Result<Vec<String>> {
        let dir = self.directories.category_dir(category);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(dir) => dir,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if let Some(name) = entry.file_name().to_str() {
                if !name.starts_with('.') {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}
