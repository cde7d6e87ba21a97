//! Collision-free on-disk placement for uploaded files.

use std::path::{Path, PathBuf};

/// Maps a validated logical file name to a fresh path under the save
/// directory. A random token prefix guarantees that concurrent uploads of
/// the same name never collide.
#[derive(Debug)]
pub struct FileStore {
    save_dir: PathBuf,
}

impl FileStore {
    pub fn new(save_dir: impl Into<PathBuf>) -> Self {
        Self {
            save_dir: save_dir.into(),
        }
    }

    /// Creates the save directory if it does not exist. Idempotent.
    pub async fn ensure_dir(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.save_dir).await
    }

    /// Returns a fresh destination path `{save_dir}/{token}_{file_name}`.
    ///
    /// The token is a v4 UUID, so two calls never produce the same path
    /// even for identical names.
    pub fn allocate(&self, file_name: &str) -> PathBuf {
        let token = uuid::Uuid::new_v4();
        self.save_dir.join(format!("{token}_{file_name}"))
    }

    pub fn save_dir(&self) -> &Path {
        &self.save_dir
    }
}
