//! Temporary media files owned by exactly one holder.
//!
//! A [`TempMedia`] is created for every downloaded source and every
//! transcoder output. [`TempMedia::remove`] consumes the value, so a file
//! cannot be deleted twice, and `Drop` removes anything that was never
//! explicitly released.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Owned path to a temporary file
pub struct TempMedia {
    path: PathBuf,
    armed: bool,
}

impl TempMedia {
    /// Takes ownership of an existing path
    pub fn adopt(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            armed: true,
        }
    }

    /// Reserves a fresh unique path inside `dir`. The file itself is not created.
    pub fn reserve(dir: &Path, prefix: &str, extension: &str) -> Self {
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let rand: u32 = rand::random();
        Self::adopt(dir.join(format!("{}_{:x}_{:x}.{}", prefix, timestamp, rand, extension)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Size on disk in bytes
    pub async fn size(&self) -> io::Result<u64> {
        Ok(tokio::fs::metadata(&self.path).await?.len())
    }

    /// Deletes the file. A file that is already gone counts as removed.
    pub async fn remove(mut self) -> io::Result<()> {
        self.armed = false;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                log::debug!("Removed temp file {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

impl Drop for TempMedia {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => log::debug!("Removed leftover temp file {}", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("Failed to remove temp file {}: {}", self.path.display(), e),
        }
    }
}

impl fmt::Debug for TempMedia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TempMedia").field(&self.path).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_remove_deletes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("source.mp4");
        std::fs::write(&path, b"data").unwrap();

        let media = TempMedia::adopt(&path);
        assert_eq!(media.size().await.unwrap(), 4);
        media.remove().await.unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_remove_missing_file_is_ok() {
        let dir = TempDir::new().unwrap();
        let media = TempMedia::reserve(dir.path(), "kruzhok", "mp4");
        assert!(!media.exists());
        media.remove().await.unwrap();
    }

    #[test]
    fn test_drop_removes_unreleased_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("photo.jpg");
        std::fs::write(&path, b"jpeg").unwrap();

        drop(TempMedia::adopt(&path));
        assert!(!path.exists());
    }

    #[test]
    fn test_reserved_paths_are_unique() {
        let dir = TempDir::new().unwrap();
        let a = TempMedia::reserve(dir.path(), "kruzhok", "mp4");
        let b = TempMedia::reserve(dir.path(), "kruzhok", "mp4");
        assert_ne!(a.path(), b.path());
        assert!(a.path().starts_with(dir.path()));
        assert_eq!(a.path().extension().and_then(|e| e.to_str()), Some("mp4"));
    }
}
