use crate::core::Storage;
use crate::utils::error::Result;
use std::path::{Path, PathBuf};

/// Filesystem storage rooted at one directory; relative paths resolve against it.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn resolve(&self, path: &str) -> PathBuf {
        self.base_path.join(path)
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let data = tokio::fs::read(self.resolve(path)).await?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.resolve(path);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(full_path, data).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_creates_output_directory() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().join("reports"));

        storage
            .write_file("Legal_Summary.pdf", b"%PDF-1.5")
            .await
            .unwrap();

        let written = std::fs::read(dir.path().join("reports/Legal_Summary.pdf")).unwrap();
        assert_eq!(written, b"%PDF-1.5");
        assert_eq!(
            storage.read_file("Legal_Summary.pdf").await.unwrap(),
            b"%PDF-1.5"
        );
    }

    #[tokio::test]
    async fn test_absolute_paths_bypass_base() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("lease.pdf");
        std::fs::write(&input, b"bytes").unwrap();
        let storage = LocalStorage::new("./unused");

        let data = storage.read_file(input.to_str().unwrap()).await.unwrap();
        assert_eq!(data, b"bytes");
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());

        let err = storage.read_file("missing.pdf").await.unwrap_err();
        assert!(matches!(err, crate::utils::error::LegalEaseError::IoError(_)));
    }
}
