//! File-backed secret provider.
//!
//! Reads `{dir}/{KEY}`, the layout used by mounted secret stores (Docker
//! and Kubernetes secrets). Trailing whitespace is trimmed by the service.

use std::path::{Path, PathBuf};

use jarvis_core::secret::SecretProvider;
use jarvis_types::error::SecretError;

pub struct FileSecretProvider {
    dir: PathBuf,
}

impl FileSecretProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SecretProvider for FileSecretProvider {
    fn name(&self) -> &str {
        "file"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, SecretError> {
        // Keys are plain names; refuse anything that could escape the dir.
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Ok(None);
        }

        let path = self.dir.join(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) if err.kind() == std::io::ErrorKind::InvalidData => {
                Err(SecretError::InvalidEncoding {
                    key: key.to_string(),
                })
            }
            Err(err) => Err(SecretError::StorageError(format!(
                "failed to read {}: {err}",
                path.display()
            ))),
        }
    }
}
