//! Storage backends for original images and their derivatives.

use std::path::{Path, PathBuf};

/// Errors raised by a [`Storage`] backend.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The file to delete or read does not exist.
    #[error("file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// Any other I/O failure.
    #[error("storage I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    fn from_io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            StorageError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            StorageError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }
}

/// Where stored images live and how they are addressed.
///
/// Names are relative, `/`-separated storage names such as
/// `artwork/42/my-photo.jpg`.
pub trait Storage {
    /// Local filesystem path for `name`.
    fn path(&self, name: &str) -> PathBuf;

    /// Public URL for `name`.
    fn url(&self, name: &str) -> String;

    /// Copy `source` into storage under `name`, creating directories.
    /// Returns the stored name.
    fn save(&self, name: &str, source: &Path) -> Result<String, StorageError>;

    /// Remove the file at `path`.
    ///
    /// A missing file is reported as [`StorageError::NotFound`].
    fn delete(&self, path: &Path) -> Result<(), StorageError>;
}

/// Local directory served under a base URL.
#[derive(Debug, Clone)]
pub struct FileSystemStorage {
    location: PathBuf,
    base_url: String,
}

impl FileSystemStorage {
    /// Storage rooted at `location`, served from `base_url`.
    pub fn new(location: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            location: location.into(),
            base_url,
        }
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Storage for FileSystemStorage {
    fn path(&self, name: &str) -> PathBuf {
        name.split('/')
            .filter(|part| !part.is_empty())
            .fold(self.location.clone(), |path, part| path.join(part))
    }

    fn url(&self, name: &str) -> String {
        format!("{}{}", self.base_url, name.trim_start_matches('/'))
    }

    fn save(&self, name: &str, source: &Path) -> Result<String, StorageError> {
        let dest = self.path(name);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::from_io(parent, e))?;
        }
        std::fs::copy(source, &dest).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound && !source.exists() {
                StorageError::from_io(source, e)
            } else {
                StorageError::from_io(&dest, e)
            }
        })?;
        tracing::debug!("Stored {} as {}", source.display(), dest.display());
        Ok(name.to_string())
    }

    fn delete(&self, path: &Path) -> Result<(), StorageError> {
        std::fs::remove_file(path).map_err(|e| StorageError::from_io(path, e))
    }
}
