//! Error types for the artwork library.

use crate::storage::StorageError;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// ImageMagick or image header failure.
    #[error(transparent)]
    Magick(#[from] artwork_magick::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The record has no stored image.
    #[error("record has no image")]
    MissingImage,

    /// A record was configured inconsistently.
    #[error("invalid record: {0}")]
    InvalidRecord(String),
}
