//! Artwork - responsive image derivatives for stored records
//!
//! A record implementing [`Artwork`] owns one uploaded image. On save the
//! [`ArtworkManager`] normalizes the original and renders one JPEG
//! derivative per configured size with ImageMagick; on delete it removes the
//! original, the derivatives and the emptied folders.

pub mod config;
mod error;
pub mod manager;
pub mod paths;
pub mod record;
pub mod storage;

pub use artwork_magick::{Converter, Method, QualityPolicy, Size};
pub use error::{Error, Result};
pub use manager::{ArtworkManager, ConversionStep, DeleteReport, SaveReport};
pub use paths::{derivative_path, derivative_url, slugify, PathResolver};
pub use record::{Artwork, ArtworkRecord, MaxSize};
pub use storage::{FileSystemStorage, Storage, StorageError};
