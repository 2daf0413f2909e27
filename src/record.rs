//! Records that own an artwork image.

use artwork_magick::Size;

use crate::{Error, Result};

/// Folder used when a record does not name one.
pub const DEFAULT_FOLDER: &str = "artwork";

/// Sizes used when a record does not name any.
pub static DEFAULT_SIZES: &[Size] = &[Size::Square(1200)];

/// A record with one stored image and a set of derivative sizes.
///
/// Only [`Artwork::sub_folder`] and [`Artwork::image`] are required. Images
/// are stored under `<folder>/<sub_folder>/`, so `sub_folder` usually
/// returns the record's primary key.
///
/// ```
/// use artwork::Artwork;
///
/// struct Poster {
///     id: u64,
///     image: Option<String>,
/// }
///
/// impl Artwork for Poster {
///     fn folder(&self) -> &str {
///         "posters"
///     }
///
///     fn sub_folder(&self) -> String {
///         self.id.to_string()
///     }
///
///     fn image(&self) -> Option<&str> {
///         self.image.as_deref()
///     }
/// }
///
/// let poster = Poster { id: 7, image: None };
/// assert!(poster.is_responsive());
/// assert_eq!(poster.primary_size().unwrap().to_string(), "1200");
/// ```
pub trait Artwork {
    /// Top-level storage folder.
    fn folder(&self) -> &str {
        DEFAULT_FOLDER
    }

    /// Per-record folder below [`Artwork::folder`].
    fn sub_folder(&self) -> String;

    /// Storage name of the original image, if one is attached.
    fn image(&self) -> Option<&str>;

    /// Derivative sizes, first entry is the primary size.
    ///
    /// `None` means the record is not responsive and only the original is
    /// kept. A returned slice must not be empty.
    fn sizes(&self) -> Option<&[Size]> {
        Some(DEFAULT_SIZES)
    }

    /// Geometry the original is normalized to on save.
    ///
    /// `configured` is the process-wide setting; override to change it for
    /// this record only.
    fn image_max_size<'a>(&'a self, configured: Option<&'a str>) -> Option<&'a str> {
        configured
    }

    fn is_responsive(&self) -> bool {
        self.sizes().is_some()
    }

    fn primary_size(&self) -> Option<&Size> {
        self.sizes().and_then(|sizes| sizes.first())
    }
}

/// Per-record override of the max-size normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MaxSize {
    /// Use the configured setting.
    #[default]
    Inherit,
    /// Never touch the original.
    Disabled,
    /// Normalize to this geometry.
    Geometry(String),
}

/// Owned [`Artwork`] implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtworkRecord {
    folder: String,
    sub_folder: String,
    image: Option<String>,
    sizes: Option<Vec<Size>>,
    max_size: MaxSize,
}

impl ArtworkRecord {
    /// Record in `folder`/`sub_folder` with the default sizes and no image.
    pub fn new(folder: impl Into<String>, sub_folder: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            sub_folder: sub_folder.into(),
            image: None,
            sizes: Some(DEFAULT_SIZES.to_vec()),
            max_size: MaxSize::Inherit,
        }
    }

    /// Attach a stored image by storage name.
    pub fn with_image(mut self, name: impl Into<String>) -> Self {
        self.image = Some(name.into());
        self
    }

    /// Set the derivative sizes; `None` makes the record non-responsive.
    ///
    /// # Errors
    ///
    /// An empty list is rejected.
    pub fn with_sizes(mut self, sizes: Option<Vec<Size>>) -> Result<Self> {
        if matches!(sizes, Some(ref s) if s.is_empty()) {
            return Err(Error::InvalidRecord(
                "sizes must not be empty; use None for a non-responsive record".into(),
            ));
        }
        self.sizes = sizes;
        Ok(self)
    }

    pub fn with_max_size(mut self, max_size: MaxSize) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn set_image(&mut self, name: impl Into<String>) {
        self.image = Some(name.into());
    }
}

impl Artwork for ArtworkRecord {
    fn folder(&self) -> &str {
        &self.folder
    }

    fn sub_folder(&self) -> String {
        self.sub_folder.clone()
    }

    fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    fn sizes(&self) -> Option<&[Size]> {
        self.sizes.as_deref()
    }

    fn image_max_size<'a>(&'a self, configured: Option<&'a str>) -> Option<&'a str> {
        match self.max_size {
            MaxSize::Inherit => configured,
            MaxSize::Disabled => None,
            MaxSize::Geometry(ref g) => Some(g.as_str()),
        }
    }
}
