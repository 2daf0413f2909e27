//! Target sizes, geometry strings and the JPEG quality policy.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// A derivative target size.
///
/// Deserializes from an integer (`1200`), a two-element array (`[800, 600]`)
/// or a string. Strings of the form `"W"` and `"WxH"` become [`Size::Square`]
/// and [`Size::Rect`]; anything else is kept verbatim as a geometry string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "SizeRepr", into = "SizeRepr")]
pub enum Size {
    /// Square bounding box, `W` x `W`.
    Square(u32),
    /// Bounding box of width x height.
    Rect(u32, u32),
    /// Pre-formatted ImageMagick geometry, e.g. `2048x2048>`.
    Geometry(String),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum SizeRepr {
    Int(u32),
    Pair(u32, u32),
    Text(String),
}

impl TryFrom<SizeRepr> for Size {
    type Error = Error;

    fn try_from(repr: SizeRepr) -> Result<Self> {
        match repr {
            SizeRepr::Int(w) => Size::square(w),
            SizeRepr::Pair(w, h) => Size::rect(w, h),
            SizeRepr::Text(s) => s.parse(),
        }
    }
}

impl From<Size> for SizeRepr {
    fn from(size: Size) -> Self {
        match size {
            Size::Square(w) => SizeRepr::Int(w),
            Size::Rect(w, h) => SizeRepr::Pair(w, h),
            Size::Geometry(g) => SizeRepr::Text(g),
        }
    }
}

impl Size {
    /// Square size; zero is rejected.
    pub fn square(width: u32) -> Result<Self> {
        if width == 0 {
            return Err(Error::InvalidInput("size width must be positive".into()));
        }
        Ok(Size::Square(width))
    }

    /// Width x height size; zero dimensions are rejected.
    pub fn rect(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidInput(format!(
                "size {width}x{height} must have positive dimensions"
            )));
        }
        Ok(Size::Rect(width, height))
    }

    /// The geometry argument handed to ImageMagick.
    pub fn geometry(&self) -> String {
        match self {
            Size::Square(w) => format!("{w}x{w}"),
            Size::Rect(w, h) => format!("{w}x{h}"),
            Size::Geometry(g) => g.clone(),
        }
    }

    /// Width known without looking at the source image.
    pub fn fixed_width(&self) -> Option<u32> {
        match self {
            Size::Square(w) | Size::Rect(w, _) => Some(*w),
            Size::Geometry(_) => None,
        }
    }

    /// Width of this size, falling back to the source image's pixel width
    /// for geometry strings.
    pub fn width_for(&self, source: &Path) -> Result<u32> {
        match self.fixed_width() {
            Some(w) => Ok(w),
            None => source_width(source),
        }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Size::Square(w) => write!(f, "{w}"),
            Size::Rect(w, h) => write!(f, "{w}x{h}"),
            Size::Geometry(g) => f.write_str(g),
        }
    }
}

impl FromStr for Size {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::InvalidInput("empty size".into()));
        }
        if let Ok(w) = s.parse::<u32>() {
            return Size::square(w);
        }
        if let Some((w, h)) = s.split_once('x') {
            if let (Ok(w), Ok(h)) = (w.parse::<u32>(), h.parse::<u32>()) {
                return Size::rect(w, h);
            }
        }
        Ok(Size::Geometry(s.to_string()))
    }
}

/// Pixel width of the image at `path`, read from its header.
///
/// The format is detected from the file content. Uploads are stored under a
/// `.jpg` name before normalization, so the extension may lie.
pub fn source_width(path: &Path) -> Result<u32> {
    if !path.exists() {
        return Err(Error::file_not_found(path));
    }
    let image_error = |source| Error::Image {
        path: path.to_path_buf(),
        source,
    };
    image::ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| image_error(image::ImageError::IoError(e)))?
        .into_dimensions()
        .map(|(w, _)| w)
        .map_err(image_error)
}

/// Resize operator passed to ImageMagick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    /// Plain scaling (`-resize`).
    #[default]
    Resize,
    /// Aspect-preserving fit that also drops profiles (`-thumbnail`).
    Thumbnail,
}

impl Method {
    /// The ImageMagick option for this method.
    pub fn flag(&self) -> &'static str {
        match self {
            Method::Resize => "-resize",
            Method::Thumbnail => "-thumbnail",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.flag()[1..])
    }
}

/// JPEG quality and sharpening, chosen by output width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityPolicy {
    /// Outputs at or below this width count as thumbnails.
    pub thumb_size: u32,
    /// Quality for outputs wider than `thumb_size`.
    pub jpeg_quality: u8,
    /// Quality for thumbnails.
    pub thumb_quality: u8,
}

impl Default for QualityPolicy {
    fn default() -> Self {
        Self {
            thumb_size: 200,
            jpeg_quality: 85,
            thumb_quality: 80,
        }
    }
}

impl QualityPolicy {
    /// Whether an output of `width` pixels is a thumbnail.
    pub fn is_thumbnail(&self, width: u32) -> bool {
        width <= self.thumb_size
    }

    /// Trailing encoder options for an output of `width` pixels.
    pub fn encoder_args(&self, width: u32) -> Vec<String> {
        if self.is_thumbnail(width) {
            vec![
                "-unsharp".to_string(),
                "0x.5".to_string(),
                "-quality".to_string(),
                self.thumb_quality.to_string(),
            ]
        } else {
            vec!["-quality".to_string(), self.jpeg_quality.to_string()]
        }
    }
}
