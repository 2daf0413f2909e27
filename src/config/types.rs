use artwork_magick::{QualityPolicy, Size};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub artwork: ArtworkConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub tools: ToolsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArtworkConfig {
    /// Maximum length of the filename stem, in characters
    #[serde(default = "default_filename_max_length")]
    pub filename_max_length: usize,

    /// Geometry the original upload is shrunk to; `false` leaves originals untouched
    #[serde(default = "default_image_max_size", with = "disableable")]
    pub image_max_size: Option<String>,

    /// Derivatives at or below this width are thumbnails
    #[serde(default = "default_thumb_size")]
    pub thumb_size: u32,

    /// JPEG quality for derivatives wider than `thumb_size`
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// JPEG quality for thumbnails
    #[serde(default = "default_thumb_quality")]
    pub thumb_quality: u8,

    /// Folder used for records created from the command line
    #[serde(default = "default_folder")]
    pub folder: String,

    /// Sizes used for records created from the command line; `false` disables derivatives
    #[serde(default = "default_sizes", with = "disableable")]
    pub sizes: Option<Vec<Size>>,
}

impl Default for ArtworkConfig {
    fn default() -> Self {
        Self {
            filename_max_length: default_filename_max_length(),
            image_max_size: default_image_max_size(),
            thumb_size: default_thumb_size(),
            jpeg_quality: default_jpeg_quality(),
            thumb_quality: default_thumb_quality(),
            folder: default_folder(),
            sizes: default_sizes(),
        }
    }
}

impl ArtworkConfig {
    pub fn quality_policy(&self) -> QualityPolicy {
        QualityPolicy {
            thumb_size: self.thumb_size,
            jpeg_quality: self.jpeg_quality,
            thumb_quality: self.thumb_quality,
        }
    }
}

fn default_filename_max_length() -> usize {
    50
}

fn default_image_max_size() -> Option<String> {
    Some("2048x2048>".to_string())
}

fn default_thumb_size() -> u32 {
    QualityPolicy::default().thumb_size
}

fn default_jpeg_quality() -> u8 {
    QualityPolicy::default().jpeg_quality
}

fn default_thumb_quality() -> u8 {
    QualityPolicy::default().thumb_quality
}

fn default_folder() -> String {
    "artwork".to_string()
}

fn default_sizes() -> Option<Vec<Size>> {
    Some(vec![Size::Square(1200)])
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory holding stored images
    #[serde(default = "default_media_root")]
    pub media_root: PathBuf,

    /// Public URL prefix for `media_root`
    #[serde(default = "default_media_url")]
    pub media_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            media_root: default_media_root(),
            media_url: default_media_url(),
        }
    }
}

fn default_media_root() -> PathBuf {
    PathBuf::from("media")
}

fn default_media_url() -> String {
    "/media/".to_string()
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ToolsConfig {
    /// ImageMagick executable (`convert` or `magick`); searched in PATH when unset
    #[serde(default)]
    pub convert_path: Option<PathBuf>,

    /// Argument placed before the source image, e.g. `convert` for `magick convert`
    #[serde(default)]
    pub convert_subcommand: Option<String>,
}

/// `false` in the file means "disabled" (`None`); any other value is kept.
mod disableable {
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr<T> {
        Flag(bool),
        Value(T),
    }

    pub fn serialize<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        match value {
            Some(v) => v.serialize(serializer),
            None => serializer.serialize_bool(false),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        match Repr::<T>::deserialize(deserializer)? {
            Repr::Flag(false) => Ok(None),
            Repr::Flag(true) => Err(de::Error::custom(
                "`true` is not a value; remove the key to use the default",
            )),
            Repr::Value(v) => Ok(Some(v)),
        }
    }
}
