mod types;

pub use types::*;

use anyhow::{Context, Result};
use artwork_magick::Size;
use std::path::{Path, PathBuf};

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config = parse_config(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}

/// Parse and validate configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config> {
    let mut config: Config = toml::from_str(content)?;
    validate_config(&config)?;
    expand_paths(&mut config);
    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./config.toml",
        "./artwork.toml",
        "~/.config/artwork/config.toml",
        "/etc/artwork/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

fn expand_paths(config: &mut Config) {
    let root = config.storage.media_root.to_string_lossy().to_string();
    config.storage.media_root = PathBuf::from(shellexpand::tilde(&root).into_owned());

    if let Some(ref path) = config.tools.convert_path {
        let expanded = shellexpand::tilde(&path.to_string_lossy()).to_string();
        config.tools.convert_path = Some(PathBuf::from(expanded));
    }
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    let artwork = &config.artwork;

    if artwork.filename_max_length == 0 {
        anyhow::bail!("artwork.filename_max_length cannot be 0");
    }
    if artwork.thumb_size == 0 {
        anyhow::bail!("artwork.thumb_size cannot be 0");
    }
    if artwork.jpeg_quality > 100 {
        anyhow::bail!("artwork.jpeg_quality must be between 0 and 100");
    }
    if artwork.thumb_quality > 100 {
        anyhow::bail!("artwork.thumb_quality must be between 0 and 100");
    }
    if let Some(ref geometry) = artwork.image_max_size {
        if geometry.trim().is_empty() {
            anyhow::bail!("artwork.image_max_size cannot be empty; use false to disable");
        }
    }
    if let Some(ref sizes) = artwork.sizes {
        if sizes.is_empty() {
            anyhow::bail!("artwork.sizes cannot be empty; use false to disable derivatives");
        }
        if let Some(Size::Geometry(g)) = sizes.iter().find(|s| matches!(s, Size::Geometry(_))) {
            tracing::warn!(
                "artwork.sizes entry {:?} is a geometry string; its derivatives are named after the source width",
                g
            );
        }
    }
    if artwork.folder.trim().is_empty() {
        anyhow::bail!("artwork.folder cannot be empty");
    }

    if config.storage.media_url.is_empty() {
        anyhow::bail!("storage.media_url cannot be empty");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.artwork.filename_max_length, 50);
        assert_eq!(config.artwork.image_max_size.as_deref(), Some("2048x2048>"));
        assert_eq!(config.artwork.thumb_size, 200);
        assert_eq!(config.artwork.jpeg_quality, 85);
        assert_eq!(config.artwork.thumb_quality, 80);
        assert_eq!(config.artwork.sizes, Some(vec![Size::Square(1200)]));
        assert_eq!(config.storage.media_root, PathBuf::from("media"));
        assert_eq!(config.storage.media_url, "/media/");
        assert!(config.tools.convert_path.is_none());
    }

    #[test]
    fn full_file() {
        let config = parse_config(
            r#"
            [artwork]
            filename_max_length = 20
            image_max_size = "4096x4096>"
            thumb_size = 150
            jpeg_quality = 90
            thumb_quality = 75
            folder = "covers"
            sizes = [1200, [600, 400], 150]

            [storage]
            media_root = "/srv/media"
            media_url = "https://cdn.example.com/media/"

            [tools]
            convert_path = "/usr/local/bin/magick"
            convert_subcommand = "convert"
            "#,
        )
        .unwrap();

        assert_eq!(config.artwork.filename_max_length, 20);
        assert_eq!(config.artwork.image_max_size.as_deref(), Some("4096x4096>"));
        assert_eq!(config.artwork.quality_policy().thumb_size, 150);
        assert_eq!(config.artwork.folder, "covers");
        assert_eq!(
            config.artwork.sizes,
            Some(vec![Size::Square(1200), Size::Rect(600, 400), Size::Square(150)])
        );
        assert_eq!(config.storage.media_root, PathBuf::from("/srv/media"));
        assert_eq!(
            config.tools.convert_path,
            Some(PathBuf::from("/usr/local/bin/magick"))
        );
        assert_eq!(config.tools.convert_subcommand.as_deref(), Some("convert"));
    }

    #[test]
    fn false_disables() {
        let config = parse_config(
            r#"
            [artwork]
            image_max_size = false
            sizes = false
            "#,
        )
        .unwrap();
        assert!(config.artwork.image_max_size.is_none());
        assert!(config.artwork.sizes.is_none());
    }

    #[test]
    fn true_is_rejected() {
        assert!(parse_config("[artwork]\nimage_max_size = true\n").is_err());
    }

    #[test]
    fn invalid_values_rejected() {
        assert!(parse_config("[artwork]\njpeg_quality = 101\n").is_err());
        assert!(parse_config("[artwork]\nthumb_quality = 200\n").is_err());
        assert!(parse_config("[artwork]\nthumb_size = 0\n").is_err());
        assert!(parse_config("[artwork]\nfilename_max_length = 0\n").is_err());
        assert!(parse_config("[artwork]\nsizes = []\n").is_err());
        assert!(parse_config("[artwork]\nimage_max_size = \"\"\n").is_err());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artwork.toml");
        std::fs::write(&path, "[artwork]\nthumb_size = 300\n").unwrap();

        let config = load_config_or_default(Some(&path)).unwrap();
        assert_eq!(config.artwork.thumb_size, 300);

        assert!(load_config(&dir.path().join("missing.toml")).is_err());
    }
}
