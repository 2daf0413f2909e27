//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`], which roots a [`FileSystemStorage`] in a temp
//! directory and replaces ImageMagick with a small `sh` script. The script
//! records every argument vector, copies the source to the destination, and
//! exits 1 for any destination containing [`FAILING_WIDTH`]`w`.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use artwork::config::ArtworkConfig;
use artwork::{ArtworkManager, Converter, FileSystemStorage, Storage};
use tempfile::TempDir;

/// Derivatives of this width make the fake converter fail.
pub const FAILING_WIDTH: u32 = 666;

pub const MEDIA_URL: &str = "https://cdn.example.com/media/";

/// Script body; `{log}` is replaced by the invocation log path.
const FAKE_CONVERT: &str = r#"log='{log}'
printf '%s\n' "$@" >> "$log"
echo -- >> "$log"
src="$1"; src="${src%\[0\]}"
for last; do :; done
case "$last" in *-666w.jpg) echo "convert: unable to open image '$last'" >&2; exit 1;; esac
cp "$src" "$last"
"#;

/// Temp media root plus an [`ArtworkManager`] driving the fake converter.
pub struct TestHarness {
    pub dir: TempDir,
    pub manager: ArtworkManager,
    pub script: PathBuf,
    log: PathBuf,
}

impl TestHarness {
    /// Harness with default artwork settings.
    pub fn new() -> Self {
        Self::with_settings(ArtworkConfig::default())
    }

    /// Harness with custom artwork settings.
    pub fn with_settings(settings: ArtworkConfig) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let log = dir.path().join("convert.log");
        let script = write_fake_convert(dir.path(), &log);

        let storage = FileSystemStorage::new(dir.path().join("media"), MEDIA_URL);
        let converter = Converter::new("sh").with_subcommand(script.display().to_string());
        let manager = ArtworkManager::new(storage, converter, &settings);

        Self {
            dir,
            manager,
            script,
            log,
        }
    }

    pub fn media_root(&self) -> PathBuf {
        self.dir.path().join("media")
    }

    /// Write a `width` x `height` JPEG at storage name `name`.
    pub fn store_original(&self, name: &str, width: u32, height: u32) -> PathBuf {
        let path = self.manager.storage().path(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        write_jpeg(&path, width, height);
        path
    }

    /// Argument vectors of every converter run so far, without the script.
    pub fn invocations(&self) -> Vec<Vec<String>> {
        let Ok(content) = std::fs::read_to_string(&self.log) else {
            return Vec::new();
        };
        let mut runs = Vec::new();
        let mut current = Vec::new();
        for line in content.lines() {
            if line == "--" {
                runs.push(std::mem::take(&mut current));
            } else {
                current.push(line.to_string());
            }
        }
        runs
    }
}

/// Write the fake converter into `dir`, logging to `log`.
pub fn write_fake_convert(dir: &Path, log: &Path) -> PathBuf {
    let script = dir.join("fake-convert.sh");
    std::fs::write(&script, FAKE_CONVERT.replace("{log}", &log.display().to_string()))
        .expect("failed to write fake converter");
    script
}

/// Write a solid-color JPEG of the given dimensions.
pub fn write_jpeg(path: &Path, width: u32, height: u32) {
    write_image(path, width, height, image::ImageFormat::Jpeg);
}

/// Write a solid-color image in `format`, whatever the extension of `path`.
pub fn write_image(path: &Path, width: u32, height: u32, format: image::ImageFormat) {
    image::RgbImage::from_pixel(width, height, image::Rgb([200, 80, 40]))
        .save_with_format(path, format)
        .expect("failed to write test image");
}
