//! Save and delete hooks for artwork records.
//!
//! Both hooks are best effort: every step runs even when an earlier one
//! failed, nothing is returned as `Err`, and the outcome of each step is
//! collected in a report the caller may inspect or ignore.

use std::path::{Path, PathBuf};

use artwork_magick::{Converter, Method, Size};

use crate::config::{ArtworkConfig, Config};
use crate::paths::{derivative_path, derivative_url, PathResolver};
use crate::record::Artwork;
use crate::storage::{FileSystemStorage, Storage, StorageError};
use crate::{Error, Result};

/// One conversion run by [`ArtworkManager::on_save`].
#[derive(Debug)]
pub struct ConversionStep {
    pub size: Size,
    /// Destination, when it could be computed.
    pub path: Option<PathBuf>,
    pub outcome: std::result::Result<(), artwork_magick::Error>,
}

impl ConversionStep {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Outcome of [`ArtworkManager::on_save`].
#[derive(Debug, Default)]
pub struct SaveReport {
    /// In-place max-size normalization of the original, if configured.
    pub normalized: Option<ConversionStep>,
    /// One entry per configured size, in order.
    pub derivatives: Vec<ConversionStep>,
}

impl SaveReport {
    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ConversionStep> {
        self.normalized
            .iter()
            .chain(self.derivatives.iter())
            .filter(|step| !step.is_ok())
    }

    /// Derivatives that were written.
    pub fn written(&self) -> impl Iterator<Item = &Path> {
        self.derivatives
            .iter()
            .filter(|step| step.is_ok())
            .filter_map(|step| step.path.as_deref())
    }
}

/// Outcome of [`ArtworkManager::on_delete`].
#[derive(Debug, Default)]
pub struct DeleteReport {
    pub deleted: Vec<PathBuf>,
    /// Files that were already gone.
    pub missing: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, StorageError)>,
    /// Sizes whose derivative path could not be computed.
    pub unresolved: Vec<(Size, artwork_magick::Error)>,
    pub removed_dirs: Vec<PathBuf>,
}

impl DeleteReport {
    /// True unless a file could not be removed. Missing files are expected.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.unresolved.is_empty()
    }
}

/// Runs the artwork lifecycle against a storage backend.
pub struct ArtworkManager<S = FileSystemStorage> {
    storage: S,
    converter: Converter,
    resolver: PathResolver,
    image_max_size: Option<String>,
}

impl ArtworkManager<FileSystemStorage> {
    /// Manager for the configured media root, locating ImageMagick on the way.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut converter = Converter::discover(config.tools.convert_path.as_deref())?;
        if let Some(ref sub) = config.tools.convert_subcommand {
            converter = converter.with_subcommand(sub.clone());
        }
        let storage = FileSystemStorage::new(&config.storage.media_root, &config.storage.media_url);
        Ok(Self::new(storage, converter, &config.artwork))
    }
}

impl<S: Storage> ArtworkManager<S> {
    /// The converter's quality policy is replaced by the one in `settings`.
    pub fn new(storage: S, converter: Converter, settings: &ArtworkConfig) -> Self {
        Self {
            storage,
            converter: converter.with_policy(settings.quality_policy()),
            resolver: PathResolver::new(settings.filename_max_length),
            image_max_size: settings.image_max_size.clone(),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn converter(&self) -> &Converter {
        &self.converter
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Copy `source` into storage at the record's upload location.
    ///
    /// Returns the storage name to attach to the record.
    pub fn upload<A: Artwork + ?Sized>(&self, record: &A, source: &Path) -> Result<String> {
        let filename = source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| Error::InvalidRecord(format!("not a file: {}", source.display())))?;
        let name = self
            .resolver
            .upload_location(record.folder(), &record.sub_folder(), &filename);
        let stored = self.storage.save(&name, source)?;
        tracing::info!("Stored upload {} as {}", source.display(), stored);
        Ok(stored)
    }

    fn original<'a, A: Artwork + ?Sized>(&self, record: &'a A) -> Result<(&'a str, PathBuf)> {
        let name = record.image().ok_or(Error::MissingImage)?;
        Ok((name, self.storage.path(name)))
    }

    /// Local path of the derivative at `size`.
    pub fn image_path<A: Artwork + ?Sized>(&self, record: &A, size: &Size) -> Result<PathBuf> {
        let (_, original) = self.original(record)?;
        let width = size.width_for(&original)?;
        Ok(derivative_path(&original, width))
    }

    /// URL of the derivative at `size`.
    pub fn image_url<A: Artwork + ?Sized>(&self, record: &A, size: &Size) -> Result<String> {
        let (name, original) = self.original(record)?;
        let width = size.width_for(&original)?;
        Ok(derivative_url(&self.storage.url(name), width))
    }

    /// URL for an `<img src>`: the primary derivative, or the original for
    /// records that are not responsive.
    pub fn primary_image_url<A: Artwork + ?Sized>(&self, record: &A) -> Result<String> {
        match record.primary_size() {
            Some(size) => self.image_url(record, size),
            None => {
                let (name, _) = self.original(record)?;
                Ok(self.storage.url(name))
            }
        }
    }

    /// Every derivative URL with its width, in size order.
    pub fn image_urls_with_widths<A: Artwork + ?Sized>(&self, record: &A) -> Result<Vec<(String, u32)>> {
        let (name, original) = self.original(record)?;
        let url = self.storage.url(name);
        record
            .sizes()
            .unwrap_or_default()
            .iter()
            .map(|size| -> Result<(String, u32)> {
                let width = size.width_for(&original)?;
                Ok((derivative_url(&url, width), width))
            })
            .collect()
    }

    /// `srcset` attribute value, `"<url> <w>w, ..."`.
    pub fn srcset<A: Artwork + ?Sized>(&self, record: &A) -> Result<String> {
        Ok(self
            .image_urls_with_widths(record)?
            .iter()
            .map(|(url, width)| format!("{url} {width}w"))
            .collect::<Vec<_>>()
            .join(", "))
    }

    fn convert_step(&self, source: &Path, dest: PathBuf, size: &Size, method: Method) -> ConversionStep {
        let outcome = self.converter.convert(source, &dest, size, method);
        if let Err(ref e) = outcome {
            // Tool failures are logged by the converter with their stderr.
            if !matches!(e, artwork_magick::Error::ToolFailed { .. }) {
                tracing::error!("Artwork conversion at size {} failed: {}", size, e);
            }
        }
        ConversionStep {
            size: size.clone(),
            path: Some(dest),
            outcome,
        }
    }

    /// Normalize the original and regenerate every derivative.
    pub fn on_save<A: Artwork + ?Sized>(&self, record: &A) -> SaveReport {
        let mut report = SaveReport::default();
        let Ok((name, original)) = self.original(record) else {
            tracing::debug!("Record {}/{} has no image; nothing to convert", record.folder(), record.sub_folder());
            return report;
        };
        tracing::debug!("Saving artwork {}", name);

        if let Some(geometry) = record.image_max_size(self.image_max_size.as_deref()) {
            let size = Size::Geometry(geometry.to_string());
            report.normalized =
                Some(self.convert_step(&original, original.clone(), &size, Method::Resize));
        }

        for size in record.sizes().unwrap_or_default() {
            let step = match size.width_for(&original) {
                Ok(width) => self.convert_step(
                    &original,
                    derivative_path(&original, width),
                    size,
                    Method::Thumbnail,
                ),
                Err(e) => {
                    tracing::error!("Cannot place derivative {} of {}: {}", size, name, e);
                    ConversionStep {
                        size: size.clone(),
                        path: None,
                        outcome: Err(e),
                    }
                }
            };
            report.derivatives.push(step);
        }

        if !report.is_success() {
            tracing::warn!(
                "Artwork {} saved with {} failed conversion(s)",
                name,
                report.failures().count()
            );
        }
        report
    }

    /// Remove the original, every derivative and the emptied folders.
    pub fn on_delete<A: Artwork + ?Sized>(&self, record: &A) -> DeleteReport {
        let mut report = DeleteReport::default();
        let Ok((name, original)) = self.original(record) else {
            tracing::debug!("Record {}/{} has no image; nothing to delete", record.folder(), record.sub_folder());
            return report;
        };

        // Geometry-string sizes are named after the original's width, so
        // resolve every derivative before the original goes away.
        let mut derivatives = Vec::new();
        for size in record.sizes().unwrap_or_default() {
            match size.width_for(&original) {
                Ok(width) => derivatives.push(derivative_path(&original, width)),
                Err(e) => {
                    tracing::warn!("Cannot locate derivative {} of {}: {}", size, name, e);
                    report.unresolved.push((size.clone(), e));
                }
            }
        }

        for path in std::iter::once(original.clone()).chain(derivatives) {
            self.delete_file(path, &mut report);
        }

        // `name` is `<folder>/<sub_folder>/<file>`; never climb above that.
        let depth = name.split('/').filter(|p| !p.is_empty()).count().saturating_sub(1);
        let mut dir = original.parent();
        for _ in 0..depth.min(2) {
            let Some(current) = dir else { break };
            if std::fs::remove_dir(current).is_err() {
                break;
            }
            tracing::info!("Deleted folder {}", current.display());
            report.removed_dirs.push(current.to_path_buf());
            dir = current.parent();
        }

        report
    }

    fn delete_file(&self, path: PathBuf, report: &mut DeleteReport) {
        match self.storage.delete(&path) {
            Ok(()) => {
                tracing::info!("Deleted file {}", path.display());
                report.deleted.push(path);
            }
            Err(e) if e.is_not_found() => {
                tracing::warn!("Attempt to delete file {} failed: file not found", path.display());
                report.missing.push(path);
            }
            Err(e) => {
                tracing::error!("Attempt to delete file {} failed: {}", path.display(), e);
                report.failed.push((path, e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ArtworkRecord;
    use assert_matches::assert_matches;

    fn manager(root: &Path) -> ArtworkManager {
        let storage = FileSystemStorage::new(root, "https://cdn.example.com/media/");
        ArtworkManager::new(storage, Converter::new("nonexistent_tool_12345"), &ArtworkConfig::default())
    }

    fn record() -> ArtworkRecord {
        ArtworkRecord::new("artwork", "42")
            .with_image("artwork/42/x.jpg")
            .with_sizes(Some(vec![Size::Square(1200), Size::Rect(600, 400), Size::Square(150)]))
            .unwrap()
    }

    #[test]
    fn derivative_locations() {
        let root = tempfile::tempdir().unwrap();
        let manager = manager(root.path());
        let record = record();

        assert_eq!(
            manager.image_path(&record, &Size::Square(1200)).unwrap(),
            root.path().join("artwork/42/x-1200w.jpg")
        );
        assert_eq!(
            manager.primary_image_url(&record).unwrap(),
            "https://cdn.example.com/media/artwork/42/x-1200w.jpg"
        );
        assert_eq!(
            manager.srcset(&record).unwrap(),
            "https://cdn.example.com/media/artwork/42/x-1200w.jpg 1200w, \
             https://cdn.example.com/media/artwork/42/x-600w.jpg 600w, \
             https://cdn.example.com/media/artwork/42/x-150w.jpg 150w"
        );
    }

    #[test]
    fn non_responsive_uses_original() {
        let root = tempfile::tempdir().unwrap();
        let manager = manager(root.path());
        let record = record().with_sizes(None).unwrap();

        assert_eq!(
            manager.primary_image_url(&record).unwrap(),
            "https://cdn.example.com/media/artwork/42/x.jpg"
        );
        assert!(manager.image_urls_with_widths(&record).unwrap().is_empty());
        assert_eq!(manager.srcset(&record).unwrap(), "");
    }

    #[test]
    fn missing_image() {
        let root = tempfile::tempdir().unwrap();
        let manager = manager(root.path());
        let record = ArtworkRecord::new("artwork", "1");

        assert_matches!(manager.primary_image_url(&record), Err(Error::MissingImage));
        assert!(manager.on_save(&record).is_success());
        assert!(manager.on_delete(&record).deleted.is_empty());
    }

    #[test]
    fn quality_policy_comes_from_settings() {
        let root = tempfile::tempdir().unwrap();
        let settings = ArtworkConfig {
            thumb_size: 320,
            ..ArtworkConfig::default()
        };
        let manager = ArtworkManager::new(
            FileSystemStorage::new(root.path(), "/media/"),
            Converter::new("convert"),
            &settings,
        );
        assert_eq!(manager.converter().policy().thumb_size, 320);
        assert_eq!(manager.resolver().filename_max_length(), 50);
    }

    #[test]
    fn missing_tool_does_not_abort_save() {
        let root = tempfile::tempdir().unwrap();
        let manager = manager(root.path());
        let record = record();
        let original = manager.storage().path("artwork/42/x.jpg");
        std::fs::create_dir_all(original.parent().unwrap()).unwrap();
        image::RgbImage::new(40, 30).save(&original).unwrap();

        let report = manager.on_save(&record);
        assert!(!report.is_success());
        assert!(report.normalized.is_some());
        assert_eq!(report.derivatives.len(), 3);
        assert_eq!(report.failures().count(), 4);
        assert_eq!(report.written().count(), 0);
        assert!(original.exists());
    }

    #[test]
    fn delete_stays_inside_record_folders() {
        let root = tempfile::tempdir().unwrap();
        let media = root.path().join("media");
        let manager = manager(&media);
        let record = ArtworkRecord::new("artwork", "1")
            .with_image("loose.jpg")
            .with_sizes(None)
            .unwrap();
        std::fs::create_dir_all(&media).unwrap();
        std::fs::write(media.join("loose.jpg"), b"x").unwrap();

        let report = manager.on_delete(&record);
        assert_eq!(report.deleted, vec![media.join("loose.jpg")]);
        assert!(report.removed_dirs.is_empty());
        assert!(media.exists());
    }
}
