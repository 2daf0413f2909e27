//! Scratch space for rewriting an image in place.

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Scratch directory next to a target image.
///
/// The converter writes into [`Workspace::output`] and [`Workspace::finalize`]
/// renames the result over the target. The scratch directory lives in the
/// target's parent so the final rename never crosses filesystems.
///
/// # Example
///
/// ```no_run
/// use artwork_magick::Workspace;
///
/// let workspace = Workspace::new("/srv/media/artwork/42/photo.jpg")?;
/// // run the converter with workspace.output() as destination
/// workspace.finalize()?;
/// # Ok::<(), artwork_magick::Error>(())
/// ```
pub struct Workspace {
    /// Removed on drop, after `finalize` has moved the output out.
    _scratch: TempDir,
    target_path: PathBuf,
    output_path: PathBuf,
}

impl Workspace {
    /// Create a workspace for replacing `target`.
    pub fn new<P: AsRef<Path>>(target: P) -> Result<Self> {
        let target = target.as_ref();
        let file_name = target
            .file_name()
            .ok_or_else(|| Error::InvalidInput(format!("not a file path: {}", target.display())))?;
        let parent = target
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let scratch = tempfile::Builder::new()
            .prefix(".artwork-")
            .tempdir_in(parent)
            .map_err(|e| Error::Workspace(format!("failed to create scratch dir in {}: {e}", parent.display())))?;
        let output_path = scratch.path().join(file_name);

        Ok(Self {
            _scratch: scratch,
            target_path: target.to_path_buf(),
            output_path,
        })
    }

    /// Where the converter should write.
    pub fn output(&self) -> &Path {
        &self.output_path
    }

    /// Move the output over the target.
    ///
    /// The original is kept as a `.bak` sibling until the rename succeeds and
    /// restored if it fails.
    pub fn finalize(self) -> Result<PathBuf> {
        let dest = &self.target_path;

        if !self.output_path.exists() {
            return Err(Error::Workspace(format!(
                "output file does not exist: {}",
                self.output_path.display()
            )));
        }

        if dest.exists() {
            let backup = dest.with_extension("bak");
            std::fs::rename(dest, &backup)
                .map_err(|e| Error::Workspace(format!("failed to back up original: {e}")))?;

            if let Err(e) = std::fs::rename(&self.output_path, dest) {
                let _ = std::fs::rename(&backup, dest);
                return Err(Error::Workspace(format!(
                    "failed to move output into place: {e}"
                )));
            }

            let _ = std::fs::remove_file(&backup);
        } else {
            std::fs::rename(&self.output_path, dest)
                .map_err(|e| Error::Workspace(format!("failed to move output into place: {e}")))?;
        }

        Ok(dest.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_paths() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("photo.jpg");
        let workspace = Workspace::new(&target).unwrap();

        let scratch = workspace.output().parent().unwrap();
        assert_ne!(scratch, dir.path());
        assert_eq!(scratch.parent().unwrap(), dir.path());
        assert_eq!(workspace.output().file_name().unwrap(), "photo.jpg");
    }

    #[test]
    fn test_finalize_replaces_target() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("photo.jpg");
        std::fs::write(&target, b"original").unwrap();

        let workspace = Workspace::new(&target).unwrap();
        std::fs::write(workspace.output(), b"converted").unwrap();
        let scratch = workspace.output().parent().unwrap().to_path_buf();
        workspace.finalize().unwrap();

        assert_eq!(std::fs::read(&target).unwrap(), b"converted");
        assert!(!dir.path().join("photo.bak").exists());
        assert!(!scratch.exists());
    }

    #[test]
    fn test_finalize_without_output_keeps_original() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("photo.jpg");
        std::fs::write(&target, b"original").unwrap();

        let workspace = Workspace::new(&target).unwrap();
        assert!(workspace.finalize().is_err());
        assert_eq!(std::fs::read(&target).unwrap(), b"original");
    }
}
