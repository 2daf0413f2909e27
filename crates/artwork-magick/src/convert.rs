//! Derivative generation through ImageMagick.

use crate::geometry::{Method, QualityPolicy, Size};
use crate::{Error, Result, Workspace};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Runs ImageMagick with a fixed colorspace/filter/strip pipeline.
///
/// Every run reads only the first frame of the source, resizes in the Lab
/// colorspace with a Lanczos filter, strips profiles (EXIF may carry GPS data)
/// and re-encodes with the [`QualityPolicy`] for the output width.
///
/// # Example
///
/// ```no_run
/// use artwork_magick::{Converter, Method, Size};
/// use std::path::Path;
///
/// let converter = Converter::discover(None)?;
/// converter.convert(
///     Path::new("/srv/media/artwork/42/photo.jpg"),
///     Path::new("/srv/media/artwork/42/photo-1200w.jpg"),
///     &Size::Square(1200),
///     Method::Thumbnail,
/// )?;
/// # Ok::<(), artwork_magick::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Converter {
    program: PathBuf,
    subcommand: Option<String>,
    policy: QualityPolicy,
}

impl Converter {
    /// Converter running `program` with the default quality policy.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            subcommand: None,
            policy: QualityPolicy::default(),
        }
    }

    /// Locate ImageMagick (see [`crate::tools::find_convert`]).
    pub fn discover(config_path: Option<&Path>) -> Result<Self> {
        crate::tools::find_convert(config_path).map(Self::new)
    }

    /// Argument placed before the source, e.g. `convert` for `magick convert`.
    pub fn with_subcommand(mut self, subcommand: impl Into<String>) -> Self {
        self.subcommand = Some(subcommand.into());
        self
    }

    /// Replace the quality policy.
    pub fn with_policy(mut self, policy: QualityPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn policy(&self) -> &QualityPolicy {
        &self.policy
    }

    /// Arguments (after the program) for one conversion of an output
    /// `width` pixels wide.
    pub fn command_args(
        &self,
        source: &Path,
        dest: &Path,
        size: &Size,
        method: Method,
        width: u32,
    ) -> Vec<String> {
        let mut args = Vec::with_capacity(16);
        if let Some(ref sub) = self.subcommand {
            args.push(sub.clone());
        }
        // First frame only, so animated sources convert deterministically.
        args.push(format!("{}[0]", source.display()));
        args.extend(
            [
                "-colorspace",
                "Lab",
                "-filter",
                "Lanczos",
                method.flag(),
            ]
            .map(String::from),
        );
        args.push(size.geometry());
        args.extend(["-colorspace", "sRGB", "-strip"].map(String::from));
        args.extend(self.policy.encoder_args(width));
        args.push(dest.display().to_string());
        args
    }

    /// Convert `source` into `dest` at `size`.
    ///
    /// When `dest` is `source` the result is written to a scratch file and
    /// swapped in afterwards, so a failed run leaves the original untouched.
    ///
    /// # Errors
    ///
    /// [`Error::ToolFailed`] on a non-zero exit (also logged with the tool's
    /// stderr), [`Error::ToolNotFound`] if the program cannot be spawned, and
    /// [`Error::FileNotFound`] / [`Error::Image`] if the source is missing or
    /// its width is needed but unreadable.
    pub fn convert(&self, source: &Path, dest: &Path, size: &Size, method: Method) -> Result<()> {
        if !source.exists() {
            return Err(Error::file_not_found(source));
        }
        let width = size.width_for(source)?;

        if source == dest {
            let workspace = Workspace::new(dest)?;
            self.run(&self.command_args(source, workspace.output(), size, method, width))?;
            workspace.finalize()?;
        } else {
            self.run(&self.command_args(source, dest, size, method, width))?;
        }

        tracing::info!("Saved image {}", dest.display());
        Ok(())
    }

    /// [`Converter::convert`] reduced to success or failure.
    ///
    /// Failures are logged, never returned.
    pub fn try_convert(&self, source: &Path, dest: &Path, size: &Size, method: Method) -> bool {
        match self.convert(source, dest, size, method) {
            Ok(()) => true,
            Err(Error::ToolFailed { .. }) => false,
            Err(e) => {
                tracing::error!("Converting {} to {} failed: {}", source.display(), dest.display(), e);
                false
            }
        }
    }

    fn tool_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    fn run(&self, args: &[String]) -> Result<()> {
        let tool = self.tool_name();
        tracing::debug!("Running {} {}", tool, args.join(" "));

        let output = Command::new(&self.program).args(args).output().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::tool_not_found(&tool)
            } else {
                Error::Io(e)
            }
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            tracing::error!(
                "ImageMagick {} returned exit code {:?}:\n{}",
                tool,
                output.status.code(),
                stderr.trim()
            );
            return Err(Error::tool_failed(tool, output.status.code(), stderr));
        }

        Ok(())
    }
}
