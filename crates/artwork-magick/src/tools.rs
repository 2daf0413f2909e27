//! External tool detection.

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Executable names tried, in order, when no path is configured.
const CONVERT_CANDIDATES: &[&str] = &["convert", "magick"];

/// Information about an external tool.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    /// Name of the tool.
    pub name: String,
    /// Whether the tool is available.
    pub available: bool,
    /// Version string if available.
    pub version: Option<String>,
    /// Path to the tool executable.
    pub path: Option<PathBuf>,
}

/// Check if a tool is available and get its information.
///
/// ImageMagick tools print their banner for `-version`.
///
/// # Example
///
/// ```no_run
/// use artwork_magick::check_tool;
///
/// let info = check_tool("convert");
/// if info.available {
///     println!("convert version: {:?}", info.version);
/// }
/// ```
pub fn check_tool(name: &str) -> ToolInfo {
    let Ok(path) = which::which(name) else {
        return ToolInfo {
            name: name.to_string(),
            available: false,
            version: None,
            path: None,
        };
    };

    let version = Command::new(&path)
        .arg("-version")
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| {
            String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .map(|s| s.trim().to_string())
        });

    ToolInfo {
        name: name.to_string(),
        available: true,
        version,
        path: Some(path),
    }
}

/// Check all ImageMagick entry points this crate may use.
pub fn check_tools() -> Vec<ToolInfo> {
    vec![check_tool("convert"), check_tool("magick"), check_tool("identify")]
}

/// Locate the ImageMagick converter, preferring a configured path over `PATH`.
///
/// A configured path that does not exist falls back to `PATH` lookup of
/// `convert`, then `magick`.
pub fn find_convert(config_path: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = config_path {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        tracing::warn!(
            "Configured converter {} does not exist; searching PATH",
            path.display()
        );
    }

    CONVERT_CANDIDATES
        .iter()
        .find_map(|name| which::which(name).ok())
        .ok_or_else(|| Error::tool_not_found(CONVERT_CANDIDATES.join(" or ")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_tool_not_found() {
        let info = check_tool("nonexistent_tool_12345");
        assert!(!info.available);
        assert!(info.version.is_none());
        assert!(info.path.is_none());
    }

    #[test]
    fn test_missing_configured_path_falls_back() {
        match find_convert(Some(Path::new("/nonexistent/convert"))) {
            Ok(found) => assert_ne!(found, Path::new("/nonexistent/convert")),
            Err(err) => assert!(matches!(err, Error::ToolNotFound { .. })),
        }
    }

    #[test]
    fn test_check_tools_names() {
        let names: Vec<String> = check_tools().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["convert", "magick", "identify"]);
    }

    #[test]
    fn test_configured_path_wins() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let found = find_convert(Some(file.path())).unwrap();
        assert_eq!(found, file.path());
    }
}
