//! Storage names for uploaded originals and their derivatives.
//!
//! Derivative locations are never stored; they are recomputed from the
//! original's path or URL and the target width.

use std::path::{Path, PathBuf};

use unicode_normalization::UnicodeNormalization;

/// Replaces any path component whose slug comes out empty.
pub const PLACEHOLDER: &str = "untitled";

/// Maps uploads to their canonical storage name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathResolver {
    filename_max_length: usize,
}

impl Default for PathResolver {
    fn default() -> Self {
        Self::new(50)
    }
}

impl PathResolver {
    pub fn new(filename_max_length: usize) -> Self {
        Self {
            filename_max_length,
        }
    }

    pub fn filename_max_length(&self) -> usize {
        self.filename_max_length
    }

    /// `<slug(folder)>/<slug(sub_folder)>/<slug(stem)>.jpg`
    ///
    /// The stem is cut to `filename_max_length` characters before
    /// slugifying. The extension is always `.jpg` since every stored image
    /// is re-encoded as JPEG.
    ///
    /// ```
    /// use artwork::paths::PathResolver;
    ///
    /// let resolver = PathResolver::default();
    /// assert_eq!(
    ///     resolver.upload_location("Artwork", "42", "My Photo.JPG"),
    ///     "artwork/42/my-photo.jpg"
    /// );
    /// ```
    pub fn upload_location(&self, folder: &str, sub_folder: &str, filename: &str) -> String {
        let stem = Path::new(filename)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let truncated: String = stem.chars().take(self.filename_max_length).collect();

        format!(
            "{}/{}/{}.jpg",
            component(folder),
            component(sub_folder).to_lowercase(),
            component(&truncated)
        )
    }
}

fn component(text: &str) -> String {
    let slug = slugify(text);
    if slug.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        slug
    }
}

/// Lowercase ASCII slug: accents folded, punctuation dropped, runs of
/// whitespace and hyphens collapsed to a single `-`.
///
/// May return an empty string.
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in text.nfkd().filter(char::is_ascii) {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_alphanumeric() || c == '_' {
            if pending_dash {
                out.push('-');
                pending_dash = false;
            }
            out.push(c);
        } else if c == '-' || c.is_ascii_whitespace() {
            pending_dash = true;
        }
    }
    if pending_dash {
        out.push('-');
    }

    out.trim_matches(|c| c == '-' || c == '_').to_string()
}

fn derivative_name(stem: &str, width: u32) -> String {
    format!("{stem}-{width}w.jpg")
}

/// `<dir>/<stem>-<width>w.jpg` next to `original`.
pub fn derivative_path(original: &Path, width: u32) -> PathBuf {
    let stem = original
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let name = derivative_name(&stem, width);
    match original.parent() {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}

/// URL counterpart of [`derivative_path`].
///
/// Only the last path segment is rewritten, so scheme and host survive.
pub fn derivative_url(original: &str, width: u32) -> String {
    let (dir, file) = match original.rsplit_once('/') {
        Some((dir, file)) => (Some(dir), file),
        None => (None, original),
    };
    let stem = match file.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file,
    };
    let name = derivative_name(stem, width);
    match dir {
        Some(dir) => format!("{dir}/{name}"),
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_location_scenario() {
        let resolver = PathResolver::default();
        assert_eq!(
            resolver.upload_location("Artwork", "42", "My Photo.JPG"),
            "artwork/42/my-photo.jpg"
        );
    }

    #[test]
    fn extension_is_always_jpg() {
        let resolver = PathResolver::default();
        assert_eq!(
            resolver.upload_location("artwork", "7", "scan.tiff"),
            "artwork/7/scan.jpg"
        );
        assert_eq!(
            resolver.upload_location("artwork", "7", "archive.tar.gz"),
            "artwork/7/archivetar.jpg"
        );
    }

    #[test]
    fn sub_folder_is_slugged_and_lowercased() {
        let resolver = PathResolver::default();
        assert_eq!(
            resolver.upload_location("Album Covers", "Record ABC", "front.png"),
            "album-covers/record-abc/front.jpg"
        );
    }

    #[test]
    fn stem_truncated_before_slugify() {
        let resolver = PathResolver::new(5);
        assert_eq!(
            resolver.upload_location("artwork", "1", "Hello World.jpg"),
            "artwork/1/hello.jpg"
        );
        // The cut lands on a space; the trailing dash is trimmed.
        let resolver = PathResolver::new(6);
        assert_eq!(
            resolver.upload_location("artwork", "1", "Hello World.jpg"),
            "artwork/1/hello.jpg"
        );
    }

    #[test]
    fn truncation_counts_characters() {
        let resolver = PathResolver::new(3);
        assert_eq!(
            resolver.upload_location("artwork", "1", "éééé.jpg"),
            "artwork/1/eee.jpg"
        );
    }

    #[test]
    fn empty_slug_falls_back_to_placeholder() {
        let resolver = PathResolver::default();
        assert_eq!(
            resolver.upload_location("artwork", "1", "!!!.jpg"),
            "artwork/1/untitled.jpg"
        );
        assert_eq!(
            resolver.upload_location("", "", "日本.png"),
            "untitled/untitled/untitled.jpg"
        );
    }

    #[test]
    fn slugify_rules() {
        assert_eq!(slugify("My Photo"), "my-photo");
        assert_eq!(slugify("  Café  au   lait "), "cafe-au-lait");
        assert_eq!(slugify("a -- b"), "a-b");
        assert_eq!(slugify("snake_case"), "snake_case");
        assert_eq!(slugify("_-trim-_"), "trim");
        assert_eq!(slugify("x.y,z!"), "xyz");
        assert_eq!(slugify("???"), "");
    }

    #[test]
    fn derivative_path_suffix() {
        for w in [100, 200, 1200] {
            let path = derivative_path(Path::new("/media/artwork/42/x.jpg"), w);
            assert!(path.to_string_lossy().ends_with(&format!("-{w}w.jpg")));
        }
        assert_eq!(
            derivative_path(Path::new("/media/artwork/42/x.jpg"), 1200),
            PathBuf::from("/media/artwork/42/x-1200w.jpg")
        );
    }

    #[test]
    fn derivative_url_keeps_scheme() {
        assert_eq!(
            derivative_url("https://cdn.example.com/media/artwork/42/x.jpg", 600),
            "https://cdn.example.com/media/artwork/42/x-600w.jpg"
        );
        assert_eq!(
            derivative_url("/media/artwork/42/x.jpg", 1200),
            "/media/artwork/42/x-1200w.jpg"
        );
        assert_eq!(derivative_url("x.jpg", 10), "x-10w.jpg");
    }
}
