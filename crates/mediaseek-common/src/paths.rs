//! Path utilities for inferring a container format by extension.
//!
//! Used by the CLI when no explicit `--format` is given. Matching is
//! case-insensitive and only looks at the final extension.

use std::path::Path;

use crate::{ContainerFormat, Error, Result};

/// Default extensions treated as ISO-BMFF.
pub const MP4_EXTENSIONS: &[&str] = &["mp4", "m4v", "m4a", "m4s", "cmfv", "cmfa", "mov"];

/// Default extensions treated as Matroska/WebM.
pub const MATROSKA_EXTENSIONS: &[&str] = &["mkv", "mka", "webm"];

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

fn contains_ignore_case<S: AsRef<str>>(list: &[S], ext: &str) -> bool {
    list.iter().any(|e| e.as_ref().eq_ignore_ascii_case(ext))
}

/// Check if a path has a supported media extension.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use mediaseek_common::paths::is_media_file;
///
/// assert!(is_media_file(Path::new("movie.mkv")));
/// assert!(is_media_file(Path::new("/path/to/video.MP4")));
/// assert!(!is_media_file(Path::new("subtitle.srt")));
/// ```
pub fn is_media_file(path: &Path) -> bool {
    detect_format(path).is_ok()
}

/// Infer the container format from the default extension lists.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use mediaseek_common::{ContainerFormat, paths::detect_format};
///
/// assert_eq!(detect_format(Path::new("a.m4v")).unwrap(), ContainerFormat::Mp4);
/// assert!(detect_format(Path::new("a.avi")).is_err());
/// ```
pub fn detect_format(path: &Path) -> Result<ContainerFormat> {
    detect_format_with(path, MP4_EXTENSIONS, MATROSKA_EXTENSIONS)
}

/// Infer the container format from caller-supplied extension lists.
pub fn detect_format_with<S: AsRef<str>>(
    path: &Path,
    mp4_extensions: &[S],
    matroska_extensions: &[S],
) -> Result<ContainerFormat> {
    let ext = extension(path).ok_or_else(|| {
        Error::invalid_input(format!("{} has no file extension", path.display()))
    })?;

    if contains_ignore_case(mp4_extensions, &ext) {
        Ok(ContainerFormat::Mp4)
    } else if contains_ignore_case(matroska_extensions, &ext) {
        Ok(ContainerFormat::Matroska)
    } else {
        Err(Error::invalid_input(format!(
            "cannot infer container format from extension .{ext}"
        )))
    }
}
