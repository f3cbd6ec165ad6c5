//! HTTP range arithmetic.

use mediaseek_common::ContainerFormat;
use mediaseek_media::MediaSegment;

/// Inclusive byte range `[start, end]` of a file of `file_size` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
    pub file_size: u64,
}

impl ByteRange {
    /// Range for a `Range` header value; `None` when unsatisfiable or malformed.
    pub fn from_header(header: &str, file_size: u64) -> Option<Self> {
        let (start, end) = parse_range_header(header, file_size)?;
        Some(Self {
            start,
            end,
            file_size,
        })
    }

    /// Range covering one segment. Empty segments have no range.
    pub fn for_segment(segment: &MediaSegment, file_size: u64) -> Option<Self> {
        if segment.size == 0 {
            return None;
        }
        Some(Self {
            start: segment.offset,
            end: segment.end() - 1,
            file_size,
        })
    }

    /// `Content-Length` of the range.
    pub fn content_length(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` header value.
    pub fn content_range(&self) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, self.file_size)
    }

    /// `Range` request header value that selects exactly this range.
    pub fn range_header(&self) -> String {
        format!("bytes={}-{}", self.start, self.end)
    }
}

/// Parse HTTP Range header.
///
/// Supports formats:
/// - bytes=0-499
/// - bytes=500-
/// - bytes=-500 (last 500 bytes)
pub fn parse_range_header(header: &str, file_size: u64) -> Option<(u64, u64)> {
    let ranges = header.trim().strip_prefix("bytes=")?;
    if file_size == 0 {
        return None;
    }

    let (start, end) = ranges.split_once('-')?;
    let (start, end) = (start.trim(), end.trim());

    match (start.is_empty(), end.is_empty()) {
        // bytes=-500
        (true, false) => {
            let suffix_len: u64 = end.parse().ok()?;
            if suffix_len == 0 {
                return None;
            }
            Some((file_size.saturating_sub(suffix_len), file_size - 1))
        }
        // bytes=500-
        (false, true) => {
            let start: u64 = start.parse().ok()?;
            if start >= file_size {
                return None;
            }
            Some((start, file_size - 1))
        }
        // bytes=0-499
        (false, false) => {
            let start: u64 = start.parse().ok()?;
            let end: u64 = end.parse().ok()?;
            if start >= file_size {
                return None;
            }
            let end = end.min(file_size - 1);
            if start > end {
                return None;
            }
            Some((start, end))
        }
        (true, true) => None,
    }
}

/// MIME type for a container, refined by the file extension where it matters.
pub fn determine_content_type(format: ContainerFormat, extension: Option<&str>) -> &'static str {
    match (format, extension.map(str::to_ascii_lowercase).as_deref()) {
        (ContainerFormat::Matroska, Some("webm")) => "video/webm",
        (ContainerFormat::Matroska, Some("mka")) => "audio/x-matroska",
        (ContainerFormat::Mp4, Some("m4a" | "cmfa")) => "audio/mp4",
        (ContainerFormat::Mp4, Some("mov")) => "video/quicktime",
        (format, _) => format.content_type(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range_header_full_range() {
        assert_eq!(parse_range_header("bytes=0-499", 1000), Some((0, 499)));
    }

    #[test]
    fn test_parse_range_header_open_end() {
        assert_eq!(parse_range_header("bytes=500-", 1000), Some((500, 999)));
    }

    #[test]
    fn test_parse_range_header_suffix() {
        assert_eq!(parse_range_header("bytes=-200", 1000), Some((800, 999)));
        assert_eq!(parse_range_header("bytes=-5000", 1000), Some((0, 999)));
    }

    #[test]
    fn test_parse_range_header_clamped() {
        assert_eq!(parse_range_header("bytes=0-2000", 1000), Some((0, 999)));
    }

    #[test]
    fn test_parse_range_header_invalid_start() {
        assert_eq!(parse_range_header("bytes=1500-", 1000), None);
        assert_eq!(parse_range_header("bytes=600-500", 1000), None);
    }

    #[test]
    fn test_parse_range_header_invalid_format() {
        assert_eq!(parse_range_header("bytes=-", 1000), None);
        assert_eq!(parse_range_header("bytes=abc-def", 1000), None);
        assert_eq!(parse_range_header("items=0-1", 1000), None);
        assert_eq!(parse_range_header("bytes=0-1-2", 1000), None);
        assert_eq!(parse_range_header("bytes=-0", 1000), None);
    }

    #[test]
    fn test_parse_range_header_empty_file() {
        assert_eq!(parse_range_header("bytes=0-", 0), None);
        assert_eq!(parse_range_header("bytes=-10", 0), None);
    }

    #[test]
    fn test_segment_range_and_headers() {
        let segment = MediaSegment {
            offset: 3000,
            size: 2000,
            timestamp_secs: 2.0,
        };
        let range = ByteRange::for_segment(&segment, 5000).unwrap();
        assert_eq!(range.content_length(), 2000);
        assert_eq!(range.content_range(), "bytes 3000-4999/5000");
        assert_eq!(range.range_header(), "bytes=3000-4999");
        assert_eq!(ByteRange::from_header(&range.range_header(), 5000), Some(range));
    }

    #[test]
    fn test_determine_content_type() {
        assert_eq!(determine_content_type(ContainerFormat::Mp4, Some("mp4")), "video/mp4");
        assert_eq!(determine_content_type(ContainerFormat::Mp4, Some("M4A")), "audio/mp4");
        assert_eq!(
            determine_content_type(ContainerFormat::Matroska, Some("mkv")),
            "video/x-matroska"
        );
        assert_eq!(determine_content_type(ContainerFormat::Matroska, Some("webm")), "video/webm");
        assert_eq!(determine_content_type(ContainerFormat::Mp4, None), "video/mp4");
    }
}
