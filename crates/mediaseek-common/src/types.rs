//! Container format definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Container family of a media file.
///
/// The segment indexer never sniffs content; callers pick the parser from
/// context (file extension, catalog metadata, or an explicit flag).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerFormat {
    /// Fragmented ISO base media file (MP4, M4V, CMAF).
    Mp4,
    /// Matroska or WebM (EBML).
    Matroska,
}

impl ContainerFormat {
    /// MIME type used when serving files of this format.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Mp4 => "video/mp4",
            Self::Matroska => "video/x-matroska",
        }
    }
}

impl fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mp4 => write!(f, "mp4"),
            Self::Matroska => write!(f, "matroska"),
        }
    }
}

impl FromStr for ContainerFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mp4" | "isobmff" | "fmp4" => Ok(Self::Mp4),
            "matroska" | "mkv" | "webm" => Ok(Self::Matroska),
            other => Err(Error::invalid_input(format!(
                "unknown container format: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_format_display() {
        assert_eq!(ContainerFormat::Mp4.to_string(), "mp4");
        assert_eq!(ContainerFormat::Matroska.to_string(), "matroska");
    }

    #[test]
    fn test_container_format_from_str() {
        assert_eq!("MP4".parse::<ContainerFormat>().unwrap(), ContainerFormat::Mp4);
        assert_eq!("webm".parse::<ContainerFormat>().unwrap(), ContainerFormat::Matroska);
        assert!("avi".parse::<ContainerFormat>().is_err());
    }

    #[test]
    fn test_container_format_serde() {
        let json = serde_json::to_string(&ContainerFormat::Matroska).unwrap();
        assert_eq!(json, "\"matroska\"");
        let parsed: ContainerFormat = serde_json::from_str("\"mp4\"").unwrap();
        assert_eq!(parsed, ContainerFormat::Mp4);
    }
}
