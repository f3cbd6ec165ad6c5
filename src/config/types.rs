use mediaseek_common::paths::{MATROSKA_EXTENSIONS, MP4_EXTENSIONS};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub streaming: StreamingConfig,

    #[serde(default)]
    pub formats: FormatsConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// `tracing` filter directive used when `RUST_LOG` is unset and
    /// `--verbose` is not given, e.g. `"mediaseek=info"`
    #[serde(default)]
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StreamingConfig {
    /// Bytes read per chunk when copying a segment
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

fn default_chunk_size() -> usize {
    64 * 1024
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
        }
    }
}

/// File extensions used to infer the container when `--format` is absent.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FormatsConfig {
    #[serde(default = "default_mp4_extensions")]
    pub mp4_extensions: Vec<String>,

    #[serde(default = "default_matroska_extensions")]
    pub matroska_extensions: Vec<String>,
}

fn default_mp4_extensions() -> Vec<String> {
    MP4_EXTENSIONS.iter().map(|s| s.to_string()).collect()
}

fn default_matroska_extensions() -> Vec<String> {
    MATROSKA_EXTENSIONS.iter().map(|s| s.to_string()).collect()
}

impl Default for FormatsConfig {
    fn default() -> Self {
        Self {
            mp4_extensions: default_mp4_extensions(),
            matroska_extensions: default_matroska_extensions(),
        }
    }
}
