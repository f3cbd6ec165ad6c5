mod types;

pub use types::*;

use anyhow::{Context, Result};
use mediaseek_common::paths::detect_format_with;
use mediaseek_common::ContainerFormat;
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./mediaseek.toml",
        "~/.config/mediaseek/config.toml",
        "/etc/mediaseek/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.streaming.chunk_size == 0 {
        anyhow::bail!("Streaming chunk size cannot be 0");
    }

    let formats = &config.formats;
    if formats.mp4_extensions.is_empty() {
        anyhow::bail!("No MP4 file extensions configured");
    }
    if formats.matroska_extensions.is_empty() {
        anyhow::bail!("No Matroska file extensions configured");
    }

    for ext in &formats.mp4_extensions {
        if formats
            .matroska_extensions
            .iter()
            .any(|other| other.eq_ignore_ascii_case(ext))
        {
            anyhow::bail!("Extension '{}' is configured for both MP4 and Matroska", ext);
        }
    }

    Ok(())
}

impl Config {
    /// Infer the container of `path` from the configured extensions.
    pub fn detect_format(&self, path: &Path) -> Result<ContainerFormat> {
        let formats = &self.formats;
        detect_format_with(path, &formats.mp4_extensions, &formats.matroska_extensions)
            .with_context(|| format!("Cannot infer container format of {:?}; pass --format", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.streaming.chunk_size, 65536);
        assert!(config.logging.filter.is_none());
        assert!(config.formats.mp4_extensions.iter().any(|e| e == "mp4"));
        assert!(config.formats.matroska_extensions.iter().any(|e| e == "webm"));
        validate_config(&config).unwrap();
    }

    #[test]
    fn test_load_partial_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[streaming]\nchunk_size = 4096").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.streaming.chunk_size, 4096);
        assert!(!config.formats.matroska_extensions.is_empty());
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let mut config = Config::default();
        config.streaming.chunk_size = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_overlapping_extensions_rejected() {
        let mut config = Config::default();
        config.formats.matroska_extensions.push("MP4".to_string());
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("both"));
    }

    #[test]
    fn test_detect_format_uses_configured_extensions() {
        let mut config = Config::default();
        config.formats.mp4_extensions = vec!["frag".to_string()];
        assert_eq!(
            config.detect_format(Path::new("clip.frag")).unwrap(),
            ContainerFormat::Mp4
        );
        assert!(config.detect_format(Path::new("clip.mp4")).is_err());
    }
}
