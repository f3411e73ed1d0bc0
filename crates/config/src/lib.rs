pub mod schema;
pub mod watcher;

pub use schema::{ReportConfig, SeriesConfig, SeriesOptions, SourceConfig, StoreConfig};
pub use watcher::ConfigWatcher;

use series_core::{Result, SeriesError};
use std::path::{Path, PathBuf};

/// Load configuration from a TOML file.  Returns `SeriesConfig::default()` if
/// the file doesn't exist so the service always starts.
pub fn load(path: impl AsRef<Path>) -> Result<SeriesConfig> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::warn!(
            "Config file not found at '{}'; using defaults.",
            path.display()
        );
        return Ok(SeriesConfig::default());
    }

    let raw = std::fs::read_to_string(path)
        .map_err(|e| SeriesError::Config(format!("cannot read '{}': {e}", path.display())))?;

    toml::from_str(&raw).map_err(|e| SeriesError::Config(format!("TOML parse error: {e}")))
}

/// Return the default config path, honouring `$XDG_CONFIG_HOME`.
pub fn default_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("series").join("series.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load(dir.path().join("absent.toml")).unwrap();
        assert!(cfg.sources.is_empty());
    }

    #[test]
    fn reads_sources_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[[sources]]\nname = \"wind\"\nurl = \"http://127.0.0.1:9/wind\"\nkeys = [\"wind\"]"
        )
        .unwrap();

        let cfg = load(file.path()).unwrap();
        assert_eq!(cfg.sources.len(), 1);
        assert_eq!(cfg.sources[0].keys, vec!["wind".to_string()]);
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[store\ncapacity = ").unwrap();
        assert!(matches!(load(file.path()), Err(SeriesError::Config(_))));
    }
}
