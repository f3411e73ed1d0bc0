use serde::{Deserialize, Serialize};
use series_core::DEFAULT_CAPACITY;
use std::collections::{BTreeSet, HashMap};
use std::num::NonZeroUsize;
use std::time::Duration;

/// Root configuration structure parsed from `series.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SeriesConfig {
    /// Ring buffer settings shared by every series.
    pub store: StoreConfig,
    /// Periodic console report.
    pub report: ReportConfig,
    /// HTTP endpoints to poll.
    pub sources: Vec<SourceConfig>,
    /// Per-series presentation options (key = series name).
    pub series: HashMap<String, SeriesOptions>,
}

impl SeriesConfig {
    /// Every series key named by any source, deduplicated and sorted.
    pub fn keys(&self) -> BTreeSet<&str> {
        self.sources
            .iter()
            .flat_map(|s| s.keys.iter().map(String::as_str))
            .collect()
    }

    /// Scale factor applied when reading `key`; `1.0` unless configured.
    pub fn scale(&self, key: &str) -> f64 {
        self.series.get(key).map_or(1.0, |o| o.scale)
    }

    /// Display label for `key`, falling back to the key itself.
    pub fn label<'a>(&'a self, key: &'a str) -> &'a str {
        self.series
            .get(key)
            .and_then(|o| o.label.as_deref())
            .unwrap_or(key)
    }
}

/// Ring buffer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Maximum samples kept per series.
    pub capacity: NonZeroUsize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

/// Periodic report settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Milliseconds between reports; `0` disables the report.
    pub interval_ms: u64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { interval_ms: 5_000 }
    }
}

/// One polled HTTP endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Name used in logs and poll messages.
    pub name: String,
    /// URL answering `GET` with a JSON object keyed by series name.
    pub url: String,
    /// Milliseconds between polls.
    #[serde(default = "default_poll_interval")]
    pub interval_ms: u64,
    /// Per-request timeout in milliseconds.
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
    /// Series keys this source feeds.
    #[serde(default)]
    pub keys: Vec<String>,
}

impl SourceConfig {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            interval_ms: default_poll_interval(),
            timeout_ms: default_timeout(),
            keys: Vec::new(),
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.max(1))
    }
}

fn default_poll_interval() -> u64 {
    1_500
}

fn default_timeout() -> u64 {
    1_000
}

/// Presentation options for a single series.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeriesOptions {
    /// Multiplier applied to every sample on read.
    pub scale: f64,
    /// Optional display label override.
    pub label: Option<String>,
}

impl Default for SeriesOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            label: None,
        }
    }
}
