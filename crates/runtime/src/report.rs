use series_config::SeriesConfig;
use series_store::{RingBufferStore, SeriesSummary};
use std::fmt;

/// What a chart or gauge would draw for one series: the scaled window,
/// the scaled latest value and raw aggregates.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesReport {
    pub key:     String,
    pub label:   String,
    pub scale:   f64,
    /// `(position, value * scale)`, oldest first.
    pub window:  Vec<(usize, f64)>,
    pub last:    f64,
    pub summary: SeriesSummary,
}

impl SeriesReport {
    /// `None` when `key` is unknown or has no samples yet.
    pub fn build(store: &RingBufferStore, config: &SeriesConfig, key: &str) -> Option<Self> {
        let summary = store.summary(key)?;
        let scale = config.scale(key);

        Some(Self {
            key: key.to_string(),
            label: config.label(key).to_string(),
            scale,
            window: store.get_range(key, None, None, scale),
            last: store.get_last(key)? * scale,
            summary,
        })
    }
}

impl fmt::Display for SeriesReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.summary;
        write!(
            f,
            "{:<16} last {:>10.3}  min {:>10.3}  max {:>10.3}  mean {:>10.3}  ({} samples)",
            self.label,
            self.last,
            s.min * self.scale,
            s.max * self.scale,
            s.mean * self.scale,
            s.len,
        )
    }
}
