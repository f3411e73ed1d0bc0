//! Event loop for `series`.
//!
//! Owns the [`RingBufferStore`] and wires together all background tasks:
//! - one HTTP poller per configured source
//! - config file watcher (live reload on change)
//! - report timer (logs the current window of every series)
//! - Ctrl-C handler

pub mod report;

pub use report::SeriesReport;

use chrono::{DateTime, Local};
use series_config::{load as load_config, ConfigWatcher, SeriesConfig};
use series_core::{Message, Result};
use series_poller::{poll_once, spawn_poller, HttpSource};
use series_store::RingBufferStore;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Bus capacity; pollers block briefly when the loop falls this far behind.
const CHANNEL_CAPACITY: usize = 64;

// ── Entry points ──────────────────────────────────────────────────────────────

/// Run until Ctrl-C.  Fails only if the initial config cannot be read.
pub async fn run(config_path: impl AsRef<Path>) -> Result<()> {
    let config_path = config_path.as_ref().to_path_buf();
    let config = load_config(&config_path)?;
    let mut runtime = Runtime::new(config_path.clone(), config);

    let (tx, mut rx) = mpsc::channel(CHANNEL_CAPACITY);

    runtime.spawn_tasks(&tx);
    let _watcher = ConfigWatcher::spawn(&config_path, tx.clone());
    spawn_shutdown_signal(tx.clone());

    info!(
        series = runtime.store().keys().count(),
        capacity = runtime.store().capacity().get(),
        "runtime started"
    );

    while let Some(msg) = rx.recv().await {
        match runtime.handle(msg) {
            Control::Continue => {}
            Control::Respawn => runtime.spawn_tasks(&tx),
            Control::Shutdown => break,
        }
    }

    runtime.abort_tasks();
    info!("runtime stopped");
    Ok(())
}

/// Poll every source once, concurrently, and return the resulting report.
pub async fn run_once(config_path: impl AsRef<Path>) -> Result<Vec<SeriesReport>> {
    let config_path = config_path.as_ref().to_path_buf();
    let config = load_config(&config_path)?;
    let mut runtime = Runtime::new(config_path, config);

    let polls = runtime.config.sources.iter().filter_map(|src| {
        match HttpSource::new(src.timeout()) {
            Ok(client) => Some(async move { poll_once(&client, src.name.clone(), &src.url).await }),
            Err(e) => {
                warn!(source = %src.name, "skipping source: {e}");
                None
            }
        }
    });
    let messages = futures::future::join_all(polls).await;

    for msg in messages {
        runtime.handle(msg);
    }
    Ok(runtime.report())
}

// ── State ─────────────────────────────────────────────────────────────────────

/// What the event loop should do after a message was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    /// Sources or report interval changed; restart the background tasks.
    Respawn,
    Shutdown,
}

/// Single owner of the store.  Every mutation goes through [`Runtime::handle`],
/// so readers between messages always see a consistent store.
pub struct Runtime {
    config_path: PathBuf,
    config:      SeriesConfig,
    store:       RingBufferStore,
    /// Time of the last successful poll per source.
    last_poll:   HashMap<String, DateTime<Local>>,
    tasks:       Vec<JoinHandle<()>>,
}

impl Runtime {
    pub fn new(config_path: PathBuf, config: SeriesConfig) -> Self {
        let mut store = RingBufferStore::new(config.store.capacity);
        store.register_keys(config.keys());

        Self {
            config_path,
            config,
            store,
            last_poll: HashMap::new(),
            tasks: Vec::new(),
        }
    }

    pub fn store(&self) -> &RingBufferStore {
        &self.store
    }

    pub fn config(&self) -> &SeriesConfig {
        &self.config
    }

    pub fn last_poll(&self, source: &str) -> Option<DateTime<Local>> {
        self.last_poll.get(source).copied()
    }

    // ── Update ────────────────────────────────────────────────────────────────

    pub fn handle(&mut self, msg: Message) -> Control {
        match msg {
            // A request issued before a reload can answer after it.
            Message::Polled { source, .. } | Message::PollFailed { source, .. }
                if !self.is_configured(&source) =>
            {
                debug!(source = %source, "dropping result from unconfigured source");
            }
            Message::Polled { source, payload, at } => {
                let appended = self.store.ingest(&payload);
                debug!(source = %source, fields = payload.len(), appended, "poll applied");
                self.last_poll.insert(source, at);
            }
            Message::PollFailed { source, error } => match self.last_poll.get(&source) {
                Some(at) => warn!(
                    source = %source,
                    last_success = %at.format("%H:%M:%S"),
                    "poll failed: {error}"
                ),
                None => warn!(source = %source, "poll failed: {error}"),
            },
            Message::ConfigReloaded => match load_config(&self.config_path) {
                Ok(cfg) => {
                    info!("Config reloaded");
                    if self.apply_config(cfg) {
                        return Control::Respawn;
                    }
                }
                Err(e) => warn!("Config reload failed: {e}"),
            },
            Message::Tick => {
                for line in self.report() {
                    info!("{line}");
                }
            }
            Message::Shutdown => return Control::Shutdown,
        }
        Control::Continue
    }

    /// Adopt a new configuration.  New keys get buffers and the capacity
    /// changes for all series; existing samples are kept.
    ///
    /// Returns `true` when the background tasks need restarting.
    pub fn apply_config(&mut self, config: SeriesConfig) -> bool {
        self.store.set_capacity(config.store.capacity);
        let created = self.store.register_keys(config.keys());
        if created > 0 {
            info!(created, "new series registered");
        }

        let respawn = config.sources != self.config.sources
            || config.report.interval_ms != self.config.report.interval_ms;
        self.config = config;
        respawn
    }

    fn is_configured(&self, source: &str) -> bool {
        self.config.sources.iter().any(|s| s.name == source)
    }

    /// Snapshot of every series that holds at least one sample.
    pub fn report(&self) -> Vec<SeriesReport> {
        self.store
            .keys()
            .filter_map(|key| SeriesReport::build(&self.store, &self.config, key))
            .collect()
    }

    // ── Background tasks ──────────────────────────────────────────────────────

    /// (Re)start pollers and the report timer for the current config.
    fn spawn_tasks(&mut self, tx: &mpsc::Sender<Message>) {
        self.abort_tasks();

        for src in &self.config.sources {
            match HttpSource::new(src.timeout()) {
                Ok(client) => self.tasks.push(spawn_poller(client, src.clone(), tx.clone())),
                Err(e) => error!(source = %src.name, "cannot start poller: {e}"),
            }
        }

        if self.config.report.interval_ms > 0 {
            let every = Duration::from_millis(self.config.report.interval_ms);
            self.tasks.push(spawn_ticker(every, tx.clone()));
        }
    }

    fn abort_tasks(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

/// Sends [`Message::Tick`] every `every`, skipping the immediate first tick.
fn spawn_ticker(every: Duration, tx: mpsc::Sender<Message>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + every, every);
        loop {
            ticker.tick().await;
            if tx.send(Message::Tick).await.is_err() {
                break; // receiver dropped
            }
        }
    })
}

fn spawn_shutdown_signal(tx: mpsc::Sender<Message>) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl-C received; shutting down");
                let _ = tx.send(Message::Shutdown).await;
            }
            Err(e) => error!("Cannot listen for Ctrl-C: {e}"),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use series_config::SourceConfig;
    use serde_json::json;
    use std::io::Write;
    use std::num::NonZeroUsize;

    fn config(capacity: usize, keys: &[&str]) -> SeriesConfig {
        let mut cfg = SeriesConfig::default();
        cfg.store.capacity = NonZeroUsize::new(capacity).unwrap();
        let mut src = SourceConfig::new("climate", "http://127.0.0.1:9/data");
        src.keys = keys.iter().map(|k| k.to_string()).collect();
        cfg.sources.push(src);
        cfg
    }

    fn polled(payload: serde_json::Value) -> Message {
        Message::Polled {
            source: "climate".into(),
            payload: payload.as_object().cloned().unwrap(),
            at: Local::now(),
        }
    }

    #[test]
    fn configured_keys_are_registered_up_front() {
        let rt = Runtime::new(PathBuf::from("unused.toml"), config(3, &["t", "rh"]));
        assert!(rt.store().contains("t"));
        assert!(rt.store().contains("rh"));
        assert_eq!(rt.store().capacity().get(), 3);
    }

    #[test]
    fn polled_payload_is_ingested() {
        let mut rt = Runtime::new(PathBuf::from("unused.toml"), config(3, &["wind"]));
        for v in 1..=4 {
            assert_eq!(rt.handle(polled(json!({ "wind": v, "other": 0 }))), Control::Continue);
        }
        assert_eq!(
            rt.store().get_range("wind", None, None, 1.0),
            vec![(1, 2.0), (2, 3.0), (3, 4.0)]
        );
        assert!(rt.last_poll("climate").is_some());
        assert!(!rt.store().contains("other"));
    }

    #[test]
    fn failed_poll_leaves_store_alone() {
        let mut rt = Runtime::new(PathBuf::from("unused.toml"), config(3, &["wind"]));
        rt.handle(polled(json!({ "wind": 7 })));
        let flow = rt.handle(Message::PollFailed {
            source: "climate".into(),
            error: series_core::SeriesError::Fetch("connection refused".into()),
        });
        assert_eq!(flow, Control::Continue);
        assert_eq!(rt.store().get_last("wind"), Some(7.0));
    }

    #[test]
    fn results_from_removed_sources_are_dropped() {
        let mut rt = Runtime::new(PathBuf::from("unused.toml"), config(3, &["wind"]));
        let mut next = config(3, &["wind"]);
        next.sources[0].name = "weather".into();
        assert!(rt.apply_config(next));

        // Still in flight from the old "climate" poller.
        assert_eq!(rt.handle(polled(json!({ "wind": 7 }))), Control::Continue);
        assert_eq!(rt.store().len("wind"), 0);
        assert!(rt.last_poll("climate").is_none());
    }

    #[test]
    fn malformed_reload_keeps_current_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let mut rt = Runtime::new(file.path().to_path_buf(), config(3, &["wind"]));
        rt.handle(polled(json!({ "wind": 1 })));

        writeln!(file, "[store\ncapacity = ").unwrap();

        assert_eq!(rt.handle(Message::ConfigReloaded), Control::Continue);
        assert_eq!(rt.store().capacity().get(), 3);
        assert_eq!(rt.config().store.capacity.get(), 3);
        assert_eq!(rt.config().sources.len(), 1);
        assert_eq!(rt.store().get_last("wind"), Some(1.0));
    }

    #[test]
    fn shutdown_stops_the_loop() {
        let mut rt = Runtime::new(PathBuf::from("unused.toml"), config(3, &[]));
        assert_eq!(rt.handle(Message::Shutdown), Control::Shutdown);
    }

    #[test]
    fn reload_with_missing_file_falls_back_to_defaults() {
        let mut rt = Runtime::new(PathBuf::from("/nonexistent/series.toml"), config(3, &["wind"]));
        // Defaults have no sources, so the pollers must be restarted.
        assert_eq!(rt.handle(Message::ConfigReloaded), Control::Respawn);
        assert!(rt.store().contains("wind"));
    }

    #[test]
    fn apply_config_adds_keys_and_changes_capacity() {
        let mut rt = Runtime::new(PathBuf::from("unused.toml"), config(5, &["wind"]));
        for v in 1..=5 {
            rt.handle(polled(json!({ "wind": v })));
        }

        // The source now feeds an extra key, so pollers restart too.
        assert!(rt.apply_config(config(2, &["wind", "rain"])));

        assert!(rt.store().contains("rain"));
        assert_eq!(rt.store().len("wind"), 5);
        rt.handle(polled(json!({ "wind": 6 })));
        assert_eq!(
            rt.store().get_range("wind", None, None, 1.0),
            vec![(1, 5.0), (2, 6.0)]
        );
    }

    #[test]
    fn changed_sources_request_respawn() {
        let mut rt = Runtime::new(PathBuf::from("unused.toml"), config(3, &["wind"]));
        assert!(!rt.apply_config(config(3, &["wind"])));

        let mut moved = config(3, &["wind"]);
        moved.sources[0].url = "http://127.0.0.1:9/other".into();
        assert!(rt.apply_config(moved));
    }

    #[test]
    fn report_covers_series_with_samples() {
        let mut cfg = config(3, &["t", "rh"]);
        cfg.series.insert(
            "t".into(),
            series_config::SeriesOptions { scale: 10.0, label: Some("Temp".into()) },
        );
        let mut rt = Runtime::new(PathBuf::from("unused.toml"), cfg);
        rt.handle(polled(json!({ "t": 2.5 })));

        let report = rt.report();
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].key, "t");
        assert_eq!(report[0].label, "Temp");
        assert_eq!(report[0].last, 25.0);
        assert_eq!(report[0].window, vec![(1, 25.0)]);
    }
}
