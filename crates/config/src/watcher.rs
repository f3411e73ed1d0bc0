use series_core::Message;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Editors often write a file in several steps; changes closer together than
/// this collapse into one reload.
const DEBOUNCE: Duration = Duration::from_millis(250);

/// Watches the config file and posts [`Message::ConfigReloaded`] on change.
///
/// The parent directory is watched rather than the file itself, so the
/// watcher survives atomic replace-on-save and a file created after startup.
///
/// # Example
/// ```no_run
/// # async fn demo() {
/// use series_config::ConfigWatcher;
/// use series_core::Message;
///
/// let (tx, mut rx) = tokio::sync::mpsc::channel(8);
/// let _watcher = ConfigWatcher::spawn("/home/user/.config/series/series.toml", tx);
/// while let Some(Message::ConfigReloaded) = rx.recv().await {
///     println!("config changed");
/// }
/// # }
/// ```
pub struct ConfigWatcher {
    path: PathBuf,
}

impl ConfigWatcher {
    /// Spawn a filesystem watcher for `path` that reports into `tx`.
    ///
    /// The background task ends once `tx`'s receiver is dropped.
    pub fn spawn(path: impl AsRef<Path>, tx: mpsc::Sender<Message>) -> Self {
        let path = path.as_ref().to_path_buf();
        tokio::spawn(watch_loop(path.clone(), tx));
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

async fn watch_loop(path: PathBuf, tx: mpsc::Sender<Message>) {
    use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

    let Some(file_name) = path.file_name().map(|n| n.to_os_string()) else {
        error!("Config path '{}' has no file name; not watching", path.display());
        return;
    };
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let (sync_tx, mut sync_rx) = mpsc::channel::<notify::Result<Event>>(16);

    let mut watcher = match RecommendedWatcher::new(
        move |res| {
            let _ = sync_tx.blocking_send(res);
        },
        Config::default().with_poll_interval(Duration::from_secs(2)),
    ) {
        Ok(w) => w,
        Err(e) => {
            error!("Failed to create filesystem watcher: {e}");
            return;
        }
    };

    if let Err(e) = watcher.watch(&dir, RecursiveMode::NonRecursive) {
        error!("Failed to watch '{}': {e}", dir.display());
        return;
    }

    info!("Watching config file: {}", path.display());

    while let Some(event) = sync_rx.recv().await {
        let event = match event {
            Ok(e) => e,
            Err(e) => {
                warn!("Watcher error: {e}");
                continue;
            }
        };

        let touches_config = event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(file_name.as_os_str()));
        if !touches_config || !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
            continue;
        }

        // Swallow the rest of the burst before reporting.
        tokio::time::sleep(DEBOUNCE).await;
        while sync_rx.try_recv().is_ok() {}

        debug!("Config file changed");
        if tx.send(Message::ConfigReloaded).await.is_err() {
            break; // receiver dropped
        }
    }
}
