pub mod client;

pub use client::{refresh, HttpSource};

use chrono::Local;
use series_config::SourceConfig;
use series_core::Message;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

/// Spawn a background Tokio task that polls `config.url` every
/// `config.interval_ms` milliseconds and forwards each outcome through `tx`.
///
/// Every tick issues its own request, so a slow response never delays the
/// next poll; a request that never answers is cut off by the client timeout.
/// The task stops when the receiver is dropped or the handle is aborted.
pub fn spawn_poller(
    source: HttpSource,
    config: SourceConfig,
    tx: mpsc::Sender<Message>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            source = %config.name,
            url = %config.url,
            interval_ms = config.interval_ms,
            "poller started"
        );

        let mut ticker = time::interval(config.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            if tx.is_closed() {
                break; // all receivers dropped
            }

            let source = source.clone();
            let name = config.name.clone();
            let url = config.url.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let _ = tx.send(poll_once(&source, name, &url).await).await;
            });
        }

        debug!(source = %config.name, "poller stopped");
    })
}

/// Fetch `url` once and wrap the outcome as a bus message.
pub async fn poll_once(source: &HttpSource, name: String, url: &str) -> Message {
    match source.fetch(url).await {
        Ok(payload) => Message::Polled {
            source: name,
            payload,
            at: Local::now(),
        },
        Err(error) => Message::PollFailed {
            source: name,
            error,
        },
    }
}
