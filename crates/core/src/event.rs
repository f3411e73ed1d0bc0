use crate::{error::SeriesError, sample::Payload};
use chrono::{DateTime, Local};

/// All messages that can flow through the runtime event bus.
///
/// Sources:
/// - Poller tasks          → `Polled`, `PollFailed`
/// - Config watcher task   → `ConfigReloaded`
/// - Report timer          → `Tick`
/// - Signal handler        → `Shutdown`
#[derive(Debug)]
pub enum Message {
    // ── Pollers ───────────────────────────────────────────────────────────────
    /// A source answered with a JSON object.
    Polled {
        /// Name of the configured source that produced the payload.
        source: String,
        payload: Payload,
        /// Local time the response was received.
        at: DateTime<Local>,
    },
    /// A fetch failed (transport error, bad status, or undecodable body).
    /// Not retried; the next tick polls again.
    PollFailed { source: String, error: SeriesError },

    // ── Config ────────────────────────────────────────────────────────────────
    /// Config file changed on disk; triggers a live reload.
    ConfigReloaded,

    // ── Internal ──────────────────────────────────────────────────────────────
    /// Report timer tick. Consumers read the store and log a summary.
    Tick,
    /// Graceful shutdown requested.
    Shutdown,
}
