//! Keyed collection of bounded sample histories.
//!
//! One [`RingBufferStore`] is created per session and handed by reference to
//! whatever feeds or reads it.  Lookups on unknown keys never fail; they
//! return empty results so a consumer always has something to draw.

pub mod buffer;

pub use buffer::{RingBuffer, SeriesSummary};

pub use series_core::DEFAULT_CAPACITY;

use series_core::{coerce, Payload};
use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use tracing::{debug, trace};

/// Mapping from series key to its ring buffer, with one store-wide capacity.
#[derive(Debug, Clone)]
pub struct RingBufferStore {
    capacity: NonZeroUsize,
    series:   BTreeMap<String, RingBuffer>,
}

impl Default for RingBufferStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl RingBufferStore {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            capacity,
            series: BTreeMap::new(),
        }
    }

    /// Create an empty buffer for every key not yet present.
    ///
    /// Re-registering a key leaves its samples untouched.  Returns the number
    /// of buffers created.
    pub fn register_keys<I, K>(&mut self, keys: I) -> usize
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let mut created = 0;
        for key in keys {
            let key = key.into();
            if self.series.contains_key(&key) {
                continue;
            }
            debug!(key = %key, "registering series");
            self.series
                .insert(key, RingBuffer::with_capacity(self.capacity));
            created += 1;
        }
        created
    }

    /// Set the eviction threshold for all buffers.
    ///
    /// Existing samples are kept; a buffer longer than `capacity` is trimmed
    /// by its next [`append`](Self::append).
    pub fn set_capacity(&mut self, capacity: NonZeroUsize) {
        if capacity != self.capacity {
            debug!(from = self.capacity.get(), to = capacity.get(), "store capacity changed");
        }
        self.capacity = capacity;
    }

    pub fn capacity(&self) -> NonZeroUsize {
        self.capacity
    }

    /// Append `value` to the series `key`.
    ///
    /// Returns `false` and leaves the store untouched if `key` was never
    /// registered.
    pub fn append(&mut self, key: &str, value: f64) -> bool {
        let Some(buffer) = self.series.get_mut(key) else {
            trace!(key, "append to unregistered series ignored");
            return false;
        };
        let evicted = buffer.push(value, self.capacity);
        trace!(key, value, evicted, "sample appended");
        true
    }

    /// Append every top-level payload field whose name is a registered key.
    ///
    /// Unmatched fields are ignored.  Returns the number of samples appended.
    pub fn ingest(&mut self, payload: &Payload) -> usize {
        payload
            .iter()
            .filter(|(key, value)| self.append(key, coerce(value)))
            .count()
    }

    /// Current contents of `key` as `(position, value * scale)` pairs.
    ///
    /// Positions start at 1 and follow insertion order.  `start` and `end`
    /// are reserved for windowed reads and currently ignored: the whole
    /// buffer is always returned.
    pub fn get_range(
        &self,
        key: &str,
        start: Option<usize>,
        end: Option<usize>,
        scale: f64,
    ) -> Vec<(usize, f64)> {
        if start.is_some() || end.is_some() {
            trace!(key, ?start, ?end, "range bounds are not applied");
        }
        self.series
            .get(key)
            .map(|buffer| {
                buffer
                    .iter()
                    .enumerate()
                    .map(|(i, v)| (i + 1, v * scale))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Most recently appended sample of `key`.
    pub fn get_last(&self, key: &str) -> Option<f64> {
        self.series.get(key).and_then(RingBuffer::last)
    }

    pub fn summary(&self, key: &str) -> Option<SeriesSummary> {
        self.series.get(key).and_then(RingBuffer::summary)
    }

    /// Number of samples held for `key` (0 when unknown).
    pub fn len(&self, key: &str) -> usize {
        self.series.get(key).map_or(0, RingBuffer::len)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.series.contains_key(key)
    }

    /// Registered keys in lexical order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    /// `true` when no series has been registered.
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}
