use std::collections::VecDeque;
use std::num::NonZeroUsize;

/// Upper bound on the slots reserved when a buffer is created.  Larger
/// windows grow on demand as samples arrive.
const MAX_PREALLOC: usize = 1024;

/// Rolling window of samples for one series, oldest first.
///
/// The bound is owned by the store and passed in on every push, so a
/// capacity change applies to all buffers at once.
#[derive(Debug, Clone, Default)]
pub struct RingBuffer {
    samples: VecDeque<f64>,
}

impl RingBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity.get().min(MAX_PREALLOC)),
        }
    }

    /// Push a new sample, evicting from the front until it fits in `capacity`.
    ///
    /// Returns how many samples were evicted.  Once the buffer is full this is
    /// always exactly one; it is larger only after the capacity was lowered.
    pub fn push(&mut self, value: f64, capacity: NonZeroUsize) -> usize {
        let mut evicted = 0;
        while self.samples.len() >= capacity.get() {
            self.samples.pop_front();
            evicted += 1;
        }
        self.samples.push_back(value);
        evicted
    }

    /// Samples in insertion order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }

    pub fn last(&self) -> Option<f64> {
        self.samples.back().copied()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Average of all samples in the window, `None` when empty.
    pub fn average(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.samples.iter().sum::<f64>() / self.samples.len() as f64)
    }

    /// Aggregate view of the current window, for gauge and label consumers.
    pub fn summary(&self) -> Option<SeriesSummary> {
        let last = self.last()?;
        let (min, max) = self
            .samples
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
                None => Some((v, v)),
            })
            .unwrap_or((f64::NAN, f64::NAN));

        Some(SeriesSummary {
            len: self.samples.len(),
            min,
            max,
            mean: self.average().unwrap_or(f64::NAN),
            last,
        })
    }
}

/// Aggregates over the current window of one series.
///
/// `min`/`max` skip `NaN` samples and are `NaN` only when every sample is;
/// `mean` is `NaN` if any sample is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesSummary {
    pub len:  usize,
    pub min:  f64,
    pub max:  f64,
    pub mean: f64,
    pub last: f64,
}
