pub mod error;
pub mod event;
pub mod sample;

pub use error::{Result, SeriesError};
pub use event::Message;
pub use sample::{coerce, Payload};

use std::num::NonZeroUsize;

/// Samples kept per series when no capacity is configured.
pub const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(60) {
    Some(n) => n,
    None => unreachable!(),
};
