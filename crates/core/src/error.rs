use thiserror::Error;

/// Top-level error type shared by every crate in the workspace.
///
/// Store operations never produce one of these; they degrade to empty
/// results instead.  Errors only come from configuration and polling.
#[derive(Debug, Error)]
pub enum SeriesError {
    #[error("config error: {0}")]
    Config(String),

    #[error("fetch error: {0}")]
    Fetch(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

pub type Result<T, E = SeriesError> = std::result::Result<T, E>;
