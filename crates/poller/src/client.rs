use series_core::{coerce, Payload, Result, SeriesError};
use series_store::RingBufferStore;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, trace};

/// HTTP client for JSON poll endpoints.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    /// Build a client whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SeriesError::Fetch(format!("build client: {e}")))?;
        Ok(Self { client })
    }

    /// `GET url` and decode the body as a JSON object.
    ///
    /// Transport failures and non-2xx answers are [`SeriesError::Fetch`]; a
    /// body that isn't a JSON object is [`SeriesError::Decode`].
    pub async fn fetch(&self, url: &str) -> Result<Payload> {
        trace!(url, "polling");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| SeriesError::Fetch(format!("GET {url}: {e}")))?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| SeriesError::Decode(format!("{url}: {e}")))?;

        match body {
            Value::Object(map) => Ok(map),
            other => Err(SeriesError::Decode(format!(
                "{url}: expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }
}

/// Fetch `url` once and append the field named `key` to the store.
///
/// Returns `Ok(true)` if a sample was appended, `Ok(false)` if the response
/// has no such field or `key` isn't registered.  Fetch errors are handed back
/// untouched; retrying is up to the caller.
pub async fn refresh(
    source: &HttpSource,
    store: &mut RingBufferStore,
    key: &str,
    url: &str,
) -> Result<bool> {
    let payload = source.fetch(url).await?;
    let Some(value) = payload.get(key) else {
        debug!(key, url, "response has no field for series");
        return Ok(false);
    };
    Ok(store.append(key, coerce(value)))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null      => "null",
        Value::Bool(_)   => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_)  => "an array",
        Value::Object(_) => "an object",
    }
}
