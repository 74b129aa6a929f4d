use std::time::Duration;

use thiserror::Error;

/// Transport-level failures while opening or reading a discovery stream.
///
/// Any of these ends the current search; none of them is fatal to the
/// owning [`crate::Discovery`].
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid discovery endpoint \"{endpoint}\": {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("stream read failed: {0}")]
    Read(String),

    #[error("no data received for {0:?}")]
    Timeout(Duration),
}

/// A `data:` line whose payload is not a valid frame envelope.
#[derive(Debug, Error)]
pub enum FrameParseError {
    #[error("frame JSON error: {source} (line: {excerpt})")]
    Json {
        excerpt: String,
        #[source]
        source: serde_json::Error,
    },
}
