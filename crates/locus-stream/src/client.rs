//! Transports that open a discovery stream.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use locus_core::AppConfig;
use reqwest::{Client, Url};

use crate::error::StreamError;
use crate::request::DiscoveryRequest;

/// Body of an opened stream, one item per network read.
pub type ByteStream = BoxStream<'static, Result<Bytes, StreamError>>;

/// Opens the byte stream for one discovery request.
pub trait StreamOpener {
    /// # Errors
    ///
    /// Returns a [`StreamError`] if the stream cannot be opened.
    fn open(
        &self,
        request: &DiscoveryRequest,
    ) -> impl Future<Output = Result<ByteStream, StreamError>> + Send;
}

/// `reqwest`-backed opener for the live discovery endpoint.
///
/// No overall request timeout is set; streams stay open for as long as the
/// backend keeps writing. Idle reads are bounded by the caller instead.
#[derive(Debug, Clone)]
pub struct DiscoveryClient {
    client: Client,
    endpoint: Url,
}

impl DiscoveryClient {
    /// # Errors
    ///
    /// Returns [`StreamError::InvalidEndpoint`] if `endpoint` is not an
    /// absolute URL, or [`StreamError::Http`] if the `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        endpoint: &str,
        user_agent: &str,
        connect_timeout: Duration,
    ) -> Result<Self, StreamError> {
        let endpoint = Url::parse(endpoint).map_err(|e| StreamError::InvalidEndpoint {
            endpoint: endpoint.to_owned(),
            reason: e.to_string(),
        })?;
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client, endpoint })
    }

    /// # Errors
    ///
    /// See [`DiscoveryClient::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, StreamError> {
        Self::new(
            &config.discovery_url,
            &config.user_agent,
            Duration::from_secs(config.connect_timeout_secs),
        )
    }

    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl StreamOpener for DiscoveryClient {
    fn open(
        &self,
        request: &DiscoveryRequest,
    ) -> impl Future<Output = Result<ByteStream, StreamError>> + Send {
        let url = self.endpoint.to_string();
        let pending = self
            .client
            .post(self.endpoint.clone())
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .json(request);

        async move {
            tracing::debug!(url = %url, "opening discovery stream");
            let response = pending.send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(StreamError::UnexpectedStatus {
                    status: status.as_u16(),
                    url,
                });
            }
            Ok(response
                .bytes_stream()
                .map(|chunk| chunk.map_err(StreamError::from))
                .boxed())
        }
    }
}

/// Replays a captured response body, split into fixed-size chunks.
///
/// Every call to [`StreamOpener::open`] yields the full body again.
#[derive(Debug)]
pub struct ReplayOpener {
    body: Bytes,
    chunk_size: usize,
    opens: AtomicUsize,
}

impl ReplayOpener {
    /// A `chunk_size` of zero is treated as one byte per chunk.
    #[must_use]
    pub fn new(body: impl Into<Bytes>, chunk_size: usize) -> Self {
        Self {
            body: body.into(),
            chunk_size: chunk_size.max(1),
            opens: AtomicUsize::new(0),
        }
    }

    /// Number of streams opened so far.
    #[must_use]
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    fn chunks(&self) -> Vec<Result<Bytes, StreamError>> {
        let mut chunks = Vec::new();
        let mut offset = 0;
        while offset < self.body.len() {
            let end = (offset + self.chunk_size).min(self.body.len());
            chunks.push(Ok(self.body.slice(offset..end)));
            offset = end;
        }
        chunks
    }
}

impl StreamOpener for ReplayOpener {
    fn open(
        &self,
        _request: &DiscoveryRequest,
    ) -> impl Future<Output = Result<ByteStream, StreamError>> + Send {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let stream = futures::stream::iter(self.chunks()).boxed();
        std::future::ready(Ok(stream))
    }
}

#[cfg(test)]
mod tests {
    use futures::TryStreamExt;
    use locus_core::Domain;

    use super::*;

    fn wire() -> DiscoveryRequest {
        DiscoveryRequest {
            profile_id: "p-1".into(),
            city_name: None,
            message: "q".into(),
            context_type: Domain::General,
        }
    }

    #[test]
    fn rejects_relative_endpoint() {
        let err = DiscoveryClient::new("/discover", "ua", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, StreamError::InvalidEndpoint { .. }));
    }

    #[tokio::test]
    async fn replay_splits_body_and_counts_opens() {
        let opener = ReplayOpener::new(&b"data: {}\nabc"[..], 5);

        let chunks: Vec<Bytes> = opener.open(&wire()).await.unwrap().try_collect().await.unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks.concat(), b"data: {}\nabc");

        let _ = opener.open(&wire()).await.unwrap();
        assert_eq!(opener.opens(), 2);
    }

    #[tokio::test]
    async fn replay_of_empty_body_ends_immediately() {
        let opener = ReplayOpener::new(Bytes::new(), 0);
        let chunks: Vec<Bytes> = opener.open(&wire()).await.unwrap().try_collect().await.unwrap();
        assert!(chunks.is_empty());
    }
}
