//! The search driver: cache lookup, stream read loop, cancellation.

use std::time::{Duration, Instant};

use bytes::Bytes;
use futures::StreamExt;
use locus_core::{AppConfig, Poi};

use crate::cache::CachePolicy;
use crate::client::{ByteStream, DiscoveryClient, StreamOpener};
use crate::context::DiscoveryContext;
use crate::dispatch::{Dispatcher, Effect, SearchState, SearchView};
use crate::error::StreamError;
use crate::frame::parse_frame;
use crate::request::SearchRequest;
use crate::session::{AbortHandle, SearchController, StreamSession};

/// Receives a search's effects as they happen.
///
/// A cancelled search stops calling the observer as soon as the abort is
/// seen; in particular neither `on_complete` nor `on_error` fires for it.
pub trait SearchObserver {
    fn on_progress(&mut self, _message: &str) {}
    fn on_results(&mut self, _results: &[Poi]) {}
    fn on_complete(&mut self, _view: &SearchView) {}
    fn on_error(&mut self, _message: &str) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SearchObserver for NoopObserver {}

/// How a search ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Completed(SearchView),
    LoadedFromCache(SearchView),
    Failed(SearchView),
    /// The stream closed before a `complete` or `error` frame.
    Incomplete(SearchView),
    Cancelled,
}

impl SearchOutcome {
    #[must_use]
    pub fn view(&self) -> Option<&SearchView> {
        match self {
            Self::Completed(view)
            | Self::LoadedFromCache(view)
            | Self::Failed(view)
            | Self::Incomplete(view) => Some(view),
            Self::Cancelled => None,
        }
    }
}

enum LineFlow {
    Continue,
    Done(SearchOutcome),
}

/// Runs searches against one [`StreamOpener`], owning the cache and trending
/// state for as long as it lives.
#[derive(Debug)]
pub struct Discovery<O> {
    opener: O,
    context: DiscoveryContext,
    controller: SearchController,
    read_timeout: Option<Duration>,
}

impl Discovery<DiscoveryClient> {
    /// # Errors
    ///
    /// Returns a [`StreamError`] if the HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, StreamError> {
        let client = DiscoveryClient::from_config(config)?;
        Ok(Self::new(
            client,
            CachePolicy {
                ttl: config.cache_ttl,
            },
            config.read_timeout,
        ))
    }
}

impl<O: StreamOpener> Discovery<O> {
    #[must_use]
    pub fn new(opener: O, policy: CachePolicy, read_timeout: Option<Duration>) -> Self {
        Self {
            opener,
            context: DiscoveryContext::new(policy),
            controller: SearchController::new(),
            read_timeout,
        }
    }

    #[must_use]
    pub fn opener(&self) -> &O {
        &self.opener
    }

    #[must_use]
    pub fn context(&self) -> &DiscoveryContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut DiscoveryContext {
        &mut self.context
    }

    /// Handle for cancelling the running search from another task.
    #[must_use]
    pub fn controller(&self) -> SearchController {
        self.controller.clone()
    }

    #[must_use]
    pub fn into_context(self) -> DiscoveryContext {
        self.context
    }

    /// Runs one search to its end, reporting effects to `observer`.
    ///
    /// Any search still registered with this instance's controller is
    /// aborted first.
    pub async fn search<S>(&mut self, request: SearchRequest, observer: &mut S) -> SearchOutcome
    where
        S: SearchObserver + ?Sized,
    {
        let abort = self.controller.begin();
        let outcome = self.run(request, abort.clone(), observer).await;
        self.controller.finish(&abort);
        outcome
    }

    async fn run<S>(
        &mut self,
        request: SearchRequest,
        abort: AbortHandle,
        observer: &mut S,
    ) -> SearchOutcome
    where
        S: SearchObserver + ?Sized,
    {
        let purged = self.context.cache.purge_expired(Instant::now());
        if purged > 0 {
            tracing::debug!(purged, "dropped expired cache entries");
        }

        if let Some(cached) = self.context.cache.get(&request.cache_key()) {
            let view = SearchView::from_cache(&request, cached.to_vec());
            tracing::info!(
                domain = %request.domain,
                count = view.results.len(),
                "serving discovery results from cache"
            );
            observer.on_results(&view.results);
            observer.on_complete(&view);
            return SearchOutcome::LoadedFromCache(view);
        }

        let wire = request.to_wire();
        let mut session = StreamSession::new(abort, Dispatcher::new(request));

        let opened = tokio::select! {
            biased;
            () = session.abort.cancelled() => return SearchOutcome::Cancelled,
            opened = self.opener.open(&wire) => opened,
        };
        let mut stream = match opened {
            Ok(stream) => stream,
            Err(err) => return fail(session, &err, observer),
        };

        loop {
            if session.abort.is_aborted() {
                return SearchOutcome::Cancelled;
            }
            let next = tokio::select! {
                biased;
                () = session.abort.cancelled() => return SearchOutcome::Cancelled,
                next = read_chunk(&mut stream, self.read_timeout) => next,
            };

            match next {
                Ok(Some(chunk)) => {
                    for line in session.lines.push(&chunk) {
                        if let LineFlow::Done(outcome) =
                            handle_line(&mut session, &line, &mut self.context, observer)
                        {
                            return outcome;
                        }
                    }
                }
                Ok(None) => {
                    if let Some(line) = session.lines.finish() {
                        if let LineFlow::Done(outcome) =
                            handle_line(&mut session, &line, &mut self.context, observer)
                        {
                            return outcome;
                        }
                    }
                    session.dispatcher.close_incomplete();
                    return SearchOutcome::Incomplete(session.dispatcher.into_view());
                }
                Err(err) => return fail(session, &err, observer),
            }
        }
    }
}

/// Next chunk of the body, `Ok(None)` once it has ended.
async fn read_chunk(
    stream: &mut ByteStream,
    timeout: Option<Duration>,
) -> Result<Option<Bytes>, StreamError> {
    let next = match timeout {
        Some(limit) => tokio::time::timeout(limit, stream.next())
            .await
            .map_err(|_| StreamError::Timeout(limit))?,
        None => stream.next().await,
    };
    next.transpose()
}

fn handle_line<S>(
    session: &mut StreamSession,
    line: &str,
    context: &mut DiscoveryContext,
    observer: &mut S,
) -> LineFlow
where
    S: SearchObserver + ?Sized,
{
    if session.abort.is_aborted() {
        return LineFlow::Done(SearchOutcome::Cancelled);
    }

    let frame = match parse_frame(line) {
        Ok(Some(frame)) => frame,
        Ok(None) => return LineFlow::Continue,
        Err(err) => {
            tracing::warn!(error = %err, "skipping malformed frame");
            return LineFlow::Continue;
        }
    };

    let effects = session.dispatcher.dispatch(frame, context);
    notify(&effects, session.dispatcher.view(), observer);

    let view = session.dispatcher.view();
    if view.state.is_terminal() {
        let view = view.clone();
        return LineFlow::Done(if view.state == SearchState::Errored {
            SearchOutcome::Failed(view)
        } else {
            SearchOutcome::Completed(view)
        });
    }
    LineFlow::Continue
}

fn fail<S>(mut session: StreamSession, err: &StreamError, observer: &mut S) -> SearchOutcome
where
    S: SearchObserver + ?Sized,
{
    if session.abort.is_aborted() {
        return SearchOutcome::Cancelled;
    }
    let effects = session.dispatcher.fail_transport(err);
    notify(&effects, session.dispatcher.view(), observer);
    SearchOutcome::Failed(session.dispatcher.into_view())
}

fn notify<S>(effects: &[Effect], view: &SearchView, observer: &mut S)
where
    S: SearchObserver + ?Sized,
{
    for effect in effects {
        match effect {
            Effect::Progress(message) => observer.on_progress(message),
            Effect::ResultsReplaced => observer.on_results(&view.results),
            Effect::Completed => observer.on_complete(view),
            Effect::Failed(message) => observer.on_error(message),
        }
    }
}

#[cfg(test)]
#[path = "discovery_test.rs"]
mod tests;
