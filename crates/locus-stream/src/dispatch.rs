//! Frame-driven search state machine.
//!
//! [`SearchState::on_frame`] is the transition table; [`Dispatcher`] applies
//! a frame's effects to the [`SearchView`] and the [`DiscoveryContext`]
//! once the table accepts it.

use std::sync::LazyLock;

use locus_core::{Domain, Poi};
use regex::Regex;
use serde_json::Value;

use crate::context::DiscoveryContext;
use crate::error::StreamError;
use crate::extract::extract_pois;
use crate::frame::{FrameKind, RawFrame};
use crate::normalize::normalize;
use crate::records::SessionUpdate;
use crate::request::SearchRequest;

/// Shown for quota and rate-limit failures reported by the backend.
pub const QUOTA_MESSAGE: &str =
    "The discovery service is busy right now. Please wait a moment and try again.";

/// Shown when the stream cannot be opened or breaks mid-read.
pub const CONNECTION_LOST_MESSAGE: &str =
    "Lost connection to the discovery service. Please try again.";

const UNKNOWN_ERROR_MESSAGE: &str = "Something went wrong while searching.";

/// Lower-case substrings of upstream errors that get a friendlier message.
const UPSTREAM_ERROR_PATTERNS: &[(&str, &str)] = &[
    ("resource_exhausted", QUOTA_MESSAGE),
    ("quota", QUOTA_MESSAGE),
    ("rate limit", QUOTA_MESSAGE),
    ("rate-limit", QUOTA_MESSAGE),
    ("ratelimit", QUOTA_MESSAGE),
    ("too many requests", QUOTA_MESSAGE),
];

/// A bare HTTP 429 status, not a number that merely contains the digits.
static TOO_MANY_REQUESTS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b429\b").expect("valid regex"));

/// Maps a raw upstream error to the text shown to the user.
///
/// Known quota/rate-limit patterns are replaced; anything else passes
/// through trimmed.
#[must_use]
pub fn friendly_upstream_message(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let friendly = UPSTREAM_ERROR_PATTERNS
        .iter()
        .find(|(pattern, _)| lowered.contains(pattern))
        .map(|(_, friendly)| *friendly)
        .or_else(|| TOO_MANY_REQUESTS_RE.is_match(raw).then_some(QUOTA_MESSAGE));
    if let Some(friendly) = friendly {
        return friendly.to_owned();
    }

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        UNKNOWN_ERROR_MESSAGE.to_owned()
    } else {
        trimmed.to_owned()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    Idle,
    Streaming,
    Complete,
    Errored,
}

impl SearchState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Errored)
    }

    /// Next state after a frame of `kind`, or `None` if the frame is rejected.
    ///
    /// Terminal states accept nothing; unknown frame types are rejected in
    /// every state.
    #[must_use]
    pub fn on_frame(self, kind: &FrameKind) -> Option<Self> {
        match (self, kind) {
            (Self::Complete | Self::Errored, _) | (_, FrameKind::Unknown(_)) => None,
            (Self::Idle | Self::Streaming, FrameKind::Complete) => Some(Self::Complete),
            (Self::Idle | Self::Streaming, FrameKind::Error) => Some(Self::Errored),
            (Self::Idle | Self::Streaming, _) => Some(Self::Streaming),
        }
    }

    /// Next state after the transport fails, or `None` once terminal.
    #[must_use]
    pub fn on_transport_error(self) -> Option<Self> {
        (!self.is_terminal()).then_some(Self::Errored)
    }
}

/// A visible consequence of one dispatched frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Progress(String),
    ResultsReplaced,
    Completed,
    Failed(String),
}

/// Everything a consumer renders for the current search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchView {
    pub state: SearchState,
    pub loading: bool,
    pub progress: Option<String>,
    pub results: Vec<Poi>,
    pub error: Option<String>,
    /// Domain announced by the backend's `start` frame.
    pub domain_hint: Option<Domain>,
    pub session_id: Option<String>,
    pub city_name: Option<String>,
    pub from_cache: bool,
}

impl SearchView {
    fn loading() -> Self {
        Self {
            state: SearchState::Idle,
            loading: true,
            progress: None,
            results: Vec::new(),
            error: None,
            domain_hint: None,
            session_id: None,
            city_name: None,
            from_cache: false,
        }
    }

    /// Terminal view for a search answered from the result cache.
    #[must_use]
    pub fn from_cache(request: &SearchRequest, results: Vec<Poi>) -> Self {
        Self {
            state: SearchState::Complete,
            loading: false,
            progress: Some("Loaded from cache".to_owned()),
            results,
            error: None,
            domain_hint: Some(request.domain),
            session_id: None,
            city_name: request.location.clone(),
            from_cache: true,
        }
    }
}

/// Applies frames of one search to its view and to the shared context.
#[derive(Debug)]
pub struct Dispatcher {
    request: SearchRequest,
    view: SearchView,
    /// Latest category-level result set; the only thing ever cached.
    committed: Option<Vec<Poi>>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(request: SearchRequest) -> Self {
        Self {
            request,
            view: SearchView::loading(),
            committed: None,
        }
    }

    #[must_use]
    pub fn request(&self) -> &SearchRequest {
        &self.request
    }

    #[must_use]
    pub fn view(&self) -> &SearchView {
        &self.view
    }

    #[must_use]
    pub fn into_view(self) -> SearchView {
        self.view
    }

    #[must_use]
    pub fn state(&self) -> SearchState {
        self.view.state
    }

    /// Applies one frame. Rejected frames return no effects and change nothing.
    pub fn dispatch(&mut self, frame: RawFrame, context: &mut DiscoveryContext) -> Vec<Effect> {
        let kind = frame.frame_kind();
        let Some(next) = self.view.state.on_frame(&kind) else {
            match &kind {
                FrameKind::Unknown(frame_type) => {
                    tracing::debug!(frame_type = %frame_type, "ignoring unrecognized frame type");
                }
                _ => tracing::debug!(
                    frame_type = %frame.kind,
                    state = ?self.view.state,
                    "ignoring frame after terminal state"
                ),
            }
            return Vec::new();
        };

        tracing::debug!(frame_type = %frame.kind, state = ?next, "dispatching frame");
        self.view.state = next;

        let RawFrame {
            data,
            error,
            navigation,
            ..
        } = frame;
        let data = normalize(data);

        match kind {
            FrameKind::Start => self.on_start(&data),
            FrameKind::Chunk => self.on_chunk(&data),
            FrameKind::CityData => self.on_city_data(&data),
            FrameKind::GeneralPois
            | FrameKind::Restaurants
            | FrameKind::Hotels
            | FrameKind::Activities => self.on_category(&kind, &data),
            FrameKind::Itinerary => self.on_itinerary(&data),
            FrameKind::Complete => {
                let navigation = navigation.unwrap_or_default();
                self.on_complete(
                    &data,
                    navigation.session_id(),
                    navigation.city_name(),
                    context,
                )
            }
            FrameKind::Error => self.on_error(error.as_deref(), &data),
            FrameKind::Unknown(_) => Vec::new(),
        }
    }

    /// Ends the search after a transport failure.
    pub fn fail_transport(&mut self, err: &StreamError) -> Vec<Effect> {
        let Some(next) = self.view.state.on_transport_error() else {
            return Vec::new();
        };
        tracing::warn!(error = %err, "discovery stream failed");
        self.view.state = next;
        self.view.loading = false;
        self.view.error = Some(CONNECTION_LOST_MESSAGE.to_owned());
        vec![Effect::Failed(CONNECTION_LOST_MESSAGE.to_owned())]
    }

    /// Clears loading after the stream closed without a terminal frame.
    ///
    /// Partial results stay visible but are not cached.
    pub fn close_incomplete(&mut self) {
        if !self.view.state.is_terminal() {
            tracing::warn!(
                count = self.view.results.len(),
                "discovery stream closed before completion"
            );
            self.view.loading = false;
        }
    }

    fn set_progress(&mut self, message: String, effects: &mut Vec<Effect>) {
        self.view.progress = Some(message.clone());
        effects.push(Effect::Progress(message));
    }

    fn replace_results(&mut self, pois: Vec<Poi>, effects: &mut Vec<Effect>) {
        self.view.results = pois;
        effects.push(Effect::ResultsReplaced);
    }

    fn on_start(&mut self, data: &Value) -> Vec<Effect> {
        let mut effects = Vec::new();
        if let Some(hint) = data
            .get("domain")
            .and_then(Value::as_str)
            .and_then(Domain::from_hint)
        {
            self.view.domain_hint = Some(hint);
        }
        let message =
            progress_text(data).unwrap_or_else(|| "Starting your search...".to_owned());
        self.set_progress(message, &mut effects);
        effects
    }

    fn on_chunk(&mut self, data: &Value) -> Vec<Effect> {
        let mut effects = Vec::new();
        if let Some(message) = progress_text(data) {
            self.set_progress(message, &mut effects);
        }
        let pois = extract_pois(data);
        if !pois.is_empty() {
            tracing::debug!(count = pois.len(), "partial results from chunk");
            self.replace_results(pois, &mut effects);
        }
        effects
    }

    fn on_city_data(&mut self, data: &Value) -> Vec<Effect> {
        let mut effects = Vec::new();
        let city = ["city", "city_name", "cityName", "name"]
            .iter()
            .find_map(|key| data.get(*key).and_then(Value::as_str))
            .map(str::trim)
            .filter(|c| !c.is_empty());
        let message = city.map_or_else(
            || "Gathering city information...".to_owned(),
            |c| format!("Exploring {c}..."),
        );
        self.set_progress(message, &mut effects);
        effects
    }

    fn on_category(&mut self, kind: &FrameKind, data: &Value) -> Vec<Effect> {
        let mut effects = Vec::new();
        let pois = extract_pois(data);
        let label = match kind {
            FrameKind::Restaurants => "restaurants",
            FrameKind::Hotels => "hotels",
            FrameKind::Activities => "activities",
            _ => "places",
        };
        self.set_progress(format!("Found {} {label}", pois.len()), &mut effects);
        self.committed = Some(pois.clone());
        self.replace_results(pois, &mut effects);
        effects
    }

    fn on_itinerary(&mut self, data: &Value) -> Vec<Effect> {
        let mut effects = Vec::new();
        let message =
            progress_text(data).unwrap_or_else(|| "Building your itinerary...".to_owned());
        self.set_progress(message, &mut effects);
        let pois = extract_pois(data);
        if !pois.is_empty() {
            self.committed = Some(pois.clone());
            self.replace_results(pois, &mut effects);
        }
        effects
    }

    fn on_complete(
        &mut self,
        data: &Value,
        session_id: Option<&str>,
        navigation_city: Option<&str>,
        context: &mut DiscoveryContext,
    ) -> Vec<Effect> {
        let mut effects = Vec::new();

        let pois = extract_pois(data);
        if !pois.is_empty() {
            self.committed = Some(pois.clone());
            self.replace_results(pois, &mut effects);
        }

        if let Some(committed) = self.committed.take().filter(|pois| !pois.is_empty()) {
            context.cache.insert(self.request.cache_key(), committed);
        }

        let city = navigation_city
            .map(str::to_owned)
            .or_else(|| {
                self.request
                    .location
                    .as_deref()
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(str::to_owned)
            });

        // The backend's own domain reading wins over the requested one.
        let domain = self.view.domain_hint.unwrap_or(self.request.domain);

        let record = context.sessions.upsert(&SessionUpdate {
            session_id,
            city_name: city.as_deref(),
            domain,
            query: &self.request.query,
            poi_count: self.view.results.len(),
        });
        self.view.session_id = Some(record.id.clone());

        if let Some(city) = city.as_deref() {
            context
                .trending
                .record(city, domain, &self.request.query);
        }

        tracing::info!(
            %domain,
            city = city.as_deref().unwrap_or_default(),
            count = self.view.results.len(),
            "discovery search complete"
        );

        self.view.city_name = city;
        self.view.loading = false;
        self.view.progress = Some("Search complete".to_owned());
        effects.push(Effect::Completed);
        effects
    }

    fn on_error(&mut self, error: Option<&str>, data: &Value) -> Vec<Effect> {
        let raw = error
            .or_else(|| data.get("error").and_then(Value::as_str))
            .or_else(|| data.as_str())
            .unwrap_or_default();
        tracing::warn!(upstream_error = raw, "discovery backend reported an error");

        let message = friendly_upstream_message(raw);
        self.view.error = Some(message.clone());
        self.view.loading = false;
        vec![Effect::Failed(message)]
    }
}

/// Progress text carried by a payload: a non-empty string, or a
/// `message`/`progress`/`status` string field.
fn progress_text(data: &Value) -> Option<String> {
    let text = match data {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => ["message", "progress", "status"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str)),
        _ => None,
    }?;
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

#[cfg(test)]
#[path = "dispatch_test.rs"]
mod tests;
