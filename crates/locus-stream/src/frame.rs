//! `data:` line parsing into typed frame envelopes.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::FrameParseError;

const DATA_PREFIX: &str = "data:";

/// Maximum number of characters of a bad line echoed into a parse error.
const EXCERPT_CHARS: usize = 120;

/// One decoded event envelope.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawFrame {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default, deserialize_with = "lenient_text")]
    pub error: Option<String>,
    #[serde(default, deserialize_with = "lenient_struct")]
    pub navigation: Option<Navigation>,
}

impl RawFrame {
    /// Typed view of the `type` field.
    #[must_use]
    pub fn frame_kind(&self) -> FrameKind {
        FrameKind::from_wire(&self.kind)
    }
}

/// Routing hints attached to `complete` frames.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Navigation {
    #[serde(default, deserialize_with = "lenient_text")]
    pub route_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_struct")]
    pub query_params: Option<QueryParams>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryParams {
    #[serde(default, deserialize_with = "lenient_text")]
    pub session_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub city_name: Option<String>,
}

/// Accepts any JSON value for an optional text field.
///
/// Numbers and booleans are rendered, objects contribute their
/// `message`/`error`/`detail` text (or compact JSON), and `null` or `[]`
/// become `None`.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(text_of(&Value::deserialize(deserializer)?))
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) if items.is_empty() => None,
        Value::Array(_) => Some(value.to_string()),
        Value::Object(map) => ["message", "error", "detail"]
            .iter()
            .find_map(|key| map.get(*key).and_then(text_of))
            .or_else(|| Some(value.to_string())),
    }
}

/// Optional nested block that degrades to `None` when it has the wrong shape.
fn lenient_struct<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

impl Navigation {
    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        self.query_params
            .as_ref()
            .and_then(|q| q.session_id.as_deref())
            .filter(|s| !s.trim().is_empty())
    }

    #[must_use]
    pub fn city_name(&self) -> Option<&str> {
        self.query_params
            .as_ref()
            .and_then(|q| q.city_name.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// The frame types the dispatcher reacts to.
///
/// Anything else is carried as [`FrameKind::Unknown`] and ignored, so the
/// backend can add event types without breaking older clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameKind {
    Start,
    Chunk,
    CityData,
    GeneralPois,
    Restaurants,
    Hotels,
    Activities,
    Itinerary,
    Complete,
    Error,
    Unknown(String),
}

impl FrameKind {
    #[must_use]
    pub fn from_wire(kind: &str) -> Self {
        match kind {
            "start" => Self::Start,
            "chunk" => Self::Chunk,
            "city_data" => Self::CityData,
            "general_pois" => Self::GeneralPois,
            "restaurants" => Self::Restaurants,
            "hotels" => Self::Hotels,
            "activities" => Self::Activities,
            "itinerary" => Self::Itinerary,
            "complete" => Self::Complete,
            "error" => Self::Error,
            other => Self::Unknown(other.to_owned()),
        }
    }

    /// `true` for the per-category result frames that replace the result set.
    #[must_use]
    pub fn is_category(&self) -> bool {
        matches!(
            self,
            Self::GeneralPois | Self::Restaurants | Self::Hotels | Self::Activities
        )
    }
}

/// Parses one stream line into a frame.
///
/// Returns `Ok(None)` for lines that carry no frame: blank lines, SSE
/// comments (`: heartbeat`), other SSE fields (`event:`, `id:`) and empty
/// `data:` lines. NUL bytes and surrounding whitespace are stripped first.
///
/// # Errors
///
/// Returns [`FrameParseError::Json`] when a `data:` payload is not a JSON
/// object with a string `type` field. Callers log and skip such lines.
pub fn parse_frame(line: &str) -> Result<Option<RawFrame>, FrameParseError> {
    let cleaned: String = line.chars().filter(|&c| c != '\0').collect();
    let trimmed = cleaned.trim();

    let Some(payload) = trimmed.strip_prefix(DATA_PREFIX) else {
        return Ok(None);
    };
    let payload = payload.trim();
    if payload.is_empty() {
        return Ok(None);
    }

    serde_json::from_str::<RawFrame>(payload)
        .map(Some)
        .map_err(|source| FrameParseError::Json {
            excerpt: payload.chars().take(EXCERPT_CHARS).collect(),
            source,
        })
}
