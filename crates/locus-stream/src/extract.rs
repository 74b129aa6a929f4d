//! POI list discovery and record canonicalization.
//!
//! Each pipeline stage nests its place list under a different field and
//! spells record fields in either snake_case or camelCase. [`extract_pois`]
//! tries [`LIST_SOURCES`] in priority order and maps the first non-empty
//! list it finds through [`canonicalize_poi`].

use locus_core::Poi;
use serde_json::{Map, Value};

use crate::normalize::normalize;

/// How many times a string payload may be re-normalized before giving up.
const MAX_DECODE_DEPTH: usize = 3;

/// Where to look for a list of place records.
#[derive(Debug, Clone, Copy)]
pub enum ListPath {
    /// A top-level field.
    Field(&'static str),
    /// A field on a nested object, e.g. `accommodation_response.hotels`.
    Nested(&'static str, &'static str),
}

/// One entry in the ordered list of places a POI list may live.
#[derive(Debug, Clone, Copy)]
pub struct ListSource {
    pub name: &'static str,
    pub path: ListPath,
}

impl ListSource {
    const fn field(name: &'static str) -> Self {
        Self {
            name,
            path: ListPath::Field(name),
        }
    }

    const fn nested(name: &'static str, outer: &'static str, inner: &'static str) -> Self {
        Self {
            name,
            path: ListPath::Nested(outer, inner),
        }
    }

    /// Returns the records at this source's path when there is at least one.
    ///
    /// A single object at the path counts as a one-element list.
    #[must_use]
    pub fn project<'a>(&self, map: &'a Map<String, Value>) -> Option<&'a [Value]> {
        let target = match self.path {
            ListPath::Field(field) => map.get(field)?,
            ListPath::Nested(outer, inner) => map.get(outer)?.as_object()?.get(inner)?,
        };
        match target {
            Value::Array(items) if !items.is_empty() => Some(items.as_slice()),
            Value::Object(obj) if !obj.is_empty() => Some(std::slice::from_ref(target)),
            _ => None,
        }
    }
}

/// Known list-bearing fields, highest priority first.
///
/// An object carrying both `hotels` and `restaurants` yields the hotels.
pub const LIST_SOURCES: &[ListSource] = &[
    ListSource::field("hotels"),
    ListSource::field("restaurants"),
    ListSource::field("activities"),
    ListSource::field("general_pois"),
    ListSource::field("generalPois"),
    ListSource::field("points_of_interest"),
    ListSource::field("pointsOfInterest"),
    ListSource::field("poi_detailed_info"),
    ListSource::field("items"),
    ListSource::field("results"),
    ListSource::nested("accommodation_response.hotels", "accommodation_response", "hotels"),
    ListSource::nested("accommodationResponse.hotels", "accommodationResponse", "hotels"),
    ListSource::nested(
        "itinerary_response.points_of_interest",
        "itinerary_response",
        "points_of_interest",
    ),
    ListSource::nested(
        "itineraryResponse.pointsOfInterest",
        "itineraryResponse",
        "pointsOfInterest",
    ),
];

/// Extracts canonical POIs from a normalized payload.
///
/// Strings are normalized again (payloads are sometimes encoded twice),
/// arrays are mapped element-wise, and objects are searched with
/// [`LIST_SOURCES`]. Anything else yields an empty list.
#[must_use]
pub fn extract_pois(value: &Value) -> Vec<Poi> {
    extract_at_depth(value, 0)
}

fn extract_at_depth(value: &Value, depth: usize) -> Vec<Poi> {
    match value {
        Value::String(text) => {
            if depth >= MAX_DECODE_DEPTH {
                return Vec::new();
            }
            match normalize(Value::String(text.clone())) {
                // Nothing more to decode.
                Value::String(decoded) if decoded == *text => Vec::new(),
                decoded => extract_at_depth(&decoded, depth + 1),
            }
        }
        Value::Array(items) => canonicalize_all(items),
        Value::Object(map) => LIST_SOURCES
            .iter()
            .find_map(|source| {
                source.project(map).map(|items| {
                    tracing::debug!(source = source.name, count = items.len(), "matched POI list");
                    canonicalize_all(items)
                })
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

fn canonicalize_all(items: &[Value]) -> Vec<Poi> {
    items
        .iter()
        .filter_map(Value::as_object)
        .filter_map(canonicalize_poi)
        .collect()
}

/// Maps one loosely shaped place record onto [`Poi`].
///
/// Returns `None` when the record has neither an identifier nor a name.
#[must_use]
pub fn canonicalize_poi(record: &Map<String, Value>) -> Option<Poi> {
    let name = text_field(record, &["name", "poi_name", "poiName", "title"]).unwrap_or_default();
    let id = text_field(record, &["id", "poi_id", "poiId"])
        .or_else(|| (!name.is_empty()).then(|| name.clone()))?;

    Some(Poi {
        id,
        name,
        category: text_field(record, &["category", "type", "poi_type", "poiType"])
            .unwrap_or_default(),
        description: text_field(
            record,
            &["description", "description_poi", "descriptionPoi"],
        )
        .unwrap_or_default(),
        latitude: number_field(record, &["latitude", "lat"]).unwrap_or(0.0),
        longitude: number_field(record, &["longitude", "lng", "lon"]).unwrap_or(0.0),
        rating: number_field(record, &["rating"]).unwrap_or(0.0),
        tags: tags_field(record),
        address: text_field(record, &["address", "formatted_address", "formattedAddress"])
            .unwrap_or_default(),
        website: text_field(record, &["website", "website_url", "websiteUrl"]),
        phone_number: text_field(record, &["phone_number", "phoneNumber", "phone"]),
        opening_hours: text_field(record, &["opening_hours", "openingHours"]),
        price_level: text_field(record, &["price_level", "priceLevel"]).unwrap_or_default(),
        price_range: text_field(record, &["price_range", "priceRange"]),
        distance: number_field(record, &["distance"]),
        city: text_field(record, &["city", "city_name", "cityName"]),
        city_id: text_field(record, &["city_id", "cityId"]),
        llm_interaction_id: text_field(record, &["llm_interaction_id", "llmInteractionId"]),
        created_at: text_field(record, &["created_at", "createdAt"]),
    })
}

/// First non-empty value among `keys`, rendered as text.
///
/// Strings are trimmed; numbers and booleans are formatted; structured
/// values become compact JSON.
fn text_field(record: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match record.get(*key)? {
        Value::Null => None,
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_owned())
        }
        Value::Array(a) if a.is_empty() => None,
        Value::Object(o) if o.is_empty() => None,
        other => Some(other.to_string()),
    })
}

/// First value among `keys` that is a number or a numeric string.
fn number_field(record: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| {
        let value = record.get(*key)?;
        value
            .as_f64()
            .or_else(|| value.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
            .filter(|n| n.is_finite())
    })
}

/// `tags` as a list of strings; a comma-separated string is split.
fn tags_field(record: &Map<String, Value>) -> Vec<String> {
    match record.get("tags") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_owned)
            .collect(),
        Some(Value::String(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_owned)
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
