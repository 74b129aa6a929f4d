use serde::{Deserialize, Serialize};

/// A place of interest, normalized from whichever pipeline stage and
/// payload encoding produced it.
///
/// `id` is never empty: when the upstream record carries no identifier the
/// display name is used instead. Coordinates default to `0.0` and `tags`
/// to an empty list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poi {
    pub id: String,
    pub name: String,
    pub category: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    pub rating: f64,
    pub tags: Vec<String>,
    pub address: String,
    pub website: Option<String>,
    pub phone_number: Option<String>,
    /// Free-form hours text, or the compact JSON of a structured schedule.
    pub opening_hours: Option<String>,
    /// Price tier as the backend reports it, e.g. `"$$"` or `"2"`.
    pub price_level: String,
    pub price_range: Option<String>,
    /// Distance from the search origin in metres, when the backend supplies it.
    pub distance: Option<f64>,
    pub city: Option<String>,
    pub city_id: Option<String>,
    pub llm_interaction_id: Option<String>,
    pub created_at: Option<String>,
}

impl Poi {
    /// Creates a POI with only a name; every other field takes its default.
    #[must_use]
    pub fn named(name: &str) -> Self {
        Self {
            id: name.to_owned(),
            name: name.to_owned(),
            category: String::new(),
            description: String::new(),
            latitude: 0.0,
            longitude: 0.0,
            rating: 0.0,
            tags: Vec::new(),
            address: String::new(),
            website: None,
            phone_number: None,
            opening_hours: None,
            price_level: String::new(),
            price_range: None,
            distance: None,
            city: None,
            city_id: None,
            llm_interaction_id: None,
            created_at: None,
        }
    }

    /// Returns `true` when the record has usable (non-origin) coordinates.
    #[must_use]
    pub fn has_coordinates(&self) -> bool {
        self.latitude.abs() > f64::EPSILON || self.longitude.abs() > f64::EPSILON
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_uses_name_as_id() {
        let poi = Poi::named("Cafe A");
        assert_eq!(poi.id, "Cafe A");
        assert!(poi.tags.is_empty());
        assert!(!poi.has_coordinates());
    }

    #[test]
    fn serializes_optional_fields_as_null() {
        let poi = Poi::named("Cafe A");
        let value = serde_json::to_value(&poi).unwrap();
        assert_eq!(value["id"], "Cafe A");
        assert!(value["website"].is_null());
        assert_eq!(value["latitude"], 0.0);
    }
}
