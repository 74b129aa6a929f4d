use serde::{Deserialize, Serialize};

/// The search vertical a discovery request targets.
///
/// Sent upstream as the request's `contextType` and used as the first
/// component of the search cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    General,
    Dining,
    Accommodation,
    Activities,
    Itinerary,
}

impl Domain {
    /// Parses a domain hint as the backend spells it.
    ///
    /// Matching is case-insensitive and accepts the event-type spellings
    /// (`"restaurants"`, `"hotels"`) alongside the canonical names.
    /// Returns `None` for anything unrecognized.
    #[must_use]
    pub fn from_hint(hint: &str) -> Option<Self> {
        match hint.trim().to_ascii_lowercase().as_str() {
            "general" | "general_pois" | "discover" => Some(Self::General),
            "dining" | "restaurant" | "restaurants" => Some(Self::Dining),
            "accommodation" | "hotel" | "hotels" => Some(Self::Accommodation),
            "activities" | "activity" => Some(Self::Activities),
            "itinerary" => Some(Self::Itinerary),
            _ => None,
        }
    }

    /// Wire name used for `contextType`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Dining => "dining",
            Self::Accommodation => "accommodation",
            Self::Activities => "activities",
            Self::Itinerary => "itinerary",
        }
    }

    /// Emoji shown next to a trending city searched in this domain.
    #[must_use]
    pub fn emoji(self) -> &'static str {
        match self {
            Self::General => "📍",
            Self::Dining => "🍽️",
            Self::Accommodation => "🏨",
            Self::Activities => "🎯",
            Self::Itinerary => "🗺️",
        }
    }

    /// Human-readable category label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::General => "Discover",
            Self::Dining => "Dining",
            Self::Accommodation => "Stays",
            Self::Activities => "Activities",
            Self::Itinerary => "Itineraries",
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hint(s).ok_or_else(|| format!("unknown domain \"{s}\""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_hint_accepts_event_type_spellings() {
        assert_eq!(Domain::from_hint("restaurants"), Some(Domain::Dining));
        assert_eq!(Domain::from_hint("Hotels"), Some(Domain::Accommodation));
        assert_eq!(Domain::from_hint(" itinerary "), Some(Domain::Itinerary));
    }

    #[test]
    fn from_hint_rejects_unknown() {
        assert_eq!(Domain::from_hint("nightlife"), None);
    }

    #[test]
    fn wire_name_round_trips_through_from_str() {
        for domain in [
            Domain::General,
            Domain::Dining,
            Domain::Accommodation,
            Domain::Activities,
            Domain::Itinerary,
        ] {
            assert_eq!(domain.as_str().parse::<Domain>(), Ok(domain));
        }
    }

    #[test]
    fn serializes_as_snake_case() {
        let json = serde_json::to_string(&Domain::Accommodation).unwrap();
        assert_eq!(json, "\"accommodation\"");
    }
}
