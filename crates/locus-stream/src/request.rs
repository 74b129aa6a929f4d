use locus_core::Domain;
use serde::Serialize;

use crate::cache::SearchCacheKey;

/// A search as the caller expresses it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub profile_id: String,
    pub domain: Domain,
    /// Free-text prompt sent to the backend as `message`.
    pub query: String,
    /// City the search is scoped to, if any.
    pub location: Option<String>,
}

impl SearchRequest {
    #[must_use]
    pub fn cache_key(&self) -> SearchCacheKey {
        SearchCacheKey::new(
            self.domain,
            &self.query,
            self.location.as_deref().unwrap_or_default(),
        )
    }

    #[must_use]
    pub fn to_wire(&self) -> DiscoveryRequest {
        DiscoveryRequest {
            profile_id: self.profile_id.clone(),
            city_name: self
                .location
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_owned),
            message: self.query.clone(),
            context_type: self.domain,
        }
    }
}

/// Request body of the streaming discovery endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryRequest {
    pub profile_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city_name: Option<String>,
    pub message: String,
    pub context_type: Domain,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_body_uses_camel_case_and_omits_missing_city() {
        let request = SearchRequest {
            profile_id: "p-1".into(),
            domain: Domain::Dining,
            query: "best seafood".into(),
            location: None,
        };
        let body = serde_json::to_value(request.to_wire()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "profileId": "p-1",
                "message": "best seafood",
                "contextType": "dining"
            })
        );
    }

    #[test]
    fn blank_location_is_not_sent() {
        let request = SearchRequest {
            profile_id: "p-1".into(),
            domain: Domain::General,
            query: "q".into(),
            location: Some("  ".into()),
        };
        assert!(request.to_wire().city_name.is_none());
    }

    #[test]
    fn cache_key_folds_case() {
        let a = SearchRequest {
            profile_id: "p-1".into(),
            domain: Domain::Dining,
            query: "Seafood".into(),
            location: Some("Lisbon".into()),
        };
        let mut b = a.clone();
        b.query = "seafood".into();
        b.location = Some("LISBON".into());
        b.profile_id = "someone-else".into();
        assert_eq!(a.cache_key(), b.cache_key());
    }
}
