//! Records of completed discovery sessions.

use chrono::{DateTime, Utc};
use locus_core::Domain;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionRecord {
    /// Server-supplied session id, or a generated UUID when none was sent.
    pub id: String,
    pub city_name: Option<String>,
    pub domain: Domain,
    pub query: String,
    pub poi_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields written into a [`SessionRecord`] on completion.
#[derive(Debug, Clone)]
pub struct SessionUpdate<'a> {
    pub session_id: Option<&'a str>,
    pub city_name: Option<&'a str>,
    pub domain: Domain,
    pub query: &'a str,
    pub poi_count: usize,
}

#[derive(Debug, Default)]
pub struct SessionStore {
    records: Vec<SessionRecord>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates or updates the record for `update.session_id`.
    ///
    /// A missing id gets a fresh UUID v4, so the call always creates in that
    /// case. Updating keeps `created_at` and only overwrites `city_name`
    /// when a new one is supplied.
    pub fn upsert(&mut self, update: &SessionUpdate<'_>) -> &SessionRecord {
        let now = Utc::now();
        let id = update
            .session_id
            .map_or_else(|| Uuid::new_v4().to_string(), str::to_owned);

        if let Some(index) = self.records.iter().position(|r| r.id == id) {
            let record = &mut self.records[index];
            if let Some(city) = update.city_name {
                record.city_name = Some(city.to_owned());
            }
            record.domain = update.domain;
            update.query.clone_into(&mut record.query);
            record.poi_count = update.poi_count;
            record.updated_at = now;
            return &self.records[index];
        }

        self.records.push(SessionRecord {
            id,
            city_name: update.city_name.map(str::to_owned),
            domain: update.domain,
            query: update.query.to_owned(),
            poi_count: update.poi_count,
            created_at: now,
            updated_at: now,
        });
        &self.records[self.records.len() - 1]
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&SessionRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    #[must_use]
    pub fn records(&self) -> &[SessionRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update<'a>(session_id: Option<&'a str>, city: Option<&'a str>, count: usize) -> SessionUpdate<'a> {
        SessionUpdate {
            session_id,
            city_name: city,
            domain: Domain::Dining,
            query: "seafood",
            poi_count: count,
        }
    }

    #[test]
    fn server_id_is_used_and_updated_in_place() {
        let mut store = SessionStore::new();
        let created_at = store.upsert(&update(Some("s-1"), Some("Lisbon"), 3)).created_at;
        let record = store.upsert(&update(Some("s-1"), None, 5)).clone();

        assert_eq!(store.len(), 1);
        assert_eq!(record.id, "s-1");
        assert_eq!(record.poi_count, 5);
        assert_eq!(record.city_name.as_deref(), Some("Lisbon"));
        assert_eq!(record.created_at, created_at);
        assert!(record.updated_at >= created_at);
    }

    #[test]
    fn missing_id_generates_a_uuid() {
        let mut store = SessionStore::new();
        let id = store.upsert(&update(None, None, 1)).id.clone();
        assert!(Uuid::parse_str(&id).is_ok(), "expected UUID, got {id}");

        store.upsert(&update(None, None, 1));
        assert_eq!(store.len(), 2, "each id-less completion is its own session");
        assert!(store.get(&id).is_some());
    }
}
