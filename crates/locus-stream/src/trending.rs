//! Per-city search counter for the trending list.

use locus_core::Domain;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendingEntry {
    pub city_name: String,
    pub search_count: u32,
    pub emoji: String,
    pub category: String,
    /// Query of the first search that introduced this city.
    pub first_message: String,
}

/// Case-insensitive per-city search counts, newest city first.
#[derive(Debug, Default)]
pub struct TrendingAggregator {
    entries: Vec<TrendingEntry>,
}

impl TrendingAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one completed search for `city_name`.
    ///
    /// An existing entry (matched case-insensitively) is incremented and
    /// keeps its original spelling, emoji, and first message. Otherwise a
    /// new entry with count 1 is inserted at the front. Blank city names are
    /// ignored.
    pub fn record(&mut self, city_name: &str, domain: Domain, message: &str) -> Option<&TrendingEntry> {
        let city = city_name.trim();
        if city.is_empty() {
            return None;
        }

        if let Some(index) = self
            .entries
            .iter()
            .position(|e| e.city_name.to_lowercase() == city.to_lowercase())
        {
            let entry = &mut self.entries[index];
            entry.search_count = entry.search_count.saturating_add(1);
            return Some(&self.entries[index]);
        }

        self.entries.insert(
            0,
            TrendingEntry {
                city_name: city.to_owned(),
                search_count: 1,
                emoji: domain.emoji().to_owned(),
                category: domain.label().to_owned(),
                first_message: message.trim().to_owned(),
            },
        );
        self.entries.first()
    }

    /// Entries in insertion order (most recently introduced city first).
    #[must_use]
    pub fn entries(&self) -> &[TrendingEntry] {
        &self.entries
    }

    /// Entries by descending `search_count`; ties keep insertion order.
    #[must_use]
    pub fn ranked(&self) -> Vec<&TrendingEntry> {
        let mut ranked: Vec<&TrendingEntry> = self.entries.iter().collect();
        ranked.sort_by(|a, b| b.search_count.cmp(&a.search_count));
        ranked
    }

    #[must_use]
    pub fn get(&self, city_name: &str) -> Option<&TrendingEntry> {
        let wanted = city_name.trim().to_lowercase();
        self.entries
            .iter()
            .find(|e| e.city_name.to_lowercase() == wanted)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_city_in_different_case_is_one_entry() {
        let mut trending = TrendingAggregator::new();
        trending.record("Lisbon", Domain::Dining, "seafood");
        trending.record("lisbon", Domain::Accommodation, "hotels");

        assert_eq!(trending.len(), 1);
        let entry = trending.get("LISBON").unwrap();
        assert_eq!(entry.search_count, 2);
        assert_eq!(entry.city_name, "Lisbon");
        assert_eq!(entry.first_message, "seafood");
        assert_eq!(entry.emoji, Domain::Dining.emoji());
    }

    #[test]
    fn new_cities_are_inserted_at_the_front() {
        let mut trending = TrendingAggregator::new();
        trending.record("Lisbon", Domain::Dining, "a");
        trending.record("Porto", Domain::Dining, "b");

        let cities: Vec<&str> = trending.entries().iter().map(|e| e.city_name.as_str()).collect();
        assert_eq!(cities, vec!["Porto", "Lisbon"]);
    }

    #[test]
    fn ranked_orders_by_count_then_recency() {
        let mut trending = TrendingAggregator::new();
        trending.record("Lisbon", Domain::Dining, "a");
        trending.record("Porto", Domain::Dining, "b");
        trending.record("Faro", Domain::Dining, "c");
        trending.record("lisbon", Domain::Dining, "d");

        let cities: Vec<&str> = trending.ranked().iter().map(|e| e.city_name.as_str()).collect();
        assert_eq!(cities, vec!["Lisbon", "Faro", "Porto"]);
    }

    #[test]
    fn blank_city_is_ignored() {
        let mut trending = TrendingAggregator::new();
        assert!(trending.record("  ", Domain::General, "x").is_none());
        assert!(trending.is_empty());
    }

    #[test]
    fn counts_never_decrease() {
        let mut trending = TrendingAggregator::new();
        let mut last = 0;
        for _ in 0..5 {
            let count = trending
                .record("Lisbon", Domain::General, "x")
                .unwrap()
                .search_count;
            assert!(count > last);
            last = count;
        }
    }
}
