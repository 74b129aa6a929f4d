//! Terminal output for search progress, results, and trending cities.

use std::fmt::Write as _;

use locus_core::Poi;
use locus_stream::{SearchObserver, SearchView, TrendingEntry};

const NAME_WIDTH: usize = 32;

/// Streams progress lines to stderr while a search runs.
pub(crate) struct ConsoleObserver {
    show_progress: bool,
}

impl ConsoleObserver {
    pub(crate) fn new(show_progress: bool) -> Self {
        Self { show_progress }
    }
}

impl SearchObserver for ConsoleObserver {
    fn on_progress(&mut self, message: &str) {
        if self.show_progress {
            eprintln!("\u{2026} {message}");
        }
    }

    fn on_results(&mut self, results: &[Poi]) {
        if self.show_progress {
            eprintln!("  {} places so far", results.len());
        }
    }

    fn on_complete(&mut self, view: &SearchView) {
        if self.show_progress && view.from_cache {
            eprintln!("loaded {} places from cache", view.results.len());
        }
    }

    fn on_error(&mut self, message: &str) {
        eprintln!("error: {message}");
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        format!("{}...", text.chars().take(width - 3).collect::<String>())
    } else {
        text.to_owned()
    }
}

/// Formats results as a fixed-width table.
pub(crate) fn format_results(results: &[Poi]) -> String {
    if results.is_empty() {
        return "no places found\n".to_owned();
    }

    let mut out = format!(
        "{:<w$}  {:<16}{:<8}ADDRESS\n",
        "NAME",
        "CATEGORY",
        "RATING",
        w = NAME_WIDTH
    );
    for poi in results {
        let rating = if poi.rating > 0.0 {
            format!("{:.1}", poi.rating)
        } else {
            "\u{2014}".to_owned()
        };
        let _ = writeln!(
            out,
            "{:<w$}  {:<16}{:<8}{}",
            truncate(&poi.name, NAME_WIDTH),
            truncate(&poi.category, 15),
            rating,
            poi.address,
            w = NAME_WIDTH
        );
    }
    out
}

/// Formats trending cities, highest count first.
pub(crate) fn format_trending(entries: &[&TrendingEntry]) -> String {
    let mut out = String::from("Trending\n");
    for entry in entries {
        let _ = writeln!(
            out,
            "{} {:<20}{:>4}  {}",
            entry.emoji, entry.city_name, entry.search_count, entry.category
        );
    }
    out
}
