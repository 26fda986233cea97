//! Data models for scraped publications and run summaries

use chrono::NaiveDate;
use serde::Serialize;

/// A single publication scraped from a firm's listing page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Publication {
    pub company: String,
    pub publication_type: String,
    pub publication_date: Option<NaiveDate>,
    pub practice_area: Option<String>,
    pub heading: String,
    pub link: String,
}

impl Publication {
    /// Stable storage key derived from the article link
    pub fn link_hash(&self) -> String {
        format!("{:x}", md5::compute(self.link.as_bytes()))
    }
}

/// Inclusive window of publication dates a run persists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Where a publication date falls relative to a [`DateRange`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateVerdict {
    InRange,
    /// Older than the range start; listings are newest-first so this ends pagination
    Stale,
    Future,
    Undated,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn classify(&self, date: Option<NaiveDate>) -> DateVerdict {
        match date {
            None => DateVerdict::Undated,
            Some(d) if d < self.start => DateVerdict::Stale,
            Some(d) if d > self.end => DateVerdict::Future,
            Some(_) => DateVerdict::InRange,
        }
    }
}

impl Default for DateRange {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or(NaiveDate::MIN),
            end: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap_or(NaiveDate::MAX),
        }
    }
}

/// Result of writing one publication
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    Unchanged,
}

/// Per-firm counters reported at the end of a run
#[derive(Debug, Clone, Default)]
pub struct FirmSummary {
    pub firm: String,
    pub found: usize,
    pub saved: usize,
    pub updated: usize,
    pub unchanged: usize,
    /// Parsed but outside the date range (or undated where the firm drops those)
    pub filtered: usize,
    pub failed: usize,
}

impl FirmSummary {
    pub fn new(firm: impl Into<String>) -> Self {
        Self {
            firm: firm.into(),
            ..Self::default()
        }
    }

    pub fn record(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Inserted => self.saved += 1,
            UpsertOutcome::Updated => self.updated += 1,
            UpsertOutcome::Unchanged => self.unchanged += 1,
        }
    }
}

/// Aggregate counts read back from a firm's table
#[derive(Debug, Clone, Default)]
pub struct FirmStatistics {
    pub total: i64,
    pub by_type: Vec<(String, i64)>,
    pub by_practice: Vec<(String, i64)>,
    pub recent: Vec<(Option<NaiveDate>, String)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn classify_respects_inclusive_bounds() {
        let range = DateRange::new(date(2024, 1, 1), date(2025, 12, 31));

        assert_eq!(range.classify(Some(date(2024, 1, 1))), DateVerdict::InRange);
        assert_eq!(range.classify(Some(date(2025, 12, 31))), DateVerdict::InRange);
        assert_eq!(range.classify(Some(date(2023, 12, 31))), DateVerdict::Stale);
        assert_eq!(range.classify(Some(date(2026, 1, 1))), DateVerdict::Future);
        assert_eq!(range.classify(None), DateVerdict::Undated);
    }

    #[test]
    fn link_hash_is_stable_md5_hex() {
        let publication = Publication {
            company: "Trilegal".to_string(),
            publication_type: "Update".to_string(),
            publication_date: None,
            practice_area: None,
            heading: "Heading".to_string(),
            link: "https://trilegal.com/knowledge_repository/a".to_string(),
        };

        let hash = publication.link_hash();
        assert_eq!(hash.len(), 32);
        assert_eq!(hash, publication.clone().link_hash());
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn summary_counts_outcomes() {
        let mut summary = FirmSummary::new("SAM");
        summary.record(UpsertOutcome::Inserted);
        summary.record(UpsertOutcome::Inserted);
        summary.record(UpsertOutcome::Updated);
        summary.record(UpsertOutcome::Unchanged);

        assert_eq!(summary.saved, 2);
        assert_eq!(summary.updated, 1);
        assert_eq!(summary.unchanged, 1);
    }
}
