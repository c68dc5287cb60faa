//! Data models for scraped candidates, normalized articles, and run reports.
//!
//! This module defines the core data structures used throughout the application:
//! - [`SourceId`]: The newsletter an article was attributed to
//! - [`RawCandidate`]: An unvalidated article link parsed out of a listing page
//! - [`ScrapeOutput`]: Everything one extractor produced during a run
//! - [`Article`]: The normalized, identified record handed to the sink
//! - [`RunSummary`] and [`RunOutcome`]: Diagnostics emitted at the end of a run
//!
//! [`Article`] uses camelCase field names to match the JSON artifact consumed
//! by the dashboard.

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// The newsletter sources this crate knows how to extract.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum SourceId {
    /// Ben's Bites archive (`bensbites.com`).
    #[value(name = "bens_bites")]
    BensBites,
    /// The AI Rundown homepage (`therundown.ai`).
    #[value(name = "ai_rundown")]
    AiRundown,
}

impl SourceId {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceId::BensBites => "bens_bites",
            SourceId::AiRundown => "ai_rundown",
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An article link as found on a listing page.
///
/// Candidates have no identity yet; they are consumed by the combiner in the
/// same run they were produced and never persisted on their own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCandidate {
    /// Visible anchor (or heading) text, whitespace-normalized.
    pub title: String,
    /// Best-effort teaser text found near the link.
    pub description: Option<String>,
    /// Absolute `https://` URL of the post.
    pub url: String,
    /// Machine-readable publish time exactly as the page exposed it.
    pub published_at: Option<String>,
    pub image_url: Option<String>,
    pub category: Option<String>,
}

impl RawCandidate {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            url: url.into(),
            published_at: None,
            image_url: None,
            category: None,
        }
    }
}

/// What a single extractor produced during a run.
#[derive(Debug, Clone)]
pub struct ScrapeOutput {
    /// The extractor that produced these candidates.
    pub source: SourceId,
    /// The run's logical timestamp, shared by every output of the run.
    pub scraped_at: DateTime<Utc>,
    /// Candidates in document order.
    pub candidates: Vec<RawCandidate>,
    /// Human-readable descriptions of network or parse failures.
    pub errors: Vec<String>,
}

impl ScrapeOutput {
    pub fn empty(source: SourceId, scraped_at: DateTime<Utc>) -> Self {
        Self {
            source,
            scraped_at,
            candidates: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Number of candidates the extractor found.
    pub fn found(&self) -> usize {
        self.candidates.len()
    }
}

/// A normalized, deduplicated article.
///
/// This is the unit written to `articles.json` and upserted into the sink.
/// Only `saved` and `saved_at` change after creation, and only downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    /// Assigned once by the combiner.
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    /// Unique within one run's output.
    pub url: String,
    pub source: SourceId,
    /// Publish time as exposed by the source, verbatim. May not parse.
    pub published_at: Option<String>,
    /// The run's logical timestamp.
    pub scraped_at: DateTime<Utc>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub saved: bool,
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
}

/// Per-source diagnostics in the run summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSummary {
    pub found: usize,
    pub errors: Vec<String>,
}

/// Diagnostic record written to `logs/` after every run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub timestamp: DateTime<Utc>,
    pub sources: BTreeMap<SourceId, SourceSummary>,
    pub total_combined: usize,
    pub total_filtered: usize,
    pub output_path: Option<String>,
}

/// Final result reported to whatever triggered the run.
///
/// A run with source-level errors is still `success: true`; only a fault in
/// the pipeline itself or a sink failure flips it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
    pub success: bool,
    pub timestamp: DateTime<Utc>,
    pub articles_count: usize,
    /// Number of output articles attributed to each source.
    pub sources: BTreeMap<SourceId, usize>,
    pub output_path: Option<String>,
    /// Rows acknowledged by the sink, when one is configured.
    pub upserted: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunOutcome {
    /// Outcome of a run that failed before any source was visited.
    pub fn aborted(timestamp: DateTime<Utc>, error: impl fmt::Display) -> Self {
        Self {
            success: false,
            timestamp,
            articles_count: 0,
            sources: BTreeMap::new(),
            output_path: None,
            upserted: None,
            error: Some(error.to_string()),
        }
    }

    /// Mark the run as failed with `error` as the reported message.
    pub fn fail(mut self, error: impl fmt::Display) -> Self {
        self.success = false;
        self.error = Some(error.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_article() -> Article {
        Article {
            id: Uuid::new_v4(),
            title: "Agents everywhere".to_string(),
            description: None,
            url: "https://www.bensbites.com/p/agents-everywhere".to_string(),
            source: SourceId::BensBites,
            published_at: None,
            scraped_at: Utc.with_ymd_and_hms(2026, 2, 8, 20, 0, 0).unwrap(),
            image_url: None,
            category: None,
            saved: false,
            saved_at: None,
        }
    }

    #[test]
    fn test_source_id_serialization() {
        assert_eq!(
            serde_json::to_string(&SourceId::BensBites).unwrap(),
            "\"bens_bites\""
        );
        assert_eq!(
            serde_json::from_str::<SourceId>("\"ai_rundown\"").unwrap(),
            SourceId::AiRundown
        );
        assert_eq!(SourceId::AiRundown.to_string(), "ai_rundown");
    }

    #[test]
    fn test_article_serializes_camel_case_with_nulls() {
        let json = serde_json::to_value(sample_article()).unwrap();
        let obj = json.as_object().unwrap();

        for key in [
            "id",
            "title",
            "description",
            "url",
            "source",
            "publishedAt",
            "scrapedAt",
            "imageUrl",
            "category",
            "saved",
            "savedAt",
        ] {
            assert!(obj.contains_key(key), "missing key {key}");
        }
        assert!(obj["description"].is_null());
        assert!(obj["savedAt"].is_null());
        assert_eq!(obj["saved"], serde_json::Value::Bool(false));
        assert_eq!(obj["source"], "bens_bites");
    }

    #[test]
    fn test_article_deserialization_defaults_saved_fields() {
        let json = r#"{
            "id": "6f2d0a2e-7d0b-4a53-9a51-9a0a3c1f2b11",
            "title": "Test",
            "description": null,
            "url": "https://www.therundown.ai/p/test",
            "source": "ai_rundown",
            "publishedAt": "2026-02-08T10:00:00Z",
            "scrapedAt": "2026-02-08T20:00:00Z",
            "imageUrl": null,
            "category": null
        }"#;

        let article: Article = serde_json::from_str(json).unwrap();
        assert_eq!(article.source, SourceId::AiRundown);
        assert!(!article.saved);
        assert_eq!(article.saved_at, None);
    }

    #[test]
    fn test_run_summary_uses_source_names_as_keys() {
        let mut sources = BTreeMap::new();
        sources.insert(
            SourceId::AiRundown,
            SourceSummary {
                found: 0,
                errors: vec!["Network error: timed out".to_string()],
            },
        );
        let summary = RunSummary {
            timestamp: Utc.with_ymd_and_hms(2026, 2, 8, 20, 0, 0).unwrap(),
            sources,
            total_combined: 0,
            total_filtered: 0,
            output_path: Some(".tmp/articles.json".to_string()),
        };

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["sources"]["ai_rundown"]["found"], 0);
        assert_eq!(
            json["sources"]["ai_rundown"]["errors"][0],
            "Network error: timed out"
        );
    }

    #[test]
    fn test_aborted_outcome_reports_error() {
        let ts = Utc.with_ymd_and_hms(2026, 2, 8, 20, 0, 0).unwrap();
        let json = serde_json::to_value(RunOutcome::aborted(ts, "bad config")).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["articles_count"], 0);
        assert_eq!(json["error"], "bad config");
        assert!(json["output_path"].is_null());
    }

    #[test]
    fn test_fail_keeps_counts() {
        let ts = Utc.with_ymd_and_hms(2026, 2, 8, 20, 0, 0).unwrap();
        let mut outcome = RunOutcome::aborted(ts, "x");
        outcome.success = true;
        outcome.error = None;
        outcome.articles_count = 4;

        let failed = outcome.fail("HTTP 401: denied");
        assert!(!failed.success);
        assert_eq!(failed.articles_count, 4);
        assert_eq!(failed.error.as_deref(), Some("HTTP 401: denied"));
        assert!(
            !serde_json::to_string(&RunOutcome {
                error: None,
                ..failed
            })
            .unwrap()
            .contains("\"error\"")
        );
    }

    #[test]
    fn test_scrape_output_found() {
        let mut out = ScrapeOutput::empty(SourceId::BensBites, Utc::now());
        assert_eq!(out.found(), 0);
        out.candidates
            .push(RawCandidate::new("Title", "https://www.bensbites.com/p/x"));
        assert_eq!(out.found(), 1);
    }
}
