//! Merging per-source candidates into one article list.
//!
//! Outputs are processed in invocation order and the first candidate seen
//! for a URL wins, so source order is the tie-break for cross-posted links.
//! Each surviving candidate gets a fresh identifier and the run timestamp.

use crate::config::SourceConfig;
use crate::freshness::parse_timestamp;
use crate::models::{Article, ScrapeOutput, SourceId};
use crate::scrapers::is_valid_title;
use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::collections::HashSet;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Attribute `url` to the first configured source whose domain it contains.
pub fn source_for_url(url: &str, sources: &[SourceConfig]) -> Option<SourceId> {
    sources
        .iter()
        .find(|s| url.contains(s.domain.as_str()))
        .map(|s| s.id)
}

/// Combine extractor outputs into deduplicated, identified articles, newest first.
///
/// Candidates with an empty URL, a title shorter than three characters, or a
/// URL already taken by an earlier candidate are dropped. `sources` drives
/// domain attribution; a URL matching no configured domain keeps the source
/// of the extractor that found it.
///
/// # Arguments
///
/// * `outputs` - Per-source outputs in invocation order; earlier outputs win
///   duplicate URLs
/// * `sources` - Configured sources, used for domain attribution
///
/// # Returns
///
/// Articles with fresh ids, sorted newest first by publish time, falling
/// back to scrape time.
#[instrument(level = "info", skip_all, fields(outputs = outputs.len()))]
pub fn combine_sources(outputs: &[ScrapeOutput], sources: &[SourceConfig]) -> Vec<Article> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut articles = Vec::new();
    let mut dropped = 0usize;

    for output in outputs {
        for candidate in &output.candidates {
            let url = candidate.url.trim();
            if url.is_empty() || !is_valid_title(&candidate.title) || !seen.insert(url) {
                dropped += 1;
                continue;
            }

            articles.push(Article {
                id: Uuid::new_v4(),
                title: candidate.title.trim().to_string(),
                description: candidate.description.clone(),
                url: url.to_string(),
                source: source_for_url(url, sources).unwrap_or(output.source),
                published_at: candidate.published_at.clone(),
                scraped_at: output.scraped_at,
                image_url: candidate.image_url.clone(),
                category: candidate.category.clone(),
                saved: false,
                saved_at: None,
            });
        }
    }

    debug!(dropped, "Dropped duplicate or invalid candidates");
    sort_newest_first(&mut articles);
    info!(count = articles.len(), "Combined sources");
    articles
}

/// Stable sort by publish time, descending. Articles without a parsable
/// publish time sort by their scrape time instead.
pub fn sort_newest_first(articles: &mut [Article]) {
    articles.sort_by_cached_key(|a| Reverse(sort_key(a)));
}

fn sort_key(article: &Article) -> DateTime<Utc> {
    article
        .published_at
        .as_deref()
        .and_then(parse_timestamp)
        .unwrap_or(article.scraped_at)
}
