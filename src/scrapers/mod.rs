//! Newsletter listing extractors.
//!
//! Each source gets one [`Extractor`] implementation that turns the listing
//! page's HTML into [`RawCandidate`]s. Sources share a structural signature:
//! article links carry a fixed path marker (`/p/`) and everything else on the
//! page is navigation.
//!
//! # Supported Sources
//!
//! | Source | Module | Listing page | Notes |
//! |--------|--------|--------------|-------|
//! | Ben's Bites | [`bensbites`] | `/archive` | Teaser is the link's next sibling |
//! | The AI Rundown | [`rundown`] | homepage | Scoped to the "Latest" section when present |
//!
//! # Common Patterns
//!
//! - Relative links are resolved against the source's base URL; anything that
//!   does not end up `https://` is skipped.
//! - A URL is emitted at most once per document.
//! - Titles shorter than three characters are treated as noise.
//! - Description, image and publish time are best-effort and looked up in the
//!   nearest enclosing `div` or `article`.
//!
//! [`scrape_source`] wraps fetching, extraction and the post-fetch delay, and
//! never fails: errors are recorded on the returned [`ScrapeOutput`].

use crate::config::SourceConfig;
use crate::error::ScrapeError;
use crate::fetch::FetchDocument;
use crate::models::{RawCandidate, ScrapeOutput, SourceId};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, error, info, instrument};
use url::Url;

pub mod bensbites;
pub mod rundown;

pub use bensbites::BensBitesExtractor;
pub use rundown::RundownExtractor;

/// Titles with fewer characters than this are icon links or similar noise.
pub const MIN_TITLE_CHARS: usize = 3;

static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());
static IMAGE: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());
static TIME: Lazy<Selector> = Lazy::new(|| Selector::parse("time[datetime]").unwrap());

/// Extract article candidates from one source's listing page.
pub trait Extractor: Send + Sync {
    fn config(&self) -> &SourceConfig;

    fn source(&self) -> SourceId {
        self.config().id
    }

    /// Parse `html` into candidates, in document order.
    ///
    /// A page without matching links yields an empty list, not an error.
    fn extract(&self, html: &str) -> Result<Vec<RawCandidate>, ScrapeError>;
}

/// Build the extractor matching `config.id`.
pub fn extractor_for(config: SourceConfig) -> Box<dyn Extractor> {
    match config.id {
        SourceId::BensBites => Box::new(BensBitesExtractor::new(config)),
        SourceId::AiRundown => Box::new(RundownExtractor::new(config)),
    }
}

/// Fetch the listing page for `extractor`, extract candidates, then wait
/// `delay` before returning.
///
/// The delay only follows a successful fetch-and-parse. Failures are stored
/// in [`ScrapeOutput::errors`] alongside an empty candidate list.
///
/// # Arguments
///
/// * `extractor` - The source to scrape
/// * `fetcher` - Supplies the listing page HTML
/// * `scraped_at` - The run's logical timestamp
/// * `delay` - Pause after a successful fetch
///
/// # Returns
///
/// A [`ScrapeOutput`]; this never fails.
#[instrument(level = "info", skip_all, fields(source = %extractor.source()))]
pub async fn scrape_source<F: FetchDocument>(
    extractor: &dyn Extractor,
    fetcher: &F,
    scraped_at: DateTime<Utc>,
    delay: Duration,
) -> ScrapeOutput {
    let mut output = ScrapeOutput::empty(extractor.source(), scraped_at);
    let listing_url = &extractor.config().listing_url;

    let html = match fetcher.fetch(listing_url).await {
        Ok(html) => html,
        Err(e) => {
            error!(error = %e, url = %listing_url, "Listing fetch failed");
            output.errors.push(e.to_string());
            return output;
        }
    };

    match extractor.extract(&html) {
        Ok(candidates) => output.candidates = candidates,
        Err(e) => {
            error!(error = %e, url = %listing_url, "Listing parse failed");
            output.errors.push(e.to_string());
            return output;
        }
    }

    info!(count = output.found(), url = %listing_url, "Extracted article candidates");

    if !delay.is_zero() {
        debug!(?delay, "Rate limiting before next request");
        tokio::time::sleep(delay).await;
    }
    output
}

pub(crate) fn base_url(config: &SourceConfig) -> Result<Url, ScrapeError> {
    Url::parse(&config.base_url)
        .map_err(|e| ScrapeError::Parse(format!("invalid base URL {}: {}", config.base_url, e)))
}

/// Walk every article link under `scope` and let `build` turn it into a
/// candidate.
///
/// `build` receives the anchor and its resolved URL and returns `None` to
/// reject it. A URL is only marked as seen once a candidate is emitted for
/// it, so an icon-only link does not shadow a titled link to the same post.
pub(crate) fn collect_candidates<'a, F>(
    scope: ElementRef<'a>,
    config: &SourceConfig,
    base: &Url,
    mut build: F,
) -> Vec<RawCandidate>
where
    F: FnMut(ElementRef<'a>, String) -> Option<RawCandidate>,
{
    let mut seen: HashSet<String> = HashSet::new();
    let mut candidates = Vec::new();

    for anchor in scope.select(&ANCHOR) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if !href.contains(config.path_marker.as_str()) {
            continue;
        }
        let Some(url) = resolve(base, href) else {
            continue;
        };
        if seen.contains(&url) {
            continue;
        }
        if let Some(candidate) = build(anchor, url.clone()) {
            seen.insert(url);
            candidates.push(candidate);
        }
    }
    candidates
}

/// Resolve `href` against `base`, keeping only `https://` results.
pub(crate) fn resolve(base: &Url, href: &str) -> Option<String> {
    let resolved = base.join(href.trim()).ok()?.to_string();
    resolved.starts_with("https://").then_some(resolved)
}

/// Visible text of `el` with runs of whitespace collapsed and ends trimmed.
pub(crate) fn element_text(el: ElementRef<'_>) -> String {
    normalize_whitespace(&el.text().collect::<String>())
}

pub(crate) fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub(crate) fn is_valid_title(title: &str) -> bool {
    title.trim().chars().count() >= MIN_TITLE_CHARS
}

/// Nearest ancestor `div` or `article`.
pub(crate) fn nearest_container<'a>(el: ElementRef<'a>) -> Option<ElementRef<'a>> {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|e| matches!(e.value().name(), "div" | "article"))
}

/// `src` of the first image inside `container`.
pub(crate) fn first_image(container: ElementRef<'_>) -> Option<String> {
    container
        .select(&IMAGE)
        .next()
        .and_then(|img| img.value().attr("src"))
        .map(str::trim)
        .filter(|src| !src.is_empty())
        .map(String::from)
}

/// `datetime` attribute of the first `<time datetime>` inside `container`, verbatim.
pub(crate) fn published_time(container: ElementRef<'_>) -> Option<String> {
    container
        .select(&TIME)
        .next()
        .and_then(|t| t.value().attr("datetime"))
        .filter(|dt| !dt.trim().is_empty())
        .map(String::from)
}
