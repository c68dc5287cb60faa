//! Trailing-window freshness filter.
//!
//! An article is kept when its publish time (or, lacking one, its scrape
//! time) falls within the window ending at `now`. The filter fails open: an
//! article whose recency cannot be determined is kept.

use crate::models::Article;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::{debug, info, instrument, warn};

/// Parse the timestamp formats seen in listing pages.
///
/// Accepts RFC 3339, naive ISO-8601 date-times (taken as UTC) and bare
/// `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    None
}

/// Whether an item with these timestamps is recent relative to `cutoff`.
///
/// `published_at` takes precedence over `scraped_at`. Missing or unparsable
/// timestamps count as recent.
pub fn is_recent(
    published_at: Option<&str>,
    scraped_at: Option<&str>,
    cutoff: DateTime<Utc>,
) -> bool {
    let Some(raw) = published_at.or(scraped_at) else {
        return true;
    };
    match parse_timestamp(raw) {
        Some(ts) => ts >= cutoff,
        None => {
            debug!(timestamp = raw, "Unparsable timestamp; keeping article");
            true
        }
    }
}

/// Keep the articles from the trailing `window` ending at `now`.
///
/// # Arguments
///
/// * `articles` - Combined articles, in output order
/// * `now` - End of the window, normally the run timestamp
/// * `window` - Length of the window
///
/// # Returns
///
/// The recent articles in their original order. A window reaching back past
/// the earliest representable instant keeps everything.
#[instrument(level = "info", skip(articles), fields(total = articles.len()))]
pub fn filter_recent(
    articles: Vec<Article>,
    now: DateTime<Utc>,
    window: chrono::Duration,
) -> Vec<Article> {
    let Some(cutoff) = now.checked_sub_signed(window) else {
        warn!(%window, "Window start out of range; keeping every article");
        return articles;
    };
    let total = articles.len();

    let recent: Vec<Article> = articles
        .into_iter()
        .filter(|a| {
            let scraped_at = a.scraped_at.to_rfc3339();
            is_recent(a.published_at.as_deref(), Some(scraped_at.as_str()), cutoff)
        })
        .collect();

    info!(
        kept = recent.len(),
        dropped = total - recent.len(),
        %cutoff,
        "Applied freshness window"
    );
    recent
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceId;
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 8, 20, 0, 0).unwrap()
    }

    fn article(published_at: Option<String>, scraped_at: DateTime<Utc>) -> Article {
        Article {
            id: Uuid::new_v4(),
            title: "Title".to_string(),
            description: None,
            url: format!("https://www.therundown.ai/p/{}", Uuid::new_v4()),
            source: SourceId::AiRundown,
            published_at,
            scraped_at,
            image_url: None,
            category: None,
            saved: false,
            saved_at: None,
        }
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2026, 2, 8, 9, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2026-02-08T09:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2026-02-08T10:30:00+01:00"), Some(expected));
        assert_eq!(parse_timestamp("2026-02-08T09:30:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2026-02-08T09:30:00.000123"),
            Some(expected + Duration::microseconds(123))
        );
        assert_eq!(
            parse_timestamp("2026-02-08"),
            Some(Utc.with_ymd_and_hms(2026, 2, 8, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp("not-a-date"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn test_published_48h_ago_is_excluded() {
        let published = (now() - Duration::hours(48)).to_rfc3339();
        let kept = filter_recent(
            vec![article(Some(published), now())],
            now(),
            Duration::hours(24),
        );
        assert!(kept.is_empty());
    }

    #[test]
    fn test_missing_published_falls_back_to_scraped() {
        let recent = article(None, now() - Duration::hours(1));
        let stale = article(None, now() - Duration::hours(30));
        let kept = filter_recent(vec![recent.clone(), stale], now(), Duration::hours(24));
        assert_eq!(kept, vec![recent]);
    }

    #[test]
    fn test_published_takes_precedence_over_scraped() {
        // Recently scraped, but published long ago.
        let old = article(Some("2025-01-01T00:00:00Z".to_string()), now());
        assert!(filter_recent(vec![old], now(), Duration::hours(24)).is_empty());
    }

    #[test]
    fn test_both_timestamps_absent_is_kept() {
        let cutoff = now() - Duration::hours(24);
        assert!(is_recent(None, None, cutoff));
    }

    #[test]
    fn test_unparsable_published_is_kept() {
        let a = article(Some("not-a-date".to_string()), now() - Duration::days(30));
        let kept = filter_recent(vec![a.clone()], now(), Duration::hours(24));
        assert_eq!(kept, vec![a]);
    }

    #[test]
    fn test_cutoff_is_inclusive() {
        let cutoff = now() - Duration::hours(24);
        assert!(is_recent(Some(cutoff.to_rfc3339().as_str()), None, cutoff));
        let just_before = (cutoff - Duration::seconds(1)).to_rfc3339();
        assert!(!is_recent(Some(just_before.as_str()), None, cutoff));
    }

    #[test]
    fn test_filter_preserves_order() {
        let a = article(None, now());
        let b = article(Some((now() - Duration::hours(2)).to_rfc3339()), now());
        let c = article(None, now() - Duration::minutes(5));
        let kept = filter_recent(
            vec![a.clone(), b.clone(), c.clone()],
            now(),
            Duration::hours(24),
        );
        assert_eq!(kept, vec![a, b, c]);
    }

    #[test]
    fn test_window_past_earliest_instant_keeps_everything() {
        let old = article(Some("1970-01-01T00:00:00Z".to_string()), now());
        let kept = filter_recent(vec![old.clone()], now(), chrono::TimeDelta::MAX);
        assert_eq!(kept, vec![old]);
    }
}
