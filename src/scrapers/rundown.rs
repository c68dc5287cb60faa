//! The AI Rundown homepage extractor.
//!
//! The [homepage](https://www.therundown.ai) links posts under `/p/<slug>`,
//! typically as an `<h3>` inside a card together with a teaser paragraph,
//! a cover image and a `<time>` element. Only the "Latest" section is
//! scanned when the page has one, so pinned and footer links stay out.

use super::{
    Extractor, base_url, collect_candidates, element_text, first_image, is_valid_title,
    nearest_container, published_time,
};
use crate::config::SourceConfig;
use crate::error::ScrapeError;
use crate::models::RawCandidate;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};

/// Teasers this short are bylines, read times and similar boilerplate.
const MIN_DESCRIPTION_CHARS: usize = 20;

static HEADING: Lazy<Selector> = Lazy::new(|| Selector::parse("h2, h3, h4").unwrap());
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());

#[derive(Debug, Clone)]
pub struct RundownExtractor {
    config: SourceConfig,
}

impl RundownExtractor {
    pub fn new(config: SourceConfig) -> Self {
        Self { config }
    }
}

impl Default for RundownExtractor {
    fn default() -> Self {
        Self::new(SourceConfig::ai_rundown())
    }
}

impl Extractor for RundownExtractor {
    fn config(&self) -> &SourceConfig {
        &self.config
    }

    #[instrument(level = "debug", skip_all)]
    fn extract(&self, html: &str) -> Result<Vec<RawCandidate>, ScrapeError> {
        let base = base_url(&self.config)?;
        let document = Html::parse_document(html);

        let scope = match latest_section(&document) {
            Some(section) => {
                debug!("Scoping extraction to the latest-articles section");
                section
            }
            None => document.root_element(),
        };

        let candidates = collect_candidates(scope, &self.config, &base, |anchor, url| {
            let title = enclosing_h3(anchor)
                .map(element_text)
                .unwrap_or_else(|| element_text(anchor));
            if !is_valid_title(&title) {
                return None;
            }

            let container = nearest_container(anchor);
            let description = container
                .and_then(|c| c.select(&PARAGRAPH).next())
                .map(element_text)
                .filter(|d| *d != title && d.chars().count() > MIN_DESCRIPTION_CHARS);

            Some(RawCandidate {
                description,
                published_at: container.and_then(published_time),
                image_url: container.and_then(first_image),
                ..RawCandidate::new(title, url)
            })
        });

        debug!(count = candidates.len(), "Parsed AI Rundown homepage");
        Ok(candidates)
    }
}

/// Parent of the first `h2`/`h3`/`h4` mentioning "latest".
fn latest_section(document: &Html) -> Option<ElementRef<'_>> {
    document
        .select(&HEADING)
        .find(|h| element_text(*h).to_lowercase().contains("latest"))
        .and_then(|h| h.parent())
        .and_then(ElementRef::wrap)
}

fn enclosing_h3<'a>(anchor: ElementRef<'a>) -> Option<ElementRef<'a>> {
    anchor
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == "h3")
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOMEPAGE: &str = r#"
<html><body>
  <header>
    <a href="/p/pinned-welcome-post">Welcome to the Rundown</a>
  </header>
  <section>
    <h2>Latest Articles</h2>
    <article>
      <h3><a href="/p/openai-ships">OpenAI ships</a> a new model</h3>
      <p>3 min read</p>
      <time datetime="2026-02-08T09:30:00Z">Feb 8</time>
      <img src="https://cdn.therundown.ai/openai.png">
    </article>
    <div class="card">
      <a href="https://www.therundown.ai/p/robots">Robots are coming to the warehouse</a>
      <p>A deep dive into warehouse automation and what it means for jobs.</p>
    </div>
    <div class="card">
      <a href="/p/robots">Robots are coming to the warehouse</a>
    </div>
  </section>
</body></html>
"#;

    fn extract(html: &str) -> Vec<RawCandidate> {
        RundownExtractor::default().extract(html).unwrap()
    }

    #[test]
    fn test_latest_section_scopes_extraction() {
        let urls: Vec<_> = extract(HOMEPAGE).into_iter().map(|c| c.url).collect();
        assert_eq!(
            urls,
            vec![
                "https://www.therundown.ai/p/openai-ships",
                "https://www.therundown.ai/p/robots",
            ]
        );
    }

    #[test]
    fn test_h3_text_wins_over_anchor_text() {
        let first = extract(HOMEPAGE).remove(0);
        assert_eq!(first.title, "OpenAI ships a new model");
        assert_eq!(first.published_at.as_deref(), Some("2026-02-08T09:30:00Z"));
        assert_eq!(
            first.image_url.as_deref(),
            Some("https://cdn.therundown.ai/openai.png")
        );
    }

    #[test]
    fn test_short_first_paragraph_is_not_a_description() {
        let first = extract(HOMEPAGE).remove(0);
        assert_eq!(first.description, None);
    }

    #[test]
    fn test_card_paragraph_is_description() {
        let robots = extract(HOMEPAGE).remove(1);
        assert_eq!(robots.title, "Robots are coming to the warehouse");
        assert_eq!(
            robots.description.as_deref(),
            Some("A deep dive into warehouse automation and what it means for jobs.")
        );
        assert_eq!(robots.published_at, None);
        assert_eq!(robots.image_url, None);
    }

    #[test]
    fn test_without_latest_heading_whole_page_is_scanned() {
        let html = r#"<html><body>
            <header><a href="/p/pinned-welcome-post">Welcome to the Rundown</a></header>
            <div><a href="/p/robots">Robots are coming to the warehouse</a></div>
        </body></html>"#;
        let urls: Vec<_> = extract(html).into_iter().map(|c| c.url).collect();
        assert_eq!(
            urls,
            vec![
                "https://www.therundown.ai/p/pinned-welcome-post",
                "https://www.therundown.ai/p/robots",
            ]
        );
    }

    #[test]
    fn test_unparsable_time_is_still_kept_verbatim() {
        let html = r#"<div>
            <a href="/p/odd-date">Odd date format</a>
            <time datetime="yesterday-ish">yesterday</time>
        </div>"#;
        assert_eq!(
            extract(html)[0].published_at.as_deref(),
            Some("yesterday-ish")
        );
    }
}
