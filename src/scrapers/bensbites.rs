//! Ben's Bites archive extractor.
//!
//! The [archive page](https://www.bensbites.com/archive) lists every issue as
//! a link to `/p/<slug>`, usually followed by a one-line teaser element. The
//! archive carries no dates, so `published_at` is only set when a `<time>`
//! element happens to sit in the link's container.

use super::{
    Extractor, base_url, collect_candidates, element_text, first_image, is_valid_title,
    nearest_container, published_time,
};
use crate::config::SourceConfig;
use crate::error::ScrapeError;
use crate::models::RawCandidate;
use scraper::{ElementRef, Html};
use tracing::{debug, instrument};

#[derive(Debug, Clone)]
pub struct BensBitesExtractor {
    config: SourceConfig,
}

impl BensBitesExtractor {
    pub fn new(config: SourceConfig) -> Self {
        Self { config }
    }
}

impl Default for BensBitesExtractor {
    fn default() -> Self {
        Self::new(SourceConfig::bens_bites())
    }
}

impl Extractor for BensBitesExtractor {
    fn config(&self) -> &SourceConfig {
        &self.config
    }

    #[instrument(level = "debug", skip_all)]
    fn extract(&self, html: &str) -> Result<Vec<RawCandidate>, ScrapeError> {
        let base = base_url(&self.config)?;
        let document = Html::parse_document(html);

        let candidates =
            collect_candidates(document.root_element(), &self.config, &base, |anchor, url| {
                let title = element_text(anchor);
                if !is_valid_title(&title) {
                    return None;
                }

                let description = teaser(anchor).filter(|d| *d != title);
                let container = nearest_container(anchor);

                Some(RawCandidate {
                    description,
                    published_at: container.and_then(published_time),
                    image_url: container.and_then(first_image),
                    ..RawCandidate::new(title, url)
                })
            });

        debug!(count = candidates.len(), "Parsed Ben's Bites archive");
        Ok(candidates)
    }
}

/// Text of the link's next element sibling when it is a `p` or `div`.
fn teaser(anchor: ElementRef<'_>) -> Option<String> {
    anchor
        .next_siblings()
        .find_map(ElementRef::wrap)
        .filter(|el| matches!(el.value().name(), "p" | "div"))
        .map(element_text)
        .filter(|text| !text.is_empty())
}
