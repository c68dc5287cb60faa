//! Run orchestration: extract, combine, filter, persist.
//!
//! The pipeline follows a fixed sequence:
//! 1. **Extraction**: Each configured source is fetched and parsed, one at a
//!    time, in configuration order
//! 2. **Combination**: Candidates are merged, deduplicated by URL and given ids
//! 3. **Filtering**: Articles outside the freshness window are dropped
//! 4. **Output**: `articles.json` and a run summary are written, then the
//!    articles are handed to the sink when one is configured
//!
//! Source-level errors never fail a run. Output or sink failures produce a
//! failed [`RunOutcome`]; an artifact that was already written stays on disk.

use crate::combine::combine_sources;
use crate::config::{AppConfig, SourceConfig};
use crate::error::PipelineError;
use crate::fetch::FetchDocument;
use crate::freshness::filter_recent;
use crate::models::{Article, RunOutcome, RunSummary, ScrapeOutput, SourceId, SourceSummary};
use crate::outputs::json;
use crate::scrapers::{Extractor, extractor_for, scrape_source};
use crate::supabase::ArticleSink;
use crate::utils::ensure_writable_dir;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, instrument, warn};

/// Everything a run produced before anything was written.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_at: DateTime<Utc>,
    /// Per-source outputs in invocation order.
    pub outputs: Vec<ScrapeOutput>,
    /// Article count after combination, before filtering.
    pub total_combined: usize,
    /// Articles that survived the freshness window.
    pub articles: Vec<Article>,
}

impl RunReport {
    pub fn summary(&self, output_path: Option<&Path>) -> RunSummary {
        let sources = self
            .outputs
            .iter()
            .map(|o| {
                (
                    o.source,
                    SourceSummary {
                        found: o.found(),
                        errors: o.errors.clone(),
                    },
                )
            })
            .collect();

        RunSummary {
            timestamp: self.run_at,
            sources,
            total_combined: self.total_combined,
            total_filtered: self.articles.len(),
            output_path: output_path.map(|p| p.display().to_string()),
        }
    }

    /// Output articles per attributed source. Every invoked source is listed,
    /// including those that contributed nothing.
    pub fn source_counts(&self) -> BTreeMap<SourceId, usize> {
        let mut counts: BTreeMap<SourceId, usize> =
            self.outputs.iter().map(|o| (o.source, 0)).collect();
        for (source, n) in self.articles.iter().map(|a| a.source).counts() {
            counts.insert(source, n);
        }
        counts
    }

    fn outcome(&self) -> RunOutcome {
        RunOutcome {
            success: true,
            timestamp: self.run_at,
            articles_count: self.articles.len(),
            sources: self.source_counts(),
            output_path: None,
            upserted: None,
            error: None,
        }
    }
}

/// Configured extractors plus the fetcher they share.
pub struct Pipeline<F> {
    fetcher: F,
    extractors: Vec<Box<dyn Extractor>>,
    sources: Vec<SourceConfig>,
    delay: Duration,
    window: chrono::Duration,
}

impl<F: FetchDocument> Pipeline<F> {
    /// Build the extractors for `config.sources`, in order.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] when the freshness window is invalid.
    pub fn new(fetcher: F, config: &AppConfig) -> Result<Self, PipelineError> {
        Ok(Self {
            fetcher,
            extractors: config.sources.iter().cloned().map(extractor_for).collect(),
            sources: config.sources.clone(),
            delay: config.settings.delay(),
            window: config.settings.window()?,
        })
    }

    /// Run every extractor, strictly one after another.
    #[instrument(level = "info", skip(self))]
    pub async fn extract_all(&self, run_at: DateTime<Utc>) -> Vec<ScrapeOutput> {
        let outputs: Vec<ScrapeOutput> = stream::iter(self.extractors.iter())
            .then(|extractor| {
                scrape_source(extractor.as_ref(), &self.fetcher, run_at, self.delay)
            })
            .collect()
            .await;

        for output in &outputs {
            if output.errors.is_empty() {
                info!(source = %output.source, found = output.found(), "Source scraped");
            } else {
                warn!(
                    source = %output.source,
                    found = output.found(),
                    errors = ?output.errors,
                    "Source scraped with errors"
                );
            }
        }
        outputs
    }

    /// Extract, combine and filter, using `run_at` both as the articles'
    /// scrape time and as the end of the freshness window.
    #[instrument(level = "info", skip(self))]
    pub async fn run(&self, run_at: DateTime<Utc>) -> RunReport {
        let outputs = self.extract_all(run_at).await;

        let combined = combine_sources(&outputs, &self.sources);
        let total_combined = combined.len();
        let articles = filter_recent(combined, run_at, self.window);

        info!(
            total_combined,
            total_filtered = articles.len(),
            "Pipeline run complete"
        );
        RunReport {
            run_at,
            outputs,
            total_combined,
            articles,
        }
    }
}

/// Write `articles.json` and the run summary under `output_dir`.
///
/// The previous `articles.json` is only replaced after the summary has been
/// written; on any failure it is left as it was.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display()))]
pub async fn write_artifacts(
    report: &RunReport,
    output_dir: &Path,
) -> Result<PathBuf, PipelineError> {
    ensure_writable_dir(output_dir).await?;
    let staged = json::stage_articles(&report.articles, output_dir).await?;
    let articles_path = output_dir.join(json::ARTICLES_FILE);

    if let Err(e) = json::write_summary(&report.summary(Some(&articles_path)), output_dir).await {
        staged.discard().await;
        return Err(e);
    }
    staged.commit().await
}

/// Run the full pipeline and report the outcome.
///
/// # Arguments
///
/// * `pipeline` - Configured extractors and fetcher
/// * `output_dir` - Directory for `articles.json` and `logs/`
/// * `sink` - Optional; without one the run ends after the artifacts are written
/// * `run_at` - The run's logical timestamp
///
/// # Returns
///
/// A [`RunOutcome`]. Artifact or sink failures are reported in it rather
/// than returned as errors.
#[instrument(level = "info", skip_all, fields(%run_at))]
pub async fn execute<F, S>(
    pipeline: &Pipeline<F>,
    output_dir: &Path,
    sink: Option<&S>,
    run_at: DateTime<Utc>,
) -> RunOutcome
where
    F: FetchDocument,
    S: ArticleSink,
{
    let report = pipeline.run(run_at).await;
    let mut outcome = report.outcome();

    match write_artifacts(&report, output_dir).await {
        Ok(path) => outcome.output_path = Some(path.display().to_string()),
        Err(e) => {
            error!(error = %e, "Failed to write run artifacts");
            return outcome.fail(e);
        }
    }

    if let Some(sink) = sink {
        match sink.upsert(&report.articles).await {
            Ok(count) => outcome.upserted = Some(count),
            Err(e) => {
                error!(error = %e, "Sink rejected articles; local artifact kept");
                return outcome.fail(PipelineError::Sink(e));
            }
        }
    }

    outcome
}

/// Upload a previously written `articles.json` through `sink`.
#[instrument(level = "info", skip(sink))]
pub async fn upload_file<S: ArticleSink>(
    path: &Path,
    sink: &S,
) -> Result<usize, PipelineError> {
    let articles = json::read_articles(path).await?;
    let count = sink.upsert(&articles).await?;
    info!(count, "Uploaded articles");
    Ok(count)
}
