//! JSON artifacts written at the end of a run.
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── articles.json                         # filtered articles, newest first
//! └── logs/
//!     └── scrape_2026-02-08_20-00-00.log    # run summary
//! ```
//!
//! `articles.json` is staged and only replaced once the run summary is on
//! disk; summaries accumulate.

use crate::error::PipelineError;
use crate::models::{Article, RunSummary};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, error, info, instrument, warn};

pub const ARTICLES_FILE: &str = "articles.json";
pub const LOG_DIR: &str = "logs";

/// An article list written next to its final location but not yet in place.
///
/// The previous `articles.json` stays untouched until [`commit`](Self::commit).
#[derive(Debug)]
pub struct StagedArticles {
    staged: PathBuf,
    target: PathBuf,
}

impl StagedArticles {
    /// Replace `articles.json` with the staged file.
    ///
    /// # Returns
    ///
    /// The final path.
    pub async fn commit(self) -> Result<PathBuf, PipelineError> {
        fs::rename(&self.staged, &self.target).await?;
        info!(path = %self.target.display(), "Wrote articles JSON");
        Ok(self.target)
    }

    /// Remove the staged file, leaving `articles.json` as it was.
    pub async fn discard(self) {
        if let Err(e) = fs::remove_file(&self.staged).await {
            warn!(path = %self.staged.display(), error = %e, "Failed to remove staged articles");
        }
    }
}

/// Write `articles` as a pretty-printed JSON array to a staging file in
/// `output_dir`.
///
/// # Arguments
///
/// * `articles` - Articles in output order
/// * `output_dir` - Directory that will hold `articles.json`
///
/// # Returns
///
/// A [`StagedArticles`] to commit once everything else for the run is written.
#[instrument(
    level = "info",
    skip_all,
    fields(output_dir = %output_dir.display(), count = articles.len())
)]
pub async fn stage_articles(
    articles: &[Article],
    output_dir: &Path,
) -> Result<StagedArticles, PipelineError> {
    let json = serde_json::to_string_pretty(articles)?;

    if let Err(e) = fs::create_dir_all(output_dir).await {
        error!(error = %e, "Failed to create output dir");
        return Err(e.into());
    }

    let staged = output_dir.join(format!("{ARTICLES_FILE}.tmp"));
    fs::write(&staged, json).await?;
    debug!(path = %staged.display(), "Staged articles JSON");
    Ok(StagedArticles {
        staged,
        target: output_dir.join(ARTICLES_FILE),
    })
}

/// Read a previously written `articles.json`.
#[instrument(level = "info")]
pub async fn read_articles(path: &Path) -> Result<Vec<Article>, PipelineError> {
    let json = fs::read_to_string(path).await?;
    let articles: Vec<Article> = serde_json::from_str(&json)?;
    info!(count = articles.len(), "Read articles JSON");
    Ok(articles)
}

/// Write the run summary to `{output_dir}/logs/scrape_{timestamp}.log`.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display()))]
pub async fn write_summary(
    summary: &RunSummary,
    output_dir: &Path,
) -> Result<PathBuf, PipelineError> {
    let json = serde_json::to_string_pretty(summary)?;

    let log_dir = output_dir.join(LOG_DIR);
    if let Err(e) = fs::create_dir_all(&log_dir).await {
        error!(log_dir = %log_dir.display(), error = %e, "Failed to create log dir");
        return Err(e.into());
    }

    let filename = format!(
        "scrape_{}.log",
        summary.timestamp.format("%Y-%m-%d_%H-%M-%S")
    );
    let path = log_dir.join(filename);
    fs::write(&path, json).await?;
    info!(path = %path.display(), "Wrote run summary");
    Ok(path)
}
