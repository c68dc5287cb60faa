//! # Newsletter Digest
//!
//! A scraping pipeline that collects article links from AI newsletter
//! listing pages, merges and deduplicates them, keeps only the last day's
//! worth, and hands the result to Supabase.
//!
//! ## Features
//!
//! - Extracts article candidates from Ben's Bites and The AI Rundown
//! - Deduplicates by URL across sources (the first source to report a URL wins)
//! - Drops articles older than the freshness window, keeping undated ones
//! - Writes `articles.json` plus a per-run summary under `logs/`
//! - Optionally upserts the articles into a Supabase `articles` table
//! - Bookmarks articles in Supabase and lists bookmarks
//!
//! ## Usage
//!
//! ```sh
//! newsletter_digest scrape -o .tmp --upload
//! newsletter_digest latest --source ai_rundown --limit 20
//! ```
//!
//! ## Architecture
//!
//! 1. **Extraction**: Fetch each listing page in turn and parse candidates
//! 2. **Combination**: Merge candidates, deduplicate by URL, assign ids
//! 3. **Filtering**: Keep articles inside the freshness window
//! 4. **Output**: Write JSON artifacts, then upsert into the sink
//!
//! The run outcome is printed to stdout as JSON; logs go to stderr.

use chrono::Utc;
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod combine;
mod config;
mod error;
mod fetch;
mod freshness;
mod models;
mod outputs;
mod pipeline;
mod scrapers;
mod supabase;
mod utils;

use cli::{Cli, Command, LatestArgs, SaveArgs, SavedArgs, ScrapeArgs, UploadArgs};
use config::load_config;
use error::{PipelineError, SinkError};
use fetch::HttpFetcher;
use models::RunOutcome;
use outputs::json;
use pipeline::{Pipeline, execute, upload_file};
use supabase::{NewBookmark, SupabaseClient, latest_articles};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    let start_time = std::time::Instant::now();
    info!("newsletter_digest starting up");

    let args = Cli::parse();
    debug!(command = ?args.command, config = ?args.config, "Parsed CLI arguments");

    let succeeded = match &args.command {
        Command::Scrape(scrape) => {
            let outcome = run_scrape(&args, scrape).await;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            outcome.success
        }
        Command::Upload(upload) => {
            run_upload(&args, upload).await?;
            true
        }
        Command::Latest(latest) => {
            run_latest(&args, latest).await?;
            true
        }
        Command::Save(save) => {
            run_save(&args, save).await?;
            true
        }
        Command::Saved(saved) => {
            run_saved(&args, saved).await?;
            true
        }
    };

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        succeeded,
        "Execution complete"
    );

    if !succeeded {
        std::process::exit(1);
    }
    Ok(())
}

/// Build a Supabase client when both credentials are present.
fn supabase_client(args: &Cli) -> Result<Option<SupabaseClient>, SinkError> {
    match (&args.supabase_url, &args.supabase_key) {
        (Some(url), Some(key)) => SupabaseClient::new(url, key).map(Some),
        (None, None) => Ok(None),
        _ => Err(SinkError::Config(
            "SUPABASE_URL and SUPABASE_ANON_KEY must be set together".to_string(),
        )),
    }
}

fn require_supabase(args: &Cli) -> Result<SupabaseClient, SinkError> {
    supabase_client(args)?.ok_or_else(|| {
        SinkError::Config("SUPABASE_URL and SUPABASE_ANON_KEY are required".to_string())
    })
}

async fn prepare_scrape(
    args: &Cli,
    scrape: &ScrapeArgs,
) -> Result<(Pipeline<HttpFetcher>, Option<SupabaseClient>), PipelineError> {
    let mut config = load_config(args.config.as_deref()).await?;
    if let Some(hours) = scrape.window_hours {
        config.settings.window_hours = hours;
    }
    config.settings.window()?;

    let sink = if scrape.upload {
        Some(require_supabase(args)?)
    } else {
        None
    };

    let fetcher = HttpFetcher::new(config.settings.timeout(), &config.settings.user_agent)
        .map_err(|e| PipelineError::Config(e.to_string()))?;

    info!(
        sources = config.sources.len(),
        window_hours = config.settings.window_hours,
        upload = sink.is_some(),
        "Scrape configured"
    );
    Ok((Pipeline::new(fetcher, &config)?, sink))
}

async fn run_scrape(args: &Cli, scrape: &ScrapeArgs) -> RunOutcome {
    let run_at = Utc::now();
    match prepare_scrape(args, scrape).await {
        Ok((pipeline, sink)) => execute(&pipeline, &scrape.output_dir, sink.as_ref(), run_at).await,
        Err(e) => {
            error!(error = %e, "Scrape could not start");
            RunOutcome::aborted(run_at, e)
        }
    }
}

async fn run_upload(args: &Cli, upload: &UploadArgs) -> Result<(), Box<dyn Error>> {
    let client = require_supabase(args)?;
    let count = upload_file(&upload.input, &client).await?;
    let report = serde_json::json!({ "success": true, "upserted": count });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn run_latest(args: &Cli, latest: &LatestArgs) -> Result<(), Box<dyn Error>> {
    if latest.remote {
        let client = require_supabase(args)?;
        let rows = client.latest(latest.source, latest.limit).await?;
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        let articles = json::read_articles(&latest.input).await?;
        let articles = latest_articles(articles, latest.source, latest.limit);
        println!("{}", serde_json::to_string_pretty(&articles)?);
    }
    Ok(())
}

async fn run_save(args: &Cli, save: &SaveArgs) -> Result<(), Box<dyn Error>> {
    let client = require_supabase(args)?;
    let bookmark = NewBookmark {
        article_id: save.article_id,
        user_id: save.user.clone(),
        notes: save.notes.clone(),
    };
    let saved = client.save_article(&bookmark).await?;
    println!("{}", serde_json::to_string_pretty(&saved)?);
    Ok(())
}

async fn run_saved(args: &Cli, saved: &SavedArgs) -> Result<(), Box<dyn Error>> {
    let client = require_supabase(args)?;
    let rows = client.saved_articles(saved.user.as_deref()).await?;
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_huge_window_override_aborts_the_run() {
        let tmp = tempfile::tempdir().unwrap();
        let args = Cli::parse_from([
            "newsletter_digest",
            "scrape",
            "--window-hours",
            "100000000000",
        ]);
        let Command::Scrape(scrape) = &args.command else {
            panic!("expected scrape");
        };
        let scrape = ScrapeArgs {
            output_dir: tmp.path().to_path_buf(),
            upload: false,
            window_hours: scrape.window_hours,
        };

        let outcome = run_scrape(&args, &scrape).await;
        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("out of range"));
        assert!(!tmp.path().join("articles.json").exists());
    }

    #[test]
    fn test_half_set_credentials_are_rejected() {
        let mut args = Cli::parse_from(["newsletter_digest", "saved"]);
        args.supabase_url = Some("https://xyz.supabase.co".to_string());
        args.supabase_key = None;
        assert!(matches!(supabase_client(&args), Err(SinkError::Config(_))));
    }
}
