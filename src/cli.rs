//! Command-line interface definitions.
//!
//! Supabase credentials can be provided via flags or environment variables.

use crate::models::SourceId;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

/// Command-line arguments for the newsletter digest.
///
/// # Examples
///
/// ```sh
/// # Scrape both newsletters into ./.tmp
/// newsletter_digest scrape
///
/// # Scrape and upsert into Supabase
/// SUPABASE_URL=https://xyz.supabase.co SUPABASE_ANON_KEY=... newsletter_digest scrape --upload
///
/// # Show the ten newest Ben's Bites articles from the last run
/// newsletter_digest latest --source bens_bites --limit 10
///
/// # Bookmark an article, then list bookmarks
/// newsletter_digest save 6f2d0a2e-7d0b-4a53-9a51-9a0a3c1f2b11 --notes "read later"
/// newsletter_digest saved
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Supabase project URL
    #[arg(long, env = "SUPABASE_URL", global = true)]
    pub supabase_url: Option<String>,

    /// Supabase API key
    #[arg(long, env = "SUPABASE_ANON_KEY", global = true, hide_env_values = true)]
    pub supabase_key: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scrape every source and write articles.json plus a run summary
    Scrape(ScrapeArgs),
    /// Upsert a previously written articles.json into Supabase
    Upload(UploadArgs),
    /// Print the most recently scraped articles
    Latest(LatestArgs),
    /// Bookmark an article in Supabase
    Save(SaveArgs),
    /// Print bookmarked articles from Supabase
    Saved(SavedArgs),
}

#[derive(Args, Debug)]
pub struct ScrapeArgs {
    /// Directory for articles.json and logs/
    #[arg(short, long, default_value = ".tmp")]
    pub output_dir: PathBuf,

    /// Upsert the filtered articles into Supabase after writing them
    #[arg(long)]
    pub upload: bool,

    /// Override the freshness window from the config file
    #[arg(long)]
    pub window_hours: Option<i64>,
}

#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Article file written by `scrape`
    #[arg(short, long, default_value = ".tmp/articles.json")]
    pub input: PathBuf,
}

#[derive(Args, Debug)]
pub struct LatestArgs {
    /// Only show articles from this source
    #[arg(short, long, value_enum)]
    pub source: Option<SourceId>,

    /// Maximum number of articles
    #[arg(short, long, default_value_t = 100)]
    pub limit: usize,

    /// Query Supabase instead of the local file
    #[arg(long)]
    pub remote: bool,

    /// Article file written by `scrape`
    #[arg(short, long, default_value = ".tmp/articles.json")]
    pub input: PathBuf,
}

#[derive(Args, Debug)]
pub struct SaveArgs {
    /// Id of the article to bookmark
    pub article_id: Uuid,

    /// Owner of the bookmark
    #[arg(short, long)]
    pub user: Option<String>,

    /// Free-form note stored with the bookmark
    #[arg(short, long)]
    pub notes: Option<String>,
}

#[derive(Args, Debug)]
pub struct SavedArgs {
    /// Only show this user's bookmarks
    #[arg(short, long)]
    pub user: Option<String>,
}
