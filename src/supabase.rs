//! Persistence sink and retrieval backed by Supabase's REST interface.
//!
//! Articles are upserted into the `articles` table with `url` as the conflict
//! target, so re-running a scrape refreshes rows instead of duplicating them.
//! Column names are snake_case and the identifier lives in `article_id`.
//!
//! Bookmarks live in a separate `saved_articles` table that references
//! `articles`; reading them back embeds the bookmarked article.

use crate::error::SinkError;
use crate::models::{Article, SourceId};
use crate::utils::truncate_for_log;
use chrono::{DateTime, Utc};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

/// Something that can durably store a run's articles.
pub trait ArticleSink {
    /// Insert or update `articles`, keyed on URL. Returns the number of rows
    /// the store acknowledged.
    async fn upsert(&self, articles: &[Article]) -> Result<usize, SinkError>;
}

/// A row of the `articles` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRow {
    pub article_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub published_at: Option<String>,
    pub scraped_at: DateTime<Utc>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub source: SourceId,
}

impl From<&Article> for ArticleRow {
    fn from(article: &Article) -> Self {
        Self {
            article_id: Some(article.id),
            title: article.title.clone(),
            description: article.description.clone(),
            url: article.url.clone(),
            published_at: article.published_at.clone(),
            scraped_at: article.scraped_at,
            image_url: article.image_url.clone(),
            category: article.category.clone(),
            source: article.source,
        }
    }
}

/// A bookmark to create in the `saved_articles` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewBookmark {
    pub article_id: Uuid,
    pub user_id: Option<String>,
    pub notes: Option<String>,
}

/// A row of the `saved_articles` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedArticleRow {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub article_id: Uuid,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Set by the database on insert.
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
    /// The bookmarked article, present when the query embeds it.
    #[serde(default, rename = "articles", skip_serializing_if = "Option::is_none")]
    pub article: Option<ArticleRow>,
}

/// Client for the Supabase REST endpoint.
#[derive(Clone)]
pub struct SupabaseClient {
    client: reqwest::Client,
    base_url: String,
}

impl fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl SupabaseClient {
    /// Build a client for the project at `base_url`, authenticating with
    /// `api_key` both as `apikey` and as a bearer token.
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, SinkError> {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(SinkError::Config("Supabase URL is empty".to_string()));
        }

        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(api_key)
            .map_err(|e| SinkError::Config(format!("invalid API key: {e}")))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| SinkError::Config(format!("invalid API key: {e}")))?;
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    fn articles_endpoint(&self) -> String {
        format!("{}/rest/v1/articles", self.base_url)
    }

    fn saved_endpoint(&self) -> String {
        format!("{}/rest/v1/saved_articles", self.base_url)
    }

    /// Most recently scraped rows, optionally restricted to one source.
    ///
    /// # Arguments
    ///
    /// * `source` - Only return rows attributed to this source
    /// * `limit` - Maximum number of rows
    ///
    /// # Returns
    ///
    /// Rows ordered by `scraped_at`, newest first.
    #[instrument(level = "info", skip(self))]
    pub async fn latest(
        &self,
        source: Option<SourceId>,
        limit: usize,
    ) -> Result<Vec<ArticleRow>, SinkError> {
        let mut query: Vec<(&str, String)> = vec![
            ("select", "*".to_string()),
            ("order", "scraped_at.desc".to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(source) = source {
            query.push(("source", format!("eq.{source}")));
        }

        let response = self
            .client
            .get(self.articles_endpoint())
            .query(&query)
            .send()
            .await?;
        let rows: Vec<ArticleRow> = check_status(response).await?.json().await?;
        info!(count = rows.len(), "Fetched latest articles");
        Ok(rows)
    }

    /// Bookmark an article.
    ///
    /// # Returns
    ///
    /// The stored row, including the database-assigned `saved_at`.
    #[instrument(level = "info", skip(self), fields(article_id = %bookmark.article_id))]
    pub async fn save_article(
        &self,
        bookmark: &NewBookmark,
    ) -> Result<SavedArticleRow, SinkError> {
        let response = self
            .client
            .post(self.saved_endpoint())
            .header("Prefer", "return=representation")
            .json(bookmark)
            .send()
            .await?;

        let mut rows: Vec<SavedArticleRow> = check_status(response).await?.json().await?;
        if rows.is_empty() {
            return Err(SinkError::UnexpectedResponse(
                "bookmark insert returned no rows".to_string(),
            ));
        }
        info!("Saved article");
        Ok(rows.swap_remove(0))
    }

    /// Bookmarks with their articles embedded, most recently saved first.
    #[instrument(level = "info", skip(self))]
    pub async fn saved_articles(
        &self,
        user_id: Option<&str>,
    ) -> Result<Vec<SavedArticleRow>, SinkError> {
        let mut query: Vec<(&str, String)> = vec![
            ("select", "*, articles(*)".to_string()),
            ("order", "saved_at.desc".to_string()),
        ];
        if let Some(user_id) = user_id {
            query.push(("user_id", format!("eq.{user_id}")));
        }

        let response = self
            .client
            .get(self.saved_endpoint())
            .query(&query)
            .send()
            .await?;
        let rows: Vec<SavedArticleRow> = check_status(response).await?.json().await?;
        info!(count = rows.len(), "Fetched saved articles");
        Ok(rows)
    }
}

impl ArticleSink for SupabaseClient {
    #[instrument(level = "info", skip_all, fields(count = articles.len()))]
    async fn upsert(&self, articles: &[Article]) -> Result<usize, SinkError> {
        if articles.is_empty() {
            debug!("Nothing to upsert");
            return Ok(0);
        }

        let t0 = Instant::now();
        let rows: Vec<ArticleRow> = articles.iter().map(ArticleRow::from).collect();
        let response = self
            .client
            .post(self.articles_endpoint())
            .query(&[("on_conflict", "url")])
            .header("Prefer", "return=representation,resolution=merge-duplicates")
            .json(&rows)
            .send()
            .await?;

        let inserted: Vec<serde_json::Value> = check_status(response).await?.json().await?;
        info!(
            elapsed_ms = t0.elapsed().as_millis() as u128,
            upserted = inserted.len(),
            "Upserted articles"
        );
        Ok(inserted.len())
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SinkError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    error!(%status, body = %truncate_for_log(&body, 300), "Supabase request failed");
    Err(SinkError::Status { status, body })
}

/// Local counterpart of [`SupabaseClient::latest`] over an already-loaded
/// article list: newest scrape first, optionally filtered, at most `limit`.
pub fn latest_articles(
    articles: Vec<Article>,
    source: Option<SourceId>,
    limit: usize,
) -> Vec<Article> {
    let mut articles: Vec<Article> = articles
        .into_iter()
        .filter(|a| source.is_none_or(|s| a.source == s))
        .collect();
    articles.sort_by_key(|a| std::cmp::Reverse(a.scraped_at));
    articles.truncate(limit);
    articles
}
