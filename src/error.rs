//! Error types for each stage of the pipeline.
//!
//! Source-level failures ([`ScrapeError`]) are recoverable: they are rendered
//! to strings and stored on the per-source output. Sink and pipeline errors
//! fail the run.

use thiserror::Error;

/// Failure while fetching or parsing one source's listing page.
#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Network error: HTTP {status} for {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Failure while talking to the persistence sink.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Sink configuration error: {0}")]
    Config(String),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// Fault that aborts a pipeline run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),
}
