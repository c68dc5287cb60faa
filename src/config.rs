//! Source and runtime configuration.
//!
//! Both newsletters are configured out of the box. A YAML file can override
//! any of it:
//!
//! ```yaml
//! sources:
//!   - id: bens_bites
//!     listing_url: https://www.bensbites.com/archive
//!     base_url: https://www.bensbites.com
//!     domain: bensbites
//!     path_marker: /p/
//! settings:
//!   request_timeout_secs: 10
//!   request_delay_secs: 2
//!   window_hours: 24
//! ```

use crate::error::PipelineError;
use crate::models::SourceId;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::{info, instrument};
use url::Url;

const DEFAULT_USER_AGENT: &str = "AI-Newsletter-Dashboard/1.0 (Educational Project)";

/// Where and how to find article links for one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub id: SourceId,
    /// Page fetched once per run.
    pub listing_url: String,
    /// Base used to resolve relative links.
    pub base_url: String,
    /// Substring that attributes a URL to this source.
    pub domain: String,
    /// Path segment that marks article links, as opposed to navigation.
    #[serde(default = "default_path_marker")]
    pub path_marker: String,
}

fn default_path_marker() -> String {
    "/p/".to_string()
}

impl SourceConfig {
    pub fn bens_bites() -> Self {
        Self {
            id: SourceId::BensBites,
            listing_url: "https://www.bensbites.com/archive".to_string(),
            base_url: "https://www.bensbites.com".to_string(),
            domain: "bensbites".to_string(),
            path_marker: default_path_marker(),
        }
    }

    pub fn ai_rundown() -> Self {
        Self {
            id: SourceId::AiRundown,
            listing_url: "https://www.therundown.ai".to_string(),
            base_url: "https://www.therundown.ai".to_string(),
            domain: "therundown.ai".to_string(),
            path_marker: default_path_marker(),
        }
    }
}

/// Request pacing and freshness window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub request_timeout_secs: u64,
    /// Pause after each successful fetch.
    pub request_delay_secs: u64,
    pub window_hours: i64,
    pub user_agent: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            request_timeout_secs: 10,
            request_delay_secs: 2,
            window_hours: 24,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Settings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.request_delay_secs)
    }

    /// The freshness window as a duration.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] when `window_hours` is not positive,
    /// or so large that the window start would fall outside chrono's range.
    pub fn window(&self) -> Result<chrono::Duration, PipelineError> {
        if self.window_hours <= 0 {
            return Err(PipelineError::Config(
                "window_hours must be positive".to_string(),
            ));
        }
        let window = chrono::TimeDelta::try_hours(self.window_hours)
            .filter(|w| Utc::now().checked_sub_signed(*w).is_some())
            .ok_or_else(|| {
                PipelineError::Config(format!(
                    "window_hours {} is out of range",
                    self.window_hours
                ))
            })?;
        Ok(window)
    }
}

/// Full application configuration. Source order is the invocation order,
/// which is also the tie-break order for duplicate URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub sources: Vec<SourceConfig>,
    pub settings: Settings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sources: vec![SourceConfig::bens_bites(), SourceConfig::ai_rundown()],
            settings: Settings::default(),
        }
    }
}

impl AppConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, PipelineError> {
        let config: AppConfig =
            serde_yaml::from_str(yaml).map_err(|e| PipelineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), PipelineError> {
        if self.sources.is_empty() {
            return Err(PipelineError::Config("no sources configured".to_string()));
        }
        for source in &self.sources {
            Url::parse(&source.base_url).map_err(|e| {
                PipelineError::Config(format!("{}: invalid base_url: {}", source.id, e))
            })?;
            if source.path_marker.is_empty() || source.domain.is_empty() {
                return Err(PipelineError::Config(format!(
                    "{}: path_marker and domain must be non-empty",
                    source.id
                )));
            }
        }
        self.settings.window()?;
        Ok(())
    }
}

/// Load configuration from `path`, or fall back to the built-in defaults.
#[instrument(level = "info")]
pub async fn load_config(path: Option<&Path>) -> Result<AppConfig, PipelineError> {
    match path {
        Some(path) => {
            let yaml = fs::read_to_string(path).await?;
            let config = AppConfig::from_yaml(&yaml)?;
            info!(sources = config.sources.len(), "Loaded configuration file");
            Ok(config)
        }
        None => Ok(AppConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_has_both_sources_in_order() {
        let config = AppConfig::default();
        let ids: Vec<_> = config.sources.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![SourceId::BensBites, SourceId::AiRundown]);
        assert_eq!(config.settings.delay(), Duration::from_secs(2));
        assert_eq!(
            config.settings.window().unwrap(),
            chrono::Duration::hours(24)
        );
    }

    #[test]
    fn test_yaml_partial_settings_fill_defaults() {
        let yaml = r#"
sources:
  - id: ai_rundown
    listing_url: https://www.therundown.ai
    base_url: https://www.therundown.ai
    domain: therundown.ai
settings:
  request_delay_secs: 0
"#;
        let config = AppConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.sources[0].path_marker, "/p/");
        assert_eq!(config.settings.request_delay_secs, 0);
        assert_eq!(config.settings.request_timeout_secs, 10);
        assert_eq!(config.settings.window_hours, 24);
    }

    #[test]
    fn test_yaml_rejects_bad_base_url() {
        let yaml = r#"
sources:
  - id: bens_bites
    listing_url: https://www.bensbites.com/archive
    base_url: not a url
    domain: bensbites
"#;
        assert!(matches!(
            AppConfig::from_yaml(yaml),
            Err(PipelineError::Config(_))
        ));
    }

    #[test]
    fn test_window_rejects_non_positive_and_out_of_range_hours() {
        for hours in [0, -1, 100_000_000_000, i64::MAX] {
            let settings = Settings {
                window_hours: hours,
                ..Settings::default()
            };
            assert!(
                matches!(settings.window(), Err(PipelineError::Config(_))),
                "window_hours {hours} should be rejected"
            );
        }
    }

    #[test]
    fn test_yaml_rejects_huge_window() {
        let yaml = r#"
settings:
  window_hours: 100000000000
"#;
        assert!(matches!(
            AppConfig::from_yaml(yaml),
            Err(PipelineError::Config(_))
        ));
    }

    #[test]
    fn test_yaml_rejects_empty_sources() {
        assert!(AppConfig::from_yaml("sources: []").is_err());
    }

    #[tokio::test]
    async fn test_load_config_without_path_uses_defaults() {
        let config = load_config(None).await.unwrap();
        assert_eq!(config, AppConfig::default());
    }
}
