// Configuration for the Wikidata endpoints

use crate::error::{WikidataError, WikidataResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

pub const DEFAULT_API_URL: &str = "https://www.wikidata.org/w/api.php";
pub const DEFAULT_SPARQL_URL: &str = "https://query.wikidata.org/sparql";

/// Endpoint and transport settings for [`crate::WikidataClient`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WikidataConfig {
    /// MediaWiki action API (search, wbgetentities).
    #[serde(default = "default_api_url")]
    pub api_url: Url,

    /// SPARQL query service.
    #[serde(default = "default_sparql_url")]
    pub sparql_url: Url,

    /// Sent as `User-Agent` on every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Request timeout. Unset means the HTTP client's default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

fn default_api_url() -> Url {
    Url::parse(DEFAULT_API_URL).expect("default api url is valid")
}

fn default_sparql_url() -> Url {
    Url::parse(DEFAULT_SPARQL_URL).expect("default sparql url is valid")
}

fn default_user_agent() -> String {
    format!("wikidata-mcp/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for WikidataConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            sparql_url: default_sparql_url(),
            user_agent: default_user_agent(),
            timeout_secs: None,
        }
    }
}

impl WikidataConfig {
    /// Load configuration from a TOML file, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> WikidataResult<Self> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "Configuration file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            WikidataError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(content: &str) -> WikidataResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| WikidataError::Config(format!("Failed to parse configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Point both endpoints at one base URL. Used by tests against a mock server.
    pub fn with_base_url(base_url: &str) -> WikidataResult<Self> {
        let base = Url::parse(base_url)?;
        Ok(Self {
            api_url: base.join("w/api.php")?,
            sparql_url: base.join("sparql")?,
            ..Default::default()
        })
    }

    pub fn validate(&self) -> WikidataResult<()> {
        for url in [&self.api_url, &self.sparql_url] {
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(WikidataError::Config(format!(
                    "Only HTTP/HTTPS endpoints are supported, got: {}",
                    url
                )));
            }
        }
        if self.user_agent.trim().is_empty() {
            return Err(WikidataError::Config("user_agent must not be empty".to_string()));
        }
        if self.timeout_secs == Some(0) {
            return Err(WikidataError::Config("timeout_secs must be positive".to_string()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
