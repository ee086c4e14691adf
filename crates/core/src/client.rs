// The five Wikidata operations, each a single remote call plus an extractor

use crate::config::WikidataConfig;
use crate::error::WikidataResult;
use crate::extract;
use crate::http::{HttpClient, RemoteQuery, ReqwestClient};
use crate::types::{EntityMetadata, SearchHit, SearchNamespace};
use std::sync::Arc;
use tracing::debug;

/// Read-only client for the Wikidata action API and SPARQL endpoint.
///
/// Holds no per-call state, so one instance can serve concurrent invocations.
#[derive(Clone)]
pub struct WikidataClient {
    http: Arc<dyn HttpClient>,
    config: Arc<WikidataConfig>,
}

impl WikidataClient {
    /// Client over `reqwest` using the given configuration.
    pub fn from_config(config: WikidataConfig) -> WikidataResult<Self> {
        config.validate()?;
        let http = ReqwestClient::new(&config)?;
        Ok(Self::new(Arc::new(http), config))
    }

    pub fn new(http: Arc<dyn HttpClient>, config: WikidataConfig) -> Self {
        Self {
            http,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &WikidataConfig {
        &self.config
    }

    fn api_query(&self) -> RemoteQuery {
        RemoteQuery::new(self.config.api_url.clone())
            .header("Accept", "application/json")
            .header("User-Agent", self.config.user_agent.clone())
    }

    /// Full-text search restricted to one namespace, returning the top hit.
    pub async fn search(&self, query: &str, namespace: SearchNamespace) -> WikidataResult<SearchHit> {
        let request = self
            .api_query()
            .param("action", "query")
            .param("list", "search")
            .param("srsearch", query)
            .param("srnamespace", namespace.id())
            .param("srlimit", 1)
            .param("srqiprofile", namespace.search_profile())
            .param("srwhat", "text")
            .param("format", "json");

        let body = self.http.get_json(&request).await?;
        let hit = extract::search_hit(&body);
        debug!(query, ?namespace, ?hit, "Search completed");
        Ok(hit)
    }

    /// Entity ID for a free-text query, or the no-results sentinel.
    pub async fn search_entity(&self, query: &str) -> WikidataResult<String> {
        Ok(self.search(query, SearchNamespace::Item).await?.into_text())
    }

    /// Property ID for a free-text query, or the no-results sentinel.
    pub async fn search_property(&self, query: &str) -> WikidataResult<String> {
        Ok(self.search(query, SearchNamespace::Property).await?.into_text())
    }

    /// Property IDs used in the entity's claims. Empty for unknown entities.
    pub async fn get_properties(&self, entity_id: &str) -> WikidataResult<Vec<String>> {
        let request = self
            .api_query()
            .param("action", "wbgetentities")
            .param("ids", entity_id)
            .param("props", "claims")
            .param("format", "json");

        let body = self.http.get_json(&request).await?;
        Ok(extract::claim_properties(&body, entity_id))
    }

    /// Run a SPARQL query verbatim and return its bindings as JSON text.
    pub async fn execute_sparql(&self, sparql_query: &str) -> WikidataResult<String> {
        let request = RemoteQuery::new(self.config.sparql_url.clone())
            .header("User-Agent", self.config.user_agent.clone())
            .param("query", sparql_query)
            .param("format", "json");

        let body = self.http.get_json(&request).await?;
        extract::sparql_bindings(&body)
    }

    /// Label and description of an entity in one language.
    pub async fn get_metadata(&self, entity_id: &str, language: &str) -> WikidataResult<EntityMetadata> {
        let request = self
            .api_query()
            .param("action", "wbgetentities")
            .param("ids", entity_id)
            .param("props", "labels|descriptions")
            .param("languages", language)
            .param("format", "json");

        let body = self.http.get_json(&request).await?;
        Ok(extract::entity_metadata(&body, entity_id, language))
    }
}
