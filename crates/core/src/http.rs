// HTTP seam between the Wikidata operations and the network

use crate::config::WikidataConfig;
use crate::error::{WikidataError, WikidataResult};
use reqwest::{header, Client};
use tracing::debug;
use url::Url;

/// One outbound GET: endpoint, query parameters and extra headers.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteQuery {
    pub endpoint: Url,
    pub params: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl RemoteQuery {
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            params: Vec::new(),
            headers: Vec::new(),
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Look up a query parameter by name.
    pub fn get_param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Performs a single GET and returns the parsed JSON body.
///
/// Implementations must fail on non-2xx statuses and must not retry.
#[async_trait::async_trait]
pub trait HttpClient: Send + Sync {
    async fn get_json(&self, query: &RemoteQuery) -> WikidataResult<serde_json::Value>;
}

/// [`HttpClient`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: Client,
}

impl ReqwestClient {
    pub fn new(config: &WikidataConfig) -> WikidataResult<Self> {
        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait::async_trait]
impl HttpClient for ReqwestClient {
    async fn get_json(&self, query: &RemoteQuery) -> WikidataResult<serde_json::Value> {
        debug!(endpoint = %query.endpoint, params = ?query.params, "GET request");

        let mut request = self.client.get(query.endpoint.clone()).query(&query.params);
        for (name, value) in &query.headers {
            let name = header::HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| WikidataError::Config(format!("Invalid header name: {}", name)))?;
            let value = header::HeaderValue::from_str(value)
                .map_err(|_| WikidataError::Config(format!("Invalid header value for {}", name)))?;
            request = request.header(name, value);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WikidataError::from_status(status.as_u16(), &body));
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
