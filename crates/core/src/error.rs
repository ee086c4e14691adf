// Error types for Wikidata remote calls

/// Result type for Wikidata operations.
pub type WikidataResult<T> = Result<T, WikidataError>;

/// Errors that can occur while talking to the Wikidata endpoints.
#[derive(Debug, thiserror::Error)]
pub enum WikidataError {
    /// Network-level failure (connect, TLS, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote endpoint answered with a non-2xx status.
    #[error("Remote error (status {status}): {body}")]
    Status { status: u16, body: String },

    /// Response body was not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Response parsed but lacked a key the operation requires.
    #[error("Unexpected response shape: {0}")]
    UnexpectedShape(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl WikidataError {
    /// Build a status error, trimming very large bodies.
    pub fn from_status(status: u16, body: &str) -> Self {
        const MAX_BODY: usize = 2_000;

        let body = if body.len() > MAX_BODY {
            let mut end = MAX_BODY;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated)", &body[..end])
        } else {
            body.to_string()
        };

        Self::Status { status, body }
    }

    /// True for failures that happened on the wire rather than in response parsing.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Status { .. })
    }
}
