// Value types shared by the Wikidata operations and the tool layer

use serde::{Deserialize, Serialize};

/// Returned by the search operations when nothing matched.
pub const NO_SEARCH_RESULTS: &str = "No results found. Consider changing the search term.";

/// Placeholder for a missing label or description in the requested language.
pub const NO_LABEL_FOUND: &str = "No label found";

pub const DEFAULT_LANGUAGE: &str = "en";

/// MediaWiki namespace searched by `list=search`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchNamespace {
    /// Items (`Q` IDs)
    Item,
    /// Properties (`P` IDs)
    Property,
}

impl SearchNamespace {
    pub fn id(self) -> u32 {
        match self {
            Self::Item => 0,
            Self::Property => 120,
        }
    }

    /// CirrusSearch query-independent ranking profile.
    pub fn search_profile(self) -> &'static str {
        match self {
            Self::Item => "classic_noboostlinks",
            Self::Property => "classic",
        }
    }
}

/// Outcome of an entity or property search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchHit {
    Found(String),
    NotFound,
}

impl SearchHit {
    /// Render as the tool-level string: the bare ID or the no-results sentinel.
    pub fn into_text(self) -> String {
        match self {
            Self::Found(id) => id,
            Self::NotFound => NO_SEARCH_RESULTS.to_string(),
        }
    }
}

/// Label and description of an entity in one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMetadata {
    #[serde(rename = "Label")]
    pub label: String,
    #[serde(rename = "Descriptions")]
    pub descriptions: String,
}
