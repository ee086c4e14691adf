// Search tools: free text to entity or property ID

use crate::protocol::{CallToolResult, ToolSchema};
use crate::tools::{json_schema_object, json_schema_string, ReturnType, Tool};
use anyhow::{Context, Result};
use serde::Deserialize;
use wikidata_core::{SearchNamespace, WikidataClient};

/// Tool resolving a query to the top-ranked item or property ID
pub struct SearchTool {
    client: WikidataClient,
    namespace: SearchNamespace,
}

impl SearchTool {
    /// `search_entity`
    pub fn entity(client: WikidataClient) -> Self {
        Self {
            client,
            namespace: SearchNamespace::Item,
        }
    }

    /// `search_property`
    pub fn property(client: WikidataClient) -> Self {
        Self {
            client,
            namespace: SearchNamespace::Property,
        }
    }

    fn name(&self) -> &'static str {
        match self.namespace {
            SearchNamespace::Item => "search_entity",
            SearchNamespace::Property => "search_property",
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
}

#[async_trait::async_trait]
impl Tool for SearchTool {
    fn schema(&self) -> ToolSchema {
        let (kind, id_kind) = match self.namespace {
            SearchNamespace::Item => ("entity", "entity ID (e.g. Q8684)"),
            SearchNamespace::Property => ("property", "property ID (e.g. P57)"),
        };
        ToolSchema {
            name: self.name().to_string(),
            description: format!(
                "Search for a Wikidata {kind} ID by its query. Returns the {id_kind} of the best match, \
                 or \"{}\" when nothing matches.",
                wikidata_core::NO_SEARCH_RESULTS
            ),
            input_schema: json_schema_object(
                serde_json::json!({
                    "query": json_schema_string(&format!(
                        "The query to search for. It should be unambiguous enough to uniquely identify the {kind}."
                    ))
                }),
                vec!["query"],
            ),
            output_schema: None,
        }
    }

    fn return_type(&self) -> ReturnType {
        ReturnType::String
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: SearchArgs = serde_json::from_value(arguments)
            .with_context(|| format!("Invalid arguments for {}", self.name()))?;

        let hit = self
            .client
            .search(&args.query, self.namespace)
            .await
            .with_context(|| format!("{} failed", self.name()))?;

        self.return_type().render(serde_json::Value::String(hit.into_text()))
    }
}
