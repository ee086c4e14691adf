// SPARQL tool

use crate::protocol::{CallToolResult, ToolSchema};
use crate::tools::{json_schema_object, json_schema_string, ReturnType, Tool};
use anyhow::{Context, Result};
use serde::Deserialize;
use wikidata_core::WikidataClient;

const DESCRIPTION: &str = "Execute a SPARQL query on Wikidata.

You may assume the following prefixes:
PREFIX wd: <http://www.wikidata.org/entity/>
PREFIX wdt: <http://www.wikidata.org/prop/direct/>
PREFIX p: <http://www.wikidata.org/prop/>
PREFIX ps: <http://www.wikidata.org/prop/statement/>

Returns the result bindings as a JSON array string; an empty array when nothing matches.";

/// Tool running a raw SPARQL query against the query service
pub struct ExecuteSparqlTool {
    client: WikidataClient,
}

impl ExecuteSparqlTool {
    pub fn new(client: WikidataClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct ExecuteSparqlArgs {
    sparql_query: String,
}

#[async_trait::async_trait]
impl Tool for ExecuteSparqlTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "execute_sparql".to_string(),
            description: DESCRIPTION.to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "sparql_query": json_schema_string("The SPARQL query to execute")
                }),
                vec!["sparql_query"],
            ),
            output_schema: None,
        }
    }

    fn return_type(&self) -> ReturnType {
        ReturnType::JsonText
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: ExecuteSparqlArgs = serde_json::from_value(arguments)
            .context("Invalid arguments for execute_sparql")?;

        let bindings = self
            .client
            .execute_sparql(&args.sparql_query)
            .await
            .context("execute_sparql failed")?;

        self.return_type().render(serde_json::Value::String(bindings))
    }
}
