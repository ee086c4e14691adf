// Entity tools: claims and labels of a known ID

use crate::protocol::{CallToolResult, ToolSchema};
use crate::tools::{json_schema_object, json_schema_string, json_schema_string_with_default, ReturnType, Tool};
use anyhow::{Context, Result};
use serde::Deserialize;
use wikidata_core::{WikidataClient, DEFAULT_LANGUAGE};

/// Tool listing the property IDs an entity has claims for
pub struct GetPropertiesTool {
    client: WikidataClient,
}

impl GetPropertiesTool {
    pub fn new(client: WikidataClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct GetPropertiesArgs {
    entity_id: String,
}

#[async_trait::async_trait]
impl Tool for GetPropertiesTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_properties".to_string(),
            description: "Get the properties associated with a given Wikidata entity ID. \
                          Returns a list of property IDs; empty if the entity has none or does not exist."
                .to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "entity_id": json_schema_string("The entity ID to retrieve properties for (e.g. Q8684)")
                }),
                vec!["entity_id"],
            ),
            output_schema: None,
        }
    }

    fn return_type(&self) -> ReturnType {
        ReturnType::StringList
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: GetPropertiesArgs = serde_json::from_value(arguments)
            .context("Invalid arguments for get_properties")?;

        let properties = self
            .client
            .get_properties(&args.entity_id)
            .await
            .context("get_properties failed")?;

        self.return_type().render(serde_json::to_value(properties)?)
    }
}

/// Tool fetching the label and description of an entity
pub struct GetMetadataTool {
    client: WikidataClient,
}

impl GetMetadataTool {
    pub fn new(client: WikidataClient) -> Self {
        Self { client }
    }
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

#[derive(Debug, Deserialize)]
struct GetMetadataArgs {
    entity_id: String,
    #[serde(default = "default_language")]
    language: String,
}

#[async_trait::async_trait]
impl Tool for GetMetadataTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_metadata".to_string(),
            description: "Retrieve the label and description for a given Wikidata entity ID \
                          in one language."
                .to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "entity_id": json_schema_string("The entity ID to retrieve metadata for"),
                    "language": json_schema_string_with_default(
                        "The language code for the label and description. Use ISO 639-1 codes.",
                        DEFAULT_LANGUAGE,
                    )
                }),
                vec!["entity_id"],
            ),
            output_schema: None,
        }
    }

    fn return_type(&self) -> ReturnType {
        ReturnType::StringMap(&["Label", "Descriptions"])
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: GetMetadataArgs = serde_json::from_value(arguments)
            .context("Invalid arguments for get_metadata")?;

        let metadata = self
            .client
            .get_metadata(&args.entity_id, &args.language)
            .await
            .context("get_metadata failed")?;

        self.return_type().render(serde_json::to_value(metadata)?)
    }
}
