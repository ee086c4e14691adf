// MCP tool trait and the ordered registry the server dispatches through

use crate::protocol::{CallToolResult, ToolSchema};
use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;

/// Tool executor trait
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool schema for MCP
    fn schema(&self) -> ToolSchema;

    /// Shape of the value the tool produces
    fn return_type(&self) -> ReturnType;

    /// Execute the tool with given arguments
    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult>;
}

/// Declared result shape of a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnType {
    /// A plain string (ID or sentinel)
    String,
    /// A list of strings
    StringList,
    /// A string holding serialized JSON
    JsonText,
    /// An object with fixed string-valued keys
    StringMap(&'static [&'static str]),
}

impl ReturnType {
    /// JSON schema for `structuredContent`.
    pub fn output_schema(&self) -> serde_json::Value {
        match self {
            Self::String | Self::JsonText => wrap_result_schema(serde_json::json!({"type": "string"})),
            Self::StringList => wrap_result_schema(json_schema_array(
                serde_json::json!({"type": "string"}),
                "Property IDs",
            )),
            Self::StringMap(keys) => {
                let properties: serde_json::Map<String, serde_json::Value> = keys
                    .iter()
                    .map(|k| (k.to_string(), serde_json::json!({"type": "string"})))
                    .collect();
                json_schema_object(serde_json::Value::Object(properties), keys.to_vec())
            }
        }
    }

    /// Turn a tool value into a call result: text for the model, structured for programs.
    pub fn render(&self, value: serde_json::Value) -> Result<CallToolResult> {
        let text = match &value {
            serde_json::Value::String(s) => s.clone(),
            other => serde_json::to_string(other)?,
        };
        let structured = match self {
            Self::StringMap(_) => value,
            _ => serde_json::json!({ "result": value }),
        };
        Ok(CallToolResult::text(text, structured))
    }
}

fn wrap_result_schema(inner: serde_json::Value) -> serde_json::Value {
    json_schema_object(serde_json::json!({ "result": inner }), vec!["result"])
}

/// Failure to invoke a tool by name.
#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("{0:#}")]
    Failed(#[from] anyhow::Error),
}

/// Tool registry for managing available tools, in registration order
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register a tool. A later tool with the same name replaces the earlier one in place.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.schema().name;
        match self.index.get(&name) {
            Some(&slot) => {
                tracing::warn!(tool = %name, "Replacing already registered tool");
                self.tools[slot] = tool;
            }
            None => {
                self.index.insert(name, self.tools.len());
                self.tools.push(tool);
            }
        }
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.index.get(name).map(|&slot| self.tools[slot].clone())
    }

    /// List all tool schemas, with output schemas filled in from the return type
    pub fn list_schemas(&self) -> Vec<ToolSchema> {
        self.tools
            .iter()
            .map(|t| {
                let mut schema = t.schema();
                if schema.output_schema.is_none() {
                    schema.output_schema = Some(t.return_type().output_schema());
                }
                schema
            })
            .collect()
    }

    /// Check if a tool exists
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Invoke a tool by name. Missing arguments are treated as an empty object.
    pub async fn invoke(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<CallToolResult, InvokeError> {
        let tool = self
            .get(name)
            .ok_or_else(|| InvokeError::UnknownTool(name.to_string()))?;

        let arguments = if arguments.is_null() {
            serde_json::json!({})
        } else {
            arguments
        };

        tracing::debug!(tool = name, %arguments, "Invoking tool");
        Ok(tool.execute(arguments).await?)
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// Helper functions for creating tool schemas

pub fn json_schema_object(properties: serde_json::Value, required: Vec<&str>) -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

pub fn json_schema_string(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "string",
        "description": description
    })
}

pub fn json_schema_string_with_default(description: &str, default: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "string",
        "description": description,
        "default": default
    })
}

pub fn json_schema_array(items: serde_json::Value, description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "array",
        "items": items,
        "description": description
    })
}
