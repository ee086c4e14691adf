pub mod entity;
pub mod search;
pub mod sparql;
mod registry;

pub use entity::{GetMetadataTool, GetPropertiesTool};
pub use search::SearchTool;
pub use sparql::ExecuteSparqlTool;
pub use registry::{
    json_schema_array, json_schema_object, json_schema_string, json_schema_string_with_default,
    InvokeError, ReturnType, Tool, ToolRegistry,
};

use std::sync::Arc;
use wikidata_core::WikidataClient;

/// Registry with the Wikidata tools in their advertised order.
pub fn wikidata_registry(client: WikidataClient) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(SearchTool::entity(client.clone())));
    registry.register(Arc::new(SearchTool::property(client.clone())));
    registry.register(Arc::new(GetPropertiesTool::new(client.clone())));
    registry.register(Arc::new(ExecuteSparqlTool::new(client.clone())));
    registry.register(Arc::new(GetMetadataTool::new(client)));
    registry
}


#[cfg(test)]
mod tests {
    use super::*;
    use testing::FakeHttp;

    #[test]
    fn test_wikidata_registry_catalog() {
        let http = FakeHttp::ok(serde_json::json!({}));
        let registry = wikidata_registry(http.client());

        let names: Vec<String> = registry.list_schemas().into_iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            vec![
                "search_entity",
                "search_property",
                "get_properties",
                "execute_sparql",
                "get_metadata"
            ]
        );
        assert!(registry
            .list_schemas()
            .iter()
            .all(|s| s.output_schema.is_some() && !s.description.is_empty()));
    }
}
