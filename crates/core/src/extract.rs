// Pure translations from Wikidata response bodies to operation results
//
// Each function reads one sub-path and ignores everything else in the body, so new
// upstream fields never break extraction.

use crate::error::{WikidataError, WikidataResult};
use crate::types::{EntityMetadata, SearchHit, NO_LABEL_FOUND};
use serde_json::Value;

/// First `query.search[].title` with any `Namespace:` prefix removed.
///
/// Any other shape, including an empty hit list, counts as no result.
pub fn search_hit(body: &Value) -> SearchHit {
    body.pointer("/query/search/0/title")
        .and_then(Value::as_str)
        .map(strip_namespace)
        .filter(|id| !id.is_empty())
        .map(|id| SearchHit::Found(id.to_string()))
        .unwrap_or(SearchHit::NotFound)
}

/// `Property:P57` -> `P57`. Titles without a prefix pass through.
pub fn strip_namespace(title: &str) -> &str {
    title.rsplit(':').next().unwrap_or(title)
}

fn entity<'a>(body: &'a Value, entity_id: &str) -> Option<&'a Value> {
    body.get("entities")?.get(entity_id)
}

/// Claim keys of `entities.<id>.claims`, in response order.
pub fn claim_properties(body: &Value, entity_id: &str) -> Vec<String> {
    entity(body, entity_id)
        .and_then(|e| e.get("claims"))
        .and_then(Value::as_object)
        .map(|claims| claims.keys().cloned().collect())
        .unwrap_or_default()
}

/// `results.bindings` of a SPARQL JSON result, re-serialized as text.
pub fn sparql_bindings(body: &Value) -> WikidataResult<String> {
    let bindings = body
        .pointer("/results/bindings")
        .filter(|b| b.is_array())
        .ok_or_else(|| WikidataError::UnexpectedShape("missing results.bindings array".to_string()))?;
    Ok(serde_json::to_string(bindings)?)
}

/// Label and description of `entities.<id>` in `language`.
///
/// Both fields fall back to [`NO_LABEL_FOUND`].
pub fn entity_metadata(body: &Value, entity_id: &str, language: &str) -> EntityMetadata {
    let term = |field: &str| {
        entity(body, entity_id)
            .and_then(|e| e.get(field))
            .and_then(|terms| terms.get(language))
            .and_then(|t| t.get("value"))
            .and_then(Value::as_str)
            .unwrap_or(NO_LABEL_FOUND)
            .to_string()
    };

    EntityMetadata {
        label: term("labels"),
        descriptions: term("descriptions"),
    }
}
