//! JSON envelope of the search endpoint
//!
//! Body: `{"query": "...", "filters": {"level": "beginner", ...}}`, both keys
//! optional. Replies:
//! - short query: `{"success": true, "results": [], "total": 0}`
//! - otherwise: `{"success": true, "data": <SearchResponse>}`
//! - failure: `{"success": false, "error": {"code": ..., "message": ...}}`

use crate::interface::{Identity, LinguaError, SearchApi, SearchFilters};
use crate::search::is_short_query;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use tracing::warn;

/// Handle one search request body. Never fails: errors become the failure
/// envelope.
pub async fn handle_search<A>(api: &A, body: &Value, identity: Option<Identity>) -> Value
where
    A: SearchApi + ?Sized,
{
    match run_search(api, body, identity).await {
        Ok(reply) => reply,
        Err(e) => {
            if e.is_client_error() {
                warn!(code = e.code_str(), error = %e, "search request rejected");
            }
            error_envelope(&e)
        }
    }
}

async fn run_search<A>(api: &A, body: &Value, identity: Option<Identity>) -> Result<Value, LinguaError>
where
    A: SearchApi + ?Sized,
{
    let query = match body.get("query") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(q)) => q.trim().to_string(),
        Some(other) => return Err(LinguaError::InvalidInput(format!("query must be a string, got {}", other))),
    };

    if is_short_query(&query) {
        return Ok(json!({"success": true, "results": [], "total": 0}));
    }

    let raw_filters = match body.get("filters") {
        None | Some(Value::Null) => HashMap::new(),
        Some(Value::Object(map)) => filter_strings(map)?,
        Some(other) => return Err(LinguaError::InvalidInput(format!("filters must be an object, got {}", other))),
    };
    let filters = SearchFilters::from_map(&raw_filters)?;

    let response = api.search(query, filters, identity).await?;
    Ok(json!({"success": true, "data": response}))
}

/// Filter values must be strings; null counts as absent.
fn filter_strings(map: &Map<String, Value>) -> Result<HashMap<String, String>, LinguaError> {
    let mut filters = HashMap::with_capacity(map.len());
    for (key, value) in map {
        match value {
            Value::Null => {}
            Value::String(s) => {
                filters.insert(key.clone(), s.clone());
            }
            other => {
                return Err(LinguaError::InvalidFilter {
                    key: key.clone(),
                    value: other.to_string(),
                    reason: "filter values must be strings".to_string(),
                })
            }
        }
    }
    Ok(filters)
}

pub fn error_envelope(error: &LinguaError) -> Value {
    json!({
        "success": false,
        "error": {
            "code": error.code_str(),
            "message": error.to_string(),
        }
    })
}
