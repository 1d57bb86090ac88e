//! `CacheAdmin` — the `POST /cache` side channel (spec §4.8).

use crate::cache::CacheStore;
use crate::error::PipelineError;
use serde_json::{json, Value};
use std::sync::Arc;

pub async fn handle(
    cache_store: Option<&Arc<dyn CacheStore>>,
    host: &str,
    body: &Value,
) -> Result<Value, PipelineError> {
    let Some(store) = cache_store else {
        return Err(PipelineError::NotFound("no cache driver configured".to_string()));
    };

    let operation = body.get("operation").and_then(Value::as_str).unwrap_or("markToRefresh");
    let namespace = body.get("namespace").and_then(Value::as_str).unwrap_or(host);
    let keys: Vec<String> = body
        .get("keys")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default();

    let result = match operation {
        "markToRefresh" => store.mark_to_refresh(namespace, &keys).await?,
        "unset" => store.unset(namespace, &keys).await?,
        other => return Err(PipelineError::BadRequest(format!("unsupported cache operation '{other}'"))),
    };

    Ok(json!({ operation: result }))
}
