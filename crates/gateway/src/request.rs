//! `RequestParser` — normalizes an inbound axum request into a canonical
//! [`RequestArgs`] (spec §4.2).

use crate::error::PipelineError;
use axum::body::Bytes;
use axum::http::{HeaderMap, Method, Uri};
use gateway_kernel::types::UrlParts;
use gateway_kernel::value::{normalize_uri, parse_query};
use gateway_kernel::RequestArgs;
use serde_json::Value;
use std::collections::HashMap;

/// Reconstruct the request origin (`scheme://host`) used as the cache
/// namespace (spec §8 scenarios 1 and 7). The scheme comes from
/// `x-forwarded-proto` when the gateway sits behind a proxy, falling back to
/// the URI's own scheme, then to `http`.
fn origin(uri: &Uri, headers: &HeaderMap) -> String {
    let host = headers.get("host").and_then(|v| v.to_str().ok()).unwrap_or("");
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .or_else(|| uri.scheme_str())
        .unwrap_or("http");
    format!("{scheme}://{host}")
}

/// Parse a raw HTTP request into [`RequestArgs`].
///
/// Body I/O is the only suspension point: for `POST`/`PUT` the body is
/// parsed as JSON, surfacing a [`PipelineError::BadRequest`] on failure; for
/// every other method `body` is the empty object.
pub fn parse_request(
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
    body: &Bytes,
) -> Result<RequestArgs, PipelineError> {
    let pathname = normalize_uri(uri.path());
    let query = uri.query().unwrap_or("").to_string();
    let has_extension = pathname.contains('.');

    let host = origin(uri, headers);

    let mut header_map = HashMap::new();
    for (name, value) in headers {
        if let Ok(v) = value.to_str() {
            header_map.insert(name.as_str().to_string(), v.to_string());
        }
    }

    let params = parse_query(&query);

    let body_json = if matches!(method, &Method::POST | &Method::PUT) {
        if body.is_empty() {
            Value::Object(Default::default())
        } else {
            serde_json::from_slice(body)
                .map_err(|e| PipelineError::BadRequest(format!("invalid JSON body: {e}")))?
        }
    } else {
        Value::Object(Default::default())
    };

    let path = if query.is_empty() {
        pathname.clone()
    } else {
        format!("{pathname}?{query}")
    };

    Ok(RequestArgs {
        method: method.as_str().to_string(),
        host,
        headers: header_map,
        body: body_json,
        params,
        has_extension,
        uri: pathname.clone(),
        url: UrlParts {
            path,
            pathname,
            query,
        },
    })
}
