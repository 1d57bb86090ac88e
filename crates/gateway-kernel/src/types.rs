//! Core data types flowing through the request pipeline.
//!
//! These carry no I/O dependency — they are shared between the kernel's
//! matching/validation logic and the runtime crate's request handling.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// A scalar value produced by [`crate::value::parse_scalar`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Bool(bool),
    Null,
    Number(f64),
    Str(String),
    /// A structured value carried through `params` unparsed — used for the
    /// resolved `auth` claims object, which must nest as an object in the
    /// merged backend payload rather than serialize as a JSON string.
    Json(Value),
}

impl ScalarValue {
    /// Convert to a [`serde_json::Value`] for payload construction.
    pub fn to_json(&self) -> Value {
        match self {
            ScalarValue::Bool(b) => Value::Bool(*b),
            ScalarValue::Null => Value::Null,
            ScalarValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            ScalarValue::Str(s) => Value::String(s.clone()),
            ScalarValue::Json(v) => v.clone(),
        }
    }

    /// Coerce to a `&str` view when the scalar is a string, for JWT/claims
    /// lookups that expect string-typed values (`params.token`, etc.).
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScalarValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// `{ path, pathname, query }` — the parsed URL components of a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlParts {
    /// Full path including query string, e.g. `/v1/chat?a=1`.
    pub path: String,
    /// Path without query string, normalized.
    pub pathname: String,
    /// Raw query string, without the leading `?`.
    pub query: String,
}

/// Canonical parsed request — the output of `RequestParser` and the input
/// every other pipeline stage consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestArgs {
    pub method: String,
    pub host: String,
    /// Case-preserving header map (original header names, as received).
    pub headers: HashMap<String, String>,
    /// Parsed JSON body; `{}` for GET/DELETE.
    pub body: Value,
    /// Parsed query-string parameters.
    pub params: HashMap<String, ScalarValue>,
    /// True when the pathname contains a `.` (e.g. `/static/app.js`).
    pub has_extension: bool,
    /// Normalized pathname (single leading `/`, no trailing slash unless root).
    pub uri: String,
    pub url: UrlParts,
}

impl RequestArgs {
    /// Look up a header case-insensitively — callers (auth token
    /// resolution) need this even though the map preserves original case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Insert a value into `params` under the given key, overwriting any
    /// existing entry — used to stash the resolved `auth` claims object.
    pub fn set_param_json(&mut self, key: &str, value: Value) {
        self.params.insert(key.to_string(), ScalarValue::Json(value));
    }
}

/// The raw, still-opaque value a backend function returns: either a plain
/// scalar body, or a structured envelope. Discriminated by the presence of
/// both `body` and `headers` in the parsed JSON.
#[derive(Debug, Clone)]
pub enum BackendResponse {
    Plain(Value),
    Envelope {
        body: Value,
        headers: Option<HashMap<String, String>>,
        base64: Option<bool>,
        status_code: Option<u16>,
    },
}

impl BackendResponse {
    /// Classify a raw JSON payload returned by the invoker.
    pub fn from_json(value: Value) -> Self {
        if let Value::Object(ref map) = value {
            if map.contains_key("body") && map.contains_key("headers") {
                let body = map.get("body").cloned().unwrap_or(Value::Null);
                let headers = map.get("headers").and_then(|h| {
                    h.as_object().map(|o| {
                        o.iter()
                            .map(|(k, v)| (k.clone(), v.as_str().unwrap_or_default().to_string()))
                            .collect()
                    })
                });
                let base64 = map.get("base64").and_then(Value::as_bool);
                let status_code = map
                    .get("statusCode")
                    .and_then(Value::as_u64)
                    .map(|n| n as u16);
                return BackendResponse::Envelope {
                    body,
                    headers,
                    base64,
                    status_code,
                };
            }
        }
        BackendResponse::Plain(value)
    }
}

/// Internal normalized response shape, after `ResponseShaper` has applied
/// lambda defaults.
#[derive(Debug, Clone)]
pub struct ResponseEnvelope {
    pub body: Value,
    pub headers: HashMap<String, String>,
    pub base64: bool,
    pub status_code: u16,
}

impl Default for ResponseEnvelope {
    fn default() -> Self {
        Self {
            body: Value::Null,
            headers: HashMap::new(),
            base64: false,
            status_code: 200,
        }
    }
}
