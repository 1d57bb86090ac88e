//! `ValueCoder` — scalar coercion for query-string values, and URI
//! normalization shared by the request parser and the router.

use crate::types::ScalarValue;
use std::collections::HashMap;

/// Parse a single query-string value into a typed scalar.
///
/// `"true"`/`true` → `Bool(true)`, `"false"`/`false` → `Bool(false)`,
/// `"null"`/`"undefined"`/absent → `Null`, numeric strings → `Number`,
/// everything else is URL-decoded (failing open to the original string on
/// decode error).
pub fn parse_scalar(v: &str) -> ScalarValue {
    match v {
        "true" => return ScalarValue::Bool(true),
        "false" => return ScalarValue::Bool(false),
        "null" | "undefined" | "" => return ScalarValue::Null,
        _ => {}
    }
    if let Ok(n) = v.parse::<f64>() {
        if v.chars().all(|c| c.is_ascii_digit() || c == '.' || c == '-' || c == '+' || c == 'e' || c == 'E') {
            return ScalarValue::Number(n);
        }
    }
    match urlencoding::decode(v) {
        Ok(decoded) => ScalarValue::Str(decoded.into_owned()),
        Err(_) => ScalarValue::Str(v.to_string()),
    }
}

/// Parse a raw query string (`a=1&b=true`) into a scalar map.
///
/// Pairs with an empty key or empty value are skipped. Duplicate keys: the
/// last occurrence wins. Empty/absent input yields an empty map.
pub fn parse_query(q: &str) -> HashMap<String, ScalarValue> {
    let mut out = HashMap::new();
    if q.is_empty() {
        return out;
    }
    for pair in q.split('&') {
        if pair.is_empty() {
            continue;
        }
        let mut parts = pair.splitn(2, '=');
        let key = parts.next().unwrap_or("");
        let value = parts.next().unwrap_or("");
        if key.is_empty() || value.is_empty() {
            continue;
        }
        let decoded_key = urlencoding::decode(key)
            .map(|c| c.into_owned())
            .unwrap_or_else(|_| key.to_string());
        out.insert(decoded_key, parse_scalar(value));
    }
    out
}

/// Normalize a pathname: single leading `/`, collapsed `//` runs, no
/// trailing slash unless the result is root. Idempotent:
/// `normalize(normalize(p)) == normalize(p)`.
pub fn normalize_uri(pathname: &str) -> String {
    let collapsed: String = {
        let mut out = String::with_capacity(pathname.len());
        let mut prev_slash = false;
        for c in pathname.chars() {
            if c == '/' {
                if prev_slash {
                    continue;
                }
                prev_slash = true;
            } else {
                prev_slash = false;
            }
            out.push(c);
        }
        out
    };
    let trimmed = collapsed.trim_start_matches('/').trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}")
    }
}
