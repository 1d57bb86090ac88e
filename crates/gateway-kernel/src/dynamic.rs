//! Configuration polymorphism: `lambda.cache.enabled`, `lambda.cache.key`,
//! `lambda.auth.token`, `lambda.auth.secret` may each be a literal value or
//! a function of the current request. Modeled as tagged sums, evaluated
//! uniformly via `.evaluate(...)`.

use crate::types::RequestArgs;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// `bool | (args → bool)`.
#[derive(Clone)]
pub enum CacheEnabled {
    Static(bool),
    Dynamic(Arc<dyn Fn(&RequestArgs) -> bool + Send + Sync>),
}

impl CacheEnabled {
    pub fn evaluate(&self, args: &RequestArgs) -> bool {
        match self {
            CacheEnabled::Static(b) => *b,
            CacheEnabled::Dynamic(f) => f(args),
        }
    }
}

impl fmt::Debug for CacheEnabled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheEnabled::Static(b) => write!(f, "CacheEnabled::Static({b})"),
            CacheEnabled::Dynamic(_) => write!(f, "CacheEnabled::Dynamic(<fn>)"),
        }
    }
}

/// `string | (args → string)`.
#[derive(Clone)]
pub enum CacheKeySpec {
    Static(String),
    Dynamic(Arc<dyn Fn(&RequestArgs) -> Option<String> + Send + Sync>),
}

impl CacheKeySpec {
    /// Evaluate to a cache key. A dynamic resolver that does not return a
    /// string disables caching for this request (returns `None`).
    pub fn evaluate(&self, args: &RequestArgs) -> Option<String> {
        match self {
            CacheKeySpec::Static(s) => Some(s.clone()),
            CacheKeySpec::Dynamic(f) => f(args),
        }
    }
}

impl fmt::Debug for CacheKeySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKeySpec::Static(s) => write!(f, "CacheKeySpec::Static({s:?})"),
            CacheKeySpec::Dynamic(_) => write!(f, "CacheKeySpec::Dynamic(<fn>)"),
        }
    }
}

/// `(params, headers) → token`, or absent (use the default resolution
/// order: `Authorization` header, then `params.token`).
#[derive(Clone)]
pub enum TokenSource {
    Default,
    Dynamic(Arc<dyn Fn(&HashMap<String, crate::types::ScalarValue>, &HashMap<String, String>) -> Option<String> + Send + Sync>),
}

impl TokenSource {
    pub fn resolve(&self, args: &RequestArgs) -> Option<String> {
        match self {
            TokenSource::Default => args
                .header("authorization")
                .map(str::to_string)
                .or_else(|| args.params.get("token").and_then(|v| v.as_str().map(str::to_string))),
            TokenSource::Dynamic(f) => f(&args.params, &args.headers),
        }
    }
}

impl fmt::Debug for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenSource::Default => write!(f, "TokenSource::Default"),
            TokenSource::Dynamic(_) => write!(f, "TokenSource::Dynamic(<fn>)"),
        }
    }
}

/// `string | (payload, params, headers → string)`.
#[derive(Clone)]
pub enum SecretSource {
    Static(String),
    Dynamic(Arc<dyn Fn(&Value, &HashMap<String, crate::types::ScalarValue>, &HashMap<String, String>) -> String + Send + Sync>),
}

impl SecretSource {
    pub fn resolve(&self, payload: &Value, args: &RequestArgs) -> String {
        match self {
            SecretSource::Static(s) => s.clone(),
            SecretSource::Dynamic(f) => f(payload, &args.params, &args.headers),
        }
    }
}

impl fmt::Debug for SecretSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecretSource::Static(_) => write!(f, "SecretSource::Static(<redacted>)"),
            SecretSource::Dynamic(_) => write!(f, "SecretSource::Dynamic(<fn>)"),
        }
    }
}
