//! `LambdaSpec` — the per-route configuration entry. Immutable after load.

use crate::dynamic::{CacheEnabled, CacheKeySpec, SecretSource, TokenSource};
use crate::error::GatewayError;
use serde_json::Value;
use std::collections::HashMap;

/// Default values merged into requests (under client-supplied values) and
/// responses (under backend-returned values).
#[derive(Debug, Clone, Default)]
pub struct LambdaDefaults {
    pub request_params: HashMap<String, Value>,
    pub response_headers: HashMap<String, String>,
    pub response_base64: Option<bool>,
}

/// `cache: { enabled, key }`. Absence at the `LambdaSpec` level means no
/// caching for this route regardless of whether a `CacheStore` is configured.
#[derive(Debug, Clone)]
pub struct CacheSpec {
    pub enabled: CacheEnabled,
    pub key: CacheKeySpec,
}

/// Subset of JWT verification knobs a lambda can require.
#[derive(Debug, Clone, Default)]
pub struct VerifyOptions {
    pub algorithms: Vec<String>,
    pub audience: Option<String>,
    pub issuer: Option<String>,
    pub leeway_secs: Option<u64>,
}

/// `auth: { allowedFields, secret, token?, options?, requiredRoles? }`.
#[derive(Debug, Clone)]
pub struct AuthSpec {
    pub allowed_fields: Vec<String>,
    pub secret: SecretSource,
    pub token: TokenSource,
    pub options: VerifyOptions,
    pub required_roles: Vec<String>,
}

/// A single backend function binding, reachable through one or more route
/// patterns in the `RouteTable`.
#[derive(Debug, Clone)]
pub struct LambdaSpec {
    pub name: String,
    /// Version qualifier passed to the invoker; `$LATEST` if unset.
    pub version: Option<String>,
    /// If true, the invoker payload is the merged parameter map only.
    pub params_only: bool,
    pub defaults: LambdaDefaults,
    pub cache: Option<CacheSpec>,
    pub auth: Option<AuthSpec>,
}

impl LambdaSpec {
    /// Create a minimal lambda spec with just a backend function name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            params_only: false,
            defaults: LambdaDefaults::default(),
            cache: None,
            auth: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_params_only(mut self, params_only: bool) -> Self {
        self.params_only = params_only;
        self
    }

    pub fn with_defaults(mut self, defaults: LambdaDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_cache(mut self, cache: CacheSpec) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_auth(mut self, auth: AuthSpec) -> Self {
        self.auth = Some(auth);
        self
    }

    /// The version qualifier to send to the invoker.
    pub fn qualifier(&self) -> &str {
        self.version.as_deref().unwrap_or("$LATEST")
    }

    pub(crate) fn validate(&self) -> Result<(), GatewayError> {
        if self.name.trim().is_empty() {
            return Err(GatewayError::EmptyLambdaName);
        }
        Ok(())
    }
}
