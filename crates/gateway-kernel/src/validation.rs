//! Gateway configuration container and startup validation.
//!
//! [`GatewayConfig`] aggregates the route table and the global settings
//! named in spec §6, and exposes [`validate()`](GatewayConfig::validate) to
//! surface the fatal startup errors before any runtime resource (socket,
//! Redis connection, invoker client) is allocated.

use crate::error::GatewayError;
use crate::lambda::LambdaSpec;

/// Cache tuning, passed through to the `CacheStore` collaborator.
#[derive(Debug, Clone)]
pub struct CacheTuning {
    /// Entry eviction, in seconds. Default 30 days.
    pub ttl_secs: u64,
    /// Time-to-refresh, in seconds. Default 7200 (2 hours).
    pub ttr_secs: u64,
    /// Cache store RPC timeout, in milliseconds. Default 1000.
    pub timeout_ms: u64,
}

impl Default for CacheTuning {
    fn default() -> Self {
        Self {
            ttl_secs: 30 * 24 * 3600,
            ttr_secs: 7200,
            timeout_ms: 1000,
        }
    }
}

/// Top-level gateway configuration (spec §6).
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Route table: `(pattern, spec)` pairs in declaration order.
    pub lambdas: Vec<(String, LambdaSpec)>,
    /// Log sink identifier.
    pub log_group: String,
    /// Redis connection URL; absent disables caching entirely.
    pub redis_url: Option<String>,
    /// TCP port to listen on. Default 8080.
    pub port: u16,
    /// Prefix prepended to every computed cache key.
    pub cache_prefix: String,
    pub cache_tuning: CacheTuning,
    /// Base URL of the function-invocation service.
    pub invoker_url: String,
    /// Endpoint the buffered log sink flushes to.
    pub log_sink_url: Option<String>,
}

impl GatewayConfig {
    /// Construct a minimal config with the two required fields.
    pub fn new(log_group: impl Into<String>) -> Self {
        Self {
            lambdas: Vec::new(),
            log_group: log_group.into(),
            redis_url: None,
            port: 8080,
            cache_prefix: String::new(),
            cache_tuning: CacheTuning::default(),
            invoker_url: String::new(),
            log_sink_url: None,
        }
    }

    pub fn with_lambda(mut self, pattern: impl Into<String>, spec: LambdaSpec) -> Self {
        self.lambdas.push((pattern.into(), spec));
        self
    }

    pub fn with_redis_url(mut self, url: impl Into<String>) -> Self {
        self.redis_url = Some(url.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_cache_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.cache_prefix = prefix.into();
        self
    }

    pub fn with_invoker_url(mut self, url: impl Into<String>) -> Self {
        self.invoker_url = url.into();
        self
    }

    pub fn with_log_sink_url(mut self, url: impl Into<String>) -> Self {
        self.log_sink_url = Some(url.into());
        self
    }

    pub fn with_cache_tuning(mut self, tuning: CacheTuning) -> Self {
        self.cache_tuning = tuning;
        self
    }

    /// Validate startup invariants (spec §6 exit codes).
    ///
    /// Checks, in order: at least one lambda is registered; `log_group` is
    /// non-empty; every route pattern is well-formed; every lambda passes
    /// its own structural check; no two patterns collide.
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.lambdas.is_empty() {
            return Err(GatewayError::NoLambdas);
        }
        if self.log_group.trim().is_empty() {
            return Err(GatewayError::NoLogGroup);
        }

        let mut seen = std::collections::HashSet::new();
        for (pattern, spec) in &self.lambdas {
            if !pattern.starts_with('/') {
                return Err(GatewayError::InvalidPattern(
                    pattern.clone(),
                    "pattern must start with '/'".to_string(),
                ));
            }
            if !seen.insert(pattern.as_str()) {
                return Err(GatewayError::DuplicatePattern(pattern.clone()));
            }
            spec.validate()?;
        }
        Ok(())
    }
}
