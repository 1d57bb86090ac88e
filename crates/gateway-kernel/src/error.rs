//! Definition-time error types for the lambda gateway contract.
//!
//! [`GatewayError`] covers every failure mode that can be detected before a
//! single request is served: malformed configuration, duplicate or unknown
//! route patterns, invalid auth specs. Per-request failures (bad JWTs,
//! backend errors, missing routes at request time) belong to the runtime
//! crate's `PipelineError`, which wraps this type for the config-error case.

use thiserror::Error;

/// Compile-time / configuration error type for the gateway kernel contract.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum GatewayError {
    /// No lambdas were provided in the route table.
    #[error("no lambdas provided")]
    NoLambdas,

    /// No `logGroup` identifier was configured.
    #[error("no logGroup provided")]
    NoLogGroup,

    /// `cachePrefix` deserialized to something other than a string.
    #[error("cachePrefix must be a string")]
    CachePrefixNotString,

    /// A route pattern is empty or does not begin with `/`.
    #[error("route pattern '{0}' is invalid: {1}")]
    InvalidPattern(String, String),

    /// A route pattern has already been registered.
    #[error("route pattern '{0}' is already registered")]
    DuplicatePattern(String),

    /// No route with this pattern is currently registered.
    #[error("route pattern '{0}' is not registered")]
    PatternNotFound(String),

    /// A lambda's `auth` field is a truthy value that is not a structured
    /// auth configuration object (spec: "auth should be an object").
    #[error("auth should be an object")]
    InvalidAuthConfig,

    /// A lambda's `name` field is empty or whitespace-only.
    #[error("lambda name cannot be empty")]
    EmptyLambdaName,
}
