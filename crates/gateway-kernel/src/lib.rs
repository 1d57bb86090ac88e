//! Contract crate for the lambda gateway: canonical request/response types,
//! the `Router` trait, the `LambdaSpec` route-table entry, and the
//! `GatewayConfig` container with its startup validation.
//!
//! No concrete router, authenticator, cache, or invoker implementation
//! lives here — those belong in the `gateway` runtime crate. This mirrors
//! the framework-contract / runtime-implementation split used throughout
//! the rest of this workspace's kernel crate.

pub mod dynamic;
pub mod error;
pub mod lambda;
pub mod router;
pub mod types;
pub mod validation;
pub mod value;

#[cfg(feature = "config")]
pub mod config;

pub use dynamic::{CacheEnabled, CacheKeySpec, SecretSource, TokenSource};
pub use error::GatewayError;
pub use lambda::{AuthSpec, CacheSpec, LambdaDefaults, LambdaSpec, VerifyOptions};
pub use router::{Router, Segment};
pub use types::{BackendResponse, RequestArgs, ResponseEnvelope, ScalarValue, UrlParts};
pub use validation::{CacheTuning, GatewayConfig};
