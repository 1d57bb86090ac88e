//! `lambda-gateway` — an HTTP gateway that dispatches requests to named
//! backend "lambda" functions, with longest-prefix routing, JWT auth, a
//! read-through cache, and diagnostic logging.
//!
//! # Pipeline
//!
//! Every request runs through, in order: [`request::parse_request`] →
//! [`router::PatternRouter`] (or [`cache_admin`] for `POST /cache`) →
//! [`auth::authenticate`] → [`cached_invoker::CachedInvoker`] →
//! [`shaper::shape`] → [`responder::Responder`]. [`pipeline::Pipeline`]
//! orchestrates the sequence; [`server::GatewayServer`] wires it to axum.

pub mod auth;
pub mod cache;
pub mod cache_admin;
pub mod cached_invoker;
pub mod error;
pub mod invoker;
pub mod pipeline;
pub mod request;
pub mod responder;
pub mod router;
pub mod server;
pub mod shaper;

pub use error::{PipelineError, PipelineResult};
pub use pipeline::Pipeline;
pub use server::GatewayServer;
