//! `Responder` and `LogSink` — final response shaping and diagnostic
//! logging (spec §4.7).
//!
//! Every error is logged via `LogSink` before the response is written, in
//! addition to the `tracing` event emitted at the same call site (the
//! ambient stack's structured logging and the spec's external log group
//! are two distinct sinks — see SPEC_FULL.md).

use crate::error::PipelineError;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::Response;
use base64::{engine::general_purpose::STANDARD, Engine};
use gateway_kernel::ResponseEnvelope;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{interval, Duration};
use tracing::{error, warn};

#[async_trait]
pub trait LogSink: Send + Sync {
    async fn log(&self, level: &str, entry: Value);
}

/// Discards every entry. Used when `logSinkUrl` is not configured — the
/// `tracing` events still fire regardless.
pub struct NullLogSink;

#[async_trait]
impl LogSink for NullLogSink {
    async fn log(&self, _level: &str, _entry: Value) {}
}

/// Accumulates log entries and flushes them to a remote collector on an
/// interval, rather than making one HTTP call per request.
pub struct BufferedLogSink {
    buffer: Arc<Mutex<Vec<Value>>>,
}

impl BufferedLogSink {
    pub fn new(endpoint: String, flush_every: Duration) -> Self {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let flush_buffer = buffer.clone();
        tokio::spawn(async move {
            let mut ticker = interval(flush_every);
            let client = reqwest::Client::new();
            loop {
                ticker.tick().await;
                let batch = {
                    let mut guard = flush_buffer.lock().await;
                    if guard.is_empty() {
                        continue;
                    }
                    std::mem::take(&mut *guard)
                };
                if let Err(e) = client.post(&endpoint).json(&batch).send().await {
                    warn!(error = %e, "failed to flush log batch");
                }
            }
        });
        Self { buffer }
    }

    /// Test/inspection helper — not part of the `LogSink` contract.
    pub async fn drain(&self) -> Vec<Value> {
        std::mem::take(&mut *self.buffer.lock().await)
    }
}

#[async_trait]
impl LogSink for BufferedLogSink {
    async fn log(&self, level: &str, mut entry: Value) {
        if let Value::Object(ref mut map) = entry {
            map.insert("level".to_string(), Value::String(level.to_string()));
        }
        self.buffer.lock().await.push(entry);
    }
}

pub struct Responder {
    pub log_sink: Arc<dyn LogSink>,
}

impl Responder {
    fn base_headers() -> Vec<(HeaderName, HeaderValue)> {
        vec![
            (HeaderName::from_static("content-type"), HeaderValue::from_static("application/json")),
            (
                HeaderName::from_static("access-control-allow-origin"),
                HeaderValue::from_static("*"),
            ),
        ]
    }

    pub fn write(status: StatusCode, body: Value) -> Response {
        let mut builder = Response::builder().status(status);
        for (name, value) in Self::base_headers() {
            builder = builder.header(name, value);
        }
        builder
            .body(Body::from(body.to_string()))
            .unwrap_or_else(|_| Response::new(Body::empty()))
    }

    pub async fn write_error(&self, err: &PipelineError) -> Response {
        let status = err.status_code();
        let body = err.to_body();
        let level = if status.is_server_error() { "error" } else { "warn" };
        if status.is_server_error() {
            error!(status = status.as_u16(), message = %err, "request failed");
        } else {
            warn!(status = status.as_u16(), message = %err, "request rejected");
        }
        self.log_sink.log(level, json!({"message": err.to_string(), "statusCode": status.as_u16()})).await;
        Self::write(status, body)
    }

    pub async fn responds(&self, err: Option<PipelineError>, envelope: Option<ResponseEnvelope>) -> Response {
        let Some(err) = err else {
            let envelope = envelope.expect("responds requires either an error or an envelope");
            return self.write_envelope(envelope);
        };
        self.write_error(&err).await
    }

    fn write_envelope(&self, envelope: ResponseEnvelope) -> Response {
        let status = StatusCode::from_u16(envelope.status_code).unwrap_or(StatusCode::OK);
        let mut builder = Response::builder().status(status);

        let mut headers: Vec<(HeaderName, HeaderValue)> = Self::base_headers();
        for (k, v) in &envelope.headers {
            if let (Ok(name), Ok(value)) = (HeaderName::try_from(k.as_str()), HeaderValue::try_from(v.as_str())) {
                if let Some(existing) = headers.iter_mut().find(|(n, _)| *n == name) {
                    existing.1 = value;
                } else {
                    headers.push((name, value));
                }
            }
        }
        for (name, value) in headers {
            builder = builder.header(name, value);
        }

        let body = if envelope.base64 {
            if let Value::String(s) = &envelope.body {
                match STANDARD.decode(s) {
                    Ok(bytes) => Body::from(bytes),
                    Err(_) => Body::from(envelope.body.to_string()),
                }
            } else {
                Body::from(envelope.body.to_string())
            }
        } else if let Value::String(s) = &envelope.body {
            Body::from(s.clone())
        } else {
            Body::from(envelope.body.to_string())
        };

        builder.body(body).unwrap_or_else(|_| Response::new(Body::empty()))
    }
}
