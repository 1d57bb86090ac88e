//! `Invoker` — calls a named backend function over HTTP (spec §4.5).
//!
//! Wire shape mirrors an AWS Lambda-style invoke call: `{ FunctionName,
//! Payload: <JSON-encoded string>, Qualifier }`, posted to the configured
//! invoker endpoint. The response is expected to carry its own `Payload`
//! field holding the backend's JSON-encoded result.

use crate::error::PipelineError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, instrument};

#[async_trait]
pub trait Invoker: Send + Sync {
    async fn invoke(&self, name: &str, payload: Value, version: &str) -> Result<Value, PipelineError>;
}

pub struct HttpInvoker {
    base_url: String,
    client: Client,
}

impl HttpInvoker {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build reqwest client");
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }
}

#[async_trait]
impl Invoker for HttpInvoker {
    #[instrument(skip(self, payload), fields(function = %name, version = %version))]
    async fn invoke(&self, name: &str, payload: Value, version: &str) -> Result<Value, PipelineError> {
        let encoded_payload = serde_json::to_string(&payload)
            .map_err(|e| PipelineError::InternalError(format!("payload encode failed: {e}")))?;

        let wire_body = json!({
            "FunctionName": name,
            "Payload": encoded_payload,
            "Qualifier": version,
        });

        debug!(url = %self.base_url, "invoking backend function");

        let response = self
            .client
            .post(&self.base_url)
            .json(&wire_body)
            .send()
            .await
            .map_err(|e| PipelineError::InternalError(format!("invoker transport error: {e}")))?;

        let status = response.status();
        let raw: Value = response
            .json()
            .await
            .map_err(|e| PipelineError::InternalError(format!("invoker response not JSON: {e}")))?;

        if status.as_u16() >= 400 {
            return Err(PipelineError::BackendError {
                status: status.as_u16(),
                body: raw,
            });
        }

        let payload_field = raw
            .get("Payload")
            .ok_or_else(|| PipelineError::InternalError("invoker response missing Payload".to_string()))?;

        match payload_field {
            Value::String(s) => serde_json::from_str(s)
                .map_err(|e| PipelineError::InternalError(format!("backend payload not JSON: {e}"))),
            other => Ok(other.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RecordingInvoker {
        expected_name: String,
    }

    #[async_trait]
    impl Invoker for RecordingInvoker {
        async fn invoke(&self, name: &str, payload: Value, version: &str) -> Result<Value, PipelineError> {
            assert_eq!(name, self.expected_name);
            assert_eq!(version, "$LATEST");
            Ok(json!({"echo": payload}))
        }
    }

    #[tokio::test]
    async fn invoker_trait_object_is_usable_behind_dyn() {
        let invoker: Box<dyn Invoker> = Box::new(RecordingInvoker {
            expected_name: "my-fn".to_string(),
        });
        let result = invoker.invoke("my-fn", json!({"x": 1}), "$LATEST").await.unwrap();
        assert_eq!(result, json!({"echo": {"x": 1}}));
    }
}
