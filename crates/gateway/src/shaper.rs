//! `ResponseShaper` — normalizes a raw backend response into a
//! [`ResponseEnvelope`], applying lambda defaults (spec §4.6).

use crate::error::PipelineError;
use gateway_kernel::{BackendResponse, LambdaDefaults, ResponseEnvelope};
use serde_json::Value;

pub fn shape(raw: Value, defaults: &LambdaDefaults) -> Result<ResponseEnvelope, PipelineError> {
    let envelope = match BackendResponse::from_json(raw) {
        BackendResponse::Envelope {
            body,
            headers,
            base64,
            status_code,
        } => {
            let mut merged_headers = defaults.response_headers.clone();
            if let Some(backend_headers) = headers {
                merged_headers.extend(backend_headers);
            }
            ResponseEnvelope {
                body,
                headers: merged_headers,
                base64: base64.or(defaults.response_base64).unwrap_or(false),
                status_code: status_code.unwrap_or(200),
            }
        }
        BackendResponse::Plain(body) => ResponseEnvelope {
            body,
            headers: defaults.response_headers.clone(),
            base64: defaults.response_base64.unwrap_or(false),
            status_code: 200,
        },
    };

    if envelope.status_code >= 400 {
        return Err(PipelineError::BackendError {
            status: envelope.status_code,
            body: envelope.body,
        });
    }

    Ok(envelope)
}
