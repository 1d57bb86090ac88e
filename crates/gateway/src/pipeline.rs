//! `Pipeline` — orchestrates one request through every component in order
//! (spec §4.9): `RequestParser → (Router | CacheAdmin) → Authenticator →
//! CachedInvoker → ResponseShaper → Responder`.

use crate::auth::authenticate;
use crate::cache::CacheStore;
use crate::cache_admin;
use crate::cached_invoker::CachedInvoker;
use crate::error::PipelineError;
use crate::request::parse_request;
use crate::responder::Responder;
use crate::shaper::shape;
use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::Response;
use gateway_kernel::Router;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::Instrument;
use uuid::Uuid;

pub struct Pipeline {
    pub router: Arc<RwLock<Box<dyn Router>>>,
    pub cached_invoker: CachedInvoker,
    pub cache_store: Option<Arc<dyn CacheStore>>,
    pub responder: Responder,
}

impl Pipeline {
    pub async fn handle(&self, method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
        if method == Method::OPTIONS || uri.path() == "/favicon.ico" {
            return Responder::write(StatusCode::OK, serde_json::Value::String(String::new()));
        }

        let request_id = Uuid::new_v4().to_string();
        let span = tracing::info_span!(
            "request",
            request_id = %request_id,
            method = %method,
            path = %uri.path(),
        );

        async move {
            match self.run(method, uri, headers, body).await {
                Ok(response) => response,
                Err(err) => self.responder.write_error(&err).await,
            }
        }
        .instrument(span)
        .await
    }

    async fn run(&self, method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Result<Response, PipelineError> {
        let args = parse_request(&method, &uri, &headers, &body)?;
        tracing::info!("request parsed");

        let is_cache_request = method == Method::POST && args.uri == "/cache";

        if is_cache_request {
            let result = cache_admin::handle(self.cache_store.as_ref(), &args.host, &args.body).await?;
            return Ok(Responder::write(StatusCode::OK, result));
        }

        let lambda = {
            let router = self.router.read().await;
            router.resolve(&args.uri).cloned()
        };

        let Some(lambda) = lambda else {
            return Err(PipelineError::NotFound(format!("no route for '{}'", args.uri)));
        };
        tracing::info!(lambda = %lambda.name, "route matched");

        let args = authenticate(lambda.auth.as_ref(), args).await?;
        let raw = self.cached_invoker.invoke(&lambda, &args).await?;
        let envelope = shape(raw, &lambda.defaults)?;
        tracing::info!(lambda = %lambda.name, status = envelope.status_code, "request completed");

        Ok(self.responder.responds(None, Some(envelope)).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheTuningSecs, InMemoryCacheStore};
    use crate::invoker::Invoker;
    use crate::responder::NullLogSink;
    use crate::router::PatternRouter;
    use async_trait::async_trait;
    use gateway_kernel::LambdaSpec;
    use serde_json::{json, Value};

    struct EchoInvoker;

    #[async_trait]
    impl Invoker for EchoInvoker {
        async fn invoke(&self, name: &str, payload: Value, _version: &str) -> Result<Value, PipelineError> {
            Ok(json!({"function": name, "payload": payload}))
        }
    }

    fn pipeline_with_routes(routes: Vec<(&str, LambdaSpec)>) -> Pipeline {
        let mut router = PatternRouter::new();
        for (pattern, spec) in routes {
            router.register(pattern, spec).unwrap();
        }
        Pipeline {
            router: Arc::new(RwLock::new(Box::new(router))),
            cached_invoker: CachedInvoker {
                cache_store: None,
                invoker: Arc::new(EchoInvoker),
                cache_prefix: String::new(),
            },
            cache_store: None,
            responder: Responder { log_sink: Arc::new(NullLogSink) },
        }
    }

    #[tokio::test]
    async fn options_request_is_empty_200() {
        let pipeline = pipeline_with_routes(vec![]);
        let response = pipeline
            .handle(Method::OPTIONS, "/anything".parse().unwrap(), HeaderMap::new(), Bytes::new())
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn favicon_is_empty_200() {
        let pipeline = pipeline_with_routes(vec![]);
        let response = pipeline
            .handle(Method::GET, "/favicon.ico".parse().unwrap(), HeaderMap::new(), Bytes::new())
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unmatched_route_is_404() {
        let pipeline = pipeline_with_routes(vec![("/known", LambdaSpec::new("fn"))]);
        let response = pipeline
            .handle(Method::GET, "/unknown".parse().unwrap(), HeaderMap::new(), Bytes::new())
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn matched_route_invokes_backend() {
        let pipeline = pipeline_with_routes(vec![("/chat", LambdaSpec::new("chat-fn"))]);
        let response = pipeline
            .handle(Method::GET, "/chat".parse().unwrap(), HeaderMap::new(), Bytes::new())
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn cache_admin_without_store_is_404() {
        let pipeline = pipeline_with_routes(vec![]);
        let body = Bytes::from_static(br#"{"operation":"unset","keys":[]}"#);
        let response = pipeline
            .handle(Method::POST, "/cache".parse().unwrap(), HeaderMap::new(), body)
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn cache_admin_with_store_succeeds() {
        let mut pipeline = pipeline_with_routes(vec![]);
        let store: Arc<dyn CacheStore> = Arc::new(InMemoryCacheStore::new(CacheTuningSecs {
            ttl_secs: 60,
            ttr_secs: 60,
        }));
        pipeline.cache_store = Some(store);
        let body = Bytes::from_static(br#"{"operation":"unset","keys":["a"]}"#);
        let response = pipeline
            .handle(Method::POST, "/cache".parse().unwrap(), HeaderMap::new(), body)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
