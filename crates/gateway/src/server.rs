//! `GatewayServer` — builds the axum app and serves it (spec §5, §6).
//!
//! Every request falls through to [`Pipeline::handle`]; there is no
//! per-route axum handler because the spec's route table is entirely
//! runtime-configured data, not compile-time axum routes.

use crate::cache::{CacheStore, CacheTuningSecs, RedisCacheStore};
use crate::cached_invoker::CachedInvoker;
use crate::invoker::HttpInvoker;
use crate::pipeline::Pipeline;
use crate::responder::{BufferedLogSink, LogSink, NullLogSink, Responder};
use crate::router::PatternRouter;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, Uri};
use axum::response::Response;
use axum::routing::any;
use axum::Router as AxumRouter;
use gateway_kernel::{GatewayConfig, Router};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::info;

#[derive(Clone)]
struct AppState {
    pipeline: Arc<Pipeline>,
}

pub struct GatewayServer {
    config: GatewayConfig,
}

impl GatewayServer {
    pub fn new(config: GatewayConfig) -> Self {
        Self { config }
    }

    /// Assemble the `Pipeline` from the validated config: route table,
    /// cache store (only if `redisUrl` is set), invoker, and log sink.
    pub async fn build_pipeline(&self) -> anyhow::Result<Pipeline> {
        self.config.validate()?;

        let mut router = PatternRouter::new();
        for (pattern, spec) in &self.config.lambdas {
            router.register(pattern, spec.clone())?;
        }

        let cache_store: Option<Arc<dyn CacheStore>> = match &self.config.redis_url {
            Some(url) => {
                let tuning = CacheTuningSecs {
                    ttl_secs: self.config.cache_tuning.ttl_secs,
                    ttr_secs: self.config.cache_tuning.ttr_secs,
                };
                Some(Arc::new(
                    RedisCacheStore::connect(url, tuning)
                        .await
                        .map_err(|e| anyhow::anyhow!("failed to connect to redis: {e}"))?,
                ))
            }
            None => {
                info!("no redisUrl configured — caching disabled");
                None
            }
        };

        let invoker = Arc::new(HttpInvoker::new(&self.config.invoker_url));

        let log_sink: Arc<dyn LogSink> = match &self.config.log_sink_url {
            Some(url) => Arc::new(BufferedLogSink::new(url.clone(), Duration::from_secs(5))),
            None => Arc::new(NullLogSink),
        };

        Ok(Pipeline {
            router: Arc::new(RwLock::new(Box::new(router))),
            cached_invoker: CachedInvoker {
                cache_store: cache_store.clone(),
                invoker,
                cache_prefix: self.config.cache_prefix.clone(),
            },
            cache_store,
            responder: Responder { log_sink },
        })
    }

    pub fn build_app(pipeline: Pipeline) -> AxumRouter {
        let state = AppState {
            pipeline: Arc::new(pipeline),
        };
        AxumRouter::new().fallback(any(handle_request)).with_state(state)
    }

    pub async fn start(self) -> anyhow::Result<()> {
        let port = self.config.port;
        let pipeline = self.build_pipeline().await?;
        let app = Self::build_app(pipeline);
        let addr = format!("0.0.0.0:{port}");
        info!(addr = %addr, "lambda gateway starting");
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app).await?;
        Ok(())
    }
}

async fn handle_request(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state.pipeline.handle(method, uri, headers, body).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::invoker::Invoker;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use gateway_kernel::LambdaSpec;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    struct EchoInvoker;

    #[async_trait]
    impl Invoker for EchoInvoker {
        async fn invoke(&self, name: &str, payload: Value, _version: &str) -> Result<Value, PipelineError> {
            Ok(json!({"function": name, "payload": payload}))
        }
    }

    fn test_pipeline() -> Pipeline {
        let mut router = PatternRouter::new();
        router.register("/echo", LambdaSpec::new("echo-fn")).unwrap();
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

    /// Router-level HTTP test of the assembled axum app, not just `Pipeline::handle` directly.
    #[tokio::test]
    async fn app_routes_request_through_full_axum_stack() {
        let app = GatewayServer::build_app(test_pipeline());
        let response = app
            .oneshot(Request::builder().uri("/echo").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn app_returns_404_for_unmatched_route() {
        let app = GatewayServer::build_app(test_pipeline());
        let response = app
            .oneshot(Request::builder().uri("/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
