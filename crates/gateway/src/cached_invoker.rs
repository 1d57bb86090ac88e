//! `CachedInvoker` — cache eligibility, payload construction, and backend
//! invocation (spec §4.5).

use crate::cache::{boxed_fill, CacheStore};
use crate::error::PipelineError;
use crate::invoker::Invoker;
use gateway_kernel::LambdaSpec;
use gateway_kernel::RequestArgs;
use serde_json::{json, Map, Value};
use std::sync::Arc;

pub struct CachedInvoker {
    pub cache_store: Option<Arc<dyn CacheStore>>,
    pub invoker: Arc<dyn Invoker>,
    pub cache_prefix: String,
}

impl CachedInvoker {
    pub async fn invoke(&self, lambda: &LambdaSpec, args: &RequestArgs) -> Result<Value, PipelineError> {
        let payload = build_payload(lambda, args);
        let name = lambda.name.clone();
        let qualifier = lambda.qualifier().to_string();

        let Some(cache_key) = self.resolve_cache_key(lambda, args) else {
            return self.invoker.invoke(&name, payload, &qualifier).await;
        };

        let invoker = self.invoker.clone();
        let namespace = args.host.clone();
        let fill = boxed_fill(move || async move { invoker.invoke(&name, payload, &qualifier).await });

        self.cache_store
            .as_ref()
            .expect("resolve_cache_key only returns Some when cache_store is present")
            .get(&namespace, &cache_key, fill)
            .await
    }

    /// `None` means caching is not eligible for this request (no cache
    /// store configured, no `lambda.cache`, `enabled` evaluates false, or
    /// the key evaluator doesn't return a string).
    fn resolve_cache_key(&self, lambda: &LambdaSpec, args: &RequestArgs) -> Option<String> {
        self.cache_store.as_ref()?;
        let cache = lambda.cache.as_ref()?;
        if !cache.enabled.evaluate(args) {
            return None;
        }
        let key = cache.key.evaluate(args)?;
        Some(format!("{}{key}", self.cache_prefix))
    }
}

fn build_payload(lambda: &LambdaSpec, args: &RequestArgs) -> Value {
    if lambda.params_only {
        let mut merged = Map::new();
        for (k, v) in &lambda.defaults.request_params {
            merged.insert(k.clone(), v.clone());
        }
        for (k, v) in &args.params {
            merged.insert(k.clone(), v.to_json());
        }
        Value::Object(merged)
    } else {
        let mut params = Map::new();
        for (k, v) in &lambda.defaults.request_params {
            params.insert(k.clone(), v.clone());
        }
        for (k, v) in &args.params {
            params.insert(k.clone(), v.to_json());
        }
        json!({
            "method": args.method,
            "headers": args.headers,
            "body": args.body,
            "params": params,
            "uri": args.uri,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheTuningSecs, InMemoryCacheStore};
    use gateway_kernel::dynamic::{CacheEnabled, CacheKeySpec};
    use gateway_kernel::lambda::CacheSpec;
    use gateway_kernel::types::UrlParts;
    use gateway_kernel::ScalarValue;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn args() -> RequestArgs {
        let mut params = HashMap::new();
        params.insert("q".to_string(), ScalarValue::Str("hi".to_string()));
        RequestArgs {
            method: "GET".to_string(),
            host: "api.example.com".to_string(),
            headers: HashMap::new(),
            body: Value::Object(Default::default()),
            params,
            has_extension: false,
            uri: "/chat".to_string(),
            url: UrlParts {
                path: "/chat".to_string(),
                pathname: "/chat".to_string(),
                query: String::new(),
            },
        }
    }

    struct CountingInvoker {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl Invoker for CountingInvoker {
        async fn invoke(&self, _name: &str, payload: Value, _version: &str) -> Result<Value, PipelineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(json!({"received": payload}))
        }
    }

    #[tokio::test]
    async fn params_only_payload_is_merged_params_map() {
        let lambda = LambdaSpec::new("fn").with_params_only(true);
        let calls = Arc::new(AtomicUsize::new(0));
        let invoker = Arc::new(CountingInvoker { calls: calls.clone() });
        let ci = CachedInvoker {
            cache_store: None,
            invoker,
            cache_prefix: String::new(),
        };
        let result = ci.invoke(&lambda, &args()).await.unwrap();
        assert_eq!(result["received"]["q"], "hi");
        assert!(result["received"].get("method").is_none());
    }

    #[tokio::test]
    async fn full_envelope_payload_includes_request_shape() {
        let lambda = LambdaSpec::new("fn");
        let calls = Arc::new(AtomicUsize::new(0));
        let invoker = Arc::new(CountingInvoker { calls: calls.clone() });
        let ci = CachedInvoker {
            cache_store: None,
            invoker,
            cache_prefix: String::new(),
        };
        let result = ci.invoke(&lambda, &args()).await.unwrap();
        assert_eq!(result["received"]["method"], "GET");
        assert_eq!(result["received"]["uri"], "/chat");
        assert_eq!(result["received"]["params"]["q"], "hi");
    }

    #[tokio::test]
    async fn json_param_nests_as_object_in_merged_payload() {
        let lambda = LambdaSpec::new("fn");
        let calls = Arc::new(AtomicUsize::new(0));
        let invoker = Arc::new(CountingInvoker { calls: calls.clone() });
        let ci = CachedInvoker {
            cache_store: None,
            invoker,
            cache_prefix: String::new(),
        };
        let mut request = args();
        request.set_param_json("auth", json!({"role": "admin"}));
        let result = ci.invoke(&lambda, &request).await.unwrap();
        assert_eq!(result["received"]["params"]["auth"]["role"], "admin");
    }

    #[tokio::test]
    async fn caching_disabled_without_cache_store_always_invokes() {
        let lambda = LambdaSpec::new("fn").with_cache(CacheSpec {
            enabled: CacheEnabled::Static(true),
            key: CacheKeySpec::Static("k".to_string()),
        });
        let calls = Arc::new(AtomicUsize::new(0));
        let invoker = Arc::new(CountingInvoker { calls: calls.clone() });
        let ci = CachedInvoker {
            cache_store: None,
            invoker,
            cache_prefix: String::new(),
        };
        ci.invoke(&lambda, &args()).await.unwrap();
        ci.invoke(&lambda, &args()).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn eligible_request_is_cached_across_calls() {
        let lambda = LambdaSpec::new("fn").with_cache(CacheSpec {
            enabled: CacheEnabled::Static(true),
            key: CacheKeySpec::Static("k".to_string()),
        });
        let calls = Arc::new(AtomicUsize::new(0));
        let invoker = Arc::new(CountingInvoker { calls: calls.clone() });
        let cache_store = Arc::new(InMemoryCacheStore::new(CacheTuningSecs {
            ttl_secs: 60,
            ttr_secs: 60,
        }));
        let ci = CachedInvoker {
            cache_store: Some(cache_store),
            invoker,
            cache_prefix: "pfx:".to_string(),
        };
        ci.invoke(&lambda, &args()).await.unwrap();
        ci.invoke(&lambda, &args()).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn non_string_key_disables_caching() {
        let lambda = LambdaSpec::new("fn").with_cache(CacheSpec {
            enabled: CacheEnabled::Static(true),
            key: CacheKeySpec::Dynamic(Arc::new(|_| None)),
        });
        let calls = Arc::new(AtomicUsize::new(0));
        let invoker = Arc::new(CountingInvoker { calls: calls.clone() });
        let cache_store = Arc::new(InMemoryCacheStore::new(CacheTuningSecs {
            ttl_secs: 60,
            ttr_secs: 60,
        }));
        let ci = CachedInvoker {
            cache_store: Some(cache_store),
            invoker,
            cache_prefix: String::new(),
        };
        ci.invoke(&lambda, &args()).await.unwrap();
        ci.invoke(&lambda, &args()).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
