//! `CacheStore` — read-through cache with stale-while-revalidate semantics
//! (spec §4.5, §4.8).
//!
//! Each entry occupies two Redis keys: `{namespace}:{key}` holds the cached
//! JSON value with a TTL of `CACHE_TTL`, and `{namespace}:{key}:fresh` is a
//! marker key with a TTL of `CACHE_TTR`. While the marker exists the entry
//! is fresh; once it expires (but the value key hasn't) the entry is
//! served stale and refreshed in the background. `markToRefresh` simply
//! deletes the marker key, forcing the next read to refresh.

use crate::error::PipelineError;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{error, warn};

/// The thunk invoked on a cache miss or to refresh a stale entry. Calls
/// through to `Invoker::invoke` (spec §4.5).
pub type Fill = Box<dyn FnOnce() -> Pin<Box<dyn Future<Output = Result<Value, PipelineError>> + Send>> + Send>;

#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, namespace: &str, key: &str, fill: Fill) -> Result<Value, PipelineError>;
    async fn mark_to_refresh(&self, namespace: &str, keys: &[String]) -> Result<Value, PipelineError>;
    async fn unset(&self, namespace: &str, keys: &[String]) -> Result<Value, PipelineError>;
}

#[derive(Debug, Clone, Copy)]
pub struct CacheTuningSecs {
    pub ttl_secs: u64,
    pub ttr_secs: u64,
}

#[derive(Clone)]
pub struct RedisCacheStore {
    conn: ConnectionManager,
    tuning: CacheTuningSecs,
}

impl RedisCacheStore {
    pub async fn connect(redis_url: &str, tuning: CacheTuningSecs) -> Result<Self, PipelineError> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| PipelineError::InternalError(format!("invalid redis url: {e}")))?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| PipelineError::InternalError(format!("redis connect failed: {e}")))?;
        Ok(Self { conn, tuning })
    }

    fn value_key(namespace: &str, key: &str) -> String {
        format!("{namespace}:{key}")
    }

    fn fresh_key(namespace: &str, key: &str) -> String {
        format!("{namespace}:{key}:fresh")
    }

    async fn store(&self, namespace: &str, key: &str, value: &Value) -> Result<(), PipelineError> {
        let mut conn = self.conn.clone();
        let raw = serde_json::to_string(value)
            .map_err(|e| PipelineError::InternalError(format!("cache serialize failed: {e}")))?;
        conn.set_ex::<_, _, ()>(Self::value_key(namespace, key), raw, self.tuning.ttl_secs)
            .await
            .map_err(|e| PipelineError::InternalError(format!("redis set failed: {e}")))?;
        conn.set_ex::<_, _, ()>(Self::fresh_key(namespace, key), "1", self.tuning.ttr_secs)
            .await
            .map_err(|e| PipelineError::InternalError(format!("redis set failed: {e}")))?;
        Ok(())
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, namespace: &str, key: &str, fill: Fill) -> Result<Value, PipelineError> {
        let mut conn = self.conn.clone();
        let value_key = Self::value_key(namespace, key);
        let fresh_key = Self::fresh_key(namespace, key);

        let raw: Option<String> = conn
            .get(&value_key)
            .await
            .map_err(|e| PipelineError::InternalError(format!("redis get failed: {e}")))?;

        let Some(raw) = raw else {
            let value = fill().await?;
            self.store(namespace, key, &value).await?;
            return Ok(value);
        };

        let cached: Value = serde_json::from_str(&raw)
            .map_err(|e| PipelineError::InternalError(format!("cache deserialize failed: {e}")))?;

        let is_fresh: bool = conn
            .exists(&fresh_key)
            .await
            .map_err(|e| PipelineError::InternalError(format!("redis exists failed: {e}")))?;

        if is_fresh {
            return Ok(cached);
        }

        let store = self.clone();
        let namespace = namespace.to_string();
        let key = key.to_string();
        tokio::spawn(async move {
            match fill().await {
                Ok(fresh) => {
                    if let Err(e) = store.store(&namespace, &key, &fresh).await {
                        error!(error = %e, "failed to store refreshed cache entry");
                    }
                }
                Err(e) => warn!(error = %e, "background cache refresh failed"),
            }
        });

        Ok(cached)
    }

    async fn mark_to_refresh(&self, namespace: &str, keys: &[String]) -> Result<Value, PipelineError> {
        let mut conn = self.conn.clone();
        for key in keys {
            let _: i64 = conn
                .del(Self::fresh_key(namespace, key))
                .await
                .map_err(|e| PipelineError::InternalError(format!("redis del failed: {e}")))?;
        }
        Ok(Value::Array(keys.iter().map(|k| Value::String(k.clone())).collect()))
    }

    async fn unset(&self, namespace: &str, keys: &[String]) -> Result<Value, PipelineError> {
        let mut conn = self.conn.clone();
        for key in keys {
            let _: i64 = conn
                .del(Self::value_key(namespace, key))
                .await
                .map_err(|e| PipelineError::InternalError(format!("redis del failed: {e}")))?;
            let _: i64 = conn
                .del(Self::fresh_key(namespace, key))
                .await
                .map_err(|e| PipelineError::InternalError(format!("redis del failed: {e}")))?;
        }
        Ok(Value::Array(keys.iter().map(|k| Value::String(k.clone())).collect()))
    }
}

struct InMemoryEntry {
    value: Value,
    stored_at: std::time::Instant,
}

/// Test double with the same fresh/stale/miss contract, in-process.
#[derive(Default, Clone)]
pub struct InMemoryCacheStore {
    entries: Arc<Mutex<HashMap<String, InMemoryEntry>>>,
    tuning: CacheTuningSecs,
}

impl InMemoryCacheStore {
    pub fn new(tuning: CacheTuningSecs) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            tuning,
        }
    }
}

impl Default for CacheTuningSecs {
    fn default() -> Self {
        Self {
            ttl_secs: 30 * 24 * 3600,
            ttr_secs: 7200,
        }
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, namespace: &str, key: &str, fill: Fill) -> Result<Value, PipelineError> {
        let full_key = format!("{namespace}:{key}");
        let existing = {
            let entries = self.entries.lock().await;
            entries.get(&full_key).map(|e| (e.value.clone(), e.stored_at.elapsed()))
        };

        match existing {
            Some((value, age)) if age < Duration::from_secs(self.tuning.ttl_secs) => {
                if age < Duration::from_secs(self.tuning.ttr_secs) {
                    Ok(value)
                } else {
                    let store = self.entries.clone();
                    let full_key2 = full_key.clone();
                    tokio::spawn(async move {
                        if let Ok(fresh) = fill().await {
                            store.lock().await.insert(
                                full_key2,
                                InMemoryEntry {
                                    value: fresh,
                                    stored_at: std::time::Instant::now(),
                                },
                            );
                        }
                    });
                    Ok(value)
                }
            }
            _ => {
                let value = fill().await?;
                self.entries.lock().await.insert(
                    full_key,
                    InMemoryEntry {
                        value: value.clone(),
                        stored_at: std::time::Instant::now(),
                    },
                );
                Ok(value)
            }
        }
    }

    async fn mark_to_refresh(&self, namespace: &str, keys: &[String]) -> Result<Value, PipelineError> {
        let mut entries = self.entries.lock().await;
        for key in keys {
            let full_key = format!("{namespace}:{key}");
            if let Some(e) = entries.get_mut(&full_key) {
                e.stored_at = std::time::Instant::now() - Duration::from_secs(self.tuning.ttr_secs + 1);
            }
        }
        Ok(Value::Array(keys.iter().map(|k| Value::String(k.clone())).collect()))
    }

    async fn unset(&self, namespace: &str, keys: &[String]) -> Result<Value, PipelineError> {
        let mut entries = self.entries.lock().await;
        for key in keys {
            entries.remove(&format!("{namespace}:{key}"));
        }
        Ok(Value::Array(keys.iter().map(|k| Value::String(k.clone())).collect()))
    }
}

pub fn boxed_fill<F, Fut>(f: F) -> Fill
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Value, PipelineError>> + Send + 'static,
{
    Box::new(move || Box::pin(f()))
}
