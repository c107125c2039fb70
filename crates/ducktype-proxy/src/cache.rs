//! Process-wide registry of proxy types.
//!
//! Published proxy types live in a `DashMap` and are read without further locking. The
//! first request for a key takes that key's slot mutex and builds; concurrent requests
//! for the same key wait on the slot and then find the published entry, so each key is
//! built at most once. Slots are released when their build finishes; failed builds publish
//! nothing and can be retried.
use crate::{
    config::DuckTypeConfig,
    conversion::DuckChainer,
    error::DuckTypeError,
    factory::{ProxyType, ProxyTypeFactory},
    metrics::{CacheStats, DuckTypeMetrics},
    stubs::dispatch::TrampolineTable,
};
use dashmap::DashMap;
use ducktype_types::{
    comparer::TypeComparer,
    error::InvocationError,
    runtime::RuntimeType,
    value::{DuckRef, Value},
    TypeDescription, TypeKind,
};
use parking_lot::Mutex;
use std::sync::{Arc, LazyLock};
use tracing::{debug, trace};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ProxyKey {
    pub shape: TypeDescription,
    pub target: TypeDescription,
}

type Slot = Arc<Mutex<Option<Arc<ProxyType>>>>;

struct CacheInner {
    config: DuckTypeConfig,
    published: DashMap<ProxyKey, Arc<ProxyType>>,
    slots: DashMap<ProxyKey, Slot>,
    trampolines: TrampolineTable,
    metrics: DuckTypeMetrics,
}

/// Handle to a proxy type cache. Clones share the same cache.
#[derive(Clone)]
pub struct DuckTypeCache {
    inner: Arc<CacheInner>,
}

static GLOBAL_CACHE: LazyLock<DuckTypeCache> =
    LazyLock::new(|| DuckTypeCache::with_config(DuckTypeConfig::from_env()));

impl Default for DuckTypeCache {
    fn default() -> Self {
        Self::new()
    }
}

impl DuckTypeCache {
    pub fn new() -> Self {
        Self::with_config(DuckTypeConfig::default())
    }

    pub fn with_config(config: DuckTypeConfig) -> Self {
        let metrics = DuckTypeMetrics::new(config.metrics_enabled);
        Self {
            inner: Arc::new(CacheInner {
                config,
                published: DashMap::new(),
                slots: DashMap::new(),
                trampolines: TrampolineTable::new(),
                metrics,
            }),
        }
    }

    /// The process-wide cache, configured from the environment on first use.
    pub fn global() -> &'static DuckTypeCache {
        &GLOBAL_CACHE
    }

    pub fn config(&self) -> &DuckTypeConfig {
        &self.inner.config
    }

    pub fn metrics(&self) -> &DuckTypeMetrics {
        &self.inner.metrics
    }

    pub fn get_or_build(
        &self,
        shape: &TypeDescription,
        target: &TypeDescription,
    ) -> Result<Arc<ProxyType>, DuckTypeError> {
        let key = ProxyKey {
            shape: shape.clone(),
            target: target.clone(),
        };
        loop {
            if let Some(found) = self.inner.published.get(&key) {
                self.inner.metrics.record_proxy_cache_hit();
                return Ok(found.clone());
            }

            let slot: Slot = self.inner.slots.entry(key.clone()).or_default().clone();
            let mut guard = slot.lock();
            if let Some(found) = guard.as_ref() {
                trace!("proxy type for {:?} published while waiting", key);
                self.inner.metrics.record_proxy_cache_hit();
                return Ok(found.clone());
            }
            // the slot was released by a failed build while this thread waited on it
            let current = self
                .inner
                .slots
                .get(&key)
                .is_some_and(|s| Arc::ptr_eq(s.value(), &slot));
            if !current {
                continue;
            }
            self.inner.metrics.record_proxy_cache_miss();

            let factory = ProxyTypeFactory::new(
                &self.inner.config,
                &self.inner.trampolines,
                &self.inner.metrics,
            );
            let result = match factory.build(shape, target) {
                Ok(proxy) => {
                    let proxy = Arc::new(proxy);
                    *guard = Some(proxy.clone());
                    self.inner.published.insert(key.clone(), proxy.clone());
                    self.inner.metrics.record_build();
                    Ok(proxy)
                }
                Err(source) => {
                    debug!("proxy build for {:?} failed: {}", key, source);
                    self.inner.metrics.record_failed_build();
                    Err(DuckTypeError::BuildAborted {
                        shape: shape.type_name(),
                        target: target.type_name(),
                        source,
                    })
                }
            };
            self.inner.slots.remove_if(&key, |_, s| Arc::ptr_eq(s, &slot));
            return result;
        }
    }

    /// Wraps `instance` as `shape`.
    ///
    /// Proxies already assignable to `shape` are returned unchanged; other proxies are
    /// re-wrapped around their underlying instance. Struct shapes return a populated copy.
    pub fn wrap(&self, shape: &TypeDescription, instance: &Value) -> Result<Value, DuckTypeError> {
        match instance {
            Value::Null => Err(DuckTypeError::ArgumentNull {
                shape: shape.type_name(),
            }),
            Value::Object(object) => {
                let proxy = self.get_or_build(shape, object.description())?;
                proxy
                    .instantiate(instance.clone(), self)
                    .map_err(|source| DuckTypeError::CopyFailed {
                        shape: shape.type_name(),
                        source,
                    })
            }
            Value::Duck(duck) => {
                let comparer = TypeComparer::new();
                if comparer.is_assignable_from(
                    &RuntimeType::from(shape),
                    &RuntimeType::from(duck.shape()),
                ) {
                    return Ok(instance.clone());
                }
                self.wrap(shape, duck.instance())
            }
            other => Err(DuckTypeError::UnsupportedTarget {
                actual: other.type_name(),
            }),
        }
    }

    /// Like [`wrap`](Self::wrap) but returns the proxy itself. Struct shapes are rejected.
    pub fn proxy(&self, shape: &TypeDescription, instance: &Value) -> Result<DuckRef, DuckTypeError> {
        if shape.kind == TypeKind::Struct {
            return Err(DuckTypeError::CopyShape {
                shape: shape.type_name(),
            });
        }
        match self.wrap(shape, instance)? {
            Value::Duck(duck) => Ok(duck),
            other => Err(DuckTypeError::UnsupportedTarget {
                actual: other.type_name(),
            }),
        }
    }

    /// Whether a proxy of `shape` over `target` can be built. Builds (and caches) it when so.
    pub fn can_create(&self, shape: &TypeDescription, target: &TypeDescription) -> bool {
        self.get_or_build(shape, target).is_ok()
    }

    pub fn contains(&self, shape: &TypeDescription, target: &TypeDescription) -> bool {
        self.inner.published.contains_key(&ProxyKey {
            shape: shape.clone(),
            target: target.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.inner.published.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.published.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.inner
            .metrics
            .cache_statistics(self.len(), self.inner.trampolines.len())
    }
}

impl DuckChainer for DuckTypeCache {
    fn chain(&self, shape: &TypeDescription, value: &Value) -> Result<Value, InvocationError> {
        self.wrap(shape, value)
            .map_err(|e| InvocationError::DuckChain(e.to_string()))
    }
}
