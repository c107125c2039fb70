use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Serialize, Clone, Copy)]
pub struct CacheStat {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub size: usize,
}

#[derive(Debug, Serialize, Clone, Copy)]
pub struct CacheStats {
    pub proxy_types: CacheStat,
    pub trampolines: CacheStat,
    pub builds: u64,
    pub failed_builds: u64,
}

impl std::fmt::Display for CacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Duck Typing Cache Statistics:")?;
        writeln!(f, "  Proxy Types:   {}", self.proxy_types)?;
        writeln!(f, "  Trampolines:   {}", self.trampolines)?;
        writeln!(
            f,
            "  Builds:        {:>8} ({} failed)",
            self.builds, self.failed_builds
        )?;
        Ok(())
    }
}

impl std::fmt::Display for CacheStat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "hits: {:>8}, misses: {:>8}, hit_rate: {:>6.2}%, size: {:>8}",
            self.hits,
            self.misses,
            self.hit_rate * 100.0,
            self.size
        )
    }
}

/// Counters for the proxy cache.
///
/// Counters are independent, so `Ordering::Relaxed` is enough. When disabled every
/// `record_*` call is a no-op.
#[derive(Debug, Default)]
pub struct DuckTypeMetrics {
    enabled: bool,
    pub proxy_cache_hits: AtomicU64,
    pub proxy_cache_misses: AtomicU64,
    pub trampoline_cache_hits: AtomicU64,
    pub trampoline_cache_misses: AtomicU64,
    /// Proxy types successfully built
    pub builds: AtomicU64,
    /// Builds aborted by a structural mismatch
    pub failed_builds: AtomicU64,
}

impl DuckTypeMetrics {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Self::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[inline]
    fn bump(&self, counter: &AtomicU64) {
        if self.enabled {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn record_proxy_cache_hit(&self) {
        self.bump(&self.proxy_cache_hits);
    }

    #[inline]
    pub fn record_proxy_cache_miss(&self) {
        self.bump(&self.proxy_cache_misses);
    }

    #[inline]
    pub fn record_trampoline_cache_hit(&self) {
        self.bump(&self.trampoline_cache_hits);
    }

    #[inline]
    pub fn record_trampoline_cache_miss(&self) {
        self.bump(&self.trampoline_cache_misses);
    }

    pub fn record_build(&self) {
        self.bump(&self.builds);
    }

    pub fn record_failed_build(&self) {
        self.bump(&self.failed_builds);
    }

    pub fn cache_statistics(&self, proxy_types: usize, trampolines: usize) -> CacheStats {
        CacheStats {
            proxy_types: self.stat(
                self.proxy_cache_hits.load(Ordering::Relaxed),
                self.proxy_cache_misses.load(Ordering::Relaxed),
                proxy_types,
            ),
            trampolines: self.stat(
                self.trampoline_cache_hits.load(Ordering::Relaxed),
                self.trampoline_cache_misses.load(Ordering::Relaxed),
                trampolines,
            ),
            builds: self.builds.load(Ordering::Relaxed),
            failed_builds: self.failed_builds.load(Ordering::Relaxed),
        }
    }

    fn stat(&self, hits: u64, misses: u64, size: usize) -> CacheStat {
        let total = hits + misses;
        let hit_rate = if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        };
        CacheStat {
            hits,
            misses,
            hit_rate,
            size,
        }
    }
}
