//! Runtime configuration.
//!
//! ## Environment Variables
//!
//! - `DUCKTYPE_PROXY_ASSEMBLY`: Assembly identity the generated proxies run as. Targets whose
//!   assembly lists this name in `internals_visible_to` have their internal members bound
//!   directly (default: `DuckTypeProxies`)
//!
//! - `DUCKTYPE_METRICS`: Collect cache and build counters (`"0"` or `"false"` to disable,
//!   default: enabled)
//!
//! - `DUCKTYPE_WARN_AMBIGUOUS`: Emit a warning whenever several target overloads remain
//!   after narrowing (`"1"` or `"true"`)
use std::env;

pub const DEFAULT_PROXY_ASSEMBLY: &str = "DuckTypeProxies";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuckTypeConfig {
    pub proxy_assembly: String,
    pub metrics_enabled: bool,
    pub warn_on_ambiguous_overloads: bool,
}

impl Default for DuckTypeConfig {
    fn default() -> Self {
        Self {
            proxy_assembly: DEFAULT_PROXY_ASSEMBLY.to_string(),
            metrics_enabled: true,
            warn_on_ambiguous_overloads: false,
        }
    }
}

fn flag(name: &str) -> Option<bool> {
    env::var(name).ok().map(|v| {
        let v = v.trim().to_ascii_lowercase();
        v == "1" || v == "true" || v == "yes" || v == "on"
    })
}

impl DuckTypeConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let proxy_assembly = env::var("DUCKTYPE_PROXY_ASSEMBLY")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.proxy_assembly);
        Self {
            proxy_assembly,
            metrics_enabled: flag("DUCKTYPE_METRICS").unwrap_or(defaults.metrics_enabled),
            warn_on_ambiguous_overloads: flag("DUCKTYPE_WARN_AMBIGUOUS")
                .unwrap_or(defaults.warn_on_ambiguous_overloads),
        }
    }

    pub fn with_proxy_assembly(mut self, name: impl Into<String>) -> Self {
        self.proxy_assembly = name.into();
        self
    }

    pub fn with_metrics(mut self, enabled: bool) -> Self {
        self.metrics_enabled = enabled;
        self
    }

    pub fn with_ambiguity_warnings(mut self, enabled: bool) -> Self {
        self.warn_on_ambiguous_overloads = enabled;
        self
    }
}
