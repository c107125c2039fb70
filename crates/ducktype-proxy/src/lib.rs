//! # ducktype-proxy
//!
//! Runtime duck typing: wraps an object in a proxy implementing a caller-declared shape,
//! forwarding every shape member to the best-matching member of the object's type.
//!
//! ## Core Types
//!
//! - **[`DuckTypeCache`]**: Builds proxy types on first use and publishes each exactly once.
//! - **[`ProxyType`]**: The adapter synthesized for one (shape, target type) pair.
//! - **[`ProxyInstance`]**: A proxy over one object, used through
//!   [`DuckInstance`](ducktype_types::value::DuckInstance).
//! - **[`MemberResolver`](resolver::MemberResolver)**: Chooses the target member for each
//!   shape member.
//! - **[`ConversionPlanner`](conversion::ConversionPlanner)**: Plans value conversions across
//!   the proxy boundary.
//!
//! ## Example
//!
//! ```
//! use ducktype_proxy::DuckTypeExt;
//! use ducktype_types::{
//!     builder::TypeBuilder, members::MethodDefinition, object::ObjectRef,
//!     runtime::RuntimeType, value::Value,
//! };
//!
//! let shape = TypeBuilder::interface("IGreeter")
//!     .method(MethodDefinition::new("Greet", RuntimeType::String).as_abstract())
//!     .build();
//! let target = TypeBuilder::class("Greeter")
//!     .method(MethodDefinition::new("Greet", RuntimeType::String).with_body(|_| Ok(Value::from("hi"))))
//!     .build();
//!
//! let proxy = Value::Object(ObjectRef::new(&target)).duck_proxy(&shape).unwrap();
//! assert_eq!(proxy.invoke("Greet", &mut []).unwrap(), Value::from("hi"));
//! ```
use ducktype_types::{
    value::{DuckRef, Value},
    TypeDescription,
};

pub mod cache;
pub mod config;
pub mod conversion;
pub mod error;
pub mod factory;
pub mod metrics;
pub mod proxy;
pub mod resolver;
pub mod stubs;

pub use cache::DuckTypeCache;
pub use config::DuckTypeConfig;
pub use error::{BuildError, DuckTypeError};
pub use factory::ProxyType;
pub use metrics::CacheStats;
pub use proxy::ProxyInstance;
pub use stubs::dispatch::DispatchKind;

/// Wraps `instance` as `shape` using the process-wide cache.
pub fn wrap(shape: &TypeDescription, instance: &Value) -> Result<Value, DuckTypeError> {
    DuckTypeCache::global().wrap(shape, instance)
}

/// Whether the process-wide cache can build a proxy of `shape` over `target`.
pub fn can_create(shape: &TypeDescription, target: &TypeDescription) -> bool {
    DuckTypeCache::global().can_create(shape, target)
}

pub trait DuckTypeExt {
    /// Wraps `self` as `shape` using the process-wide cache.
    fn duck_as(&self, shape: &TypeDescription) -> Result<Value, DuckTypeError>;

    fn duck_proxy(&self, shape: &TypeDescription) -> Result<DuckRef, DuckTypeError>;
}

impl DuckTypeExt for Value {
    fn duck_as(&self, shape: &TypeDescription) -> Result<Value, DuckTypeError> {
        wrap(shape, self)
    }

    fn duck_proxy(&self, shape: &TypeDescription) -> Result<DuckRef, DuckTypeError> {
        DuckTypeCache::global().proxy(shape, self)
    }
}

/// Returns the wrapped instance when `value` is a proxy, otherwise `value` itself.
pub fn unwrap_instance(value: &Value) -> &Value {
    match value {
        Value::Duck(duck) => duck.instance(),
        other => other,
    }
}
