//! # ducktype-rs
//!
//! Runtime duck-typing proxies over a host type model.
//!
//! - [`ducktype_types`]: the host model (types, members, values, objects).
//! - [`ducktype_proxy`]: proxy type generation, caching and the wrapping API.
//!
//! Most callers only need the [`prelude`].
pub use ducktype_proxy;
pub use ducktype_types;

pub mod prelude {
    pub use ducktype_proxy::{
        can_create, wrap, BuildError, DuckTypeCache, DuckTypeConfig, DuckTypeError, DuckTypeExt,
    };
    pub use ducktype_types::{
        binding::{BindingFlags, DuckAttribute, DuckKind},
        builder::TypeBuilder,
        error::InvocationError,
        members::{FieldDefinition, IndexerDefinition, MethodDefinition, PropertyDefinition},
        object::ObjectRef,
        runtime::RuntimeType,
        value::{DuckInstance, DuckRef, Value},
        Accessibility, AssemblyIdentity, TypeDescription,
    };
}
