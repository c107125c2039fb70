//! # ducktype-types
//!
//! Host type model for the duck-typing proxy generator.
//! Shapes, targets and proxies are all described with the types in this crate.
//!
//! ## Core Types
//!
//! - **[`TypeDescription`]**: A defined host type (class, struct, interface or enum).
//! - **[`MethodDescription`](members::MethodDescription)**: A method bound to its declaring type.
//! - **[`FieldDescription`](members::FieldDescription)**: A field bound to its declaring type.
//! - **[`RuntimeType`](runtime::RuntimeType)**: The type of a slot, parameter or return value.
//! - **[`Value`](value::Value)**: A dynamic value flowing through proxies.
//! - **[`TypeComparer`](comparer::TypeComparer)**: Handles type equality and assignability.
use crate::{
    error::TypeDefinitionError,
    members::{
        FieldDefinition, FieldDescription, IndexerDefinition, MethodDefinition,
        PropertyDefinition,
    },
    runtime::RuntimeType,
    value::Value,
};
use parking_lot::RwLock;
use std::{
    fmt::{Debug, Formatter},
    hash::{Hash, Hasher},
    ops::Deref,
    sync::{Arc, OnceLock},
};

#[macro_use]
mod macros;

pub mod binding;
pub mod builder;
pub mod comparer;
pub mod error;
pub mod members;
pub mod object;
pub mod runtime;
pub mod value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Accessibility {
    Public,
    Internal,
    Protected,
    ProtectedInternal,
    PrivateProtected,
    Private,
}

impl Accessibility {
    pub fn is_public(self) -> bool {
        matches!(self, Accessibility::Public)
    }

    /// Whether code in `assembly` may reach a member with this accessibility declared in `owner`.
    /// Protected access is never granted since proxies do not derive from their targets.
    pub fn is_visible_to(self, owner: &AssemblyIdentity, assembly: &str) -> bool {
        match self {
            Accessibility::Public => true,
            Accessibility::Internal | Accessibility::ProtectedInternal => {
                owner.grants_internals_to(assembly)
            }
            _ => false,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Hash)]
pub struct AssemblyIdentity {
    pub name: String,
    pub internals_visible_to: Vec<String>,
}

impl AssemblyIdentity {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            internals_visible_to: vec![],
        })
    }

    pub fn with_friends(name: impl Into<String>, friends: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            internals_visible_to: friends.iter().map(|f| f.to_string()).collect(),
        })
    }

    pub fn grants_internals_to(&self, assembly: &str) -> bool {
        self.name == assembly || self.internals_visible_to.iter().any(|f| f == assembly)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Class,
    Struct,
    Interface,
    Enum,
}

#[derive(Default, Clone)]
pub struct TypeMembers {
    pub fields: Vec<Arc<FieldDefinition>>,
    pub properties: Vec<Arc<PropertyDefinition>>,
    pub methods: Vec<Arc<MethodDefinition>>,
    pub indexers: Vec<Arc<IndexerDefinition>>,
}

impl TypeMembers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, field: FieldDefinition) -> Self {
        self.fields.push(Arc::new(field));
        self
    }

    pub fn with_property(mut self, property: PropertyDefinition) -> Self {
        self.properties.push(Arc::new(property));
        self
    }

    pub fn with_method(mut self, method: MethodDefinition) -> Self {
        self.methods.push(Arc::new(method));
        self
    }

    pub fn with_indexer(mut self, indexer: IndexerDefinition) -> Self {
        self.indexers.push(Arc::new(indexer));
        self
    }
}

static NO_MEMBERS: OnceLock<TypeMembers> = OnceLock::new();

pub struct TypeDefinition {
    pub namespace: Option<String>,
    pub name: String,
    pub assembly: Arc<AssemblyIdentity>,
    pub accessibility: Accessibility,
    pub kind: TypeKind,
    pub is_abstract: bool,
    pub is_sealed: bool,
    /// Underlying integral type, only set for enums.
    pub enum_underlying: Option<RuntimeType>,
    pub extends: Option<TypeDescription>,
    pub implements: Vec<TypeDescription>,
    members: OnceLock<TypeMembers>,
    statics: RwLock<Vec<Value>>,
}

/// Shared handle to a [`TypeDefinition`]. Equality and hashing use the definition's address.
#[derive(Clone)]
pub struct TypeDescription(Arc<TypeDefinition>);

impl Deref for TypeDescription {
    type Target = TypeDefinition;

    fn deref(&self) -> &TypeDefinition {
        &self.0
    }
}

impl Debug for TypeDescription {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

impl PartialEq for TypeDescription {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for TypeDescription {}

impl Hash for TypeDescription {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.0).hash(state);
    }
}

impl TypeDescription {
    pub(crate) fn declare(definition: TypeDefinition) -> Self {
        Self(Arc::new(definition))
    }

    /// Attaches the member lists to a declared type. Static field slots are initialized here.
    pub fn define(&self, members: TypeMembers) -> Result<(), TypeDefinitionError> {
        let statics: Vec<Value> = members
            .fields
            .iter()
            .map(|f| {
                if f.is_static {
                    f.initial_value()
                } else {
                    Value::Null
                }
            })
            .collect();
        self.0
            .members
            .set(members)
            .map_err(|_| TypeDefinitionError::AlreadyDefined(self.type_name()))?;
        *self.0.statics.write() = statics;
        Ok(())
    }

    pub fn is_defined(&self) -> bool {
        self.0.members.get().is_some()
    }

    pub fn members(&self) -> &TypeMembers {
        self.0
            .members
            .get()
            .unwrap_or_else(|| NO_MEMBERS.get_or_init(TypeMembers::default))
    }

    pub fn fields(&self) -> &[Arc<FieldDefinition>] {
        &self.members().fields
    }

    pub fn methods(&self) -> &[Arc<MethodDefinition>] {
        &self.members().methods
    }

    pub fn properties(&self) -> &[Arc<PropertyDefinition>] {
        &self.members().properties
    }

    pub fn indexers(&self) -> &[Arc<IndexerDefinition>] {
        &self.members().indexers
    }

    pub fn type_name(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{}.{}", ns, self.name),
            None => self.name.clone(),
        }
    }

    pub fn is_value_type(&self) -> bool {
        matches!(self.kind, TypeKind::Struct | TypeKind::Enum)
    }

    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    pub fn is_enum(&self) -> Option<&RuntimeType> {
        if self.kind == TypeKind::Enum {
            self.enum_underlying.as_ref()
        } else {
            None
        }
    }

    /// Whether code running as `assembly` may name this type.
    pub fn is_visible_to(&self, assembly: &str) -> bool {
        self.accessibility.is_visible_to(&self.assembly, assembly)
    }

    /// This type followed by its base classes, most derived first.
    pub fn ancestors(&self) -> impl Iterator<Item = TypeDescription> {
        std::iter::successors(Some(self.clone()), |t| t.extends.clone())
    }

    /// Every interface implemented by this type or its bases, including inherited interfaces.
    pub fn interfaces(&self) -> Vec<TypeDescription> {
        let mut found: Vec<TypeDescription> = vec![];
        let mut pending: Vec<TypeDescription> = self
            .ancestors()
            .flat_map(|t| t.implements.clone())
            .collect();
        pending.reverse();
        while let Some(next) = pending.pop() {
            if found.contains(&next) {
                continue;
            }
            pending.extend(next.implements.iter().rev().cloned());
            found.push(next);
        }
        found
    }

    pub fn static_value(&self, field: &FieldDescription) -> Value {
        self.0
            .statics
            .read()
            .get(field.index)
            .cloned()
            .unwrap_or(Value::Null)
    }

    pub fn set_static_value(&self, field: &FieldDescription, value: Value) {
        if let Some(slot) = self.0.statics.write().get_mut(field.index) {
            *slot = value;
        }
    }

    pub fn find_field(&self, name: &str) -> Option<FieldDescription> {
        self.ancestors().find_map(|owner| {
            let index = owner.fields().iter().position(|f| f.name == name)?;
            FieldDescription::new(owner, index)
        })
    }
}
