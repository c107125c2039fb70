use crate::{
    members::{FieldDefinition, IndexerDefinition, MethodDefinition, PropertyDefinition},
    runtime::RuntimeType,
    Accessibility, AssemblyIdentity, TypeDefinition, TypeDescription, TypeKind, TypeMembers,
};
use parking_lot::RwLock;
use std::sync::{Arc, OnceLock};

/// Fluent constructor for host types.
///
/// [`build`](TypeBuilder::build) declares and defines in one step. Self-referential types
/// (an interface whose members return the interface itself) are made with
/// [`declare`](TypeBuilder::declare) followed by [`TypeDescription::define`].
pub struct TypeBuilder {
    namespace: Option<String>,
    name: String,
    assembly: Arc<AssemblyIdentity>,
    accessibility: Accessibility,
    kind: TypeKind,
    is_abstract: bool,
    is_sealed: bool,
    enum_underlying: Option<RuntimeType>,
    extends: Option<TypeDescription>,
    implements: Vec<TypeDescription>,
    members: TypeMembers,
}

impl TypeBuilder {
    fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            namespace: None,
            name: name.into(),
            assembly: AssemblyIdentity::new("Host"),
            accessibility: Accessibility::Public,
            kind,
            is_abstract: kind == TypeKind::Interface,
            is_sealed: matches!(kind, TypeKind::Struct | TypeKind::Enum),
            enum_underlying: None,
            extends: None,
            implements: vec![],
            members: TypeMembers::default(),
        }
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Class)
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Interface)
    }

    pub fn structure(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Struct)
    }

    pub fn enumeration(name: impl Into<String>, underlying: RuntimeType) -> Self {
        let mut builder = Self::new(name, TypeKind::Enum);
        builder.enum_underlying = Some(underlying);
        builder
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn assembly(mut self, assembly: &Arc<AssemblyIdentity>) -> Self {
        self.assembly = assembly.clone();
        self
    }

    pub fn accessibility(mut self, accessibility: Accessibility) -> Self {
        self.accessibility = accessibility;
        self
    }

    pub fn internal(self) -> Self {
        self.accessibility(Accessibility::Internal)
    }

    pub fn private(self) -> Self {
        self.accessibility(Accessibility::Private)
    }

    pub fn as_abstract(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn sealed(mut self) -> Self {
        self.is_sealed = true;
        self
    }

    pub fn extends(mut self, base: &TypeDescription) -> Self {
        self.extends = Some(base.clone());
        self
    }

    pub fn implements(mut self, interface: &TypeDescription) -> Self {
        self.implements.push(interface.clone());
        self
    }

    pub fn field(mut self, field: FieldDefinition) -> Self {
        self.members = self.members.with_field(field);
        self
    }

    pub fn property(mut self, property: PropertyDefinition) -> Self {
        self.members = self.members.with_property(property);
        self
    }

    pub fn method(mut self, method: MethodDefinition) -> Self {
        self.members = self.members.with_method(method);
        self
    }

    pub fn indexer(mut self, indexer: IndexerDefinition) -> Self {
        self.members = self.members.with_indexer(indexer);
        self
    }

    /// Creates the type without members. Members added to the builder are discarded.
    pub fn declare(self) -> TypeDescription {
        self.split().0
    }

    pub fn build(self) -> TypeDescription {
        let (description, members) = self.split();
        // a freshly declared type is never already defined
        let _ = description.define(members);
        description
    }

    fn split(self) -> (TypeDescription, TypeMembers) {
        let description = TypeDescription::declare(TypeDefinition {
            namespace: self.namespace,
            name: self.name,
            assembly: self.assembly,
            accessibility: self.accessibility,
            kind: self.kind,
            is_abstract: self.is_abstract,
            is_sealed: self.is_sealed,
            enum_underlying: self.enum_underlying,
            extends: self.extends,
            implements: self.implements,
            members: OnceLock::new(),
            statics: RwLock::new(vec![]),
        });
        (description, self.members)
    }
}
