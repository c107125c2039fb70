//! Builds one [`ProxyType`] per (shape, target type) pair.
//!
//! Interfaces and open classes get a forwarding table: one stub per method, property and
//! indexer of the shape. Struct shapes get a copy table that fills a fresh shape instance
//! from the target when the proxy is instantiated.
use crate::{
    cache::DuckTypeCache,
    config::DuckTypeConfig,
    conversion::{ConversionPlan, DuckChainer},
    error::BuildError,
    metrics::DuckTypeMetrics,
    proxy::ProxyInstance,
    resolver::effective_binding,
    stubs::{
        dispatch::{select_strategy, DispatchKind, DispatchStrategy, Forward, TrampolineTable},
        fields::FieldAccessor,
        indexers::IndexerStub,
        methods::MethodStub,
        properties::PropertyStub,
        Accessor, BuildContext,
    },
};
use ducktype_types::{
    binding::DuckKind,
    error::InvocationError,
    members::{
        FieldDescription, IndexerDescription, MethodDescription, MethodKind, MethodSlot,
        PropertyDescription,
    },
    object::ObjectRef,
    runtime::RuntimeType,
    value::{DuckRef, Value},
    Accessibility, TypeDescription, TypeKind,
};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use tracing::{debug, trace};

static NEXT_PROXY_ID: AtomicUsize = AtomicUsize::new(1);

#[derive(Clone, Debug)]
pub(crate) struct MethodEntry {
    pub shape: MethodDescription,
    pub accessor: Accessor,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct ForwardingTable {
    pub methods: Vec<MethodEntry>,
    pub properties: Vec<PropertyStub>,
    pub indexers: Vec<IndexerStub>,
}

#[derive(Clone, Debug)]
enum CopySource {
    Getter {
        target: MethodDescription,
        strategy: DispatchStrategy,
        plan: ConversionPlan,
    },
    Field(FieldAccessor),
}

impl CopySource {
    fn read(&self, instance: &Value, chainer: &dyn DuckChainer) -> Result<Value, InvocationError> {
        match self {
            CopySource::Getter {
                target,
                strategy,
                plan,
            } => {
                let receiver = if target.is_static() {
                    Value::Null
                } else {
                    instance.clone()
                };
                let raw = strategy.forward(&receiver, &mut [], &[])?;
                plan.apply(raw, chainer)
            }
            CopySource::Field(accessor) => accessor.get(instance, chainer),
        }
    }
}

#[derive(Clone, Debug)]
struct CopyEntry {
    field: FieldDescription,
    source: CopySource,
}

#[derive(Clone, Debug)]
enum ProxyLayout {
    Forwarding(ForwardingTable),
    Copy(Vec<CopyEntry>),
}

/// A synthesized adapter from one target type to one shape. Immutable once built.
#[derive(Debug)]
pub struct ProxyType {
    id: usize,
    name: String,
    shape: TypeDescription,
    target: TypeDescription,
    layout: ProxyLayout,
}

impl ProxyType {
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape(&self) -> &TypeDescription {
        &self.shape
    }

    pub fn target(&self) -> &TypeDescription {
        &self.target
    }

    /// Whether instantiating produces a copy of a struct shape instead of a forwarding proxy.
    pub fn is_copy(&self) -> bool {
        matches!(self.layout, ProxyLayout::Copy(_))
    }

    /// How the first shape method named `name` reaches its target, if it forwards at all.
    pub fn method_dispatch(&self, name: &str) -> Option<DispatchKind> {
        self.forwarding()?
            .methods
            .iter()
            .find(|m| m.shape.name() == name)
            .and_then(|m| m.accessor.stub())
            .map(|stub| stub.dispatch_kind())
    }

    pub(crate) fn forwarding(&self) -> Option<&ForwardingTable> {
        match &self.layout {
            ProxyLayout::Forwarding(table) => Some(table),
            ProxyLayout::Copy(_) => None,
        }
    }

    /// Wraps `instance`. Struct shapes yield a populated shape object instead of a proxy.
    pub fn instantiate(
        self: &Arc<Self>,
        instance: Value,
        cache: &DuckTypeCache,
    ) -> Result<Value, InvocationError> {
        match &self.layout {
            ProxyLayout::Forwarding(_) => {
                let proxy: DuckRef = ProxyInstance::new(self.clone(), instance, cache.clone());
                Ok(Value::Duck(proxy))
            }
            ProxyLayout::Copy(entries) => {
                let copy = ObjectRef::new(&self.shape);
                for entry in entries {
                    copy.store(&entry.field, entry.source.read(&instance, cache)?);
                }
                Ok(Value::Object(copy))
            }
        }
    }
}

pub struct ProxyTypeFactory<'a> {
    config: &'a DuckTypeConfig,
    trampolines: &'a TrampolineTable,
    metrics: &'a DuckTypeMetrics,
}

impl<'a> ProxyTypeFactory<'a> {
    pub fn new(
        config: &'a DuckTypeConfig,
        trampolines: &'a TrampolineTable,
        metrics: &'a DuckTypeMetrics,
    ) -> Self {
        Self {
            config,
            trampolines,
            metrics,
        }
    }

    pub fn build(
        &self,
        shape: &TypeDescription,
        target: &TypeDescription,
    ) -> Result<ProxyType, BuildError> {
        debug!("building proxy type for {:?} over {:?}", shape, target);
        let ctx = BuildContext::new(self.config, self.trampolines, self.metrics);
        if !ctx.type_accessible(shape) {
            return Err(BuildError::ShapeNotVisible(shape.type_name()));
        }
        let layout = match shape.kind {
            TypeKind::Interface => ProxyLayout::Forwarding(self.forwarding(shape, target, &ctx)?),
            TypeKind::Class if !shape.is_sealed => {
                ProxyLayout::Forwarding(self.forwarding(shape, target, &ctx)?)
            }
            TypeKind::Struct => ProxyLayout::Copy(self.copy(shape, target, &ctx)?),
            _ => return Err(BuildError::InvalidShapeKind(shape.type_name())),
        };
        let proxy = ProxyType {
            id: NEXT_PROXY_ID.fetch_add(1, Ordering::Relaxed),
            name: format!("DuckProxy<{}->{}>", shape.type_name(), target.type_name()),
            shape: shape.clone(),
            target: target.clone(),
            layout,
        };
        debug!("built {} (id {})", proxy.name, proxy.id);
        Ok(proxy)
    }

    /// Types contributing members to the shape: an interface and everything it extends, or a
    /// class and its bases, most derived first.
    fn shape_sources(shape: &TypeDescription) -> Vec<TypeDescription> {
        if shape.is_interface() {
            std::iter::once(shape.clone())
                .chain(shape.interfaces())
                .collect()
        } else {
            shape.ancestors().collect()
        }
    }

    fn forwarding(
        &self,
        shape: &TypeDescription,
        target: &TypeDescription,
        ctx: &BuildContext,
    ) -> Result<ForwardingTable, BuildError> {
        let sources = Self::shape_sources(shape);
        let inherited = |owner: &TypeDescription, accessibility: Accessibility| {
            shape.is_interface() || owner == shape || accessibility != Accessibility::Private
        };
        let mut table = ForwardingTable::default();

        let mut signatures: Vec<String> = vec![];
        for owner in &sources {
            for (index, def) in owner.methods().iter().enumerate() {
                let signature = def.signature_string();
                if !inherited(owner, def.accessibility) || signatures.contains(&signature) {
                    continue;
                }
                signatures.push(signature);
                let Some(method) = MethodDescription::new(owner.clone(), MethodSlot::Method(index))
                else {
                    continue;
                };
                let accessor = Self::method_accessor(&method, shape, target, ctx)?;
                table.methods.push(MethodEntry {
                    shape: method,
                    accessor,
                });
            }
        }

        let mut names: Vec<String> = vec![];
        for owner in &sources {
            for (index, def) in owner.properties().iter().enumerate() {
                if !inherited(owner, def.visibility()) || names.contains(&def.name) {
                    continue;
                }
                names.push(def.name.clone());
                if let Some(property) = PropertyDescription::new(owner.clone(), index) {
                    table.properties.push(PropertyStub::build(&property, target, ctx)?);
                }
            }
        }

        let mut index_lists: Vec<Vec<RuntimeType>> = vec![];
        for owner in &sources {
            for (index, def) in owner.indexers().iter().enumerate() {
                let list: Vec<RuntimeType> =
                    def.parameters.iter().map(|p| p.signature_type()).collect();
                if !inherited(owner, def.visibility()) || index_lists.contains(&list) {
                    continue;
                }
                index_lists.push(list);
                if let Some(indexer) = IndexerDescription::new(owner.clone(), index) {
                    table.indexers.push(IndexerStub::build(&indexer, target, ctx)?);
                }
            }
        }

        debug!(
            "{} methods, {} properties, {} indexers forwarded for {:?}",
            table.methods.len(),
            table.properties.len(),
            table.indexers.len(),
            shape
        );
        Ok(table)
    }

    /// Abstract methods must bind. Virtual methods, and interface methods with a default body,
    /// bind when the target has a match and keep their body otherwise. Non-virtual class
    /// methods always run their own body.
    fn method_accessor(
        method: &MethodDescription,
        shape: &TypeDescription,
        target: &TypeDescription,
        ctx: &BuildContext,
    ) -> Result<Accessor, BuildError> {
        let def = method.method();
        let overridable =
            def.body.is_none() || def.kind == MethodKind::Virtual || shape.is_interface();
        if let (false, Some(body)) = (overridable, &def.body) {
            return Ok(Accessor::Default(body.clone()));
        }
        match (ctx.resolver.resolve_method(method, target), &def.body) {
            (Some(found), _) => {
                trace!("{:?} bound to {:?}", method, found);
                Ok(Accessor::Forward(MethodStub::build(method, &found, target, ctx)?))
            }
            (None, Some(body)) => Ok(Accessor::Default(body.clone())),
            (None, None) => Err(BuildError::TargetMemberNotFound {
                member: method.qualified_name(),
                target: target.type_name(),
            }),
        }
    }

    fn copy(
        &self,
        shape: &TypeDescription,
        target: &TypeDescription,
        ctx: &BuildContext,
    ) -> Result<Vec<CopyEntry>, BuildError> {
        let mut entries = vec![];
        for (index, def) in shape.fields().iter().enumerate() {
            if def.is_static {
                continue;
            }
            let Some(field) = FieldDescription::new(shape.clone(), index) else {
                continue;
            };
            let (name, flags) = effective_binding(def.duck.as_ref(), &def.name);
            let kind = def.duck.as_ref().map(|d| d.kind).unwrap_or_default();

            let property = match kind {
                DuckKind::Property => ctx.resolver.resolve_property(name, flags, target),
                DuckKind::Field => None,
            };
            let source = if let Some(property) = property {
                let getter = property
                    .getter()
                    .ok_or_else(|| BuildError::PropertyCantBeRead(property.qualified_name()))?;
                CopySource::Getter {
                    strategy: select_strategy(target, &getter, ctx),
                    plan: ctx.planner.plan(&getter.method().return_type, &def.ty),
                    target: getter,
                }
            } else if let Some(found) = ctx.resolver.resolve_field(name, flags, target) {
                CopySource::Field(FieldAccessor::build(&found, &def.ty, false, ctx)?)
            } else {
                return Err(BuildError::TargetMemberNotFound {
                    member: field.qualified_name(),
                    target: target.type_name(),
                });
            };
            entries.push(CopyEntry { field, source });
        }
        Ok(entries)
    }
}
