//! Forwarding stubs: one per shape member, built once per proxy type.
use crate::{
    config::DuckTypeConfig, conversion::ConversionPlanner, conversion::DuckChainer,
    metrics::DuckTypeMetrics, resolver::MemberResolver,
};
use crate::error::BuildError;
use ducktype_types::{
    error::InvocationError,
    members::{MethodBody, MethodDescription},
    runtime::RuntimeType,
    value::Value,
    Accessibility, TypeDescription,
};

pub mod dispatch;
pub mod fields;
pub mod indexers;
pub mod methods;
pub mod properties;

use dispatch::TrampolineTable;
use fields::FieldAccessor;
use methods::MethodStub;

pub struct BuildContext<'a> {
    pub config: &'a DuckTypeConfig,
    pub resolver: MemberResolver<'a>,
    pub planner: ConversionPlanner,
    pub trampolines: &'a TrampolineTable,
    pub metrics: &'a DuckTypeMetrics,
}

impl<'a> BuildContext<'a> {
    pub fn new(
        config: &'a DuckTypeConfig,
        trampolines: &'a TrampolineTable,
        metrics: &'a DuckTypeMetrics,
    ) -> Self {
        Self {
            config,
            resolver: MemberResolver::new(config),
            planner: ConversionPlanner::new(),
            trampolines,
            metrics,
        }
    }

    pub fn type_accessible(&self, ty: &TypeDescription) -> bool {
        ty.is_visible_to(&self.config.proxy_assembly)
    }

    pub fn member_accessible(&self, owner: &TypeDescription, accessibility: Accessibility) -> bool {
        accessibility.is_visible_to(&owner.assembly, &self.config.proxy_assembly)
    }
}

/// Implementation of one shape accessor or method slot.
#[derive(Clone, Debug)]
pub enum Accessor {
    Forward(MethodStub),
    FieldGet(FieldAccessor),
    FieldSet(FieldAccessor),
    /// The shape's own body, kept when the target has nothing to bind.
    Default(MethodBody),
}

impl Accessor {
    /// `proxy` is the receiver seen by shape default bodies; `instance` is the wrapped object.
    pub fn call(
        &self,
        proxy: &Value,
        instance: &Value,
        args: &mut [Value],
        generics: &[RuntimeType],
        chainer: &dyn DuckChainer,
    ) -> Result<Value, InvocationError> {
        match self {
            Accessor::Forward(stub) => stub.invoke(instance, args, generics, chainer),
            Accessor::FieldGet(field) => field.get(instance, chainer),
            Accessor::FieldSet(field) => {
                let value = args.last().cloned().unwrap_or(Value::Null);
                field.set(instance, value, chainer)?;
                Ok(Value::Null)
            }
            Accessor::Default(body) => body.call(proxy, args, generics),
        }
    }

    pub fn stub(&self) -> Option<&MethodStub> {
        match self {
            Accessor::Forward(stub) => Some(stub),
            _ => None,
        }
    }
}

/// Falls back to the shape's own accessor body when nothing on the target backs it.
/// Accessors without a body leave the member unimplemented, which fails the build.
pub(crate) fn shape_default(
    accessor: Option<MethodDescription>,
    member: String,
    target: &TypeDescription,
) -> Result<Option<Accessor>, BuildError> {
    match accessor {
        None => Ok(None),
        Some(accessor) => match &accessor.method().body {
            Some(body) => Ok(Some(Accessor::Default(body.clone()))),
            None => Err(BuildError::TargetMemberNotFound {
                member,
                target: target.type_name(),
            }),
        },
    }
}
