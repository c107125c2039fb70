use crate::{
    conversion::DuckChainer,
    error::BuildError,
    resolver::effective_binding,
    stubs::{fields::FieldAccessor, methods::MethodStub, shape_default, Accessor, BuildContext},
};
use ducktype_types::{
    binding::DuckKind, error::InvocationError, members::PropertyDescription, value::Value,
    TypeDescription,
};
use tracing::trace;

/// Getter and setter of one shape property.
#[derive(Clone, Debug)]
pub struct PropertyStub {
    shape: PropertyDescription,
    getter: Option<Accessor>,
    setter: Option<Accessor>,
}

impl PropertyStub {
    /// Binds to a target property first (unless the shape asks for a field), then to a field
    /// of the same name, then to the shape's own accessor bodies.
    pub fn build(
        shape: &PropertyDescription,
        target: &TypeDescription,
        ctx: &BuildContext,
    ) -> Result<Self, BuildError> {
        let def = shape.property();
        let (name, flags) = effective_binding(def.duck.as_ref(), &def.name);
        let kind = def.duck.as_ref().map(|d| d.kind).unwrap_or_default();

        if kind == DuckKind::Property {
            if let Some(found) = ctx.resolver.resolve_property(name, flags, target) {
                trace!("{} bound to property {}", shape.qualified_name(), found.qualified_name());
                let getter = match (shape.getter(), found.getter()) {
                    (None, _) => None,
                    (Some(s), Some(t)) => Some(Accessor::Forward(MethodStub::build(&s, &t, target, ctx)?)),
                    (Some(_), None) => return Err(BuildError::PropertyCantBeRead(found.qualified_name())),
                };
                let setter = match (shape.setter(), found.setter()) {
                    (None, _) => None,
                    (Some(s), Some(t)) => Some(Accessor::Forward(MethodStub::build(&s, &t, target, ctx)?)),
                    (Some(_), None) => return Err(BuildError::PropertyCantBeWritten(found.qualified_name())),
                };
                return Ok(Self {
                    shape: shape.clone(),
                    getter,
                    setter,
                });
            }
        }

        if let Some(field) = ctx.resolver.resolve_field(name, flags, target) {
            trace!("{} bound to field {}", shape.qualified_name(), field.qualified_name());
            let getter = match def.getter {
                Some(_) => Some(Accessor::FieldGet(FieldAccessor::build(&field, &def.ty, false, ctx)?)),
                None => None,
            };
            let setter = match def.setter {
                Some(_) => Some(Accessor::FieldSet(FieldAccessor::build(&field, &def.ty, true, ctx)?)),
                None => None,
            };
            return Ok(Self {
                shape: shape.clone(),
                getter,
                setter,
            });
        }

        Ok(Self {
            shape: shape.clone(),
            getter: shape_default(shape.getter(), shape.qualified_name(), target)?,
            setter: shape_default(shape.setter(), shape.qualified_name(), target)?,
        })
    }

    pub fn name(&self) -> &str {
        &self.shape.property().name
    }

    pub fn can_read(&self) -> bool {
        self.getter.is_some()
    }

    pub fn can_write(&self) -> bool {
        self.setter.is_some()
    }

    pub fn getter(&self) -> Option<&Accessor> {
        self.getter.as_ref()
    }

    pub fn get(
        &self,
        proxy: &Value,
        instance: &Value,
        chainer: &dyn DuckChainer,
    ) -> Result<Value, InvocationError> {
        match &self.getter {
            Some(getter) => getter.call(proxy, instance, &mut [], &[], chainer),
            None => Err(InvocationError::MemberNotFound {
                owner: self.shape.parent.type_name(),
                member: format!("get_{}", self.name()),
            }),
        }
    }

    pub fn set(
        &self,
        proxy: &Value,
        instance: &Value,
        value: Value,
        chainer: &dyn DuckChainer,
    ) -> Result<(), InvocationError> {
        match &self.setter {
            Some(setter) => setter
                .call(proxy, instance, &mut [value], &[], chainer)
                .map(|_| ()),
            None => Err(InvocationError::MemberNotFound {
                owner: self.shape.parent.type_name(),
                member: format!("set_{}", self.name()),
            }),
        }
    }
}
