use crate::{
    conversion::{ConversionPlan, DuckChainer},
    error::BuildError,
    stubs::BuildContext,
};
use ducktype_types::{
    comparer::TypeComparer, error::InvocationError, members::FieldDescription,
    runtime::RuntimeType, value::Value,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessStrategy {
    Direct,
    /// The field is hidden from the proxy assembly; receiver and stored value are checked
    /// against the field's declared types on every access.
    Trampoline,
}

/// Reads or writes a target field in place of a shape property or field.
#[derive(Clone, Debug)]
pub struct FieldAccessor {
    field: FieldDescription,
    read: ConversionPlan,
    write: ConversionPlan,
    strategy: AccessStrategy,
}

impl FieldAccessor {
    pub fn build(
        field: &FieldDescription,
        shape_ty: &RuntimeType,
        writable: bool,
        ctx: &BuildContext,
    ) -> Result<Self, BuildError> {
        let def = field.field();
        if writable && def.init_only {
            return Err(BuildError::FieldIsReadonly(field.qualified_name()));
        }
        let strategy = if ctx.type_accessible(&field.parent)
            && ctx.member_accessible(&field.parent, def.accessibility)
        {
            AccessStrategy::Direct
        } else {
            AccessStrategy::Trampoline
        };
        Ok(Self {
            field: field.clone(),
            read: ctx.planner.plan(&def.ty, shape_ty),
            write: ctx.planner.plan(shape_ty, &def.ty),
            strategy,
        })
    }

    pub fn field(&self) -> &FieldDescription {
        &self.field
    }

    pub fn strategy(&self) -> AccessStrategy {
        self.strategy
    }

    fn check_receiver(&self, instance: &Value) -> Result<(), InvocationError> {
        if self.strategy == AccessStrategy::Direct {
            return Ok(());
        }
        let owner = RuntimeType::from(&self.field.parent);
        if TypeComparer::new().value_is_instance_of(instance, &owner) {
            Ok(())
        } else {
            Err(InvocationError::InvalidCast {
                expected: owner.get_name(),
                actual: instance.type_name(),
            })
        }
    }

    pub fn get(&self, instance: &Value, chainer: &dyn DuckChainer) -> Result<Value, InvocationError> {
        let raw = if self.field.field().is_static {
            self.field.parent.static_value(&self.field)
        } else {
            self.check_receiver(instance)?;
            instance.as_object()?.load(&self.field)
        };
        self.read.apply(raw, chainer)
    }

    pub fn set(
        &self,
        instance: &Value,
        value: Value,
        chainer: &dyn DuckChainer,
    ) -> Result<(), InvocationError> {
        let value = self.write.apply(value, chainer)?;
        let def = self.field.field();
        if self.strategy == AccessStrategy::Trampoline
            && !TypeComparer::new().value_is_instance_of(&value, &def.ty)
        {
            return Err(InvocationError::InvalidCast {
                expected: def.ty.get_name(),
                actual: value.type_name(),
            });
        }
        if def.is_static {
            self.field.parent.set_static_value(&self.field, value);
        } else {
            self.check_receiver(instance)?;
            instance.as_object()?.store(&self.field, value);
        }
        Ok(())
    }
}
