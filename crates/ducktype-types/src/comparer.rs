use crate::{members::Parameter, runtime::RuntimeType, value::Value, TypeDescription};

#[derive(Clone, Copy, Debug, Default)]
pub struct TypeComparer;

impl TypeComparer {
    pub fn new() -> Self {
        Self
    }

    /// Equal counts, equal types and equal by-ref-ness at every position.
    pub fn parameters_equal(&self, a: &[Parameter], b: &[Parameter]) -> bool {
        a.len() == b.len()
            && a
                .iter()
                .zip(b.iter())
                .all(|(a, b)| a.signature_type() == b.signature_type())
    }

    pub fn is_subclass_of(&self, derived: &TypeDescription, base: &TypeDescription) -> bool {
        derived.ancestors().any(|a| &a == base)
    }

    pub fn implements(&self, ty: &TypeDescription, interface: &TypeDescription) -> bool {
        ty == interface || ty.interfaces().contains(interface)
    }

    pub fn is_assignable_from(&self, dest: &RuntimeType, src: &RuntimeType) -> bool {
        if dest == src {
            return true;
        }
        match (dest, src) {
            (RuntimeType::Object, src) => {
                !matches!(src, RuntimeType::ByRef(_) | RuntimeType::Void)
            }
            (RuntimeType::Nullable(inner), src) => inner.as_ref() == src,
            (RuntimeType::ByRef(d), RuntimeType::ByRef(s)) => d == s,
            (RuntimeType::Type(d), RuntimeType::Type(s)) => {
                if d.is_interface() {
                    self.implements(s, d)
                } else {
                    self.is_subclass_of(s, d)
                }
            }
            _ => false,
        }
    }

    /// Loose parameter compatibility used to narrow overload candidates.
    pub fn is_compatible(&self, expected: &RuntimeType, actual: &RuntimeType) -> bool {
        let (expected, actual) = (expected.element(), actual.element());
        expected == actual
            || self.is_assignable_from(actual, expected)
            || (expected.is_value_type() && actual.is_value_type())
            || (!expected.is_value_type() && matches!(actual, RuntimeType::Object))
    }

    pub fn value_is_instance_of(&self, value: &Value, ty: &RuntimeType) -> bool {
        if ty.is_generic_parameter() {
            return true;
        }
        match value {
            Value::Null => !ty.is_value_type() || ty.nullable_inner().is_some(),
            Value::Duck(d) => self.is_assignable_from(ty, &RuntimeType::Type(d.shape().clone())),
            other => other
                .runtime_type()
                .is_some_and(|rt| self.is_assignable_from(ty, &rt)),
        }
    }
}
