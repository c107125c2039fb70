use crate::{object::ObjectRef, value::Value, TypeDescription, TypeKind};
use std::fmt::{Debug, Display, Formatter};

runtime_type_impls! {
    simple_types: {
        Void => "Void",
        Boolean => "Boolean",
        Char => "Char",
        Int8 => "SByte",
        UInt8 => "Byte",
        Int16 => "Int16",
        UInt16 => "UInt16",
        Int32 => "Int32",
        UInt32 => "UInt32",
        Int64 => "Int64",
        UInt64 => "UInt64",
        Float32 => "Single",
        Float64 => "Double",
        Object => "Object",
        String => "String",
    },
    complex_types: {
        Type(TypeDescription),
        Nullable(Box<RuntimeType>),
        ByRef(Box<RuntimeType>),
        MethodGeneric(u16),
    },
    get_name: {
        Type(td) => td.type_name(),
        Nullable(t) => format!("Nullable<{}>", t.get_name()),
        ByRef(t) => format!("{}&", t.get_name()),
        MethodGeneric(i) => format!("!!{}", i),
    },
    default_value: {
        Boolean => Value::Boolean(false),
        Char => Value::Char('\0'),
        Int8 => Value::Int8(0),
        UInt8 => Value::UInt8(0),
        Int16 => Value::Int16(0),
        UInt16 => Value::UInt16(0),
        Int32 => Value::Int32(0),
        UInt32 => Value::UInt32(0),
        Int64 => Value::Int64(0),
        UInt64 => Value::UInt64(0),
        Float32 => Value::Float32(0.0),
        Float64 => Value::Float64(0.0),
        Type(td) => match td.kind {
            TypeKind::Enum => Value::Enum(td.clone(), 0),
            TypeKind::Struct => Value::Object(ObjectRef::new(td)),
            TypeKind::Class | TypeKind::Interface => Value::Null,
        },
        Void | Object | String | Nullable(_) | ByRef(_) | MethodGeneric(_) => Value::Null,
    }
}

impl Debug for RuntimeType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.get_name())
    }
}

impl Display for RuntimeType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.get_name())
    }
}

impl From<&TypeDescription> for RuntimeType {
    fn from(td: &TypeDescription) -> Self {
        RuntimeType::Type(td.clone())
    }
}

impl From<TypeDescription> for RuntimeType {
    fn from(td: TypeDescription) -> Self {
        RuntimeType::Type(td)
    }
}

impl RuntimeType {
    pub fn by_ref(self) -> Self {
        RuntimeType::ByRef(Box::new(self))
    }

    pub fn nullable(self) -> Self {
        RuntimeType::Nullable(Box::new(self))
    }

    pub fn is_value_type(&self) -> bool {
        match self {
            RuntimeType::Void
            | RuntimeType::Object
            | RuntimeType::String
            | RuntimeType::ByRef(_)
            | RuntimeType::MethodGeneric(_) => false,
            RuntimeType::Type(td) => td.is_value_type(),
            _ => true,
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, RuntimeType::Void)
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            RuntimeType::Int8
                | RuntimeType::UInt8
                | RuntimeType::Int16
                | RuntimeType::UInt16
                | RuntimeType::Int32
                | RuntimeType::UInt32
                | RuntimeType::Int64
                | RuntimeType::UInt64
        )
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer()
            || matches!(
                self,
                RuntimeType::Float32 | RuntimeType::Float64 | RuntimeType::Char
            )
    }

    pub fn as_type(&self) -> Option<&TypeDescription> {
        match self {
            RuntimeType::Type(td) => Some(td),
            _ => None,
        }
    }

    pub fn enum_underlying(&self) -> Option<&RuntimeType> {
        self.as_type()?.is_enum()
    }

    pub fn is_enum(&self) -> bool {
        self.enum_underlying().is_some()
    }

    /// The referenced type for `ByRef`, otherwise the type itself.
    pub fn element(&self) -> &RuntimeType {
        match self {
            RuntimeType::ByRef(inner) => inner,
            other => other,
        }
    }

    pub fn nullable_inner(&self) -> Option<&RuntimeType> {
        match self {
            RuntimeType::Nullable(inner) => Some(inner),
            _ => None,
        }
    }

    pub fn is_generic_parameter(&self) -> bool {
        match self {
            RuntimeType::MethodGeneric(_) => true,
            RuntimeType::Nullable(inner) | RuntimeType::ByRef(inner) => {
                inner.is_generic_parameter()
            }
            _ => false,
        }
    }

    /// Replaces method generic parameters with the supplied arguments.
    pub fn substitute(&self, generics: &[RuntimeType]) -> RuntimeType {
        match self {
            RuntimeType::MethodGeneric(i) => generics
                .get(*i as usize)
                .cloned()
                .unwrap_or_else(|| self.clone()),
            RuntimeType::Nullable(inner) => inner.substitute(generics).nullable(),
            RuntimeType::ByRef(inner) => inner.substitute(generics).by_ref(),
            other => other.clone(),
        }
    }

    pub fn is_visible_to(&self, assembly: &str) -> bool {
        match self {
            RuntimeType::Type(td) => td.is_visible_to(assembly),
            RuntimeType::Nullable(inner) | RuntimeType::ByRef(inner) => {
                inner.is_visible_to(assembly)
            }
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TypeBuilder;

    #[test]
    fn test_names() {
        assert_eq!(RuntimeType::Int32.get_name(), "Int32");
        assert_eq!(RuntimeType::Float32.get_name(), "Single");
        assert_eq!(RuntimeType::Int32.by_ref().get_name(), "Int32&");
        assert_eq!(
            RuntimeType::from_simple_name("Double"),
            Some(RuntimeType::Float64)
        );
        assert_eq!(RuntimeType::from_simple_name("Widget"), None);
    }

    #[test]
    fn test_value_types() {
        let color = TypeBuilder::enumeration("Color", RuntimeType::Int32).build();
        let point = TypeBuilder::structure("Point").build();
        let class = TypeBuilder::class("Widget").build();
        assert!(RuntimeType::Int16.is_value_type());
        assert!(RuntimeType::Int32.nullable().is_value_type());
        assert!(!RuntimeType::String.is_value_type());
        assert!(RuntimeType::from(&color).is_value_type());
        assert!(RuntimeType::from(&point).is_value_type());
        assert!(!RuntimeType::from(&class).is_value_type());
        assert!(RuntimeType::from(&color).is_enum());
    }

    #[test]
    fn test_default_values() {
        let color = TypeBuilder::enumeration("Color", RuntimeType::Int32).build();
        assert_eq!(RuntimeType::Int16.default_value(), Value::Int16(0));
        assert_eq!(RuntimeType::String.default_value(), Value::Null);
        assert_eq!(
            RuntimeType::from(&color).default_value(),
            Value::Enum(color.clone(), 0)
        );
    }

    #[test]
    fn test_substitute() {
        let generic = RuntimeType::MethodGeneric(0).by_ref();
        assert_eq!(
            generic.substitute(&[RuntimeType::String]),
            RuntimeType::String.by_ref()
        );
        assert!(generic.is_generic_parameter());
    }
}
