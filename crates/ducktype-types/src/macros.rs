macro_rules! runtime_type_impls {
    (
        simple_types: {
            $( $variant:ident => $name:literal ),* $(,)?
        },
        complex_types: {
            $( $complex_variant:ident ( $($tuple_arg:tt)* ) ),* $(,)?
        },
        get_name: {
            $( $name_pat:pat => $name_expr:expr ),* $(,)?
        },
        default_value: {
            $( $default_pat:pat => $default_expr:expr ),* $(,)?
        }
    ) => {
        #[derive(Clone, PartialEq, Eq, Hash)]
        pub enum RuntimeType {
            $( $variant, )*
            $( $complex_variant ( $($tuple_arg)* ), )*
        }

        impl RuntimeType {
            pub fn get_name(&self) -> std::string::String {
                use RuntimeType::*;
                match self {
                    $( $variant => $name.to_string(), )*
                    $( $name_pat => $name_expr, )*
                }
            }

            /// Resolves a primitive by its short name, e.g. `"Int32"`.
            pub fn from_simple_name(name: &str) -> Option<Self> {
                match name {
                    $( $name => Some(RuntimeType::$variant), )*
                    _ => None,
                }
            }

            pub fn is_simple(&self) -> bool {
                matches!(self, $( RuntimeType::$variant )|*)
            }

            /// The zero value stored in a fresh slot of this type.
            pub fn default_value(&self) -> Value {
                use RuntimeType::*;
                match self {
                    $( $default_pat => $default_expr, )*
                }
            }
        }
    };
}

macro_rules! value_conversions {
    ($( $variant:ident($ty:ty) ),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }

            impl TryFrom<Value> for $ty {
                type Error = InvocationError;

                fn try_from(value: Value) -> Result<Self, Self::Error> {
                    match value {
                        Value::$variant(v) => Ok(v),
                        Value::Null => Err(InvocationError::NullValueType(
                            RuntimeType::$variant.get_name(),
                        )),
                        other => Err(InvocationError::InvalidCast {
                            expected: RuntimeType::$variant.get_name(),
                            actual: other.type_name(),
                        }),
                    }
                }
            }
        )*
    };
}
