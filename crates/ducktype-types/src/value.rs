use crate::{error::InvocationError, object::ObjectRef, runtime::RuntimeType, TypeDescription};
use std::{
    any::Any,
    fmt::{Debug, Formatter},
    sync::Arc,
};

/// Behaviour of a proxy instance, seen from the caller's side.
///
/// Members are addressed by the shape's member names. Overloads are selected from the
/// runtime types of the supplied arguments; `ref`/`out` results are written back into `args`.
pub trait DuckInstance: Send + Sync {
    /// The wrapped object.
    fn instance(&self) -> &Value;

    fn instance_type(&self) -> RuntimeType {
        self.instance()
            .runtime_type()
            .unwrap_or(RuntimeType::Object)
    }

    fn shape(&self) -> &TypeDescription;

    fn invoke(&self, name: &str, args: &mut [Value]) -> Result<Value, InvocationError> {
        self.invoke_generic(name, &[], args)
    }

    fn invoke_generic(
        &self,
        name: &str,
        generics: &[RuntimeType],
        args: &mut [Value],
    ) -> Result<Value, InvocationError>;

    fn get(&self, name: &str) -> Result<Value, InvocationError>;

    fn set(&self, name: &str, value: Value) -> Result<(), InvocationError>;

    fn get_index(&self, index: &[Value]) -> Result<Value, InvocationError>;

    fn set_index(&self, index: &[Value], value: Value) -> Result<(), InvocationError>;

    fn as_any(&self) -> &dyn Any;
}

pub type DuckRef = Arc<dyn DuckInstance>;

#[derive(Clone)]
pub enum Value {
    Null,
    Boolean(bool),
    Char(char),
    Int8(i8),
    UInt8(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    String(Arc<str>),
    Enum(TypeDescription, i64),
    Object(ObjectRef),
    Duck(DuckRef),
}

value_conversions! {
    Boolean(bool),
    Char(char),
    Int8(i8),
    UInt8(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<ObjectRef> for Value {
    fn from(o: ObjectRef) -> Self {
        Value::Object(o)
    }
}

impl From<DuckRef> for Value {
    fn from(d: DuckRef) -> Self {
        Value::Duck(d)
    }
}

impl TryFrom<Value> for String {
    type Error = InvocationError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(s) => Ok(s.to_string()),
            other => Err(InvocationError::InvalidCast {
                expected: RuntimeType::String.get_name(),
                actual: other.type_name(),
            }),
        }
    }
}

impl Value {
    /// The dynamic type of the value; `None` for null.
    pub fn runtime_type(&self) -> Option<RuntimeType> {
        Some(match self {
            Value::Null => return None,
            Value::Boolean(_) => RuntimeType::Boolean,
            Value::Char(_) => RuntimeType::Char,
            Value::Int8(_) => RuntimeType::Int8,
            Value::UInt8(_) => RuntimeType::UInt8,
            Value::Int16(_) => RuntimeType::Int16,
            Value::UInt16(_) => RuntimeType::UInt16,
            Value::Int32(_) => RuntimeType::Int32,
            Value::UInt32(_) => RuntimeType::UInt32,
            Value::Int64(_) => RuntimeType::Int64,
            Value::UInt64(_) => RuntimeType::UInt64,
            Value::Float32(_) => RuntimeType::Float32,
            Value::Float64(_) => RuntimeType::Float64,
            Value::String(_) => RuntimeType::String,
            Value::Enum(td, _) => RuntimeType::Type(td.clone()),
            Value::Object(o) => RuntimeType::Type(o.description().clone()),
            Value::Duck(d) => RuntimeType::Type(d.shape().clone()),
        })
    }

    pub fn type_name(&self) -> String {
        self.runtime_type()
            .map(|t| t.get_name())
            .unwrap_or_else(|| "null".to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_object(&self) -> Result<&ObjectRef, InvocationError> {
        match self {
            Value::Object(o) => Ok(o),
            Value::Null => Err(InvocationError::NullReference("instance".to_string())),
            other => Err(InvocationError::InvalidCast {
                expected: "Object".to_string(),
                actual: other.type_name(),
            }),
        }
    }

    pub fn as_duck(&self) -> Option<&DuckRef> {
        match self {
            Value::Duck(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(&**s),
            _ => None,
        }
    }

    /// Integral payload of integers, chars and enums.
    pub fn integral(&self) -> Option<i64> {
        match self {
            Value::Char(v) => Some(*v as i64),
            Value::Int8(v) => Some(*v as i64),
            Value::UInt8(v) => Some(*v as i64),
            Value::Int16(v) => Some(*v as i64),
            Value::UInt16(v) => Some(*v as i64),
            Value::Int32(v) => Some(*v as i64),
            Value::UInt32(v) => Some(*v as i64),
            Value::Int64(v) => Some(*v),
            Value::UInt64(v) => Some(*v as i64),
            Value::Enum(_, v) => Some(*v),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Int8(a), Value::Int8(b)) => a == b,
            (Value::UInt8(a), Value::UInt8(b)) => a == b,
            (Value::Int16(a), Value::Int16(b)) => a == b,
            (Value::UInt16(a), Value::UInt16(b)) => a == b,
            (Value::Int32(a), Value::Int32(b)) => a == b,
            (Value::UInt32(a), Value::UInt32(b)) => a == b,
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::UInt64(a), Value::UInt64(b)) => a == b,
            (Value::Float32(a), Value::Float32(b)) => a == b,
            (Value::Float64(a), Value::Float64(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Enum(t1, a), Value::Enum(t2, b)) => t1 == t2 && a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Duck(a), Value::Duck(b)) => std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b)),
            _ => false,
        }
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(v) => write!(f, "Boolean({})", v),
            Value::Char(v) => write!(f, "Char({:?})", v),
            Value::Int8(v) => write!(f, "Int8({})", v),
            Value::UInt8(v) => write!(f, "UInt8({})", v),
            Value::Int16(v) => write!(f, "Int16({})", v),
            Value::UInt16(v) => write!(f, "UInt16({})", v),
            Value::Int32(v) => write!(f, "Int32({})", v),
            Value::UInt32(v) => write!(f, "UInt32({})", v),
            Value::Int64(v) => write!(f, "Int64({})", v),
            Value::UInt64(v) => write!(f, "UInt64({})", v),
            Value::Float32(v) => write!(f, "Float32({})", v),
            Value::Float64(v) => write!(f, "Float64({})", v),
            Value::String(v) => write!(f, "{:?}", v),
            Value::Enum(td, v) => write!(f, "{}({})", td.type_name(), v),
            Value::Object(o) => write!(f, "{:?}", o),
            Value::Duck(d) => write!(f, "Duck<{}>({:?})", d.shape().type_name(), d.instance()),
        }
    }
}
