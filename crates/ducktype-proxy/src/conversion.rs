//! Conversion plans between shape-side and target-side types.
//!
//! A plan is chosen once when a stub is built and applied to every value crossing the
//! proxy boundary in that position: arguments flow shape → target, return values and
//! `ref`/`out` write-backs flow target → shape.
use ducktype_types::{
    comparer::TypeComparer, error::InvocationError, runtime::RuntimeType, value::Value,
    TypeDescription, TypeKind,
};

/// Creates proxies for values that must cross the boundary as another shape.
pub trait DuckChainer {
    fn chain(&self, shape: &TypeDescription, value: &Value) -> Result<Value, InvocationError>;
}

#[derive(Clone, Debug, PartialEq)]
pub enum ConversionPlan {
    Passthrough,
    Box,
    Unbox(RuntimeType),
    EnumReinterpret(RuntimeType),
    Numeric(RuntimeType),
    DuckChain(TypeDescription),
    DuckUnwrap(RuntimeType),
    Checked(RuntimeType),
}

/// Whether values of this type can be wrapped as another shape (interfaces, open classes and
/// plain-data structs).
pub fn is_chainable(td: &TypeDescription) -> bool {
    match td.kind {
        TypeKind::Interface | TypeKind::Struct => true,
        TypeKind::Class => !td.is_sealed,
        TypeKind::Enum => false,
    }
}

fn reference_shape(ty: &RuntimeType) -> Option<&TypeDescription> {
    ty.as_type()
        .filter(|td| !td.is_value_type() && is_chainable(td))
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ConversionPlanner {
    comparer: TypeComparer,
}

impl ConversionPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plans the conversion of a `source`-typed value into a `dest`-typed slot.
    /// By-ref types are planned on their element types.
    pub fn plan(&self, source: &RuntimeType, dest: &RuntimeType) -> ConversionPlan {
        let (source, dest) = (source.element(), dest.element());
        if source == dest || dest.is_void() {
            return ConversionPlan::Passthrough;
        }
        if source.is_generic_parameter() || dest.is_generic_parameter() {
            return ConversionPlan::Passthrough;
        }

        if source.is_value_type()
            && (matches!(dest, RuntimeType::Object) || dest.nullable_inner() == Some(source))
        {
            return ConversionPlan::Box;
        }
        if dest.is_value_type()
            && (matches!(source, RuntimeType::Object) || source.nullable_inner() == Some(dest))
        {
            return ConversionPlan::Unbox(dest.clone());
        }

        let integral = |t: &RuntimeType| t.is_enum() || t.is_integer();
        if (source.is_enum() || dest.is_enum()) && integral(source) && integral(dest) {
            return ConversionPlan::EnumReinterpret(dest.clone());
        }
        if source.is_numeric() && dest.is_numeric() {
            return ConversionPlan::Numeric(dest.clone());
        }

        if self.comparer.is_assignable_from(dest, source) {
            return ConversionPlan::Passthrough;
        }
        if let Some(td) = dest.as_type() {
            if is_chainable(td) && !source.is_value_type() {
                return ConversionPlan::DuckChain(td.clone());
            }
        }
        if reference_shape(source).is_some() {
            return ConversionPlan::DuckUnwrap(dest.clone());
        }
        ConversionPlan::Checked(dest.clone())
    }
}

impl ConversionPlan {
    pub fn apply(&self, value: Value, chainer: &dyn DuckChainer) -> Result<Value, InvocationError> {
        let comparer = TypeComparer::new();
        match self {
            ConversionPlan::Passthrough | ConversionPlan::Box => Ok(value),
            ConversionPlan::Unbox(dest) | ConversionPlan::Checked(dest) => {
                checked(&comparer, value, dest)
            }
            ConversionPlan::EnumReinterpret(dest) => reinterpret(value, dest),
            ConversionPlan::Numeric(dest) => convert_numeric(value, dest),
            ConversionPlan::DuckChain(shape) => {
                let dest = RuntimeType::from(shape);
                match value {
                    Value::Null => Ok(Value::Null),
                    Value::Duck(d)
                        if comparer.is_assignable_from(&dest, &RuntimeType::from(d.shape())) =>
                    {
                        Ok(Value::Duck(d))
                    }
                    // a proxy handed back to its own target type
                    Value::Duck(d) if comparer.value_is_instance_of(d.instance(), &dest) => {
                        Ok(d.instance().clone())
                    }
                    other if comparer.value_is_instance_of(&other, &dest) => Ok(other),
                    other => chainer.chain(shape, &other),
                }
            }
            ConversionPlan::DuckUnwrap(dest) => match value {
                Value::Duck(d) => checked(&comparer, d.instance().clone(), dest),
                other => checked(&comparer, other, dest),
            },
        }
    }
}

fn checked(comparer: &TypeComparer, value: Value, dest: &RuntimeType) -> Result<Value, InvocationError> {
    if comparer.value_is_instance_of(&value, dest) {
        return Ok(value);
    }
    if let Value::Duck(d) = &value {
        if comparer.value_is_instance_of(d.instance(), dest) {
            return Ok(d.instance().clone());
        }
    }
    Err(mismatch(&value, dest))
}

fn mismatch(value: &Value, dest: &RuntimeType) -> InvocationError {
    if value.is_null() {
        InvocationError::NullValueType(dest.get_name())
    } else {
        InvocationError::InvalidCast {
            expected: dest.get_name(),
            actual: value.type_name(),
        }
    }
}

#[derive(Clone, Copy)]
enum Number {
    Signed(i64),
    Unsigned(u64),
    Float(f64),
}

impl Number {
    fn of(value: &Value) -> Option<Self> {
        Some(match value {
            Value::Char(v) => Number::Unsigned(*v as u64),
            Value::Int8(v) => Number::Signed(*v as i64),
            Value::UInt8(v) => Number::Unsigned(*v as u64),
            Value::Int16(v) => Number::Signed(*v as i64),
            Value::UInt16(v) => Number::Unsigned(*v as u64),
            Value::Int32(v) => Number::Signed(*v as i64),
            Value::UInt32(v) => Number::Unsigned(*v as u64),
            Value::Int64(v) => Number::Signed(*v),
            Value::UInt64(v) => Number::Unsigned(*v),
            Value::Float32(v) => Number::Float(*v as f64),
            Value::Float64(v) => Number::Float(*v),
            Value::Enum(_, v) => Number::Signed(*v),
            _ => return None,
        })
    }

    fn as_i64(self) -> i64 {
        match self {
            Number::Signed(v) => v,
            Number::Unsigned(v) => v as i64,
            Number::Float(v) => v as i64,
        }
    }

    fn as_u64(self) -> u64 {
        match self {
            Number::Signed(v) => v as u64,
            Number::Unsigned(v) => v,
            Number::Float(v) => v as u64,
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Number::Signed(v) => v as f64,
            Number::Unsigned(v) => v as f64,
            Number::Float(v) => v,
        }
    }
}

fn convert_numeric(value: Value, dest: &RuntimeType) -> Result<Value, InvocationError> {
    let Some(n) = Number::of(&value) else {
        return Err(mismatch(&value, dest));
    };
    Ok(match dest {
        RuntimeType::Int8 => Value::Int8(n.as_i64() as i8),
        RuntimeType::UInt8 => Value::UInt8(n.as_u64() as u8),
        RuntimeType::Int16 => Value::Int16(n.as_i64() as i16),
        RuntimeType::UInt16 => Value::UInt16(n.as_u64() as u16),
        RuntimeType::Int32 => Value::Int32(n.as_i64() as i32),
        RuntimeType::UInt32 => Value::UInt32(n.as_u64() as u32),
        RuntimeType::Int64 => Value::Int64(n.as_i64()),
        RuntimeType::UInt64 => Value::UInt64(n.as_u64()),
        RuntimeType::Float32 => Value::Float32(n.as_f64() as f32),
        RuntimeType::Float64 => Value::Float64(n.as_f64()),
        RuntimeType::Char => match char::from_u32(n.as_u64() as u32) {
            Some(c) => Value::Char(c),
            None => return Err(mismatch(&value, dest)),
        },
        other => return checked(&TypeComparer::new(), value, other),
    })
}

fn reinterpret(value: Value, dest: &RuntimeType) -> Result<Value, InvocationError> {
    let Some(raw) = value.integral() else {
        return Err(mismatch(&value, dest));
    };
    match dest.as_type() {
        Some(td) if td.is_enum().is_some() => Ok(Value::Enum(td.clone(), raw)),
        _ => convert_numeric(Value::Int64(raw), dest),
    }
}
