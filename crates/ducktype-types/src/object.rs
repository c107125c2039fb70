use crate::{error::InvocationError, members::FieldDescription, value::Value, TypeDescription};
use parking_lot::RwLock;
use std::{
    collections::HashMap,
    fmt::{Debug, Formatter},
    sync::Arc,
};

type FieldKey = (TypeDescription, usize);

pub struct Object {
    description: TypeDescription,
    fields: RwLock<HashMap<FieldKey, Value>>,
}

/// Shared reference to a heap object. Compares by identity.
#[derive(Clone)]
pub struct ObjectRef(Arc<Object>);

impl ObjectRef {
    /// Allocates an instance with every instance field (including inherited ones) at its
    /// initial value.
    pub fn new(description: &TypeDescription) -> Self {
        let mut fields = HashMap::new();
        for owner in description.ancestors() {
            for (index, field) in owner.fields().iter().enumerate() {
                if !field.is_static {
                    fields.insert((owner.clone(), index), field.initial_value());
                }
            }
        }
        Self(Arc::new(Object {
            description: description.clone(),
            fields: RwLock::new(fields),
        }))
    }

    pub fn description(&self) -> &TypeDescription {
        &self.0.description
    }

    pub fn load(&self, field: &FieldDescription) -> Value {
        self.0
            .fields
            .read()
            .get(&(field.parent.clone(), field.index))
            .cloned()
            .unwrap_or_else(|| field.field().ty.default_value())
    }

    pub fn store(&self, field: &FieldDescription, value: Value) {
        self.0
            .fields
            .write()
            .insert((field.parent.clone(), field.index), value);
    }

    fn lookup(&self, name: &str) -> Result<FieldDescription, InvocationError> {
        self.0
            .description
            .find_field(name)
            .ok_or_else(|| InvocationError::MemberNotFound {
                owner: self.0.description.type_name(),
                member: name.to_string(),
            })
    }

    pub fn get_field(&self, name: &str) -> Result<Value, InvocationError> {
        let field = self.lookup(name)?;
        Ok(self.load(&field))
    }

    pub fn set_field(&self, name: &str, value: impl Into<Value>) -> Result<(), InvocationError> {
        let field = self.lookup(name)?;
        self.store(&field, value.into());
        Ok(())
    }

    pub fn address(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ObjectRef {}

impl Debug for ObjectRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{:#x}", self.0.description.type_name(), self.address())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{builder::TypeBuilder, members::FieldDefinition, runtime::RuntimeType};

    #[test]
    fn test_fields_start_at_initial_values() {
        let base = TypeBuilder::class("Base")
            .field(FieldDefinition::new("_id", RuntimeType::Int32).initial(7))
            .build();
        let derived = TypeBuilder::class("Derived")
            .extends(&base)
            .field(FieldDefinition::new("_name", RuntimeType::String))
            .build();
        let obj = ObjectRef::new(&derived);
        assert_eq!(obj.get_field("_id"), Ok(Value::Int32(7)));
        assert_eq!(obj.get_field("_name"), Ok(Value::Null));
        obj.set_field("_name", "duck").unwrap();
        assert_eq!(obj.get_field("_name"), Ok(Value::from("duck")));
        assert!(obj.get_field("_missing").is_err());
    }

    #[test]
    fn test_identity() {
        let ty = TypeBuilder::class("Thing").build();
        let a = ObjectRef::new(&ty);
        let b = ObjectRef::new(&ty);
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }
}
