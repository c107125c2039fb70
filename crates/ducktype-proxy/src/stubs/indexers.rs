use crate::{
    conversion::DuckChainer,
    error::BuildError,
    stubs::{methods::MethodStub, shape_default, Accessor, BuildContext},
};
use ducktype_types::{
    comparer::TypeComparer, error::InvocationError, members::IndexerDescription, value::Value,
    TypeDescription,
};

#[derive(Clone, Debug)]
pub struct IndexerStub {
    shape: IndexerDescription,
    getter: Option<Accessor>,
    setter: Option<Accessor>,
}

impl IndexerStub {
    pub fn build(
        shape: &IndexerDescription,
        target: &TypeDescription,
        ctx: &BuildContext,
    ) -> Result<Self, BuildError> {
        let Some(found) = ctx.resolver.resolve_indexer(shape, target) else {
            return Ok(Self {
                shape: shape.clone(),
                getter: shape_default(shape.getter(), shape.qualified_name(), target)?,
                setter: shape_default(shape.setter(), shape.qualified_name(), target)?,
            });
        };
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
        Ok(Self {
            shape: shape.clone(),
            getter,
            setter,
        })
    }

    pub fn param_count(&self) -> usize {
        self.shape.indexer().parameters.len()
    }

    /// How well `index` fits this indexer's parameter list: 2 per exact runtime type, 1 per
    /// assignable value. `None` when the count differs or a value does not fit.
    pub fn score(&self, index: &[Value]) -> Option<usize> {
        let parameters = &self.shape.indexer().parameters;
        if parameters.len() != index.len() {
            return None;
        }
        let comparer = TypeComparer::new();
        parameters.iter().zip(index).try_fold(0, |score, (param, value)| {
            if value.runtime_type().as_ref() == Some(&param.ty) {
                Some(score + 2)
            } else if comparer.value_is_instance_of(value, &param.ty) {
                Some(score + 1)
            } else {
                None
            }
        })
    }

    pub fn get(
        &self,
        proxy: &Value,
        instance: &Value,
        index: &[Value],
        chainer: &dyn DuckChainer,
    ) -> Result<Value, InvocationError> {
        let Some(getter) = &self.getter else {
            return Err(InvocationError::MemberNotFound {
                owner: self.shape.parent.type_name(),
                member: "get_Item".to_string(),
            });
        };
        let mut args = index.to_vec();
        getter.call(proxy, instance, &mut args, &[], chainer)
    }

    pub fn set(
        &self,
        proxy: &Value,
        instance: &Value,
        index: &[Value],
        value: Value,
        chainer: &dyn DuckChainer,
    ) -> Result<(), InvocationError> {
        let Some(setter) = &self.setter else {
            return Err(InvocationError::MemberNotFound {
                owner: self.shape.parent.type_name(),
                member: "set_Item".to_string(),
            });
        };
        let mut args = index.to_vec();
        args.push(value);
        setter.call(proxy, instance, &mut args, &[], chainer).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::DuckTypeConfig, metrics::DuckTypeMetrics, stubs::dispatch::TrampolineTable};
    use ducktype_types::{
        builder::TypeBuilder, members::IndexerDefinition, object::ObjectRef, runtime::RuntimeType,
    };

    struct NoChaining;

    impl DuckChainer for NoChaining {
        fn chain(&self, shape: &TypeDescription, _: &Value) -> Result<Value, InvocationError> {
            Err(InvocationError::DuckChain(shape.type_name()))
        }
    }

    #[test]
    fn test_indexer_forwarding() {
        let config = DuckTypeConfig::default();
        let table = TrampolineTable::new();
        let metrics = DuckTypeMetrics::new(false);
        let ctx = BuildContext::new(&config, &table, &metrics);

        let target = TypeBuilder::class("Target")
            .indexer(
                IndexerDefinition::new(RuntimeType::Int64)
                    .param("i", RuntimeType::Int32)
                    .getter(|inv| Ok(Value::Int64(inv.arg_as::<i32>(0)? as i64 * 10))),
            )
            .build();
        let shape = TypeBuilder::interface("IShape")
            .indexer(
                IndexerDefinition::new(RuntimeType::Int32)
                    .param("i", RuntimeType::Int32)
                    .get()
                    .set(),
            )
            .build();
        let shape_idx = IndexerDescription::new(shape.clone(), 0).unwrap();
        assert_eq!(
            IndexerStub::build(&shape_idx, &target, &ctx).unwrap_err(),
            BuildError::PropertyCantBeWritten("Target::Item".to_string())
        );

        let read_only = TypeBuilder::interface("IReadOnly")
            .indexer(
                IndexerDefinition::new(RuntimeType::Int32)
                    .param("i", RuntimeType::Int32)
                    .get(),
            )
            .build();
        let stub =
            IndexerStub::build(&IndexerDescription::new(read_only, 0).unwrap(), &target, &ctx).unwrap();
        assert_eq!(stub.param_count(), 1);
        let instance = Value::Object(ObjectRef::new(&target));
        assert_eq!(
            stub.get(&Value::Null, &instance, &[Value::Int32(4)], &NoChaining),
            Ok(Value::Int32(40))
        );
        assert!(stub
            .set(&Value::Null, &instance, &[Value::Int32(4)], Value::Int32(1), &NoChaining)
            .is_err());
    }
}
