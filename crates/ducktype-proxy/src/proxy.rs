use crate::{
    cache::DuckTypeCache,
    factory::{ForwardingTable, MethodEntry, ProxyType},
    stubs::indexers::IndexerStub,
};
use ducktype_types::{
    comparer::TypeComparer,
    error::InvocationError,
    members::ParameterMode,
    runtime::RuntimeType,
    value::{DuckInstance, DuckRef, Value},
    TypeDescription,
};
use std::{
    any::Any,
    sync::{Arc, Weak},
};
use tracing::trace;

/// A live proxy: the shared [`ProxyType`] plus the wrapped object.
///
/// The wrapped object is only referenced, never cloned or dropped early; the proxy keeps
/// it alive for as long as the proxy itself lives.
pub struct ProxyInstance {
    me: Weak<ProxyInstance>,
    proxy_type: Arc<ProxyType>,
    instance: Value,
    cache: DuckTypeCache,
}

impl ProxyInstance {
    pub(crate) fn new(proxy_type: Arc<ProxyType>, instance: Value, cache: DuckTypeCache) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            proxy_type,
            instance,
            cache,
        })
    }

    pub fn proxy_type(&self) -> &Arc<ProxyType> {
        &self.proxy_type
    }

    /// The proxy as a value, handed to shape default bodies as their receiver.
    fn this(&self) -> Value {
        match self.me.upgrade() {
            Some(me) => {
                let duck: DuckRef = me;
                Value::Duck(duck)
            }
            None => Value::Null,
        }
    }

    fn table(&self) -> Result<&ForwardingTable, InvocationError> {
        self.proxy_type
            .forwarding()
            .ok_or_else(|| InvocationError::NoImplementation(self.proxy_type.name().to_string()))
    }

    fn not_found(&self, member: impl Into<String>) -> InvocationError {
        InvocationError::MemberNotFound {
            owner: self.proxy_type.shape().type_name(),
            member: member.into(),
        }
    }

    /// The best-scoring shape indexer for `index`; ties go to the first declared.
    fn indexer_for(&self, index: &[Value]) -> Result<&IndexerStub, InvocationError> {
        let mut best: Option<(usize, &IndexerStub)> = None;
        for indexer in &self.table()?.indexers {
            let Some(score) = indexer.score(index) else {
                continue;
            };
            if best.map_or(true, |(top, _)| score > top) {
                best = Some((score, indexer));
            }
        }
        best.map(|(_, indexer)| indexer).ok_or_else(|| self.not_found("Item"))
    }

    /// Scores how well `args` fit a shape method: 2 per exact runtime type, 1 per assignable
    /// argument. `None` when an argument does not fit at all.
    fn score(entry: &MethodEntry, generics: &[RuntimeType], args: &[Value]) -> Option<usize> {
        let def = entry.shape.method();
        if def.generic_arity() != generics.len()
            || args.len() > def.parameters.len()
            || args.len() < def.required_parameter_count()
        {
            return None;
        }
        let comparer = TypeComparer::new();
        let mut score = 0;
        for (arg, param) in args.iter().zip(def.parameters.iter()) {
            if param.mode == ParameterMode::Out {
                score += 1;
                continue;
            }
            let ty = param.ty.substitute(generics);
            if arg.runtime_type().as_ref() == Some(&ty) {
                score += 2;
            } else if comparer.value_is_instance_of(arg, &ty) {
                score += 1;
            } else {
                return None;
            }
        }
        Some(score)
    }
}

impl DuckInstance for ProxyInstance {
    fn instance(&self) -> &Value {
        &self.instance
    }

    fn shape(&self) -> &TypeDescription {
        self.proxy_type.shape()
    }

    fn invoke_generic(
        &self,
        name: &str,
        generics: &[RuntimeType],
        args: &mut [Value],
    ) -> Result<Value, InvocationError> {
        let table = self.table()?;
        let mut best: Option<(usize, &MethodEntry)> = None;
        for entry in table.methods.iter().filter(|m| m.shape.name() == name) {
            let Some(score) = Self::score(entry, generics, args) else {
                continue;
            };
            if best.map_or(true, |(top, _)| score > top) {
                best = Some((score, entry));
            }
        }
        let Some((_, entry)) = best else {
            return Err(self.not_found(name));
        };
        trace!("{} dispatches {} to {:?}", self.proxy_type.name(), name, entry.shape);

        let parameters = &entry.shape.method().parameters;
        let mut full: Vec<Value> = args.to_vec();
        for param in &parameters[args.len()..] {
            full.push(param.default.clone().unwrap_or(Value::Null));
        }
        let result = entry
            .accessor
            .call(&self.this(), &self.instance, &mut full, generics, &self.cache)?;
        for (slot, value) in args.iter_mut().zip(full) {
            *slot = value;
        }
        Ok(result)
    }

    fn get(&self, name: &str) -> Result<Value, InvocationError> {
        let table = self.table()?;
        match table.properties.iter().find(|p| p.name() == name) {
            Some(property) => property.get(&self.this(), &self.instance, &self.cache),
            None => Err(self.not_found(name)),
        }
    }

    fn set(&self, name: &str, value: Value) -> Result<(), InvocationError> {
        let table = self.table()?;
        match table.properties.iter().find(|p| p.name() == name) {
            Some(property) => property.set(&self.this(), &self.instance, value, &self.cache),
            None => Err(self.not_found(name)),
        }
    }

    fn get_index(&self, index: &[Value]) -> Result<Value, InvocationError> {
        let indexer = self.indexer_for(index)?;
        indexer.get(&self.this(), &self.instance, index, &self.cache)
    }

    fn set_index(&self, index: &[Value], value: Value) -> Result<(), InvocationError> {
        let indexer = self.indexer_for(index)?;
        indexer.set(&self.this(), &self.instance, index, value, &self.cache)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
