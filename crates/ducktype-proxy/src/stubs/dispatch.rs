//! How a bound target member is reached.
//!
//! The strategy follows visibility: a member the proxy assembly can see on a type it can
//! see is called directly; a hidden member on a visible type goes through its captured
//! body pointer; anything on a hidden type goes through a trampoline that re-checks the
//! receiver and arguments against the real signature before calling.
use crate::{metrics::DuckTypeMetrics, stubs::BuildContext};
use dashmap::DashMap;
use ducktype_types::{
    comparer::TypeComparer,
    error::InvocationError,
    members::{MethodBody, MethodDescription, ParameterMode},
    runtime::RuntimeType,
    value::Value,
    TypeDescription,
};
use enum_dispatch::enum_dispatch;
use std::{
    fmt::{Debug, Formatter},
    sync::Arc,
};
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DispatchKind {
    Direct,
    FunctionPointer,
    Trampoline,
}

#[enum_dispatch]
pub trait Forward {
    fn forward(
        &self,
        receiver: &Value,
        args: &mut [Value],
        generics: &[RuntimeType],
    ) -> Result<Value, InvocationError>;

    fn kind(&self) -> DispatchKind;
}

#[enum_dispatch(Forward)]
#[derive(Clone, Debug)]
pub enum DispatchStrategy {
    DirectCall,
    FunctionPointerCall,
    TrampolineCall,
}

fn missing_body(method: &MethodDescription) -> InvocationError {
    InvocationError::NoImplementation(method.qualified_name())
}

#[derive(Clone, Debug)]
pub struct DirectCall {
    method: MethodDescription,
}

impl Forward for DirectCall {
    fn forward(
        &self,
        receiver: &Value,
        args: &mut [Value],
        generics: &[RuntimeType],
    ) -> Result<Value, InvocationError> {
        match &self.method.method().body {
            Some(body) => body.call(receiver, args, generics),
            None => Err(missing_body(&self.method)),
        }
    }

    fn kind(&self) -> DispatchKind {
        DispatchKind::Direct
    }
}

#[derive(Clone, Debug)]
pub struct FunctionPointerCall {
    method: MethodDescription,
    pointer: Option<MethodBody>,
}

impl Forward for FunctionPointerCall {
    fn forward(
        &self,
        receiver: &Value,
        args: &mut [Value],
        generics: &[RuntimeType],
    ) -> Result<Value, InvocationError> {
        match &self.pointer {
            Some(body) => body.call(receiver, args, generics),
            None => Err(missing_body(&self.method)),
        }
    }

    fn kind(&self) -> DispatchKind {
        DispatchKind::FunctionPointer
    }
}

#[derive(Clone, Debug)]
pub struct TrampolineCall {
    trampoline: Arc<Trampoline>,
}

impl Forward for TrampolineCall {
    fn forward(
        &self,
        receiver: &Value,
        args: &mut [Value],
        _generics: &[RuntimeType],
    ) -> Result<Value, InvocationError> {
        self.trampoline.invoke(receiver, args)
    }

    fn kind(&self) -> DispatchKind {
        DispatchKind::Trampoline
    }
}

/// Type-erased forwarder for one target member on an inaccessible type.
pub struct Trampoline {
    method: MethodDescription,
    body: Option<MethodBody>,
    comparer: TypeComparer,
}

impl Debug for Trampoline {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Trampoline({:?})", self.method)
    }
}

impl Trampoline {
    fn new(method: MethodDescription) -> Self {
        Self {
            body: method.method().body.clone(),
            method,
            comparer: TypeComparer::new(),
        }
    }

    pub fn method(&self) -> &MethodDescription {
        &self.method
    }

    pub fn invoke(&self, receiver: &Value, args: &mut [Value]) -> Result<Value, InvocationError> {
        let def = self.method.method();
        if !def.is_static {
            let owner = RuntimeType::from(&self.method.parent);
            if receiver.is_null() {
                return Err(InvocationError::NullReference(self.method.qualified_name()));
            }
            if !self.comparer.value_is_instance_of(receiver, &owner) {
                return Err(InvocationError::InvalidCast {
                    expected: owner.get_name(),
                    actual: receiver.type_name(),
                });
            }
        }
        if args.len() != def.parameters.len() {
            return Err(InvocationError::ArgumentCount {
                member: self.method.qualified_name(),
                expected: def.parameters.len(),
                actual: args.len(),
            });
        }
        for (arg, param) in args.iter().zip(def.parameters.iter()) {
            if param.mode == ParameterMode::Out || self.comparer.value_is_instance_of(arg, &param.ty) {
                continue;
            }
            return Err(if arg.is_null() {
                InvocationError::NullValueType(param.ty.get_name())
            } else {
                InvocationError::InvalidCast {
                    expected: param.ty.get_name(),
                    actual: arg.type_name(),
                }
            });
        }
        match &self.body {
            Some(body) => body.call(receiver, args, &[]),
            None => Err(missing_body(&self.method)),
        }
    }
}

/// Trampolines shared by every proxy type of a cache, one per target member.
#[derive(Default)]
pub struct TrampolineTable {
    entries: DashMap<MethodDescription, Arc<Trampoline>>,
}

impl TrampolineTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(
        &self,
        method: &MethodDescription,
        metrics: &DuckTypeMetrics,
    ) -> Arc<Trampoline> {
        if let Some(existing) = self.entries.get(method) {
            metrics.record_trampoline_cache_hit();
            return existing.clone();
        }
        metrics.record_trampoline_cache_miss();
        self.entries
            .entry(method.clone())
            .or_insert_with(|| {
                debug!("generating trampoline for {:?}", method);
                Arc::new(Trampoline::new(method.clone()))
            })
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Picks the strategy for calling `method` on instances of `target`.
pub fn select_strategy(
    target: &TypeDescription,
    method: &MethodDescription,
    ctx: &BuildContext,
) -> DispatchStrategy {
    let type_visible = ctx.type_accessible(target) && ctx.type_accessible(&method.parent);
    let member_visible = ctx.member_accessible(&method.parent, method.method().accessibility);
    if type_visible && member_visible {
        DirectCall {
            method: method.clone(),
        }
        .into()
    } else if type_visible {
        FunctionPointerCall {
            method: method.clone(),
            pointer: method.method().body.clone(),
        }
        .into()
    } else {
        TrampolineCall {
            trampoline: ctx.trampolines.get_or_create(method, ctx.metrics),
        }
        .into()
    }
}
