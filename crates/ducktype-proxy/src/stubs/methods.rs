use crate::{
    conversion::{ConversionPlan, DuckChainer},
    error::BuildError,
    stubs::{
        dispatch::{select_strategy, DispatchKind, DispatchStrategy, Forward},
        BuildContext,
    },
};
use ducktype_types::{
    error::InvocationError,
    members::{MethodDescription, ParameterMode},
    runtime::RuntimeType,
    value::Value,
    TypeDescription,
};

/// How one target argument is produced from the shape arguments.
#[derive(Clone, Debug)]
enum ArgumentPlan {
    Value {
        source: usize,
        plan: ConversionPlan,
    },
    /// By-ref parameter of identical type: the slot is passed through and copied back.
    SameRef { source: usize },
    /// By-ref parameter whose types differ: a scratch slot of the target type is converted
    /// in (unless `out`) and converted back after the call.
    ScratchRef {
        source: usize,
        inbound: Option<ConversionPlan>,
        outbound: ConversionPlan,
        initial: Value,
    },
    /// Trailing target parameter the shape does not declare.
    Default(Value),
}

/// Compiled forwarding of one shape method onto one target method.
#[derive(Clone, Debug)]
pub struct MethodStub {
    shape: MethodDescription,
    target: MethodDescription,
    arguments: Vec<ArgumentPlan>,
    return_plan: ConversionPlan,
    strategy: DispatchStrategy,
}

impl MethodStub {
    pub fn build(
        shape: &MethodDescription,
        target: &MethodDescription,
        target_type: &TypeDescription,
        ctx: &BuildContext,
    ) -> Result<Self, BuildError> {
        let strategy = select_strategy(target_type, target, ctx);
        let wanted = shape.method();
        let found = target.method();

        if found.generic_arity() > 0 && strategy.kind() == DispatchKind::Trampoline {
            return Err(BuildError::UnsupportedGenericOnInaccessibleType {
                member: shape.qualified_name(),
                target: target_type.type_name(),
            });
        }

        let count = wanted.parameters.len().max(found.parameters.len());
        let mut arguments = Vec::with_capacity(found.parameters.len());
        for i in 0..count {
            match (wanted.parameters.get(i), found.parameters.get(i)) {
                (Some(s), Some(t)) => {
                    if s.mode != t.mode {
                        return Err(BuildError::SignatureMismatch {
                            shape_member: shape.qualified_name(),
                            target_member: target.qualified_name(),
                        });
                    }
                    let plan = if !t.is_by_ref() {
                        ArgumentPlan::Value {
                            source: i,
                            plan: ctx.planner.plan(&s.ty, &t.ty),
                        }
                    } else if s.ty == t.ty {
                        ArgumentPlan::SameRef { source: i }
                    } else {
                        ArgumentPlan::ScratchRef {
                            source: i,
                            inbound: (t.mode != ParameterMode::Out)
                                .then(|| ctx.planner.plan(&s.ty, &t.ty)),
                            outbound: ctx.planner.plan(&t.ty, &s.ty),
                            initial: t.ty.default_value(),
                        }
                    };
                    arguments.push(plan);
                }
                (None, Some(t)) => match &t.default {
                    Some(value) => arguments.push(ArgumentPlan::Default(value.clone())),
                    None => {
                        return Err(BuildError::ShapeParameterMissing {
                            shape_member: shape.qualified_name(),
                            parameter: t.name.clone(),
                        })
                    }
                },
                (Some(s), None) => {
                    return Err(BuildError::TargetParameterMissing {
                        target_member: target.qualified_name(),
                        parameter: s.name.clone(),
                    })
                }
                (None, None) => break,
            }
        }

        let return_plan = if wanted.return_type.is_void() {
            ConversionPlan::Passthrough
        } else {
            ctx.planner.plan(&found.return_type, &wanted.return_type)
        };

        Ok(Self {
            shape: shape.clone(),
            target: target.clone(),
            arguments,
            return_plan,
            strategy,
        })
    }

    pub fn shape(&self) -> &MethodDescription {
        &self.shape
    }

    pub fn target(&self) -> &MethodDescription {
        &self.target
    }

    pub fn dispatch_kind(&self) -> DispatchKind {
        self.strategy.kind()
    }

    /// Calls the target on `instance`. `args` are in shape order; by-ref results are written
    /// back into them.
    pub fn invoke(
        &self,
        instance: &Value,
        args: &mut [Value],
        generics: &[RuntimeType],
        chainer: &dyn DuckChainer,
    ) -> Result<Value, InvocationError> {
        let expected = self.shape.method().parameters.len();
        if args.len() != expected {
            return Err(InvocationError::ArgumentCount {
                member: self.shape.qualified_name(),
                expected,
                actual: args.len(),
            });
        }

        let mut target_args = Vec::with_capacity(self.arguments.len());
        for plan in &self.arguments {
            target_args.push(match plan {
                ArgumentPlan::Value { source, plan } => plan.apply(args[*source].clone(), chainer)?,
                ArgumentPlan::SameRef { source } => args[*source].clone(),
                ArgumentPlan::ScratchRef {
                    source,
                    inbound,
                    initial,
                    ..
                } => match inbound {
                    Some(plan) => plan.apply(args[*source].clone(), chainer)?,
                    None => initial.clone(),
                },
                ArgumentPlan::Default(value) => value.clone(),
            });
        }

        let receiver = if self.target.is_static() {
            Value::Null
        } else {
            instance.clone()
        };
        let result = self.strategy.forward(&receiver, &mut target_args, generics)?;

        // convert every write-back before touching the caller's slots
        let mut written = Vec::new();
        for (plan, value) in self.arguments.iter().zip(target_args) {
            match plan {
                ArgumentPlan::SameRef { source } => written.push((*source, value)),
                ArgumentPlan::ScratchRef {
                    source, outbound, ..
                } => written.push((*source, outbound.apply(value, chainer)?)),
                _ => {}
            }
        }
        for (source, value) in written {
            args[source] = value;
        }

        if self.shape.method().return_type.is_void() {
            return Ok(Value::Null);
        }
        self.return_plan.apply(result, chainer)
    }
}
