//! Selects the target member that backs each shape member.
//!
//! Methods go through an exact lookup first, then a preselection by name and parameter
//! count, then narrowing by reverse binding, return type and parameter compatibility.
//! Remaining ties fall back to declaration order, so the choice is stable.
use crate::{config::DuckTypeConfig, conversion::is_chainable};
use ducktype_types::{
    binding::{BindingFlags, DuckAttribute},
    comparer::TypeComparer,
    members::{
        FieldDescription, IndexerDescription, MethodDefinition, MethodDescription, MethodSlot,
        PropertyDescription,
    },
    Accessibility, TypeDescription,
};
use tracing::{trace, warn};

/// Lookup name and binding flags after applying a member's [`DuckAttribute`].
pub fn effective_binding<'a>(
    duck: Option<&'a DuckAttribute>,
    name: &'a str,
) -> (&'a str, BindingFlags) {
    match duck {
        Some(attr) => (attr.effective_name(name), attr.binding_flags),
        None => (name, BindingFlags::ALL),
    }
}

fn reverse_binding(method: &MethodDefinition) -> Option<&str> {
    method.duck.as_ref()?.name.as_deref()
}

/// Whether two parameter lists line up, allowing surplus trailing parameters that all have
/// defaults on the longer side.
fn arity_fits(a: &MethodDefinition, b: &MethodDefinition) -> bool {
    let (short, long) = if a.parameters.len() <= b.parameters.len() {
        (a, b)
    } else {
        (b, a)
    };
    long.parameters[short.parameters.len()..]
        .iter()
        .all(|p| p.has_default())
}

/// Keeps the entries matching `pred` when at least one does.
fn narrow<T>(candidates: Vec<T>, pred: impl Fn(&T) -> bool) -> Vec<T> {
    if candidates.iter().any(&pred) {
        candidates.into_iter().filter(|c| pred(c)).collect()
    } else {
        candidates
    }
}

pub struct MemberResolver<'a> {
    config: &'a DuckTypeConfig,
    comparer: TypeComparer,
}

impl<'a> MemberResolver<'a> {
    pub fn new(config: &'a DuckTypeConfig) -> Self {
        Self {
            config,
            comparer: TypeComparer::new(),
        }
    }

    /// Methods reachable through `flags`: those declared on the target, then non-private
    /// inherited ones that are not overridden further down.
    pub fn target_methods(&self, target: &TypeDescription, flags: BindingFlags) -> Vec<MethodDescription> {
        let mut found: Vec<MethodDescription> = vec![];
        for (depth, owner) in target.ancestors().enumerate() {
            for (index, method) in owner.methods().iter().enumerate() {
                if depth > 0 && method.accessibility == Accessibility::Private {
                    continue;
                }
                if !flags.matches(method.is_static, method.accessibility) {
                    continue;
                }
                let overridden = found.iter().any(|d| {
                    let d = d.method();
                    d.name == method.name
                        && d.generic_arity() == method.generic_arity()
                        && self.comparer.parameters_equal(&d.parameters, &method.parameters)
                });
                if overridden {
                    continue;
                }
                if let Some(desc) = MethodDescription::new(owner.clone(), MethodSlot::Method(index)) {
                    found.push(desc);
                }
            }
        }
        found
    }

    pub fn resolve_method(
        &self,
        shape: &MethodDescription,
        target: &TypeDescription,
    ) -> Option<MethodDescription> {
        let wanted = shape.method();
        let (name, flags) = effective_binding(wanted.duck.as_ref(), &wanted.name);
        let signature = wanted.signature_string();
        let methods = self.target_methods(target, flags);

        let exact = methods.iter().find(|m| {
            let m = m.method();
            m.name == name
                && m.generic_arity() == wanted.generic_arity()
                && self.comparer.parameters_equal(&m.parameters, &wanted.parameters)
        });
        if let Some(found) = exact {
            match reverse_binding(found.method()) {
                Some(bound) if bound != signature => {}
                _ => {
                    trace!("exact match for {} on {:?}: {:?}", signature, target, found);
                    return Some(found.clone());
                }
            }
        }

        let candidates: Vec<&MethodDescription> = methods
            .iter()
            .filter(|m| {
                let m = m.method();
                match reverse_binding(m) {
                    Some(bound) => bound == signature,
                    None => {
                        m.name == name
                            && m.generic_arity() == wanted.generic_arity()
                            && arity_fits(wanted, m)
                    }
                }
            })
            .collect();

        match candidates.len() {
            0 => None,
            1 => Some(candidates[0].clone()),
            _ => self.select_overload(wanted, &signature, candidates, target),
        }
    }

    fn select_overload(
        &self,
        wanted: &MethodDefinition,
        signature: &str,
        candidates: Vec<&MethodDescription>,
        target: &TypeDescription,
    ) -> Option<MethodDescription> {
        let candidates = narrow(candidates, |c| reverse_binding(c.method()) == Some(signature));
        let candidates = narrow(candidates, |c| c.method().return_type == wanted.return_type);
        let returns_shape = wanted
            .return_type
            .as_type()
            .is_some_and(|td| !td.is_value_type() && is_chainable(td));
        let candidates = if returns_shape {
            narrow(candidates, |c| !c.method().return_type.is_value_type())
        } else {
            candidates
        };
        let candidates = narrow(candidates, |c| {
            wanted
                .parameters
                .iter()
                .zip(c.method().parameters.iter())
                .all(|(s, t)| s.mode == t.mode && self.comparer.is_compatible(&s.ty, &t.ty))
        });

        if candidates.len() > 1 && self.config.warn_on_ambiguous_overloads {
            warn!(
                "{} overloads of '{}' on {:?} remain after narrowing, binding the first: {:?}",
                candidates.len(),
                signature,
                target,
                candidates[0]
            );
        }
        candidates.first().map(|c| (*c).clone())
    }

    pub fn resolve_field(
        &self,
        name: &str,
        flags: BindingFlags,
        target: &TypeDescription,
    ) -> Option<FieldDescription> {
        target.ancestors().enumerate().find_map(|(depth, owner)| {
            let index = owner.fields().iter().position(|f| {
                f.name == name
                    && (depth == 0 || f.accessibility != Accessibility::Private)
                    && flags.matches(f.is_static, f.accessibility)
            })?;
            FieldDescription::new(owner, index)
        })
    }

    pub fn resolve_property(
        &self,
        name: &str,
        flags: BindingFlags,
        target: &TypeDescription,
    ) -> Option<PropertyDescription> {
        target.ancestors().enumerate().find_map(|(depth, owner)| {
            let index = owner.properties().iter().position(|p| {
                let visibility = p.visibility();
                p.name == name
                    && (depth == 0 || visibility != Accessibility::Private)
                    && flags.matches(p.is_static, visibility)
            })?;
            PropertyDescription::new(owner, index)
        })
    }

    /// Indexers are matched by parameter list: exact types first, then equal count with
    /// compatible types.
    pub fn resolve_indexer(
        &self,
        shape: &IndexerDescription,
        target: &TypeDescription,
    ) -> Option<IndexerDescription> {
        let wanted = shape.indexer();
        let flags = wanted
            .duck
            .as_ref()
            .map(|d| d.binding_flags)
            .unwrap_or(BindingFlags::ALL);
        let candidates: Vec<IndexerDescription> = target
            .ancestors()
            .enumerate()
            .flat_map(|(depth, owner)| {
                (0..owner.indexers().len())
                    .filter_map(|i| IndexerDescription::new(owner.clone(), i))
                    .filter(|d| {
                        let visibility = d.indexer().visibility();
                        (depth == 0 || visibility != Accessibility::Private)
                            && flags.matches(false, visibility)
                    })
                    .collect::<Vec<_>>()
            })
            .collect();

        if let Some(exact) = candidates.iter().find(|c| {
            self.comparer
                .parameters_equal(&c.indexer().parameters, &wanted.parameters)
        }) {
            return Some(exact.clone());
        }
        candidates.into_iter().find(|c| {
            let params = &c.indexer().parameters;
            params.len() == wanted.parameters.len()
                && wanted
                    .parameters
                    .iter()
                    .zip(params.iter())
                    .all(|(s, t)| self.comparer.is_compatible(&s.ty, &t.ty))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ducktype_types::{
        builder::TypeBuilder,
        members::{IndexerDefinition, MethodDefinition},
        runtime::RuntimeType,
    };

    fn shape_method(method: MethodDefinition) -> MethodDescription {
        let shape = TypeBuilder::interface("IShape").method(method.as_abstract()).build();
        MethodDescription::new(shape, MethodSlot::Method(0)).unwrap()
    }

    fn sum(ty: RuntimeType) -> MethodDefinition {
        MethodDefinition::new("Sum", ty.clone())
            .param("a", ty.clone())
            .param("b", ty)
    }

    #[test]
    fn test_exact_overload_wins() {
        let config = DuckTypeConfig::default();
        let resolver = MemberResolver::new(&config);
        let target = TypeBuilder::class("Target")
            .method(sum(RuntimeType::Int32))
            .method(sum(RuntimeType::Float32))
            .method(sum(RuntimeType::Float64))
            .method(sum(RuntimeType::Int16))
            .build();

        for (index, ty) in [
            RuntimeType::Int32,
            RuntimeType::Float32,
            RuntimeType::Float64,
            RuntimeType::Int16,
        ]
        .into_iter()
        .enumerate()
        {
            let found = resolver.resolve_method(&shape_method(sum(ty)), &target).unwrap();
            assert_eq!(found.slot, MethodSlot::Method(index));
        }
    }

    #[test]
    fn test_binding_flags_filter() {
        let config = DuckTypeConfig::default();
        let resolver = MemberResolver::new(&config);
        let target = TypeBuilder::class("Target")
            .method(sum(RuntimeType::Int32).internal())
            .build();
        let public_only = sum(RuntimeType::Int32)
            .duck(DuckAttribute::with_flags(BindingFlags::INSTANCE | BindingFlags::PUBLIC));
        assert!(resolver.resolve_method(&shape_method(public_only), &target).is_none());
        let non_public = sum(RuntimeType::Int32)
            .duck(DuckAttribute::with_flags(BindingFlags::INSTANCE | BindingFlags::NON_PUBLIC));
        assert!(resolver.resolve_method(&shape_method(non_public), &target).is_some());
    }

    #[test]
    fn test_reverse_binding() {
        let config = DuckTypeConfig::default();
        let resolver = MemberResolver::new(&config);
        let target = TypeBuilder::class("Target")
            .method(
                MethodDefinition::new("Compute", RuntimeType::Int32)
                    .param("x", RuntimeType::Int32)
                    .param("y", RuntimeType::Int32)
                    .duck(DuckAttribute::named("Int32 Sum(Int32, Int32)")),
            )
            .build();
        let found = resolver
            .resolve_method(&shape_method(sum(RuntimeType::Int32)), &target)
            .unwrap();
        assert_eq!(found.name(), "Compute");
    }

    #[test]
    fn test_defaults_allow_preselection() {
        let config = DuckTypeConfig::default();
        let resolver = MemberResolver::new(&config);
        let target = TypeBuilder::class("Target")
            .method(
                MethodDefinition::new("Add", RuntimeType::Void)
                    .param("key", RuntimeType::String)
                    .optional_param("value", RuntimeType::String, "none"),
            )
            .build();
        let shape = MethodDefinition::new("Add", RuntimeType::Void).param("key", RuntimeType::String);
        assert!(resolver.resolve_method(&shape_method(shape), &target).is_some());
    }

    #[test]
    fn test_narrowing_prefers_same_return_type() {
        let config = DuckTypeConfig::default();
        let resolver = MemberResolver::new(&config);
        let target = TypeBuilder::class("Target")
            .method(MethodDefinition::new("Get", RuntimeType::Object).param("k", RuntimeType::Object))
            .method(MethodDefinition::new("Get", RuntimeType::String).param("k", RuntimeType::Object))
            .build();
        let shape = MethodDefinition::new("Get", RuntimeType::String).param("k", RuntimeType::String);
        let found = resolver.resolve_method(&shape_method(shape), &target).unwrap();
        assert_eq!(found.slot, MethodSlot::Method(1));
    }

    #[test]
    fn test_inherited_members() {
        let config = DuckTypeConfig::default();
        let resolver = MemberResolver::new(&config);
        let base = TypeBuilder::class("Base")
            .method(sum(RuntimeType::Int32))
            .method(sum(RuntimeType::Int64).private())
            .build();
        let derived = TypeBuilder::class("Derived").extends(&base).build();
        let found = resolver
            .resolve_method(&shape_method(sum(RuntimeType::Int32)), &derived)
            .unwrap();
        assert_eq!(found.parent, base);
        // the private Int64 overload is invisible, the name/count preselection binds Int32
        let found = resolver
            .resolve_method(&shape_method(sum(RuntimeType::Int64)), &derived)
            .unwrap();
        assert_eq!(found.signature_string(), "Int32 Sum(Int32, Int32)");
    }

    #[test]
    fn test_indexer_exact_before_compatible() {
        let config = DuckTypeConfig::default();
        let resolver = MemberResolver::new(&config);
        let keyed = |ty: RuntimeType| IndexerDefinition::new(RuntimeType::String).param("k", ty);
        let target = TypeBuilder::class("Target")
            .indexer(keyed(RuntimeType::Int32).get())
            .indexer(keyed(RuntimeType::String).get())
            .indexer(keyed(RuntimeType::Int64).get())
            .build();
        let shape_indexer = |ty: RuntimeType| {
            let shape = TypeBuilder::interface("IShape").indexer(keyed(ty).get()).build();
            IndexerDescription::new(shape, 0).unwrap()
        };

        let resolved = |ty: RuntimeType| {
            resolver
                .resolve_indexer(&shape_indexer(ty), &target)
                .map(|found| found.index)
        };

        assert_eq!(resolved(RuntimeType::Int64), Some(2));
        assert_eq!(resolved(RuntimeType::String), Some(1));
        // no Int16 indexer, the first compatible one binds
        assert_eq!(resolved(RuntimeType::Int16), Some(0));
        assert_eq!(resolved(RuntimeType::Object), None);
    }
}
