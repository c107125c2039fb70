mod common;

use common::{Fixtures, FRIEND_ASSEMBLY};
use ducktype_rs::prelude::*;

fn build_error(cache: &DuckTypeCache, shape: &TypeDescription, target: &TypeDescription) -> BuildError {
    let f = Fixtures::get();
    match cache.wrap(shape, &f.instance(target)) {
        Err(DuckTypeError::BuildAborted { source, .. }) => source,
        other => panic!("expected a build failure, got {:?}", other),
    }
}

#[test]
fn missing_members_abort_the_build() {
    let f = Fixtures::get();
    let cache = DuckTypeCache::new();
    let shape = TypeBuilder::interface("IMissing")
        .method(MethodDefinition::new("Missing", RuntimeType::Void).as_abstract())
        .build();

    let err = build_error(&cache, &shape, &f.public_object);
    assert_eq!(
        err,
        BuildError::TargetMemberNotFound {
            member: "IMissing::Missing".to_string(),
            target: "Obscure.ObscureObject".to_string(),
        }
    );
    assert!(!cache.contains(&shape, &f.public_object));
    assert!(cache.is_empty());
    assert_eq!(cache.stats().failed_builds, 1);
    assert!(!cache.can_create(&shape, &f.public_object));
}

#[test]
fn generic_methods_need_an_accessible_target() {
    let f = Fixtures::get();
    let cache = DuckTypeCache::new();
    for ty in [&f.internal_object, &f.private_object] {
        assert!(matches!(
            build_error(&cache, &f.i_generic, ty),
            BuildError::UnsupportedGenericOnInaccessibleType { .. }
        ));
    }
    assert!(cache.can_create(&f.i_generic, &f.public_object));

    let friend = DuckTypeCache::with_config(DuckTypeConfig::default().with_proxy_assembly(FRIEND_ASSEMBLY));
    assert!(friend.can_create(&f.i_generic, &f.internal_object));
}

#[test]
fn parameter_mismatches() {
    let f = Fixtures::get();
    let cache = DuckTypeCache::new();

    let by_value = TypeBuilder::interface("IBounceByValue")
        .method(
            MethodDefinition::new("Bounce", RuntimeType::Void)
                .param("value", RuntimeType::from(&f.i_dummy))
                .as_abstract(),
        )
        .build();
    assert!(matches!(
        build_error(&cache, &by_value, &f.public_object),
        BuildError::SignatureMismatch { .. }
    ));

    let i_dummy_t = RuntimeType::from(&f.i_dummy);
    let by_out = TypeBuilder::interface("IBounceOut")
        .method(
            MethodDefinition::new("Bounce", RuntimeType::Void)
                .out_param("value", i_dummy_t.clone())
                .as_abstract(),
        )
        .build();
    let by_in = TypeBuilder::interface("IBounceIn")
        .method(
            MethodDefinition::new("Bounce", RuntimeType::Void)
                .in_param("value", i_dummy_t)
                .as_abstract(),
        )
        .build();
    for shape in [&by_out, &by_in] {
        assert!(matches!(
            build_error(&cache, shape, &f.public_object),
            BuildError::SignatureMismatch { .. }
        ));
    }

    let extra = TypeBuilder::interface("IAddExtra")
        .method(
            MethodDefinition::new("Add", RuntimeType::Void)
                .param("key", RuntimeType::String)
                .param("value", RuntimeType::Int32)
                .optional_param("extra", RuntimeType::String, "x")
                .as_abstract(),
        )
        .build();
    assert_eq!(
        build_error(&cache, &extra, &f.public_object),
        BuildError::TargetParameterMissing {
            target_member: "Obscure.ObscureObject::Add".to_string(),
            parameter: "extra".to_string(),
        }
    );

    let target = TypeBuilder::class("Calculator")
        .method(
            MethodDefinition::new("Compute", RuntimeType::Int32)
                .param("x", RuntimeType::Int32)
                .param("y", RuntimeType::Int32)
                .duck(DuckAttribute::named("Int32 Twice(Int32)"))
                .with_body(|inv| Ok(Value::Int32(inv.arg_as::<i32>(0)? * inv.arg_as::<i32>(1)?))),
        )
        .build();
    let twice = TypeBuilder::interface("ITwice")
        .method(
            MethodDefinition::new("Twice", RuntimeType::Int32)
                .param("x", RuntimeType::Int32)
                .as_abstract(),
        )
        .build();
    let err = cache
        .wrap(&twice, &Value::Object(ObjectRef::new(&target)))
        .unwrap_err();
    assert_eq!(
        err.build_error(),
        Some(&BuildError::ShapeParameterMissing {
            shape_member: "ITwice::Twice".to_string(),
            parameter: "y".to_string(),
        })
    );
}

#[test]
fn write_checks_at_build_time() {
    let f = Fixtures::get();
    let cache = DuckTypeCache::new();

    let readonly = TypeBuilder::interface("IWritableId")
        .property(
            PropertyDefinition::new("ReadonlyId", RuntimeType::Int32)
                .get()
                .set()
                .duck(DuckAttribute::field()),
        )
        .build();
    assert_eq!(
        build_error(&cache, &readonly, &f.public_object),
        BuildError::FieldIsReadonly("Obscure.ObscureObject::ReadonlyId".to_string())
    );

    let writable_count = TypeBuilder::interface("IWritableCount")
        .property(PropertyDefinition::new("Count", RuntimeType::Int32).get().set())
        .build();
    assert_eq!(
        build_error(&cache, &writable_count, &f.private_object),
        BuildError::PropertyCantBeWritten("Obscure.PrivateObscureObject::Count".to_string())
    );
}

#[test]
fn ineligible_shapes() {
    let f = Fixtures::get();
    let cache = DuckTypeCache::new();

    let sealed = TypeBuilder::class("SealedShape").sealed().build();
    assert_eq!(
        build_error(&cache, &sealed, &f.public_object),
        BuildError::InvalidShapeKind("SealedShape".to_string())
    );

    let hidden = TypeBuilder::interface("IHiddenShape")
        .assembly(&f.library)
        .internal()
        .build();
    assert_eq!(
        build_error(&cache, &hidden, &f.public_object),
        BuildError::ShapeNotVisible("IHiddenShape".to_string())
    );
}

#[test]
fn facade_argument_errors() {
    let f = Fixtures::get();
    let cache = DuckTypeCache::new();
    assert_eq!(
        cache.wrap(&f.i_obscure, &Value::Null),
        Err(DuckTypeError::ArgumentNull {
            shape: "IObscureObject".to_string()
        })
    );
    assert_eq!(
        cache.wrap(&f.i_obscure, &Value::Int32(1)),
        Err(DuckTypeError::UnsupportedTarget {
            actual: "Int32".to_string()
        })
    );
    assert!(matches!(
        cache.proxy(&f.snapshot, &f.instance(&f.public_object)),
        Err(DuckTypeError::CopyShape { .. })
    ));
    assert!(matches!(
        cache.wrap(&f.snapshot, &Value::Object(ObjectRef::new(&f.dummy))),
        Err(DuckTypeError::BuildAborted {
            source: BuildError::TargetMemberNotFound { .. },
            ..
        })
    ));
}

#[test]
fn errors_describe_the_mismatch() {
    let f = Fixtures::get();
    let cache = DuckTypeCache::new();
    let shape = TypeBuilder::interface("IMissing")
        .method(MethodDefinition::new("Missing", RuntimeType::Void).as_abstract())
        .build();
    let err = cache.wrap(&shape, &f.instance(&f.public_object)).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("IMissing"));
    assert!(message.contains("IMissing::Missing"));
    assert!(std::error::Error::source(&err).is_some());
}
