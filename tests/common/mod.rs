#![allow(dead_code)]

use ducktype_rs::{ducktype_types::members::Invocation, prelude::*};
use std::sync::{Arc, LazyLock};

/// Host types shared by the integration tests.
///
/// The `Obscure` types live in their own assembly and come in three visibilities so every
/// dispatch strategy gets exercised by the same shapes.
pub struct Fixtures {
    pub library: Arc<AssemblyIdentity>,
    pub task_status: TypeDescription,
    pub dummy: TypeDescription,
    pub public_object: TypeDescription,
    pub internal_object: TypeDescription,
    pub private_object: TypeDescription,

    pub shape_status: TypeDescription,
    pub i_dummy: TypeDescription,
    pub i_obscure: TypeDescription,
    pub i_generic: TypeDescription,
    pub obscure_base: TypeDescription,
    pub obscure_virtual: TypeDescription,
    pub snapshot: TypeDescription,
}

/// Assembly allowed to see the library's internals.
pub const FRIEND_ASSEMBLY: &str = "Obscure.Friend";

static FIXTURES: LazyLock<Fixtures> = LazyLock::new(Fixtures::new);

fn sum(ty: RuntimeType) -> MethodDefinition {
    MethodDefinition::new("Sum", ty.clone())
        .param("a", ty.clone())
        .param("b", ty)
}

fn this_field(inv: &Invocation<'_>, name: &str) -> Result<Value, InvocationError> {
    inv.this_object()?.get_field(name)
}

fn store_key(inv: &Invocation<'_>, key: String) -> Result<Value, InvocationError> {
    inv.this_object()?.set_field("_lastKey", key)?;
    Ok(Value::Null)
}

fn obscure_object(
    name: &str,
    accessibility: Accessibility,
    library: &Arc<AssemblyIdentity>,
    dummy: &TypeDescription,
    status: &TypeDescription,
) -> TypeDescription {
    let dummy_t = RuntimeType::from(dummy);
    TypeBuilder::class(name)
        .namespace("Obscure")
        .assembly(library)
        .accessibility(accessibility)
        .field(FieldDefinition::new("publicField", RuntimeType::Int32).initial(10))
        .field(FieldDefinition::new("_internalField", RuntimeType::String).internal().initial("internal"))
        .field(FieldDefinition::new("_privateField", RuntimeType::Int32).private().initial(7))
        .field(FieldDefinition::new("ReadonlyId", RuntimeType::Int32).readonly().initial(99))
        .field(FieldDefinition::new("StaticCounter", RuntimeType::Int64).as_static().initial(0i64))
        .field(FieldDefinition::new("_name", RuntimeType::String).private().initial("obscure"))
        .field(FieldDefinition::new("_lastKey", RuntimeType::String).private())
        .field(FieldDefinition::new("_dummy", dummy_t.clone()).private())
        .field(FieldDefinition::new("_slot0", RuntimeType::Int32).private())
        .field(FieldDefinition::new("_slot1", RuntimeType::Int32).private())
        .field(FieldDefinition::new("_slot2", RuntimeType::Int32).private())
        .method(sum(RuntimeType::Int32).with_body(|inv| {
            Ok(Value::Int32(inv.arg_as::<i32>(0)? + inv.arg_as::<i32>(1)?))
        }))
        .method(sum(RuntimeType::Float32).with_body(|inv| {
            Ok(Value::Float32(inv.arg_as::<f32>(0)? + inv.arg_as::<f32>(1)?))
        }))
        .method(sum(RuntimeType::Float64).with_body(|inv| {
            Ok(Value::Float64(inv.arg_as::<f64>(0)? + inv.arg_as::<f64>(1)?))
        }))
        .method(sum(RuntimeType::Int16).with_body(|inv| {
            Ok(Value::Int16(inv.arg_as::<i16>(0)?.wrapping_add(inv.arg_as::<i16>(1)?)))
        }))
        .method(
            MethodDefinition::new("ShowEnum", RuntimeType::String)
                .param("status", RuntimeType::from(status))
                .with_body(|inv| match inv.arg(0)? {
                    Value::Enum(td, v) => Ok(Value::from(format!("{}:{}", td.name, v))),
                    other => Err(InvocationError::InvalidCast {
                        expected: "TaskStatus".to_string(),
                        actual: other.type_name(),
                    }),
                }),
        )
        .method(
            MethodDefinition::new("InternalSum", RuntimeType::Int32)
                .param("a", RuntimeType::Int32)
                .param("b", RuntimeType::Int32)
                .internal()
                .with_body(|inv| Ok(Value::Int32(inv.arg_as::<i32>(0)? + inv.arg_as::<i32>(1)?))),
        )
        .method(
            MethodDefinition::new("Add", RuntimeType::Void)
                .param("key", RuntimeType::String)
                .param("value", RuntimeType::Object)
                .with_body(|inv| {
                    let key: String = inv.arg_as(0)?;
                    store_key(inv, format!("{}:object", key))
                }),
        )
        .method(
            MethodDefinition::new("Add", RuntimeType::Void)
                .param("key", RuntimeType::String)
                .param("value", RuntimeType::Int32)
                .with_body(|inv| {
                    let key: String = inv.arg_as(0)?;
                    let value: i32 = inv.arg_as(1)?;
                    store_key(inv, format!("{}:int:{}", key, value))
                }),
        )
        .method(
            MethodDefinition::new("Add", RuntimeType::Void)
                .param("key", RuntimeType::String)
                .optional_param("value", RuntimeType::String, "none")
                .with_body(|inv| {
                    let key: String = inv.arg_as(0)?;
                    let value: String = inv.arg_as(1)?;
                    store_key(inv, format!("{}:{}", key, value))
                }),
        )
        .method(
            MethodDefinition::new("GetDefault", RuntimeType::MethodGeneric(0))
                .generic("T")
                .with_body(|inv| Ok(inv.generic(0).map(|t| t.default_value()).unwrap_or(Value::Null))),
        )
        .method(
            MethodDefinition::new("GetDummy", dummy_t.clone())
                .with_body(|inv| this_field(inv, "_dummy")),
        )
        .method(
            MethodDefinition::new("TryGetDummy", RuntimeType::Boolean)
                .out_param("value", dummy_t.clone())
                .with_body(|inv| {
                    let dummy = this_field(inv, "_dummy")?;
                    inv.set_arg(0, dummy)?;
                    Ok(Value::Boolean(true))
                }),
        )
        .method(
            MethodDefinition::new("Bounce", RuntimeType::Void)
                .ref_param("value", dummy_t)
                .with_body(|inv| {
                    let seen = match inv.arg(0)? {
                        Value::Object(_) => "object",
                        Value::Null => "null",
                        _ => "other",
                    };
                    store_key(inv, format!("bounced:{}", seen))
                }),
        )
        .method(
            MethodDefinition::new("Fail", RuntimeType::Void)
                .with_body(|_| Err(InvocationError::Exception("target failure".to_string()))),
        )
        .property(
            PropertyDefinition::new("Name", RuntimeType::String)
                .getter(|inv| this_field(inv, "_name"))
                .setter(|inv| {
                    let value = inv.arg(0)?.clone();
                    inv.this_object()?.set_field("_name", value)?;
                    Ok(Value::Null)
                }),
        )
        .property(
            PropertyDefinition::new("InternalName", RuntimeType::String)
                .getter(|inv| this_field(inv, "_internalField"))
                .setter(|inv| {
                    let value = inv.arg(0)?.clone();
                    inv.this_object()?.set_field("_internalField", value)?;
                    Ok(Value::Null)
                })
                .internal(),
        )
        .property(PropertyDefinition::new("Count", RuntimeType::Int32).getter(|_| Ok(Value::Int32(3))))
        .property(
            PropertyDefinition::new("StaticLabel", RuntimeType::String)
                .getter(|_| Ok(Value::from("obscure")))
                .as_static(),
        )
        .indexer(
            IndexerDefinition::new(RuntimeType::Int32)
                .param("index", RuntimeType::Int32)
                .getter(|inv| {
                    let index: i32 = inv.arg_as(0)?;
                    if !(0..3).contains(&index) {
                        return Err(InvocationError::Exception("index out of range".to_string()));
                    }
                    this_field(inv, &format!("_slot{}", index))
                })
                .setter(|inv| {
                    let index: i32 = inv.arg_as(0)?;
                    if !(0..3).contains(&index) {
                        return Err(InvocationError::Exception("index out of range".to_string()));
                    }
                    let value = inv.arg(1)?.clone();
                    inv.this_object()?.set_field(&format!("_slot{}", index), value)?;
                    Ok(Value::Null)
                }),
        )
        .build()
}

impl Fixtures {
    pub fn get() -> &'static Self {
        &FIXTURES
    }

    fn new() -> Self {
        let library = AssemblyIdentity::with_friends("Obscure.Library", &[FRIEND_ASSEMBLY]);

        let task_status = TypeBuilder::enumeration("TaskStatus", RuntimeType::Int32)
            .namespace("Obscure")
            .assembly(&library)
            .build();
        let dummy = TypeBuilder::class("DummyFieldObject")
            .namespace("Obscure")
            .assembly(&library)
            .field(FieldDefinition::new("MagicNumber", RuntimeType::Int32).initial(42))
            .build();
        let public_object =
            obscure_object("ObscureObject", Accessibility::Public, &library, &dummy, &task_status);
        let internal_object = obscure_object(
            "InternalObscureObject",
            Accessibility::Internal,
            &library,
            &dummy,
            &task_status,
        );
        let private_object = obscure_object(
            "PrivateObscureObject",
            Accessibility::Private,
            &library,
            &dummy,
            &task_status,
        );

        let shape_status = TypeBuilder::enumeration("ShapeStatus", RuntimeType::Int32).build();
        let i_dummy = TypeBuilder::interface("IDummyFieldObject")
            .property(
                PropertyDefinition::new("MagicNumber", RuntimeType::Int32)
                    .get()
                    .duck(DuckAttribute::field()),
            )
            .build();
        let i_dummy_t = RuntimeType::from(&i_dummy);

        let i_obscure = TypeBuilder::interface("IObscureObject")
            .method(sum(RuntimeType::Int32).as_abstract())
            .method(sum(RuntimeType::Float32).as_abstract())
            .method(sum(RuntimeType::Float64).as_abstract())
            .method(sum(RuntimeType::Int16).as_abstract())
            .method(
                MethodDefinition::new("ShowEnum", RuntimeType::String)
                    .param("status", RuntimeType::from(&shape_status))
                    .as_abstract(),
            )
            .method(
                MethodDefinition::new("InternalSum", RuntimeType::Int32)
                    .param("a", RuntimeType::Int32)
                    .param("b", RuntimeType::Int32)
                    .as_abstract()
                    .duck(DuckAttribute::with_flags(BindingFlags::INSTANCE | BindingFlags::NON_PUBLIC)),
            )
            .method(
                MethodDefinition::new("Add", RuntimeType::Void)
                    .param("key", RuntimeType::String)
                    .param("value", RuntimeType::Object)
                    .as_abstract(),
            )
            .method(
                MethodDefinition::new("Add", RuntimeType::Void)
                    .param("key", RuntimeType::String)
                    .param("value", RuntimeType::Int32)
                    .as_abstract(),
            )
            .method(
                MethodDefinition::new("Add", RuntimeType::Void)
                    .param("key", RuntimeType::String)
                    .as_abstract(),
            )
            .method(MethodDefinition::new("GetDummy", i_dummy_t.clone()).as_abstract())
            .method(
                MethodDefinition::new("TryGetDummy", RuntimeType::Boolean)
                    .out_param("value", i_dummy_t.clone())
                    .as_abstract(),
            )
            .method(
                MethodDefinition::new("Bounce", RuntimeType::Void)
                    .ref_param("value", i_dummy_t)
                    .as_abstract(),
            )
            .method(MethodDefinition::new("Fail", RuntimeType::Void).as_abstract())
            .property(PropertyDefinition::new("Name", RuntimeType::String).get().set())
            .property(PropertyDefinition::new("InternalName", RuntimeType::String).get().set())
            .property(PropertyDefinition::new("Count", RuntimeType::Int32).get())
            .property(PropertyDefinition::new("StaticLabel", RuntimeType::String).get().as_static())
            .property(
                PropertyDefinition::new("LastKey", RuntimeType::String)
                    .get()
                    .duck(DuckAttribute::field().rename("_lastKey")),
            )
            .property(
                PropertyDefinition::new("PrivateField", RuntimeType::Int32)
                    .get()
                    .set()
                    .duck(DuckAttribute::field().rename("_privateField")),
            )
            .property(
                PropertyDefinition::new("PublicField", RuntimeType::Int64)
                    .get()
                    .set()
                    .duck(DuckAttribute::field().rename("publicField")),
            )
            .property(
                PropertyDefinition::new("ReadonlyId", RuntimeType::Int32)
                    .get()
                    .duck(DuckAttribute::field()),
            )
            .property(
                PropertyDefinition::new("StaticCounter", RuntimeType::Int64)
                    .get()
                    .set()
                    .as_static()
                    .duck(DuckAttribute::field()),
            )
            .indexer(
                IndexerDefinition::new(RuntimeType::Int32)
                    .param("index", RuntimeType::Int32)
                    .get()
                    .set(),
            )
            .build();

        let i_generic = TypeBuilder::interface("IGenericObscureObject")
            .method(
                MethodDefinition::new("GetDefault", RuntimeType::MethodGeneric(0))
                    .generic("T")
                    .as_abstract(),
            )
            .build();

        let obscure_base = TypeBuilder::class("ObscureBase")
            .as_abstract()
            .method(sum(RuntimeType::Int32).as_abstract())
            .method(
                MethodDefinition::new("Describe", RuntimeType::String)
                    .as_virtual()
                    .with_body(|_| Ok(Value::from("base description"))),
            )
            .method(
                MethodDefinition::new("Hello", RuntimeType::String)
                    .with_body(|_| Ok(Value::from("hello from the shape"))),
            )
            .property(PropertyDefinition::new("Name", RuntimeType::String).get())
            .build();

        let obscure_virtual = TypeBuilder::class("ObscureVirtual")
            .method(
                sum(RuntimeType::Int32)
                    .as_virtual()
                    .with_body(|_| Ok(Value::Int32(-1))),
            )
            .method(
                MethodDefinition::new("SumOfThree", RuntimeType::Int32)
                    .as_virtual()
                    .with_body(|inv| {
                        let this = inv.this.as_duck().ok_or_else(|| {
                            InvocationError::NullReference("this".to_string())
                        })?;
                        let mut args = [Value::Int32(1), Value::Int32(2)];
                        let partial: i32 = this.invoke("Sum", &mut args)?.try_into()?;
                        Ok(Value::Int32(partial + 3))
                    }),
            )
            .property(
                PropertyDefinition::new("Label", RuntimeType::String)
                    .virtual_getter(|_| Ok(Value::from("virtual label"))),
            )
            .build();

        let snapshot = TypeBuilder::structure("ObscureSnapshot")
            .field(FieldDefinition::new("Name", RuntimeType::String))
            .field(FieldDefinition::new("Count", RuntimeType::Int64))
            .field(
                FieldDefinition::new("Secret", RuntimeType::Int32)
                    .duck(DuckAttribute::field().rename("_privateField")),
            )
            .build();

        Self {
            library,
            task_status,
            dummy,
            public_object,
            internal_object,
            private_object,
            shape_status,
            i_dummy,
            i_obscure,
            i_generic,
            obscure_base,
            obscure_virtual,
            snapshot,
        }
    }

    /// A fresh instance of one of the `Obscure` object types.
    pub fn instance(&self, ty: &TypeDescription) -> Value {
        let object = ObjectRef::new(ty);
        object
            .set_field("_dummy", ObjectRef::new(&self.dummy))
            .expect("fixture types declare _dummy");
        Value::Object(object)
    }

    pub fn all_objects(&self) -> [&TypeDescription; 3] {
        [&self.public_object, &self.internal_object, &self.private_object]
    }
}
