use crate::{
    binding::DuckAttribute, error::InvocationError, object::ObjectRef, runtime::RuntimeType,
    value::Value, Accessibility, TypeDescription,
};
use std::{
    fmt::{Debug, Formatter},
    hash::{Hash, Hasher},
    sync::Arc,
};

/// Call frame handed to a native method body. `ref`/`out` parameters are written back
/// through `args`.
pub struct Invocation<'a> {
    pub this: &'a Value,
    pub args: &'a mut [Value],
    pub generics: &'a [RuntimeType],
}

impl<'a> Invocation<'a> {
    pub fn arg(&self, index: usize) -> Result<&Value, InvocationError> {
        self.args.get(index).ok_or(InvocationError::ArgumentCount {
            member: "native body".to_string(),
            expected: index + 1,
            actual: self.args.len(),
        })
    }

    pub fn arg_as<T>(&self, index: usize) -> Result<T, InvocationError>
    where
        T: TryFrom<Value, Error = InvocationError>,
    {
        self.arg(index)?.clone().try_into()
    }

    pub fn set_arg(&mut self, index: usize, value: Value) -> Result<(), InvocationError> {
        let actual = self.args.len();
        let slot = self.args.get_mut(index).ok_or(InvocationError::ArgumentCount {
            member: "native body".to_string(),
            expected: index + 1,
            actual,
        })?;
        *slot = value;
        Ok(())
    }

    pub fn this_object(&self) -> Result<&ObjectRef, InvocationError> {
        self.this.as_object()
    }

    pub fn generic(&self, index: usize) -> Option<&RuntimeType> {
        self.generics.get(index)
    }
}

type NativeMethod = dyn Fn(&mut Invocation<'_>) -> Result<Value, InvocationError> + Send + Sync;

#[derive(Clone)]
pub struct MethodBody(Arc<NativeMethod>);

impl MethodBody {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut Invocation<'_>) -> Result<Value, InvocationError> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(
        &self,
        this: &Value,
        args: &mut [Value],
        generics: &[RuntimeType],
    ) -> Result<Value, InvocationError> {
        (self.0)(&mut Invocation {
            this,
            args,
            generics,
        })
    }

    pub fn address(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    pub fn ptr_eq(&self, other: &MethodBody) -> bool {
        self.address() == other.address()
    }
}

impl Debug for MethodBody {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "MethodBody({:#x})", self.address())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ParameterMode {
    #[default]
    Value,
    Ref,
    Out,
    In,
}

impl ParameterMode {
    pub fn is_by_ref(self) -> bool {
        !matches!(self, ParameterMode::Value)
    }
}

#[derive(Clone, Debug)]
pub struct Parameter {
    pub name: String,
    /// For by-ref modes this is the referenced type.
    pub ty: RuntimeType,
    pub mode: ParameterMode,
    pub default: Option<Value>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: RuntimeType) -> Self {
        Self {
            name: name.into(),
            ty,
            mode: ParameterMode::Value,
            default: None,
        }
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    pub fn is_by_ref(&self) -> bool {
        self.mode.is_by_ref()
    }

    /// The type as it appears in a signature: `ByRef` for ref/out/in parameters.
    pub fn signature_type(&self) -> RuntimeType {
        if self.is_by_ref() {
            self.ty.clone().by_ref()
        } else {
            self.ty.clone()
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MethodKind {
    Abstract,
    Virtual,
    #[default]
    Normal,
}

#[derive(Clone, Debug)]
pub struct MethodDefinition {
    pub name: String,
    pub accessibility: Accessibility,
    pub is_static: bool,
    pub kind: MethodKind,
    pub generic_parameters: Vec<String>,
    pub parameters: Vec<Parameter>,
    pub return_type: RuntimeType,
    pub duck: Option<DuckAttribute>,
    pub body: Option<MethodBody>,
}

impl MethodDefinition {
    pub fn new(name: impl Into<String>, return_type: RuntimeType) -> Self {
        Self {
            name: name.into(),
            accessibility: Accessibility::Public,
            is_static: false,
            kind: MethodKind::Normal,
            generic_parameters: vec![],
            parameters: vec![],
            return_type,
            duck: None,
            body: None,
        }
    }

    fn push_param(mut self, name: impl Into<String>, ty: RuntimeType, mode: ParameterMode) -> Self {
        let mut param = Parameter::new(name, ty);
        param.mode = mode;
        self.parameters.push(param);
        self
    }

    pub fn param(self, name: impl Into<String>, ty: RuntimeType) -> Self {
        self.push_param(name, ty, ParameterMode::Value)
    }

    pub fn ref_param(self, name: impl Into<String>, ty: RuntimeType) -> Self {
        self.push_param(name, ty, ParameterMode::Ref)
    }

    pub fn out_param(self, name: impl Into<String>, ty: RuntimeType) -> Self {
        self.push_param(name, ty, ParameterMode::Out)
    }

    pub fn in_param(self, name: impl Into<String>, ty: RuntimeType) -> Self {
        self.push_param(name, ty, ParameterMode::In)
    }

    pub fn optional_param(
        mut self,
        name: impl Into<String>,
        ty: RuntimeType,
        default: impl Into<Value>,
    ) -> Self {
        let mut param = Parameter::new(name, ty);
        param.default = Some(default.into());
        self.parameters.push(param);
        self
    }

    pub fn generic(mut self, name: impl Into<String>) -> Self {
        self.generic_parameters.push(name.into());
        self
    }

    pub fn accessibility(mut self, accessibility: Accessibility) -> Self {
        self.accessibility = accessibility;
        self
    }

    pub fn internal(self) -> Self {
        self.accessibility(Accessibility::Internal)
    }

    pub fn private(self) -> Self {
        self.accessibility(Accessibility::Private)
    }

    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn as_abstract(mut self) -> Self {
        self.kind = MethodKind::Abstract;
        self.body = None;
        self
    }

    pub fn as_virtual(mut self) -> Self {
        self.kind = MethodKind::Virtual;
        self
    }

    pub fn duck(mut self, attribute: DuckAttribute) -> Self {
        self.duck = Some(attribute);
        self
    }

    pub fn with_body<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Invocation<'_>) -> Result<Value, InvocationError> + Send + Sync + 'static,
    {
        self.body = Some(MethodBody::new(f));
        self
    }

    pub fn generic_arity(&self) -> usize {
        self.generic_parameters.len()
    }

    pub fn is_overridable(&self) -> bool {
        matches!(self.kind, MethodKind::Abstract | MethodKind::Virtual)
    }

    pub fn required_parameter_count(&self) -> usize {
        self.parameters.iter().filter(|p| !p.has_default()).count()
    }

    fn display_type(&self, ty: &RuntimeType) -> String {
        match ty {
            RuntimeType::MethodGeneric(i) => self
                .generic_parameters
                .get(*i as usize)
                .cloned()
                .unwrap_or_else(|| ty.get_name()),
            RuntimeType::ByRef(inner) => format!("{} ByRef", self.display_type(inner)),
            RuntimeType::Nullable(inner) => format!("Nullable<{}>", self.display_type(inner)),
            other => other.get_name(),
        }
    }

    /// Signature text used by reverse bindings, e.g. `Int32 Sum(Int32, Int32)`.
    pub fn signature_string(&self) -> String {
        let generics = if self.generic_parameters.is_empty() {
            String::new()
        } else {
            format!("[{}]", self.generic_parameters.join(","))
        };
        let params: Vec<String> = self
            .parameters
            .iter()
            .map(|p| self.display_type(&p.signature_type()))
            .collect();
        format!(
            "{} {}{}({})",
            self.display_type(&self.return_type),
            self.name,
            generics,
            params.join(", ")
        )
    }
}

#[derive(Clone, Debug)]
pub struct FieldDefinition {
    pub name: String,
    pub ty: RuntimeType,
    pub accessibility: Accessibility,
    pub is_static: bool,
    pub init_only: bool,
    pub initial: Option<Value>,
    pub duck: Option<DuckAttribute>,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, ty: RuntimeType) -> Self {
        Self {
            name: name.into(),
            ty,
            accessibility: Accessibility::Public,
            is_static: false,
            init_only: false,
            initial: None,
            duck: None,
        }
    }

    pub fn accessibility(mut self, accessibility: Accessibility) -> Self {
        self.accessibility = accessibility;
        self
    }

    pub fn internal(self) -> Self {
        self.accessibility(Accessibility::Internal)
    }

    pub fn private(self) -> Self {
        self.accessibility(Accessibility::Private)
    }

    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn readonly(mut self) -> Self {
        self.init_only = true;
        self
    }

    pub fn initial(mut self, value: impl Into<Value>) -> Self {
        self.initial = Some(value.into());
        self
    }

    pub fn duck(mut self, attribute: DuckAttribute) -> Self {
        self.duck = Some(attribute);
        self
    }

    pub fn initial_value(&self) -> Value {
        self.initial
            .clone()
            .unwrap_or_else(|| self.ty.default_value())
    }
}

fn accessor_visibility(
    getter: &Option<Arc<MethodDefinition>>,
    setter: &Option<Arc<MethodDefinition>>,
    fallback: Accessibility,
) -> Accessibility {
    let mut accessors = getter.iter().chain(setter.iter()).map(|m| m.accessibility);
    if getter
        .iter()
        .chain(setter.iter())
        .any(|m| m.accessibility.is_public())
    {
        Accessibility::Public
    } else {
        accessors.next().unwrap_or(fallback)
    }
}

fn update_accessor(accessor: &mut Option<Arc<MethodDefinition>>, f: impl FnOnce(&mut MethodDefinition)) {
    if let Some(method) = accessor {
        f(Arc::make_mut(method));
    }
}

#[derive(Clone, Debug)]
pub struct PropertyDefinition {
    pub name: String,
    pub ty: RuntimeType,
    pub is_static: bool,
    pub getter: Option<Arc<MethodDefinition>>,
    pub setter: Option<Arc<MethodDefinition>>,
    pub duck: Option<DuckAttribute>,
    accessibility: Accessibility,
}

impl PropertyDefinition {
    pub fn new(name: impl Into<String>, ty: RuntimeType) -> Self {
        Self {
            name: name.into(),
            ty,
            is_static: false,
            getter: None,
            setter: None,
            duck: None,
            accessibility: Accessibility::Public,
        }
    }

    fn accessor(&self, name: String, kind: MethodKind) -> MethodDefinition {
        let mut method = MethodDefinition::new(name, RuntimeType::Void);
        method.accessibility = self.accessibility;
        method.is_static = self.is_static;
        method.kind = kind;
        method
    }

    fn new_getter(&self, kind: MethodKind, body: Option<MethodBody>) -> Arc<MethodDefinition> {
        let mut getter = self.accessor(format!("get_{}", self.name), kind);
        getter.return_type = self.ty.clone();
        getter.body = body;
        Arc::new(getter)
    }

    fn new_setter(&self, kind: MethodKind, body: Option<MethodBody>) -> Arc<MethodDefinition> {
        let mut setter = self
            .accessor(format!("set_{}", self.name), kind)
            .param("value", self.ty.clone());
        setter.body = body;
        Arc::new(setter)
    }

    /// Declares an abstract getter.
    pub fn get(mut self) -> Self {
        self.getter = Some(self.new_getter(MethodKind::Abstract, None));
        self
    }

    /// Declares an abstract setter.
    pub fn set(mut self) -> Self {
        self.setter = Some(self.new_setter(MethodKind::Abstract, None));
        self
    }

    pub fn getter<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Invocation<'_>) -> Result<Value, InvocationError> + Send + Sync + 'static,
    {
        self.getter = Some(self.new_getter(MethodKind::Normal, Some(MethodBody::new(f))));
        self
    }

    pub fn setter<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Invocation<'_>) -> Result<Value, InvocationError> + Send + Sync + 'static,
    {
        self.setter = Some(self.new_setter(MethodKind::Normal, Some(MethodBody::new(f))));
        self
    }

    /// Getter with a default body that a proxy keeps when the target has no match.
    pub fn virtual_getter<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Invocation<'_>) -> Result<Value, InvocationError> + Send + Sync + 'static,
    {
        self.getter = Some(self.new_getter(MethodKind::Virtual, Some(MethodBody::new(f))));
        self
    }

    pub fn accessibility(mut self, accessibility: Accessibility) -> Self {
        self.accessibility = accessibility;
        update_accessor(&mut self.getter, |m| m.accessibility = accessibility);
        update_accessor(&mut self.setter, |m| m.accessibility = accessibility);
        self
    }

    pub fn internal(self) -> Self {
        self.accessibility(Accessibility::Internal)
    }

    pub fn private(self) -> Self {
        self.accessibility(Accessibility::Private)
    }

    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        update_accessor(&mut self.getter, |m| m.is_static = true);
        update_accessor(&mut self.setter, |m| m.is_static = true);
        self
    }

    pub fn duck(mut self, attribute: DuckAttribute) -> Self {
        self.duck = Some(attribute);
        self
    }

    /// Most visible accessor's accessibility.
    pub fn visibility(&self) -> Accessibility {
        accessor_visibility(&self.getter, &self.setter, self.accessibility)
    }
}

#[derive(Clone, Debug)]
pub struct IndexerDefinition {
    pub ty: RuntimeType,
    pub parameters: Vec<Parameter>,
    pub getter: Option<Arc<MethodDefinition>>,
    pub setter: Option<Arc<MethodDefinition>>,
    pub duck: Option<DuckAttribute>,
    accessibility: Accessibility,
}

impl IndexerDefinition {
    pub fn new(ty: RuntimeType) -> Self {
        Self {
            ty,
            parameters: vec![],
            getter: None,
            setter: None,
            duck: None,
            accessibility: Accessibility::Public,
        }
    }

    /// Adds an index parameter. Declare index parameters before the accessors.
    pub fn param(mut self, name: impl Into<String>, ty: RuntimeType) -> Self {
        self.parameters.push(Parameter::new(name, ty));
        self
    }

    fn new_getter(&self, kind: MethodKind, body: Option<MethodBody>) -> Arc<MethodDefinition> {
        let mut getter = MethodDefinition::new("get_Item", self.ty.clone());
        getter.accessibility = self.accessibility;
        getter.kind = kind;
        getter.parameters = self.parameters.clone();
        getter.body = body;
        Arc::new(getter)
    }

    fn new_setter(&self, kind: MethodKind, body: Option<MethodBody>) -> Arc<MethodDefinition> {
        let mut setter = MethodDefinition::new("set_Item", RuntimeType::Void);
        setter.accessibility = self.accessibility;
        setter.kind = kind;
        setter.parameters = self.parameters.clone();
        setter.parameters.push(Parameter::new("value", self.ty.clone()));
        setter.body = body;
        Arc::new(setter)
    }

    pub fn get(mut self) -> Self {
        self.getter = Some(self.new_getter(MethodKind::Abstract, None));
        self
    }

    pub fn set(mut self) -> Self {
        self.setter = Some(self.new_setter(MethodKind::Abstract, None));
        self
    }

    pub fn getter<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Invocation<'_>) -> Result<Value, InvocationError> + Send + Sync + 'static,
    {
        self.getter = Some(self.new_getter(MethodKind::Normal, Some(MethodBody::new(f))));
        self
    }

    pub fn setter<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Invocation<'_>) -> Result<Value, InvocationError> + Send + Sync + 'static,
    {
        self.setter = Some(self.new_setter(MethodKind::Normal, Some(MethodBody::new(f))));
        self
    }

    pub fn accessibility(mut self, accessibility: Accessibility) -> Self {
        self.accessibility = accessibility;
        update_accessor(&mut self.getter, |m| m.accessibility = accessibility);
        update_accessor(&mut self.setter, |m| m.accessibility = accessibility);
        self
    }

    pub fn duck(mut self, attribute: DuckAttribute) -> Self {
        self.duck = Some(attribute);
        self
    }

    pub fn visibility(&self) -> Accessibility {
        accessor_visibility(&self.getter, &self.setter, self.accessibility)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MethodSlot {
    Method(usize),
    Getter(usize),
    Setter(usize),
    IndexGetter(usize),
    IndexSetter(usize),
}

/// A method (or accessor) bound to its declaring type.
#[derive(Clone)]
pub struct MethodDescription {
    pub parent: TypeDescription,
    pub slot: MethodSlot,
    method: Arc<MethodDefinition>,
}

impl MethodDescription {
    pub fn new(parent: TypeDescription, slot: MethodSlot) -> Option<Self> {
        let method = match slot {
            MethodSlot::Method(i) => parent.methods().get(i).cloned(),
            MethodSlot::Getter(i) => parent.properties().get(i)?.getter.clone(),
            MethodSlot::Setter(i) => parent.properties().get(i)?.setter.clone(),
            MethodSlot::IndexGetter(i) => parent.indexers().get(i)?.getter.clone(),
            MethodSlot::IndexSetter(i) => parent.indexers().get(i)?.setter.clone(),
        }?;
        Some(Self {
            parent,
            slot,
            method,
        })
    }

    pub fn method(&self) -> &MethodDefinition {
        &self.method
    }

    pub fn name(&self) -> &str {
        &self.method.name
    }

    pub fn is_static(&self) -> bool {
        self.method.is_static
    }

    pub fn signature_string(&self) -> String {
        self.method.signature_string()
    }

    /// `Type::Name`, used in diagnostics.
    pub fn qualified_name(&self) -> String {
        format!("{}::{}", self.parent.type_name(), self.method.name)
    }
}

impl Debug for MethodDescription {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {}",
            self.parent.type_name(),
            self.method.signature_string()
        )
    }
}

impl PartialEq for MethodDescription {
    fn eq(&self, other: &Self) -> bool {
        self.parent == other.parent && self.slot == other.slot
    }
}

impl Eq for MethodDescription {}

impl Hash for MethodDescription {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.parent.hash(state);
        self.slot.hash(state);
    }
}

#[derive(Clone)]
pub struct FieldDescription {
    pub parent: TypeDescription,
    pub index: usize,
    field: Arc<FieldDefinition>,
}

impl FieldDescription {
    pub fn new(parent: TypeDescription, index: usize) -> Option<Self> {
        let field = parent.fields().get(index)?.clone();
        Some(Self {
            parent,
            index,
            field,
        })
    }

    pub fn field(&self) -> &FieldDefinition {
        &self.field
    }

    pub fn qualified_name(&self) -> String {
        format!("{}::{}", self.parent.type_name(), self.field.name)
    }
}

impl Debug for FieldDescription {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {} {}",
            self.parent.type_name(),
            self.field.ty,
            self.field.name
        )
    }
}

impl PartialEq for FieldDescription {
    fn eq(&self, other: &Self) -> bool {
        self.parent == other.parent && self.index == other.index
    }
}

impl Eq for FieldDescription {}

impl Hash for FieldDescription {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.parent.hash(state);
        self.index.hash(state);
    }
}

#[derive(Clone, Debug)]
pub struct PropertyDescription {
    pub parent: TypeDescription,
    pub index: usize,
    property: Arc<PropertyDefinition>,
}

impl PropertyDescription {
    pub fn new(parent: TypeDescription, index: usize) -> Option<Self> {
        let property = parent.properties().get(index)?.clone();
        Some(Self {
            parent,
            index,
            property,
        })
    }

    pub fn property(&self) -> &PropertyDefinition {
        &self.property
    }

    pub fn getter(&self) -> Option<MethodDescription> {
        MethodDescription::new(self.parent.clone(), MethodSlot::Getter(self.index))
    }

    pub fn setter(&self) -> Option<MethodDescription> {
        MethodDescription::new(self.parent.clone(), MethodSlot::Setter(self.index))
    }

    pub fn qualified_name(&self) -> String {
        format!("{}::{}", self.parent.type_name(), self.property.name)
    }
}

#[derive(Clone, Debug)]
pub struct IndexerDescription {
    pub parent: TypeDescription,
    pub index: usize,
    indexer: Arc<IndexerDefinition>,
}

impl IndexerDescription {
    pub fn new(parent: TypeDescription, index: usize) -> Option<Self> {
        let indexer = parent.indexers().get(index)?.clone();
        Some(Self {
            parent,
            index,
            indexer,
        })
    }

    pub fn indexer(&self) -> &IndexerDefinition {
        &self.indexer
    }

    pub fn getter(&self) -> Option<MethodDescription> {
        MethodDescription::new(self.parent.clone(), MethodSlot::IndexGetter(self.index))
    }

    pub fn setter(&self) -> Option<MethodDescription> {
        MethodDescription::new(self.parent.clone(), MethodSlot::IndexSetter(self.index))
    }

    pub fn qualified_name(&self) -> String {
        format!("{}::Item", self.parent.type_name())
    }
}
