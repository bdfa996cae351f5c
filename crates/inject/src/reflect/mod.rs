//! Type descriptors and dynamic field access.
//!
//! Rust has no runtime reflection, so every type taking part in injection
//! derives [`Reflect`](macro@crate::Reflect). The derive emits a static
//! [`TypeInfo`] describing the type's fields, struct tags, embedded parents,
//! provided interfaces and initializer, plus index based field accessors that
//! the annotation model and the injector walk at runtime.

pub mod naming;
pub mod scalar;
pub mod tag;

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use crate::container::init::InitMethod;
use crate::errors::InjectError;

pub use tag::{StructTag, TagPair, TagSyntaxError};

/// Shared, type erased instance held by the instance registry
pub type Instance = Arc<dyn Reflect>;

/// Broad shape of a reflected type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// Plain struct
    Struct,
    /// Annotation marker struct
    Annotation,
    /// Trait object declared with [`interface!`](crate::interface)
    Interface,
    /// Leaf value settable from a tag literal
    Scalar,
}

type CastFn =
    Box<dyn Fn(Arc<dyn Any + Send + Sync>) -> Option<Box<dyn Any + Send + Sync>> + Send + Sync>;

/// An interface a concrete type declares it satisfies
pub struct Provided {
    /// Bare interface name, used for name based matching
    pub interface: &'static str,
    /// TypeId of the `dyn Trait` object type
    pub type_id: TypeId,
    cast: CastFn,
}

impl Provided {
    /// Upcast a concrete instance into the interface, boxed as `Arc<dyn Trait>`
    pub fn cast(&self, instance: &Instance) -> Option<Box<dyn Any + Send + Sync>> {
        (self.cast)(Arc::clone(instance).into_any())
    }
}

impl fmt::Debug for Provided {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provided")
            .field("interface", &self.interface)
            .finish()
    }
}

/// Static description of one reflected field
#[derive(Debug, Clone)]
pub struct FieldInfo {
    /// Field name as declared
    pub name: &'static str,
    /// Index understood by [`Reflect::field`]
    pub index: usize,
    /// Declared type after pointer indirection
    pub ty: fn() -> &'static TypeInfo,
    /// Declared as a shared pointer (`Option<Arc<T>>`)
    pub indirect: bool,
    /// Composed into the enclosing type (embedding)
    pub embedded: bool,
    /// Whether the injector may assign resolved values to the field
    pub settable: bool,
    /// Raw struct tag literal
    pub tag: StructTag,
}

impl FieldInfo {
    pub fn new<F: Typed + ?Sized>(name: &'static str, index: usize) -> Self {
        Self {
            name,
            index,
            ty: F::type_info,
            indirect: F::INDIRECT,
            embedded: false,
            settable: true,
            tag: StructTag::default(),
        }
    }

    pub fn embedded(mut self) -> Self {
        self.embedded = true;
        self
    }

    pub fn readonly(mut self) -> Self {
        self.settable = false;
        self
    }

    pub fn tagged(mut self, tag: &'static str) -> Self {
        self.tag = StructTag::new(tag);
        self
    }

    /// Resolve the field's type descriptor
    pub fn type_info(&self) -> &'static TypeInfo {
        (self.ty)()
    }

    /// Field held by value whose type is a struct or marker
    pub fn is_nested_struct(&self) -> bool {
        !self.indirect && self.type_info().is_struct()
    }
}

/// Runtime type descriptor emitted by `#[derive(Reflect)]`
pub struct TypeInfo {
    pub name: &'static str,
    pub package: &'static str,
    pub type_id: TypeId,
    pub kind: TypeKind,
    pub fields: Vec<FieldInfo>,
    pub provides: Vec<Provided>,
    pub init: Option<InitMethod>,
    pub construct: Option<fn() -> Box<dyn Reflect>>,
    /// Values accept [`Reflect::assign`] from resolved instances
    pub assignable: bool,
}

impl TypeInfo {
    /// Start a descriptor for `T`
    pub fn of<T: ?Sized + 'static>(name: &'static str, package: &'static str, kind: TypeKind) -> Self {
        Self {
            name,
            package,
            type_id: TypeId::of::<T>(),
            kind,
            fields: Vec::new(),
            provides: Vec::new(),
            init: None,
            construct: None,
            assignable: false,
        }
    }

    /// Descriptor for an interface (`dyn Trait`)
    pub fn interface<T: ?Sized + 'static>(name: &'static str, package: &'static str) -> Self {
        Self::of::<T>(name, package, TypeKind::Interface)
    }

    /// Descriptor for a scalar constructible from its default
    pub fn scalar<T: Reflect + Default>(name: &'static str) -> Self {
        Self::of::<T>(name, "", TypeKind::Scalar)
            .constructible::<T>()
            .assignable()
    }

    pub fn field(mut self, field: FieldInfo) -> Self {
        self.fields.push(field);
        self
    }

    /// Declare that `T` satisfies interface `I`
    pub fn provides<T, I>(mut self, interface: &'static str, upcast: fn(Arc<T>) -> Arc<I>) -> Self
    where
        T: Send + Sync + 'static,
        I: ?Sized + Send + Sync + 'static,
    {
        self.provides.push(Provided {
            interface,
            type_id: TypeId::of::<I>(),
            cast: Box::new(move |any| {
                let concrete = any.downcast::<T>().ok()?;
                Some(Box::new(upcast(concrete)) as Box<dyn Any + Send + Sync>)
            }),
        });
        self
    }

    /// Allow the injector to build zero values of `T`
    pub fn constructible<T: Reflect + Default>(mut self) -> Self {
        self.construct = Some(construct_default::<T>);
        self
    }

    pub fn initializer(mut self, init: InitMethod) -> Self {
        self.init = Some(init);
        self
    }

    /// Mark values of this type as replaceable by resolved instances
    pub fn assignable(mut self) -> Self {
        self.assignable = true;
        self
    }

    /// Same runtime type
    pub fn is(&self, other: &TypeInfo) -> bool {
        self.type_id == other.type_id
    }

    pub fn is_struct(&self) -> bool {
        matches!(self.kind, TypeKind::Struct | TypeKind::Annotation)
    }

    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    /// A marker, or a struct embedding a marker somewhere in its parent chain
    pub fn is_annotation(&self) -> bool {
        self.kind == TypeKind::Annotation
            || self
                .fields
                .iter()
                .filter(|field| field.embedded && field.is_nested_struct())
                .any(|field| field.type_info().is_annotation())
    }

    /// Interface declaration matching `interface` by name
    pub fn provided(&self, interface: &str) -> Option<&Provided> {
        self.provides.iter().find(|p| p.interface == interface)
    }

    /// Interface declaration matching the `dyn Trait` type id
    pub fn provided_by_id(&self, type_id: TypeId) -> Option<&Provided> {
        self.provides.iter().find(|p| p.type_id == type_id)
    }

    /// Field declared directly on this type
    pub fn field_named(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Registry key for instances of this type
    pub fn instance_name(&self) -> String {
        naming::instance_name(self.name)
    }

    /// Package qualified registry key: `services::Greeter` → `servicesGreeter`
    pub fn alternate_name(&self) -> String {
        let package = naming::upper_camel(naming::package_name(self.package));
        naming::lower_first(&format!("{}{}", package, self.name))
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("name", &self.name)
            .field("package", &self.package)
            .field("kind", &self.kind)
            .field("fields", &self.fields.iter().map(|field| field.name).collect::<Vec<_>>())
            .field("provides", &self.provides)
            .field("init", &self.init.is_some())
            .finish()
    }
}

fn construct_default<T: Reflect + Default>() -> Box<dyn Reflect> {
    Box::new(T::default())
}

/// Object safe reflection over a value
pub trait Reflect: Any + Send + Sync {
    fn type_info(&self) -> &'static TypeInfo;

    fn field(&self, _index: usize) -> Option<&dyn Reflect> {
        None
    }

    fn field_mut(&mut self, _index: usize) -> Option<&mut dyn Reflect> {
        None
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    /// Assign a resolved instance to this value
    fn assign(&mut self, value: &Instance) -> Result<(), InjectError> {
        Err(InjectError::unsupported(
            self.type_info().name,
            value.type_info().name,
        ))
    }

    /// Set this value from a struct tag literal
    fn set_literal(&mut self, literal: &str) -> Result<(), InjectError> {
        Err(InjectError::unsupported(
            self.type_info().name,
            format!("{:?}", literal),
        ))
    }

    /// Whether this value is a shared pointer
    fn is_pointer(&self) -> bool {
        false
    }

    /// Pointer without a target
    fn is_nil(&self) -> bool {
        false
    }

    fn pointee(&self) -> Option<&dyn Reflect> {
        None
    }

    /// Mutable access to the pointer target, only while uniquely held
    fn pointee_mut(&mut self) -> Option<&mut dyn Reflect> {
        None
    }
}

/// Static access to a type's descriptor
pub trait Typed: 'static {
    /// Declared through a shared pointer
    const INDIRECT: bool = false;

    fn type_info() -> &'static TypeInfo;
}

/// Types that can be resolved from the instance registry
pub trait Injectable: Typed + Send + Sync {
    fn from_instance(instance: &Instance) -> Option<Arc<Self>>;

    fn as_reflect(&self) -> Option<&dyn Reflect> {
        None
    }

    fn as_reflect_mut(&mut self) -> Option<&mut dyn Reflect> {
        None
    }
}

/// Downcast an instance to a concrete type
pub fn downcast_instance<T: Reflect>(instance: &Instance) -> Option<Arc<T>> {
    Arc::clone(instance).into_any().downcast::<T>().ok()
}

/// Upcast an instance into an interface it declares to provide
pub fn cast_interface<I: ?Sized + Send + Sync + 'static>(instance: &Instance) -> Option<Arc<I>> {
    let provided = instance.type_info().provided_by_id(TypeId::of::<I>())?;
    let boxed = provided.cast(instance)?;
    boxed.downcast::<Arc<I>>().ok().map(|arc| *arc)
}

/// Follow a pointer to its target
pub fn indirect(object: &dyn Reflect) -> Option<&dyn Reflect> {
    if object.is_pointer() {
        return object.pointee();
    }
    Some(object)
}

/// Follow a pointer to its target mutably
pub fn indirect_mut(object: &mut dyn Reflect) -> Option<&mut dyn Reflect> {
    if object.is_pointer() {
        return object.pointee_mut();
    }
    Some(object)
}

/// Walk a field index path from `root`
pub fn value_at<'a>(root: &'a dyn Reflect, path: &[usize]) -> Option<&'a dyn Reflect> {
    let mut current = root;
    for &index in path {
        current = current.field(index)?;
    }
    Some(current)
}

/// Walk a field index path from `root` mutably
pub fn value_at_mut<'a>(root: &'a mut dyn Reflect, path: &[usize]) -> Option<&'a mut dyn Reflect> {
    let mut current = root;
    for &index in path {
        current = current.field_mut(index)?;
    }
    Some(current)
}

/// Declare trait objects as injectable interfaces.
///
/// ```ignore
/// pub trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
/// elif_inject::interface!(Greeter);
/// ```
#[macro_export]
macro_rules! interface {
    ($($name:ident),+ $(,)?) => {
        $(
            impl $crate::Typed for dyn $name {
                const INDIRECT: bool = false;

                fn type_info() -> &'static $crate::TypeInfo {
                    static INFO: ::std::sync::OnceLock<$crate::TypeInfo> = ::std::sync::OnceLock::new();
                    INFO.get_or_init(|| {
                        $crate::TypeInfo::interface::<dyn $name>(stringify!($name), ::std::module_path!())
                    })
                }
            }

            impl $crate::Injectable for dyn $name {
                fn from_instance(instance: &$crate::Instance) -> ::std::option::Option<::std::sync::Arc<Self>> {
                    $crate::reflect::cast_interface::<dyn $name>(instance)
                }
            }
        )+
    };
}
