//! Reflection for leaf values and shared pointers

use std::any::Any;
use std::sync::{Arc, OnceLock};

use crate::errors::InjectError;
use crate::reflect::{Injectable, Instance, Reflect, TypeInfo, TypeKind, Typed};

macro_rules! impl_scalar {
    ($($ty:ty => $name:literal),+ $(,)?) => {
        $(
            impl Typed for $ty {
                fn type_info() -> &'static TypeInfo {
                    static INFO: OnceLock<TypeInfo> = OnceLock::new();
                    INFO.get_or_init(|| TypeInfo::scalar::<$ty>($name))
                }
            }

            impl Reflect for $ty {
                fn type_info(&self) -> &'static TypeInfo {
                    <Self as Typed>::type_info()
                }

                fn as_any(&self) -> &dyn Any {
                    self
                }

                fn as_any_mut(&mut self) -> &mut dyn Any {
                    self
                }

                fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
                    self
                }

                fn assign(&mut self, value: &Instance) -> Result<(), InjectError> {
                    if let Some(same) = value.as_any().downcast_ref::<$ty>() {
                        *self = same.clone();
                        return Ok(());
                    }
                    if let Some(literal) = value.as_any().downcast_ref::<String>() {
                        return self.set_literal(literal);
                    }
                    Err(InjectError::unsupported($name, value.type_info().name))
                }

                fn set_literal(&mut self, literal: &str) -> Result<(), InjectError> {
                    *self = literal
                        .trim()
                        .parse::<$ty>()
                        .map_err(|_| InjectError::unsupported($name, format!("{:?}", literal)))?;
                    Ok(())
                }
            }
        )+
    };
}

impl_scalar! {
    i8 => "i8",
    i16 => "i16",
    i32 => "i32",
    i64 => "i64",
    isize => "isize",
    u8 => "u8",
    u16 => "u16",
    u32 => "u32",
    u64 => "u64",
    usize => "usize",
    f32 => "f32",
    f64 => "f64",
    bool => "bool",
    char => "char",
}

impl Typed for String {
    fn type_info() -> &'static TypeInfo {
        static INFO: OnceLock<TypeInfo> = OnceLock::new();
        INFO.get_or_init(|| TypeInfo::scalar::<String>("String"))
    }
}

impl Reflect for String {
    fn type_info(&self) -> &'static TypeInfo {
        <Self as Typed>::type_info()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn assign(&mut self, value: &Instance) -> Result<(), InjectError> {
        match value.as_any().downcast_ref::<String>() {
            Some(literal) => {
                self.clone_from(literal);
                Ok(())
            }
            None => Err(InjectError::unsupported("String", value.type_info().name)),
        }
    }

    fn set_literal(&mut self, literal: &str) -> Result<(), InjectError> {
        *self = literal.to_string();
        Ok(())
    }
}

/// Comma separated option lists
impl Typed for Vec<String> {
    fn type_info() -> &'static TypeInfo {
        static INFO: OnceLock<TypeInfo> = OnceLock::new();
        INFO.get_or_init(|| TypeInfo::scalar::<Vec<String>>("Vec<String>"))
    }
}

impl Reflect for Vec<String> {
    fn type_info(&self) -> &'static TypeInfo {
        <Self as Typed>::type_info()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn assign(&mut self, value: &Instance) -> Result<(), InjectError> {
        if let Some(list) = value.as_any().downcast_ref::<Vec<String>>() {
            self.clone_from(list);
            return Ok(());
        }
        if let Some(literal) = value.as_any().downcast_ref::<String>() {
            return self.set_literal(literal);
        }
        Err(InjectError::unsupported("Vec<String>", value.type_info().name))
    }

    fn set_literal(&mut self, literal: &str) -> Result<(), InjectError> {
        *self = if literal.is_empty() {
            Vec::new()
        } else {
            literal.split(',').map(str::to_string).collect()
        };
        Ok(())
    }
}

impl<T: ?Sized + Injectable> Typed for Option<Arc<T>> {
    const INDIRECT: bool = true;

    fn type_info() -> &'static TypeInfo {
        T::type_info()
    }
}

/// Shared pointer fields; `None` is the nil pointer
impl<T: ?Sized + Injectable> Reflect for Option<Arc<T>> {
    fn type_info(&self) -> &'static TypeInfo {
        T::type_info()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn assign(&mut self, value: &Instance) -> Result<(), InjectError> {
        match T::from_instance(value) {
            Some(resolved) => {
                *self = Some(resolved);
                Ok(())
            }
            None if T::type_info().kind == TypeKind::Interface => Err(InjectError::not_implemented(
                T::type_info().name,
                value.type_info().name,
            )),
            None => Err(InjectError::unsupported(
                T::type_info().name,
                value.type_info().name,
            )),
        }
    }

    fn is_pointer(&self) -> bool {
        true
    }

    fn is_nil(&self) -> bool {
        self.is_none()
    }

    fn pointee(&self) -> Option<&dyn Reflect> {
        self.as_deref().and_then(Injectable::as_reflect)
    }

    fn pointee_mut(&mut self) -> Option<&mut dyn Reflect> {
        self.as_mut()
            .and_then(Arc::get_mut)
            .and_then(Injectable::as_reflect_mut)
    }
}
