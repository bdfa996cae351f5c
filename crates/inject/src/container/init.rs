//! Method injection support.
//!
//! A type opts into method injection by implementing [`Initializer`] and
//! adding `#[reflect(init)]` to its derive. The injector resolves each
//! parameter of [`Initializer::Params`] from the instance registry and calls
//! [`Initializer::init`] once all of them are available.

use std::fmt;
use std::sync::Arc;

use crate::reflect::{Injectable, Instance, Reflect, TypeInfo};

/// Initializer invoked after field injection
pub trait Initializer: Reflect + Sized {
    /// Tuple of `Arc<T>` dependencies
    type Params: Params;

    fn init(&mut self, params: Self::Params);
}

/// Parameter list of an initializer
pub trait Params: Sized {
    /// Descriptors of every parameter, in declaration order
    fn type_infos() -> Vec<&'static TypeInfo>;

    /// Build the parameter tuple from resolved instances
    fn from_instances(instances: &[Instance]) -> Option<Self>;
}

impl Params for () {
    fn type_infos() -> Vec<&'static TypeInfo> {
        Vec::new()
    }

    fn from_instances(instances: &[Instance]) -> Option<Self> {
        instances.is_empty().then_some(())
    }
}

macro_rules! impl_params {
    ($len:literal => $($param:ident),+) => {
        impl<$($param: ?Sized + Injectable),+> Params for ($(Arc<$param>,)+) {
            fn type_infos() -> Vec<&'static TypeInfo> {
                vec![$(<$param as crate::reflect::Typed>::type_info()),+]
            }

            fn from_instances(instances: &[Instance]) -> Option<Self> {
                if instances.len() != $len {
                    return None;
                }
                let mut iter = instances.iter();
                Some(($($param::from_instance(iter.next()?)?,)+))
            }
        }
    };
}

impl_params!(1 => A);
impl_params!(2 => A, B);
impl_params!(3 => A, B, C);
impl_params!(4 => A, B, C, D);
impl_params!(5 => A, B, C, D, E);
impl_params!(6 => A, B, C, D, E, F);
impl_params!(7 => A, B, C, D, E, F, G);
impl_params!(8 => A, B, C, D, E, F, G, H);

/// Type erased initializer stored in a [`TypeInfo`]
#[derive(Clone, Copy)]
pub struct InitMethod {
    pub params: fn() -> Vec<&'static TypeInfo>,
    pub invoke: fn(&mut dyn Reflect, &[Instance]) -> bool,
}

impl InitMethod {
    pub fn of<T: Initializer>() -> Self {
        Self {
            params: T::Params::type_infos,
            invoke: invoke::<T>,
        }
    }
}

impl fmt::Debug for InitMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<_> = (self.params)().iter().map(|info| info.name).collect();
        f.debug_struct("InitMethod").field("params", &params).finish()
    }
}

fn invoke<T: Initializer>(target: &mut dyn Reflect, instances: &[Instance]) -> bool {
    let Some(target) = target.as_any_mut().downcast_mut::<T>() else {
        return false;
    };
    let Some(params) = T::Params::from_instances(instances) else {
        return false;
    };
    target.init(params);
    true
}
