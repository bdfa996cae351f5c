//! Annotation model and reflection-driven dependency injection for elif.rs
//!
//! Types opt in with `#[derive(Reflect)]`, which records their fields,
//! struct tags and embedded annotations. The [`Injector`] then wires
//! registered instances into fields by name or interface, decodes tag
//! literals through pluggable [`Tag`] decoders, descends into nested structs
//! and finally calls each type's [`Initializer`].

extern crate self as elif_inject;

pub mod annotation;
pub mod at;
pub mod config;
pub mod container;
pub mod errors;
pub mod reflect;
pub mod tags;

pub use config::{ConfigError, ConfigSource, CycleGuard, InjectorConfig, Properties};
pub use container::{
    InitMethod, Initializer, InjectionPath, Injector, InstanceRegistry, Params, Tag, TagContext,
    TagRegistry,
};
pub use errors::{InjectError, Result};
pub use reflect::{
    FieldInfo, Injectable, Instance, Reflect, StructTag, TagPair, TagSyntaxError, TypeInfo,
    TypeKind, Typed,
};
pub use tags::{InjectTag, ValueTag};

pub use elif_inject_derive::Reflect;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get crate version
pub fn version() -> &'static str {
    VERSION
}
