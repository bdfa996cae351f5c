//! # elif-inject-derive
//!
//! Derive macros for the elif-inject reflection and annotation system.
//!
//! - `#[derive(Reflect)]`: emit type metadata and field accessors used by
//!   the annotation model and the injector

use proc_macro::TokenStream;

mod reflect;

/// Derive reflection metadata for a struct.
///
/// Container options, in `#[reflect(...)]`:
/// - `annotation`: the struct is an annotation marker
/// - `init`: the struct implements `Initializer`
/// - `provides(TraitA, TraitB)`: interfaces the struct can be resolved as
/// - `clone`: resolved instances of the struct may be assigned by cloning
/// - `no_default`: the injector must not construct zero values
///
/// Field options: `embed`, `skip`, `readonly`, `tag = "key:\"value\""`.
#[proc_macro_derive(Reflect, attributes(reflect))]
pub fn derive_reflect(input: TokenStream) -> TokenStream {
    reflect::derive_reflect_impl(input)
}
