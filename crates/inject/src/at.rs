//! Standard annotation markers
//!
//! These markers only carry data. Routing layers read them back with
//! [`annotation::find`](crate::annotation::find) after
//! [`annotation::inject_into_fields`](crate::annotation::inject_into_fields)
//! has copied the struct tag arguments into them.

use crate::Reflect;

/// Root of every annotation
#[derive(Debug, Clone, Default, PartialEq, Reflect)]
#[reflect(annotation, clone)]
pub struct Annotation {
    pub value: String,
}

/// Marks a type as a REST controller
#[derive(Debug, Clone, Default, PartialEq, Reflect)]
#[reflect(annotation, clone)]
pub struct RestController {
    #[reflect(embed)]
    pub annotation: Annotation,
}

/// Maps a request path and method to a handler
#[derive(Debug, Clone, Default, PartialEq, Reflect)]
#[reflect(annotation, clone)]
pub struct RequestMapping {
    #[reflect(embed)]
    pub annotation: Annotation,
    pub value: String,
    pub method: String,
}

macro_rules! method_mappings {
    ($($(#[$doc:meta])* $name:ident => $method:literal),+ $(,)?) => {
        $(
            $(#[$doc])*
            #[derive(Debug, Clone, Default, PartialEq, Reflect)]
            #[reflect(annotation, clone)]
            pub struct $name {
                #[reflect(embed)]
                pub request_mapping: RequestMapping,
                #[reflect(tag = concat!("value:\"", $method, "\""))]
                pub method: String,
            }
        )+
    };
}

method_mappings! {
    /// `GET` request mapping
    GetMapping => "GET",
    /// `POST` request mapping
    PostMapping => "POST",
    /// `PUT` request mapping
    PutMapping => "PUT",
    /// `DELETE` request mapping
    DeleteMapping => "DELETE",
    /// `PATCH` request mapping
    PatchMapping => "PATCH",
}

/// Documents a response of a handler
#[derive(Debug, Clone, Default, PartialEq, Reflect)]
#[reflect(annotation, clone)]
pub struct Response {
    #[reflect(embed)]
    pub annotation: Annotation,
    pub code: i32,
    pub description: String,
}
