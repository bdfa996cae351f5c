//! Built-in tag decoders
//!
//! - [`ValueTag`] handles `value:"..."`, resolving `${key:default}`
//!   placeholders from the application [`Properties`](crate::Properties).
//! - [`InjectTag`] handles `inject:"name"`, wiring another registered
//!   instance by name.

pub mod inject;
pub mod value;

pub use inject::InjectTag;
pub use value::ValueTag;
