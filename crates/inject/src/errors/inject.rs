use thiserror::Error;

use crate::reflect::tag::TagSyntaxError;

/// Error type for annotation processing and dependency injection
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InjectError {
    #[error("[inject] invalid object")]
    InvalidObject,

    #[error("[inject] unsupported injection type: cannot assign {found} to {field} ({expected})")]
    UnsupportedInjectionType {
        field: String,
        expected: String,
        found: String,
    },

    #[error("[inject] input argument type can not be the same as receiver: {type_name}")]
    IllegalArgument { type_name: String },

    #[error("[inject] tag is already exist: {name}")]
    TagAlreadyExists { name: String },

    #[error("[inject] tag is nil: {name}")]
    TagIsNil { name: String },

    #[error("[inject] invalid tag name, e.g. exampleTag")]
    InvalidTagName,

    #[error("[inject] interface {interface} is not implemented by {type_name}")]
    NotImplemented {
        interface: String,
        type_name: String,
    },

    #[error("{0}")]
    MalformedTagSyntax(#[from] TagSyntaxError),
}

impl InjectError {
    /// Create an unsupported injection type error without field context
    pub fn unsupported(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::UnsupportedInjectionType {
            field: "<value>".to_string(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create an illegal argument error for a receiver type
    pub fn illegal_argument(type_name: impl Into<String>) -> Self {
        Self::IllegalArgument {
            type_name: type_name.into(),
        }
    }

    /// Create a not implemented error
    pub fn not_implemented(interface: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::NotImplemented {
            interface: interface.into(),
            type_name: type_name.into(),
        }
    }

    /// Attach the owning field to an unsupported injection type error
    pub fn with_field(self, owner: &str, field: &str) -> Self {
        match self {
            Self::UnsupportedInjectionType {
                expected, found, ..
            } => Self::UnsupportedInjectionType {
                field: format!("{}.{}", owner, field),
                expected,
                found,
            },
            other => other,
        }
    }

    /// Check if the error is an invalid object error
    pub fn is_invalid_object(&self) -> bool {
        matches!(self, Self::InvalidObject)
    }

    /// Check if the error is a struct tag syntax error
    pub fn is_tag_syntax(&self) -> bool {
        matches!(self, Self::MalformedTagSyntax(_))
    }

    /// Check if the error is an unsupported injection type error
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedInjectionType { .. })
    }
}
