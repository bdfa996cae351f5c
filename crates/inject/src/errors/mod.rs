pub mod inject;

pub use inject::InjectError;

/// Result alias used across the injector
pub type Result<T, E = InjectError> = std::result::Result<T, E>;
