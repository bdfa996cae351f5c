pub mod init;
pub mod injector;
pub mod path;
pub mod registry;
pub mod tags;

pub use init::{InitMethod, Initializer, Params};
pub use injector::Injector;
pub use path::InjectionPath;
pub use registry::InstanceRegistry;
pub use tags::{Tag, TagContext, TagRegistry, TAG_SUFFIX};
