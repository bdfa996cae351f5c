pub mod injector;
pub mod properties;
pub mod sources;
pub mod validation;

pub use injector::*;
pub use properties::*;
pub use sources::*;
pub use validation::*;
