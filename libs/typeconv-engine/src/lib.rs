pub mod bootstrap;
pub mod config;
pub mod error;
pub mod primitive;
pub mod registry;

pub use bootstrap::build_registry;
pub use config::{EnumerationConfig, TypeconvConfig};
pub use error::{ConvertError, EngineError, RegistrationError};
pub use primitive::PrimitiveConversions;
pub use registry::{BoundConverter, ConversionRegistry};
