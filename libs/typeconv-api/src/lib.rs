pub mod config;
pub mod converter;
pub mod custom;
pub mod enumeration;
pub mod error;
pub mod value;

pub use typeconv_api_derive::Enumeration;

pub use config::{ConverterSettings, Zone};
pub use converter::{Conversion, ConversionFn, LeafResult};
pub use custom::{CustomType, CustomValue};
pub use enumeration::{EnumType, EnumValue, Enumeration};
pub use error::{LeafError, LeafErrorKind};
pub use value::{TypeKey, Value, ValueType};
