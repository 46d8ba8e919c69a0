use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;

use crate::custom::{CustomType, CustomValue};
use crate::enumeration::{EnumValue, Enumeration};

/// Identity of a participating type: the row/column key of the conversion table.
///
/// The ten built-ins form the seed table. `Enum` is the generic supertype of all
/// enumerations and only ever acts as a bridge; no runtime value reports it.
/// `Named` covers every type added after construction: specific enumerations and
/// custom bridged types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKey {
    Text,
    Int64,
    Decimal,
    Float64,
    Int32,
    Bool,
    Date,
    Enum,
    Time,
    DateTime,
    Named(Arc<str>),
}

impl TypeKey {
    /// Seed column order.
    pub const BUILTIN: [TypeKey; 10] = [
        TypeKey::Text,
        TypeKey::Int64,
        TypeKey::Decimal,
        TypeKey::Float64,
        TypeKey::Int32,
        TypeKey::Bool,
        TypeKey::Date,
        TypeKey::Enum,
        TypeKey::Time,
        TypeKey::DateTime,
    ];

    /// Built-in numeric types that receive direct number → enumeration cells.
    pub const NUMERIC: [TypeKey; 4] = [
        TypeKey::Int64,
        TypeKey::Int32,
        TypeKey::Float64,
        TypeKey::Decimal,
    ];

    pub fn named(name: impl Into<Arc<str>>) -> Self {
        TypeKey::Named(name.into())
    }

    pub fn is_numeric(&self) -> bool {
        Self::NUMERIC.contains(self)
    }

    pub fn name(&self) -> &str {
        match self {
            TypeKey::Text => "text",
            TypeKey::Int64 => "int64",
            TypeKey::Decimal => "decimal",
            TypeKey::Float64 => "float64",
            TypeKey::Int32 => "int32",
            TypeKey::Bool => "bool",
            TypeKey::Date => "date",
            TypeKey::Enum => "enum",
            TypeKey::Time => "time",
            TypeKey::DateTime => "datetime",
            TypeKey::Named(name) => name,
        }
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TypeKey {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = TypeKey::BUILTIN
            .iter()
            .find(|k| k.name() == s)
            .cloned()
            .unwrap_or_else(|| TypeKey::named(s));
        Ok(key)
    }
}

impl serde::Serialize for TypeKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Runtime value flowing through the registry.
///
/// Absence is modelled as `Option<Value>::None` at the API boundary, never as a variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Int64(i64),
    Decimal(Decimal),
    Float64(f64),
    Int32(i32),
    Bool(bool),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    Enum(EnumValue),
    Custom(CustomValue),
}

impl Value {
    /// Runtime type of the value: the row consulted on conversion.
    pub fn type_key(&self) -> TypeKey {
        match self {
            Value::Text(_) => TypeKey::Text,
            Value::Int64(_) => TypeKey::Int64,
            Value::Decimal(_) => TypeKey::Decimal,
            Value::Float64(_) => TypeKey::Float64,
            Value::Int32(_) => TypeKey::Int32,
            Value::Bool(_) => TypeKey::Bool,
            Value::Date(_) => TypeKey::Date,
            Value::Time(_) => TypeKey::Time,
            Value::DateTime(_) => TypeKey::DateTime,
            Value::Enum(e) => e.type_key(),
            Value::Custom(c) => c.type_key().clone(),
        }
    }

    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn enumeration<E: Enumeration>(e: E) -> Self {
        Value::Enum(EnumValue::of(e))
    }

    pub fn custom<T: CustomType>(payload: T) -> Self {
        Value::Custom(CustomValue::new(T::type_key(), payload))
    }

    pub fn as_enum(&self) -> Option<&EnumValue> {
        match self {
            Value::Enum(e) => Some(e),
            _ => None,
        }
    }

    /// Recover a Rust enum if the value is a member of `E`'s enumeration.
    pub fn to_enum<E: Enumeration>(&self) -> Option<E> {
        self.as_enum().and_then(|e| e.to_enum::<E>())
    }

    pub fn downcast_ref<T: CustomType>(&self) -> Option<&T> {
        match self {
            Value::Custom(c) if c.type_key() == &T::type_key() => c.downcast_ref::<T>(),
            _ => None,
        }
    }
}

/// External representation: used in diagnostics and by the default text bridge.
///
/// Temporal values always render in ISO form. The registry's configured date and
/// time formats apply only to the built-in `text` cells, not to this impl.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Int64(v) => write!(f, "{v}"),
            Value::Decimal(v) => write!(f, "{v}"),
            Value::Float64(v) => write!(f, "{v}"),
            Value::Int32(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Date(v) => write!(f, "{v}"),
            Value::Time(v) => write!(f, "{v}"),
            // Fixed ISO form, independent of `ConverterSettings::date_time_format`.
            Value::DateTime(v) => write!(f, "{}", v.format("%Y-%m-%dT%H:%M:%S%.f")),
            Value::Enum(e) => f.write_str(e.name()),
            Value::Custom(c) => write!(f, "{c}"),
        }
    }
}

impl serde::Serialize for Value {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("Value", 2)?;
        s.serialize_field("type", &self.type_key())?;
        s.serialize_field("value", &self.to_string())?;
        s.end()
    }
}

// ---------------------------------------------------------------------------
// ValueType: static mapping of concrete Rust types to their table key
// ---------------------------------------------------------------------------

/// A concrete Rust type with a fixed row in the seed table.
pub trait ValueType: Sized {
    fn type_key() -> TypeKey;
    fn into_value(self) -> Value;
    fn from_value(value: Value) -> Option<Self>;
}

macro_rules! value_type {
    ($ty:ty, $variant:ident) => {
        impl ValueType for $ty {
            fn type_key() -> TypeKey {
                TypeKey::$variant
            }

            fn into_value(self) -> Value {
                Value::$variant(self)
            }

            fn from_value(value: Value) -> Option<Self> {
                match value {
                    Value::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }

        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::$variant(v)
            }
        }
    };
}

value_type!(String, Text);
value_type!(i64, Int64);
value_type!(Decimal, Decimal);
value_type!(f64, Float64);
value_type!(i32, Int32);
value_type!(bool, Bool);
value_type!(NaiveDate, Date);
value_type!(NaiveTime, Time);
value_type!(NaiveDateTime, DateTime);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_names_round_trip_through_from_str() {
        for key in TypeKey::BUILTIN {
            let parsed: TypeKey = key.name().parse().unwrap();
            assert_eq!(parsed, key);
        }
        let other: TypeKey = "client-kind".parse().unwrap();
        assert_eq!(other, TypeKey::named("client-kind"));
    }

    #[test]
    fn runtime_type_of_builtin_values() {
        assert_eq!(Value::from("x").type_key(), TypeKey::Text);
        assert_eq!(Value::from(1i64).type_key(), TypeKey::Int64);
        assert_eq!(Value::from(1i32).type_key(), TypeKey::Int32);
        assert_eq!(Value::from(Decimal::ONE).type_key(), TypeKey::Decimal);
        assert_eq!(Value::from(true).type_key(), TypeKey::Bool);
    }

    #[test]
    fn value_type_rejects_other_variants() {
        assert_eq!(i64::from_value(Value::Int64(7)), Some(7));
        assert_eq!(i64::from_value(Value::Int32(7)), None);
        assert_eq!(String::from_value(Value::text("a")), Some("a".to_string()));
    }

    #[test]
    fn serializes_as_type_and_text() {
        let json = serde_json::to_value(Value::Int32(42)).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "int32", "value": "42" }));
    }

    #[test]
    fn datetime_display_omits_zero_fraction() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(10, 20, 30)
            .unwrap();
        assert_eq!(Value::DateTime(dt).to_string(), "2024-03-01T10:20:30");
    }
}
