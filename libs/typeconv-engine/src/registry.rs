use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard};

use typeconv_api::config::{ConverterSettings, Zone};
use typeconv_api::converter::{compose, conversion, identity, Conversion, ConversionFn, LeafResult};
use typeconv_api::custom::CustomType;
use typeconv_api::enumeration::{EnumType, EnumValue, Enumeration};
use typeconv_api::error::LeafError;
use typeconv_api::value::{TypeKey, Value, ValueType};

use crate::error::{ConvertError, RegistrationError};
use crate::primitive::{number_as_i64, PrimitiveConversions};

// ---------------------------------------------------------------------------
// ConversionTable: the square table and the bridging algorithm
// ---------------------------------------------------------------------------

/// Square table of conversion cells plus the ordered list of participating types.
///
/// Every row holds one cell per entry of `types`, the diagonal included.
struct ConversionTable {
    types: Vec<TypeKey>,
    rows: HashMap<TypeKey, HashMap<TypeKey, ConversionFn>>,
}

impl ConversionTable {
    fn seed(primitives: &Arc<PrimitiveConversions>) -> Self {
        let mut rows = HashMap::with_capacity(TypeKey::BUILTIN.len());
        for (key, cells) in primitives.seed_rows() {
            let row: HashMap<TypeKey, ConversionFn> =
                TypeKey::BUILTIN.into_iter().zip(cells).collect();
            rows.insert(key, row);
        }
        let table = Self {
            types: TypeKey::BUILTIN.to_vec(),
            rows,
        };
        table.check_square();
        table
    }

    fn cell(&self, from: &TypeKey, to: &TypeKey) -> Result<ConversionFn, ConvertError> {
        let row = self
            .rows
            .get(from)
            .ok_or_else(|| ConvertError::TypeNotRegistered(from.clone()))?;
        row.get(to)
            .cloned()
            .ok_or_else(|| ConvertError::ConversionNotDefined {
                from: from.clone(),
                to: to.clone(),
            })
    }

    /// Replace an existing cell. Both types must already be participating.
    fn set(&mut self, from: &TypeKey, to: &TypeKey, f: ConversionFn) {
        if let Some(row) = self.rows.get_mut(from) {
            row.insert(to.clone(), f);
        }
    }

    /// Add `new` by composing through `bridge`.
    ///
    /// For every type `cls` present before the call:
    /// `new → cls` is `out_of_new` then `bridge → cls`, and
    /// `cls → new` is `cls → bridge` then `into_new`.
    /// `bridge → new` is `into_new` itself and `new → new` is the identity.
    fn register_bridged(
        &mut self,
        new: &TypeKey,
        into_new: ConversionFn,
        bridge: &TypeKey,
        out_of_new: ConversionFn,
    ) -> Result<(), RegistrationError> {
        if self.rows.contains_key(new) {
            return Err(RegistrationError::AlreadyRegistered(new.clone()));
        }
        let bridge_row = self
            .rows
            .get(bridge)
            .ok_or_else(|| RegistrationError::BridgeNotRegistered(bridge.clone()))?;
        let complete = self.types.iter().all(|cls| bridge_row.contains_key(cls));
        if !complete || bridge_row.len() != self.types.len() {
            return Err(RegistrationError::BridgeIncomplete {
                bridge: bridge.clone(),
                actual: bridge_row.len(),
                expected: self.types.len(),
            });
        }

        let mut new_row = HashMap::with_capacity(self.types.len() + 1);
        for cls in &self.types {
            let bridge_to_cls = Arc::clone(&bridge_row[cls]);
            new_row.insert(
                cls.clone(),
                compose(Arc::clone(&out_of_new), bridge.clone(), bridge_to_cls),
            );
        }

        for cls in &self.types {
            if let Some(row) = self.rows.get_mut(cls) {
                let cls_to_bridge = Arc::clone(&row[bridge]);
                row.insert(
                    new.clone(),
                    compose(cls_to_bridge, bridge.clone(), Arc::clone(&into_new)),
                );
            }
        }

        self.set(bridge, new, into_new);
        new_row.insert(new.clone(), identity());
        self.types.push(new.clone());
        self.rows.insert(new.clone(), new_row);

        self.check_square();
        Ok(())
    }

    /// Every row has exactly one cell per participating type.
    fn check_square(&self) -> bool {
        let size = self.types.len();
        let mut square = self.rows.len() == size;
        if !square {
            tracing::warn!(rows = self.rows.len(), types = size, "conversion table row count mismatch");
        }
        for (key, row) in &self.rows {
            if row.len() != size {
                tracing::warn!(row = %key, entries = row.len(), expected = size, "conversion table is not square");
                square = false;
            }
        }
        debug_assert!(square, "conversion table is not square");
        square
    }
}

// ---------------------------------------------------------------------------
// ConversionRegistry: shared handle
// ---------------------------------------------------------------------------

struct Inner {
    table: RwLock<ConversionTable>,
    primitives: Arc<PrimitiveConversions>,
}

/// Registry of pairwise conversions between participating types.
///
/// Cheap to clone; clones share the same table. Reads take a shared lock only
/// long enough to fetch a cell, so the cell itself runs without holding it.
/// Each registration runs entirely under the write lock.
#[derive(Clone)]
pub struct ConversionRegistry {
    inner: Arc<Inner>,
}

impl Default for ConversionRegistry {
    fn default() -> Self {
        Self::new(ConverterSettings::default())
    }
}

impl fmt::Debug for ConversionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionRegistry")
            .field("types", &self.types())
            .field("settings", self.settings())
            .finish()
    }
}

impl ConversionRegistry {
    /// Build the registry with the seed table of the ten built-in types.
    pub fn new(settings: ConverterSettings) -> Self {
        let primitives = Arc::new(PrimitiveConversions::new(settings));
        let table = ConversionTable::seed(&primitives);
        Self {
            inner: Arc::new(Inner {
                table: RwLock::new(table),
                primitives,
            }),
        }
    }

    /// Process-wide instance with default settings, built on first use.
    pub fn global() -> &'static ConversionRegistry {
        static GLOBAL: OnceLock<ConversionRegistry> = OnceLock::new();
        GLOBAL.get_or_init(ConversionRegistry::default)
    }

    fn read(&self) -> RwLockReadGuard<'_, ConversionTable> {
        match self.inner.table.read() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("conversion table read lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, ConversionTable> {
        match self.inner.table.write() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("conversion table write lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    // --- Conversion -------------------------------------------------------

    /// Convert `value` to `target`. An absent value converts to absent.
    pub fn convert(
        &self,
        target: &TypeKey,
        value: Option<&Value>,
    ) -> Result<Option<Value>, ConvertError> {
        self.convert_or(target, value, None)
    }

    /// Convert `value` to `target`, or return `default` unchanged when `value` is absent.
    pub fn convert_or(
        &self,
        target: &TypeKey,
        value: Option<&Value>,
        default: Option<Value>,
    ) -> Result<Option<Value>, ConvertError> {
        match value {
            None => Ok(default),
            Some(value) => self.convert_value(target, value),
        }
    }

    /// Convert a present value, dispatching on its runtime type.
    pub fn convert_value(
        &self,
        target: &TypeKey,
        value: &Value,
    ) -> Result<Option<Value>, ConvertError> {
        self.dispatch(&value.type_key(), target, value)
    }

    /// Typed form of [`convert`](Self::convert) for the built-in Rust types.
    pub fn convert_to<T: ValueType>(&self, value: Option<&Value>) -> Result<Option<T>, ConvertError> {
        let expected = T::type_key();
        match self.convert(&expected, value)? {
            None => Ok(None),
            Some(result) => {
                let actual = result.type_key();
                T::from_value(result)
                    .map(Some)
                    .ok_or(ConvertError::UnexpectedResult { expected, actual })
            }
        }
    }

    /// Typed form of [`convert`](Self::convert) for a registered Rust enum.
    pub fn convert_enum<E: Enumeration>(&self, value: Option<&Value>) -> Result<Option<E>, ConvertError> {
        let expected = E::type_key();
        match self.convert(&expected, value)? {
            None => Ok(None),
            Some(result) => result
                .to_enum::<E>()
                .map(Some)
                .ok_or_else(|| ConvertError::UnexpectedResult {
                    expected,
                    actual: result.type_key(),
                }),
        }
    }

    /// Converter for a fixed pair of types.
    ///
    /// Never fails here: the cell is looked up on every call, so the converter
    /// may be created before either type is registered.
    pub fn converter(&self, from: TypeKey, to: TypeKey) -> BoundConverter {
        BoundConverter {
            registry: self.clone(),
            from,
            to,
        }
    }

    fn dispatch(
        &self,
        from: &TypeKey,
        to: &TypeKey,
        value: &Value,
    ) -> Result<Option<Value>, ConvertError> {
        let cell = self.read().cell(from, to)?;
        cell.apply(value).map_err(|cause| ConvertError::ConversionFailed {
            to: to.clone(),
            from: from.clone(),
            value: value.to_string(),
            cause,
        })
    }

    // --- Registration -----------------------------------------------------

    /// Add `new` to the table, deriving all of its conversions through `bridge`.
    ///
    /// `into_new` maps a `bridge` value to a `new` value and `out_of_new` the reverse.
    /// Fails without touching the table if `new` is already registered or `bridge`
    /// is missing or has an incomplete row.
    pub fn register_bridged_type(
        &self,
        new: TypeKey,
        into_new: impl Conversion + 'static,
        bridge: TypeKey,
        out_of_new: impl Conversion + 'static,
    ) -> Result<(), RegistrationError> {
        let mut table = self.write();
        table.register_bridged(&new, conversion(into_new), &bridge, conversion(out_of_new))?;
        tracing::debug!(new = %new, bridge = %bridge, types = table.types.len(), "registered bridged type");
        Ok(())
    }

    /// Add `new` with text as the bridge. Values of `new` leave through their `Display` form.
    pub fn register_type_via_text<F>(&self, new: TypeKey, from_text: F) -> Result<(), RegistrationError>
    where
        F: Fn(&str) -> Result<Value, LeafError> + Send + Sync + 'static,
    {
        let into_new = move |value: &Value| -> LeafResult {
            match value {
                Value::Text(s) => from_text(s.as_str()).map(Some),
                other => Err(LeafError::mismatch(&TypeKey::Text, &other.type_key())),
            }
        };
        let render = |value: &Value| -> LeafResult { Ok(Some(Value::Text(value.to_string()))) };
        self.register_bridged_type(new, into_new, TypeKey::Text, render)
    }

    /// Register a custom type parsed from and rendered to text.
    pub fn register_text_type<T>(&self) -> Result<(), RegistrationError>
    where
        T: CustomType + FromStr,
        T::Err: fmt::Display,
    {
        self.register_type_via_text(T::type_key(), |s: &str| {
            s.parse::<T>()
                .map(Value::custom)
                .map_err(|e| LeafError::parse(format!("'{s}': {e}")))
        })
    }

    /// Add an enumeration bridged through the generic `enum` type.
    ///
    /// `from_enum` maps a member of any enumeration to a member of this one and
    /// `from_number` maps an integer. Besides the bridged cells this installs
    /// text → member by exact name, each numeric type → member via `from_number`,
    /// and bool → first or second member.
    pub fn register_enumeration<FE, FN>(
        &self,
        enum_type: Arc<EnumType>,
        from_enum: FE,
        from_number: FN,
    ) -> Result<(), RegistrationError>
    where
        FE: Fn(&EnumValue) -> Result<EnumValue, LeafError> + Send + Sync + 'static,
        FN: Fn(i64) -> Result<EnumValue, LeafError> + Send + Sync + 'static,
    {
        let key = enum_type.type_key();

        let into_new = conversion(move |value: &Value| -> LeafResult {
            match value {
                Value::Enum(e) => from_enum(e).map(|m| Some(Value::Enum(m))),
                other => Err(LeafError::mismatch(&TypeKey::Enum, &other.type_key())),
            }
        });

        let by_name = {
            let ty = Arc::clone(&enum_type);
            conversion(move |value: &Value| -> LeafResult {
                match value {
                    Value::Text(s) => EnumValue::by_name(Arc::clone(&ty), s)
                        .map(|m| Some(Value::Enum(m)))
                        .ok_or_else(|| LeafError::unknown_member(ty.name(), s)),
                    other => Err(LeafError::mismatch(&TypeKey::Text, &other.type_key())),
                }
            })
        };

        let by_number = conversion(move |value: &Value| -> LeafResult {
            let n = number_as_i64(value)?;
            from_number(n).map(|m| Some(Value::Enum(m)))
        });

        let by_flag = {
            let ty = Arc::clone(&enum_type);
            conversion(move |value: &Value| -> LeafResult {
                let flag = match value {
                    Value::Bool(b) => *b,
                    other => return Err(LeafError::mismatch(&TypeKey::Bool, &other.type_key())),
                };
                if ty.len() < 2 {
                    return Err(LeafError::range(format!(
                        "{} has {} member(s), bool needs two",
                        ty.name(),
                        ty.len()
                    )));
                }
                Ok(EnumValue::new(Arc::clone(&ty), usize::from(flag)).map(Value::Enum))
            })
        };

        let mut table = self.write();
        table.register_bridged(&key, into_new, &TypeKey::Enum, identity())?;
        table.set(&TypeKey::Text, &key, by_name);
        for numeric in &TypeKey::NUMERIC {
            table.set(numeric, &key, Arc::clone(&by_number));
        }
        table.set(&TypeKey::Bool, &key, by_flag);
        table.check_square();

        tracing::debug!(
            enumeration = %key,
            members = enum_type.len(),
            types = table.types.len(),
            "registered enumeration"
        );
        Ok(())
    }

    /// Register an enumeration whose members are found by ordinal index.
    pub fn register_enumeration_default(&self, enum_type: Arc<EnumType>) -> Result<(), RegistrationError> {
        let ty = Arc::clone(&enum_type);
        let from_enum = move |e: &EnumValue| member_at(&ty, e.ordinal() as i64);
        let ty = Arc::clone(&enum_type);
        let from_number = move |n: i64| member_at(&ty, n);
        self.register_enumeration(enum_type, from_enum, from_number)
    }

    /// Register a Rust enum deriving [`Enumeration`].
    pub fn register_enum<E: Enumeration>(&self) -> Result<(), RegistrationError> {
        self.register_enumeration_default(E::enum_type())
    }

    // --- Introspection ----------------------------------------------------

    /// Participating types in registration order.
    pub fn types(&self) -> Vec<TypeKey> {
        self.read().types.clone()
    }

    pub fn contains(&self, key: &TypeKey) -> bool {
        self.read().rows.contains_key(key)
    }

    /// Whether every row has one cell per participating type.
    pub fn is_square(&self) -> bool {
        self.read().check_square()
    }

    pub fn settings(&self) -> &ConverterSettings {
        self.inner.primitives.settings()
    }

    pub fn date_format(&self) -> &str {
        &self.settings().date_format
    }

    pub fn date_time_format(&self) -> &str {
        &self.settings().date_time_format
    }

    pub fn zone(&self) -> Zone {
        self.settings().zone
    }
}

fn member_at(ty: &Arc<EnumType>, index: i64) -> Result<EnumValue, LeafError> {
    usize::try_from(index)
        .ok()
        .and_then(|i| EnumValue::new(Arc::clone(ty), i))
        .ok_or_else(|| LeafError::unknown_member(ty.name(), index))
}

// ---------------------------------------------------------------------------
// BoundConverter
// ---------------------------------------------------------------------------

/// Conversion between a fixed pair of types, resolved lazily on each call.
#[derive(Debug, Clone)]
pub struct BoundConverter {
    registry: ConversionRegistry,
    from: TypeKey,
    to: TypeKey,
}

impl BoundConverter {
    pub fn from_type(&self) -> &TypeKey {
        &self.from
    }

    pub fn to_type(&self) -> &TypeKey {
        &self.to
    }

    /// Convert `value`, assumed to be of the source type. Absent stays absent.
    pub fn call(&self, value: Option<&Value>) -> Result<Option<Value>, ConvertError> {
        match value {
            None => Ok(None),
            Some(value) => self.registry.dispatch(&self.from, &self.to, value),
        }
    }
}
