use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::value::TypeKey;

/// Type-erased payload of a custom bridged type.
///
/// Blanket-implemented; payload types only need the listed std traits.
pub trait CustomPayload: Any + fmt::Debug + fmt::Display + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn dyn_eq(&self, other: &dyn CustomPayload) -> bool;
}

impl<T> CustomPayload for T
where
    T: Any + fmt::Debug + fmt::Display + PartialEq + Send + Sync,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn CustomPayload) -> bool {
        other.as_any().downcast_ref::<T>() == Some(self)
    }
}

/// A Rust type that joins the registry through a bridge.
pub trait CustomType: CustomPayload + Sized {
    fn type_key() -> TypeKey;
}

/// Value of a custom type: payload tagged with the key it was registered under.
#[derive(Clone)]
pub struct CustomValue {
    key: TypeKey,
    payload: Arc<dyn CustomPayload>,
}

impl CustomValue {
    pub fn new(key: TypeKey, payload: impl CustomPayload) -> Self {
        Self {
            key,
            payload: Arc::new(payload),
        }
    }

    pub fn type_key(&self) -> &TypeKey {
        &self.key
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.as_any().downcast_ref::<T>()
    }
}

impl PartialEq for CustomValue {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.payload.dyn_eq(other.payload.as_ref())
    }
}

impl fmt::Debug for CustomValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomValue")
            .field("key", &self.key)
            .field("payload", &self.payload)
            .finish()
    }
}

impl fmt::Display for CustomValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.payload, f)
    }
}
