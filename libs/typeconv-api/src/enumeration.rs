use std::fmt;
use std::sync::Arc;

use crate::value::TypeKey;

/// Runtime description of an enumeration: its name and its members in ordinal order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    name: Arc<str>,
    members: Vec<Arc<str>>,
}

impl EnumType {
    pub fn new<I, S>(name: impl Into<Arc<str>>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<str>>,
    {
        Self {
            name: name.into(),
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_key(&self) -> TypeKey {
        TypeKey::Named(self.name.clone())
    }

    pub fn members(&self) -> &[Arc<str>] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn position(&self, member: &str) -> Option<usize> {
        self.members.iter().position(|m| &**m == member)
    }
}

/// One member of an enumeration.
#[derive(Debug, Clone)]
pub struct EnumValue {
    ty: Arc<EnumType>,
    ordinal: usize,
}

impl EnumValue {
    /// Member at `ordinal`, or `None` when the enumeration has no such member.
    pub fn new(ty: Arc<EnumType>, ordinal: usize) -> Option<Self> {
        (ordinal < ty.len()).then_some(Self { ty, ordinal })
    }

    pub fn by_name(ty: Arc<EnumType>, name: &str) -> Option<Self> {
        let ordinal = ty.position(name)?;
        Some(Self { ty, ordinal })
    }

    pub fn of<E: Enumeration>(e: E) -> Self {
        Self {
            ty: E::enum_type(),
            ordinal: e.ordinal(),
        }
    }

    pub fn enum_type(&self) -> &Arc<EnumType> {
        &self.ty
    }

    pub fn type_key(&self) -> TypeKey {
        self.ty.type_key()
    }

    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn name(&self) -> &str {
        &self.ty.members[self.ordinal]
    }

    pub fn to_enum<E: Enumeration>(&self) -> Option<E> {
        if self.ty.name() != E::enum_type().name() {
            return None;
        }
        E::from_ordinal(self.ordinal)
    }
}

impl PartialEq for EnumValue {
    fn eq(&self, other: &Self) -> bool {
        self.ordinal == other.ordinal && self.ty.name == other.ty.name
    }
}

impl Eq for EnumValue {}

impl fmt::Display for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A unit-only Rust enum that participates in the registry as an enumeration.
///
/// Usually derived:
///
/// ```ignore
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, Enumeration)]
/// #[enumeration(name = "client-kind")]
/// enum ClientKind {
///     Juridical,
///     Physical,
/// }
/// ```
pub trait Enumeration: Copy + Send + Sync + 'static {
    /// Shared runtime description; the same `Arc` on every call.
    fn enum_type() -> Arc<EnumType>;
    fn ordinal(self) -> usize;
    fn from_ordinal(ordinal: usize) -> Option<Self>;

    fn type_key() -> TypeKey {
        Self::enum_type().type_key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_kind() -> Arc<EnumType> {
        Arc::new(EnumType::new("client-kind", ["JURIDICAL", "PHYSICAL"]))
    }

    #[test]
    fn members_resolve_by_ordinal_and_name() {
        let ty = client_kind();
        let physical = EnumValue::by_name(ty.clone(), "PHYSICAL").unwrap();
        assert_eq!(physical.ordinal(), 1);
        assert_eq!(EnumValue::new(ty.clone(), 1).unwrap(), physical);
        assert!(EnumValue::new(ty.clone(), 2).is_none());
        assert!(EnumValue::by_name(ty, "physical").is_none());
    }

    #[test]
    fn equality_is_by_enumeration_name_and_ordinal() {
        let a = EnumValue::new(client_kind(), 0).unwrap();
        let b = EnumValue::new(client_kind(), 0).unwrap();
        let other = EnumValue::new(Arc::new(EnumType::new("other", ["JURIDICAL"])), 0).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, other);
        assert_eq!(a.type_key(), TypeKey::named("client-kind"));
    }
}
