use std::sync::Arc;

use crate::error::LeafError;
use crate::value::{TypeKey, Value};

/// Outcome of one conversion cell. `Ok(None)` is a deliberate absent result.
pub type LeafResult = Result<Option<Value>, LeafError>;

/// One cell of the conversion table: maps a value of the row's type to the column's type.
///
/// Implemented for every `Fn(&Value) -> LeafResult`, so plain functions and closures
/// can be installed directly.
pub trait Conversion: Send + Sync {
    fn apply(&self, value: &Value) -> LeafResult;
}

impl<F> Conversion for F
where
    F: Fn(&Value) -> LeafResult + Send + Sync,
{
    fn apply(&self, value: &Value) -> LeafResult {
        self(value)
    }
}

/// Erased cell function as stored in the table.
pub type ConversionFn = Arc<dyn Conversion>;

pub fn conversion(f: impl Conversion + 'static) -> ConversionFn {
    Arc::new(f)
}

pub fn identity() -> ConversionFn {
    Arc::new(|value: &Value| -> LeafResult { Ok(Some(value.clone())) })
}

/// `first` then `second`. An absent intermediate fails instead of reaching `second`.
pub fn compose(first: ConversionFn, via: TypeKey, second: ConversionFn) -> ConversionFn {
    Arc::new(move |value: &Value| -> LeafResult {
        match first.apply(value)? {
            Some(mid) => second.apply(&mid),
            None => Err(LeafError::absent_intermediate(&via)),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LeafErrorKind;

    fn double(value: &Value) -> LeafResult {
        match value {
            Value::Int64(v) => Ok(Some(Value::Int64(v * 2))),
            other => Err(LeafError::mismatch(&TypeKey::Int64, &other.type_key())),
        }
    }

    #[test]
    fn compose_runs_both_stages() {
        let f = compose(conversion(double), TypeKey::Int64, conversion(double));
        assert_eq!(f.apply(&Value::Int64(3)).unwrap(), Some(Value::Int64(12)));
    }

    #[test]
    fn compose_fails_on_absent_intermediate() {
        let nothing = conversion(|_: &Value| -> LeafResult { Ok(None) });
        let f = compose(nothing, TypeKey::Enum, conversion(double));
        let err = f.apply(&Value::Int64(1)).unwrap_err();
        assert_eq!(err.kind, LeafErrorKind::AbsentIntermediate);
    }

    #[test]
    fn leaf_reports_type_mismatch() {
        let err = conversion(double).apply(&Value::Bool(true)).unwrap_err();
        assert_eq!(err.kind, LeafErrorKind::TypeMismatch);
        assert_eq!(err.message, "expected int64, got bool");
    }
}
