//! Leaf conversion functions for the built-in types and the seed table built from them.
//!
//! Every leaf checks the variant it receives and fails with a type-mismatch error
//! otherwise. Narrowing numeric conversions follow Rust's `as` semantics, except
//! decimal → integer which truncates the fraction and then wraps.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use typeconv_api::config::ConverterSettings;
use typeconv_api::converter::{identity, ConversionFn, LeafResult};
use typeconv_api::error::LeafError;
use typeconv_api::value::{TypeKey, Value};

const NANOS_PER_SECOND: i64 = 1_000_000_000;
const NANOS_PER_DAY: i64 = 86_400 * NANOS_PER_SECOND;

macro_rules! expect {
    ($value:expr, $variant:ident) => {
        match $value {
            Value::$variant(v) => v,
            other => {
                return Err(LeafError::mismatch(&TypeKey::$variant, &other.type_key()));
            }
        }
    };
}

/// Integer view of a numeric value.
pub fn number_as_i64(value: &Value) -> Result<i64, LeafError> {
    match value {
        Value::Int64(v) => Ok(*v),
        Value::Int32(v) => Ok(i64::from(*v)),
        Value::Float64(v) => Ok(*v as i64),
        Value::Decimal(v) => decimal_to_i128(v).map(|n| n as i64),
        other => Err(LeafError::mismatch(&TypeKey::Int64, &other.type_key())),
    }
}

/// 32-bit integer view of a numeric value.
pub fn number_as_i32(value: &Value) -> Result<i32, LeafError> {
    match value {
        Value::Int64(v) => Ok(*v as i32),
        Value::Int32(v) => Ok(*v),
        Value::Float64(v) => Ok(*v as i32),
        Value::Decimal(v) => decimal_to_i128(v).map(|n| n as i32),
        other => Err(LeafError::mismatch(&TypeKey::Int32, &other.type_key())),
    }
}

fn decimal_to_i128(v: &Decimal) -> Result<i128, LeafError> {
    v.trunc()
        .to_i128()
        .ok_or_else(|| LeafError::range(format!("{v} has no integer part")))
}

fn nanos_of_day(t: &NaiveTime) -> i64 {
    i64::from(t.num_seconds_from_midnight()) * NANOS_PER_SECOND + i64::from(t.nanosecond())
}

fn time_from_nanos(nanos: i64) -> Result<NaiveTime, LeafError> {
    if !(0..NANOS_PER_DAY).contains(&nanos) {
        return Err(LeafError::range(format!("{nanos} is not a nano-of-day")));
    }
    let secs = (nanos / NANOS_PER_SECOND) as u32;
    let nano = (nanos % NANOS_PER_SECOND) as u32;
    NaiveTime::from_num_seconds_from_midnight_opt(secs, nano)
        .ok_or_else(|| LeafError::range(format!("{nanos} is not a nano-of-day")))
}

fn ok(value: Value) -> LeafResult {
    Ok(Some(value))
}

// ---------------------------------------------------------------------------
// Stateless leaves
// ---------------------------------------------------------------------------

fn render(value: &Value) -> LeafResult {
    ok(Value::Text(value.to_string()))
}

fn text_to_int64(value: &Value) -> LeafResult {
    ok(Value::Int64(expect!(value, Text).parse()?))
}

fn text_to_decimal(value: &Value) -> LeafResult {
    let s = expect!(value, Text);
    let d = s.parse::<Decimal>().or_else(|_| Decimal::from_scientific(s))?;
    ok(Value::Decimal(d))
}

fn text_to_float64(value: &Value) -> LeafResult {
    ok(Value::Float64(expect!(value, Text).parse()?))
}

fn text_to_int32(value: &Value) -> LeafResult {
    ok(Value::Int32(expect!(value, Text).parse()?))
}

fn text_to_bool(value: &Value) -> LeafResult {
    ok(Value::Bool(expect!(value, Text).eq_ignore_ascii_case("true")))
}

fn text_to_time(value: &Value) -> LeafResult {
    ok(Value::Time(expect!(value, Text).parse()?))
}

fn number_to_int64(value: &Value) -> LeafResult {
    ok(Value::Int64(number_as_i64(value)?))
}

fn number_to_int32(value: &Value) -> LeafResult {
    ok(Value::Int32(number_as_i32(value)?))
}

fn number_to_bool(value: &Value) -> LeafResult {
    ok(Value::Bool(number_as_i32(value)? > 0))
}

fn number_to_time(value: &Value) -> LeafResult {
    ok(Value::Time(time_from_nanos(number_as_i64(value)?)?))
}

fn int64_to_decimal(value: &Value) -> LeafResult {
    ok(Value::Decimal(Decimal::from(*expect!(value, Int64))))
}

fn int64_to_float64(value: &Value) -> LeafResult {
    ok(Value::Float64(*expect!(value, Int64) as f64))
}

fn decimal_to_float64(value: &Value) -> LeafResult {
    let d = expect!(value, Decimal);
    let f = d
        .to_f64()
        .ok_or_else(|| LeafError::range(format!("{d} is not representable as float64")))?;
    ok(Value::Float64(f))
}

fn float64_to_decimal(value: &Value) -> LeafResult {
    let f = *expect!(value, Float64);
    let d = Decimal::from_f64_retain(f)
        .ok_or_else(|| LeafError::range(format!("{f} is not representable as decimal")))?;
    ok(Value::Decimal(d))
}

fn int32_to_int64(value: &Value) -> LeafResult {
    ok(Value::Int64(i64::from(*expect!(value, Int32))))
}

fn int32_to_decimal(value: &Value) -> LeafResult {
    ok(Value::Decimal(Decimal::from(*expect!(value, Int32))))
}

fn int32_to_float64(value: &Value) -> LeafResult {
    ok(Value::Float64(f64::from(*expect!(value, Int32))))
}

fn bool_to_int64(value: &Value) -> LeafResult {
    ok(Value::Int64(i64::from(*expect!(value, Bool))))
}

fn bool_to_decimal(value: &Value) -> LeafResult {
    let b = *expect!(value, Bool);
    ok(Value::Decimal(if b { Decimal::ONE } else { Decimal::ZERO }))
}

fn bool_to_float64(value: &Value) -> LeafResult {
    ok(Value::Float64(if *expect!(value, Bool) { 1.0 } else { 0.0 }))
}

fn bool_to_int32(value: &Value) -> LeafResult {
    ok(Value::Int32(i32::from(*expect!(value, Bool))))
}

fn date_to_datetime(value: &Value) -> LeafResult {
    ok(Value::DateTime(expect!(value, Date).and_time(NaiveTime::MIN)))
}

fn enum_to_int64(value: &Value) -> LeafResult {
    ok(Value::Int64(expect!(value, Enum).ordinal() as i64))
}

fn enum_to_decimal(value: &Value) -> LeafResult {
    ok(Value::Decimal(Decimal::from(expect!(value, Enum).ordinal())))
}

fn enum_to_float64(value: &Value) -> LeafResult {
    ok(Value::Float64(expect!(value, Enum).ordinal() as f64))
}

fn enum_to_int32(value: &Value) -> LeafResult {
    ok(Value::Int32(expect!(value, Enum).ordinal() as i32))
}

fn enum_to_bool(value: &Value) -> LeafResult {
    ok(Value::Bool(expect!(value, Enum).ordinal() > 0))
}

fn time_to_int64(value: &Value) -> LeafResult {
    ok(Value::Int64(nanos_of_day(expect!(value, Time))))
}

fn time_to_decimal(value: &Value) -> LeafResult {
    ok(Value::Decimal(Decimal::from(nanos_of_day(expect!(value, Time)))))
}

fn time_to_float64(value: &Value) -> LeafResult {
    ok(Value::Float64(nanos_of_day(expect!(value, Time)) as f64))
}

fn time_to_int32(value: &Value) -> LeafResult {
    ok(Value::Int32(nanos_of_day(expect!(value, Time)) as i32))
}

fn time_to_bool(value: &Value) -> LeafResult {
    ok(Value::Bool(nanos_of_day(expect!(value, Time)) > 0))
}

/// Days since 1970-01-01, independent of the time zone.
fn date_to_epoch_day(value: &Value) -> LeafResult {
    let d = expect!(value, Date);
    // `NaiveDate::default()` is 1970-01-01.
    ok(Value::Int64(d.signed_duration_since(NaiveDate::default()).num_days()))
}

/// A time of day carries no date, so there is no date-time to build.
fn time_to_datetime(value: &Value) -> LeafResult {
    let t = expect!(value, Time);
    Err(LeafError::range(format!("time {t} has no date part")))
}

fn datetime_to_date(value: &Value) -> LeafResult {
    ok(Value::Date(expect!(value, DateTime).date()))
}

fn datetime_to_time(value: &Value) -> LeafResult {
    ok(Value::Time(expect!(value, DateTime).time()))
}

/// Placeholder for a pair with no meaningful conversion: logs and yields absent.
pub fn undefined(from: TypeKey, to: TypeKey) -> ConversionFn {
    Arc::new(move |value: &Value| -> LeafResult {
        tracing::warn!(%from, %to, %value, "conversion function is undefined");
        Ok(None)
    })
}

fn leaf(f: fn(&Value) -> LeafResult) -> ConversionFn {
    Arc::new(f)
}

// ---------------------------------------------------------------------------
// Leaves that depend on the configured formats and time zone
// ---------------------------------------------------------------------------

/// Library of leaf conversions bound to one set of [`ConverterSettings`].
#[derive(Debug, Clone, Default)]
pub struct PrimitiveConversions {
    settings: ConverterSettings,
}

impl PrimitiveConversions {
    pub fn new(settings: ConverterSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ConverterSettings {
        &self.settings
    }

    pub fn text_to_date(&self, value: &Value) -> LeafResult {
        let s = expect!(value, Text);
        ok(Value::Date(NaiveDate::parse_from_str(s, &self.settings.date_format)?))
    }

    pub fn text_to_datetime(&self, value: &Value) -> LeafResult {
        let s = expect!(value, Text);
        ok(Value::DateTime(NaiveDateTime::parse_from_str(
            s,
            &self.settings.date_time_format,
        )?))
    }

    pub fn date_to_text(&self, value: &Value) -> LeafResult {
        let d = expect!(value, Date);
        ok(Value::Text(d.format(&self.settings.date_format).to_string()))
    }

    pub fn datetime_to_text(&self, value: &Value) -> LeafResult {
        let dt = expect!(value, DateTime);
        ok(Value::Text(dt.format(&self.settings.date_time_format).to_string()))
    }

    /// Epoch milliseconds → local date in the configured zone.
    pub fn epoch_millis_to_date(&self, value: &Value) -> LeafResult {
        let millis = *expect!(value, Int64);
        let local = self.local_from_millis(millis)?;
        ok(Value::Date(local.date()))
    }

    /// Any number, read as epoch milliseconds → local date-time in the configured zone.
    pub fn number_to_datetime(&self, value: &Value) -> LeafResult {
        let millis = number_as_i64(value)?;
        ok(Value::DateTime(self.local_from_millis(millis)?))
    }

    pub fn datetime_to_epoch_millis(&self, value: &Value) -> LeafResult {
        let dt = expect!(value, DateTime);
        ok(Value::Int64(self.millis_from_local(dt)?))
    }

    pub fn datetime_to_epoch_seconds(&self, value: &Value) -> LeafResult {
        let dt = expect!(value, DateTime);
        let seconds = self.millis_from_local(dt)?.div_euclid(1000);
        ok(Value::Decimal(Decimal::from(seconds)))
    }

    fn local_from_millis(&self, millis: i64) -> Result<NaiveDateTime, LeafError> {
        self.settings
            .zone
            .from_epoch_millis(millis)
            .ok_or_else(|| LeafError::range(format!("{millis} ms is outside the supported range")))
    }

    fn millis_from_local(&self, local: &NaiveDateTime) -> Result<i64, LeafError> {
        self.settings.zone.to_epoch_millis(local).ok_or_else(|| {
            LeafError::range(format!("{local} does not exist in zone {}", self.settings.zone))
        })
    }

    /// Full 10×10 seed table, one row per built-in type in [`TypeKey::BUILTIN`] order.
    pub fn seed_rows(self: &Arc<Self>) -> Vec<(TypeKey, [ConversionFn; 10])> {
        use TypeKey as K;

        let bind = |f: fn(&Self, &Value) -> LeafResult| -> ConversionFn {
            let this = Arc::clone(self);
            Arc::new(move |value: &Value| f(&this, value))
        };
        let none = |from: TypeKey, to: TypeKey| undefined(from, to);

        vec![
            (K::Text, [
                identity(), leaf(text_to_int64), leaf(text_to_decimal), leaf(text_to_float64), leaf(text_to_int32),
                leaf(text_to_bool), bind(Self::text_to_date), none(K::Text, K::Enum), leaf(text_to_time), bind(Self::text_to_datetime),
            ]),
            (K::Int64, [
                leaf(render), identity(), leaf(int64_to_decimal), leaf(int64_to_float64), leaf(number_to_int32),
                leaf(number_to_bool), bind(Self::epoch_millis_to_date), none(K::Int64, K::Enum), leaf(number_to_time), bind(Self::number_to_datetime),
            ]),
            (K::Decimal, [
                leaf(render), leaf(number_to_int64), identity(), leaf(decimal_to_float64), leaf(number_to_int32),
                leaf(number_to_bool), none(K::Decimal, K::Date), none(K::Decimal, K::Enum), leaf(number_to_time), bind(Self::number_to_datetime),
            ]),
            (K::Float64, [
                leaf(render), leaf(number_to_int64), leaf(float64_to_decimal), identity(), leaf(number_to_int32),
                leaf(number_to_bool), none(K::Float64, K::Date), none(K::Float64, K::Enum), leaf(number_to_time), bind(Self::number_to_datetime),
            ]),
            (K::Int32, [
                leaf(render), leaf(int32_to_int64), leaf(int32_to_decimal), leaf(int32_to_float64), identity(),
                leaf(number_to_bool), none(K::Int32, K::Date), none(K::Int32, K::Enum), leaf(number_to_time), bind(Self::number_to_datetime),
            ]),
            (K::Bool, [
                leaf(render), leaf(bool_to_int64), leaf(bool_to_decimal), leaf(bool_to_float64), leaf(bool_to_int32),
                identity(), none(K::Bool, K::Date), none(K::Bool, K::Enum), none(K::Bool, K::Time), none(K::Bool, K::DateTime),
            ]),
            (K::Date, [
                bind(Self::date_to_text), leaf(date_to_epoch_day), none(K::Date, K::Decimal), none(K::Date, K::Float64), none(K::Date, K::Int32),
                none(K::Date, K::Bool), identity(), none(K::Date, K::Enum), none(K::Date, K::Time), leaf(date_to_datetime),
            ]),
            (K::Enum, [
                leaf(render), leaf(enum_to_int64), leaf(enum_to_decimal), leaf(enum_to_float64), leaf(enum_to_int32),
                leaf(enum_to_bool), none(K::Enum, K::Date), identity(), none(K::Enum, K::Time), none(K::Enum, K::DateTime),
            ]),
            (K::Time, [
                leaf(render), leaf(time_to_int64), leaf(time_to_decimal), leaf(time_to_float64), leaf(time_to_int32),
                leaf(time_to_bool), none(K::Time, K::Date), none(K::Time, K::Enum), identity(), leaf(time_to_datetime),
            ]),
            (K::DateTime, [
                bind(Self::datetime_to_text), bind(Self::datetime_to_epoch_millis), bind(Self::datetime_to_epoch_seconds), none(K::DateTime, K::Float64), none(K::DateTime, K::Int32),
                none(K::DateTime, K::Bool), leaf(datetime_to_date), none(K::DateTime, K::Enum), leaf(datetime_to_time), identity(),
            ]),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use typeconv_api::config::Zone;
    use typeconv_api::error::LeafErrorKind;

    fn utc() -> PrimitiveConversions {
        PrimitiveConversions::new(ConverterSettings {
            zone: Zone::Utc,
            ..ConverterSettings::default()
        })
    }

    #[test]
    fn text_parses_numbers_and_booleans() {
        assert_eq!(text_to_int64(&Value::text("-42")).unwrap(), Some(Value::Int64(-42)));
        assert_eq!(text_to_int32(&Value::text("7")).unwrap(), Some(Value::Int32(7)));
        assert_eq!(
            text_to_decimal(&Value::text("1e3")).unwrap(),
            Some(Value::Decimal(Decimal::from(1000)))
        );
        assert_eq!(text_to_bool(&Value::text("TRUE")).unwrap(), Some(Value::Bool(true)));
        assert_eq!(text_to_bool(&Value::text("yes")).unwrap(), Some(Value::Bool(false)));
    }

    #[test]
    fn unparsable_text_is_a_parse_error() {
        let err = text_to_int64(&Value::text("forty-two")).unwrap_err();
        assert_eq!(err.kind, LeafErrorKind::Parse);
        let err = utc().text_to_date(&Value::text("2024-13-01")).unwrap_err();
        assert_eq!(err.kind, LeafErrorKind::Parse);
    }

    #[test]
    fn narrowing_truncates() {
        assert_eq!(number_as_i32(&Value::Int64(1 << 32)).unwrap(), 0);
        assert_eq!(number_as_i64(&Value::Float64(2.9)).unwrap(), 2);
        let d: Decimal = "-3.75".parse().unwrap();
        assert_eq!(number_as_i64(&Value::Decimal(d)).unwrap(), -3);
        // Same wrap as the integer narrowing: 2^32 has no low 32 bits set.
        assert_eq!(number_to_bool(&Value::Int64(1 << 32)).unwrap(), Some(Value::Bool(false)));
    }

    #[test]
    fn nanos_of_day_round_trip() {
        let t = NaiveTime::from_hms_nano_opt(13, 5, 7, 123_456_789).unwrap();
        let nanos = nanos_of_day(&t);
        assert_eq!(time_from_nanos(nanos).unwrap(), t);
        assert_eq!(time_from_nanos(NANOS_PER_DAY).unwrap_err().kind, LeafErrorKind::Range);
        assert_eq!(time_from_nanos(-1).unwrap_err().kind, LeafErrorKind::Range);
    }

    #[test]
    fn epoch_conversions_use_configured_zone() {
        let p = PrimitiveConversions::new(ConverterSettings {
            zone: Zone::Fixed(FixedOffset::east_opt(2 * 3600).unwrap()),
            ..ConverterSettings::default()
        });
        let dt = NaiveDate::from_ymd_opt(1970, 1, 1)
            .unwrap()
            .and_hms_opt(2, 0, 1)
            .unwrap();
        assert_eq!(
            p.number_to_datetime(&Value::Int64(1000)).unwrap(),
            Some(Value::DateTime(dt))
        );
        assert_eq!(p.datetime_to_epoch_millis(&Value::DateTime(dt)).unwrap(), Some(Value::Int64(1000)));
        assert_eq!(
            p.datetime_to_epoch_seconds(&Value::DateTime(dt)).unwrap(),
            Some(Value::Decimal(Decimal::ONE))
        );
    }

    #[test]
    fn date_converts_to_epoch_day() {
        let next = NaiveDate::from_ymd_opt(1970, 1, 2).unwrap();
        assert_eq!(date_to_epoch_day(&Value::Date(next)).unwrap(), Some(Value::Int64(1)));
        let before = NaiveDate::from_ymd_opt(1969, 12, 31).unwrap();
        assert_eq!(date_to_epoch_day(&Value::Date(before)).unwrap(), Some(Value::Int64(-1)));
    }

    #[test]
    fn epoch_millis_to_date_uses_zone() {
        let p = utc();
        let d = NaiveDate::from_ymd_opt(2001, 9, 9).unwrap();
        assert_eq!(
            p.epoch_millis_to_date(&Value::Int64(1_000_000_000_000)).unwrap(),
            Some(Value::Date(d))
        );
    }

    #[test]
    fn time_to_datetime_fails() {
        let t = NaiveTime::from_hms_opt(1, 0, 0).unwrap();
        let err = time_to_datetime(&Value::Time(t)).unwrap_err();
        assert_eq!(err.kind, LeafErrorKind::Range);
    }

    #[test]
    fn leaves_reject_foreign_variants() {
        let err = int64_to_decimal(&Value::Int32(1)).unwrap_err();
        assert_eq!(err.kind, LeafErrorKind::TypeMismatch);
        let err = utc().datetime_to_text(&Value::Bool(true)).unwrap_err();
        assert_eq!(err.kind, LeafErrorKind::TypeMismatch);
    }

    #[test]
    fn undefined_yields_absent() {
        let f = undefined(TypeKey::Bool, TypeKey::Date);
        assert_eq!(f.apply(&Value::Bool(true)).unwrap(), None);
    }

    #[test]
    fn seed_rows_are_square() {
        let rows = Arc::new(utc()).seed_rows();
        assert_eq!(rows.len(), TypeKey::BUILTIN.len());
        for ((key, _), expected) in rows.iter().zip(TypeKey::BUILTIN) {
            assert_eq!(key, &expected);
        }
    }
}
