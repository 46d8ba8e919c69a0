//! Property-based tests for text round-trips through the registry.

use chrono::NaiveTime;
use proptest::prelude::*;
use rust_decimal::Decimal;

use typeconv_api::config::{ConverterSettings, Zone};
use typeconv_api::{TypeKey, Value};
use typeconv_engine::ConversionRegistry;

fn registry() -> ConversionRegistry {
    ConversionRegistry::new(ConverterSettings {
        zone: Zone::Utc,
        ..ConverterSettings::default()
    })
}

fn via_text(registry: &ConversionRegistry, value: &Value) -> Option<Value> {
    let text = registry.convert(&TypeKey::Text, Some(value)).unwrap();
    registry.convert(&value.type_key(), text.as_ref()).unwrap()
}

/// Decimals from a mantissa and a scale within `rust_decimal`'s limits.
fn arb_decimal() -> impl Strategy<Value = Decimal> {
    (any::<i64>(), 0u32..=18).prop_map(|(mantissa, scale)| Decimal::new(mantissa, scale))
}

fn arb_time() -> impl Strategy<Value = NaiveTime> {
    (0u32..86_400, 0u32..1_000_000_000).prop_map(|(secs, nanos)| {
        NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos).unwrap()
    })
}

proptest! {
    #[test]
    fn prop_int64_round_trips(n in any::<i64>()) {
        let value = Value::Int64(n);
        prop_assert_eq!(via_text(&registry(), &value), Some(value));
    }

    #[test]
    fn prop_int32_round_trips(n in any::<i32>()) {
        let value = Value::Int32(n);
        prop_assert_eq!(via_text(&registry(), &value), Some(value));
    }

    #[test]
    fn prop_finite_float64_round_trips(x in proptest::num::f64::NORMAL | proptest::num::f64::ZERO) {
        let value = Value::Float64(x);
        prop_assert_eq!(via_text(&registry(), &value), Some(value));
    }

    #[test]
    fn prop_decimal_round_trips(d in arb_decimal()) {
        let value = Value::Decimal(d);
        prop_assert_eq!(via_text(&registry(), &value), Some(value));
    }

    #[test]
    fn prop_time_round_trips(t in arb_time()) {
        let registry = registry();
        let value = Value::Time(t);
        prop_assert_eq!(via_text(&registry, &value), Some(value.clone()));

        let nanos = registry.convert(&TypeKey::Int64, Some(&value)).unwrap();
        let back = registry.convert(&TypeKey::Time, nanos.as_ref()).unwrap();
        prop_assert_eq!(back, Some(value));
    }

    #[test]
    fn prop_widening_is_lossless(n in any::<i32>()) {
        let registry = registry();
        let wide = registry.convert_to::<i64>(Some(&Value::Int32(n))).unwrap();
        prop_assert_eq!(wide, Some(i64::from(n)));
        let narrow = registry.convert_to::<i32>(wide.map(Value::Int64).as_ref()).unwrap();
        prop_assert_eq!(narrow, Some(n));
    }
}
