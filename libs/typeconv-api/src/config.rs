use std::fmt;
use std::str::FromStr;

use chrono::{FixedOffset, Local, LocalResult, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;

/// Time zone used to map epoch instants to local date/time values and back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Zone {
    Utc,
    /// The process's system zone.
    #[default]
    Local,
    Fixed(FixedOffset),
}

impl Zone {
    /// Local date-time of the instant `millis` after the Unix epoch.
    pub fn from_epoch_millis(&self, millis: i64) -> Option<NaiveDateTime> {
        match self {
            Zone::Utc => single(Utc.timestamp_millis_opt(millis)).map(|dt| dt.naive_local()),
            Zone::Local => single(Local.timestamp_millis_opt(millis)).map(|dt| dt.naive_local()),
            Zone::Fixed(offset) => {
                single(offset.timestamp_millis_opt(millis)).map(|dt| dt.naive_local())
            }
        }
    }

    /// Epoch milliseconds of a local date-time. In a DST gap or overlap the earliest
    /// matching instant wins.
    pub fn to_epoch_millis(&self, local: &NaiveDateTime) -> Option<i64> {
        match self {
            Zone::Utc => Utc.from_local_datetime(local).earliest().map(|dt| dt.timestamp_millis()),
            Zone::Local => Local.from_local_datetime(local).earliest().map(|dt| dt.timestamp_millis()),
            Zone::Fixed(offset) => offset
                .from_local_datetime(local)
                .earliest()
                .map(|dt| dt.timestamp_millis()),
        }
    }
}

fn single<T>(result: LocalResult<T>) -> Option<T> {
    match result {
        LocalResult::Single(v) => Some(v),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => None,
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Zone::Utc => f.write_str("utc"),
            Zone::Local => f.write_str("local"),
            Zone::Fixed(offset) => write!(f, "{offset}"),
        }
    }
}

impl FromStr for Zone {
    type Err = String;

    /// Accepts `utc`/`z`, `local`/`system` (any case) or a fixed offset such as `+03:00`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "utc" | "z" => Ok(Zone::Utc),
            "local" | "system" => Ok(Zone::Local),
            _ => trimmed
                .parse::<FixedOffset>()
                .map(Zone::Fixed)
                .map_err(|e| format!("invalid time zone '{trimmed}': {e}")),
        }
    }
}

impl<'de> Deserialize<'de> for Zone {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Textual formats and time zone used by the primitive conversions.
///
/// Fixed when the registry is built; readable but never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConverterSettings {
    /// `chrono` format for date-time ⇄ text.
    #[serde(default = "default_date_time_format")]
    pub date_time_format: String,

    /// `chrono` format for date ⇄ text.
    #[serde(default = "default_date_format")]
    pub date_format: String,

    #[serde(default)]
    pub zone: Zone,
}

fn default_date_time_format() -> String {
    "%Y-%m-%dT%H:%M:%S%.f".to_string()
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}

impl Default for ConverterSettings {
    fn default() -> Self {
        Self {
            date_time_format: default_date_time_format(),
            date_format: default_date_format(),
            zone: Zone::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn zone_parses_names_and_offsets() {
        assert_eq!("UTC".parse::<Zone>().unwrap(), Zone::Utc);
        assert_eq!("local".parse::<Zone>().unwrap(), Zone::Local);
        let east = FixedOffset::east_opt(3 * 3600).unwrap();
        assert_eq!("+03:00".parse::<Zone>().unwrap(), Zone::Fixed(east));
        assert!("mars".parse::<Zone>().is_err());
    }

    #[test]
    fn fixed_zone_shifts_epoch_instants() {
        let zone = Zone::Fixed(FixedOffset::east_opt(3 * 3600).unwrap());
        let local = zone.from_epoch_millis(0).unwrap();
        let expected = NaiveDate::from_ymd_opt(1970, 1, 1)
            .unwrap()
            .and_hms_opt(3, 0, 0)
            .unwrap();
        assert_eq!(local, expected);
        assert_eq!(zone.to_epoch_millis(&expected), Some(0));
    }

    #[test]
    fn settings_default_missing_fields() {
        let settings: ConverterSettings =
            serde_json::from_value(serde_json::json!({ "zone": "utc" })).unwrap();
        assert_eq!(settings.zone, Zone::Utc);
        assert_eq!(settings.date_format, "%Y-%m-%d");
        assert_eq!(settings.date_time_format, "%Y-%m-%dT%H:%M:%S%.f");
    }
}
