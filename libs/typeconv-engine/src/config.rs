use serde::Deserialize;

use typeconv_api::config::ConverterSettings;
use typeconv_api::value::TypeKey;

use crate::error::EngineError;

/// Root configuration: parsed from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TypeconvConfig {
    /// Text formats and time zone of the primitive conversions.
    #[serde(default)]
    pub settings: ConverterSettings,

    /// Enumerations registered at startup, members found by ordinal.
    #[serde(default)]
    pub enumerations: Vec<EnumerationConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EnumerationConfig {
    pub name: String,
    /// Member names in ordinal order.
    pub members: Vec<String>,
}

impl TypeconvConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self, EngineError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content).map_err(|e| e.with_context(path))
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, EngineError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), EngineError> {
        for (i, e) in self.enumerations.iter().enumerate() {
            if e.name.trim().is_empty() {
                return Err(EngineError::Config(format!("enumerations[{i}]: empty name")));
            }
            if TypeKey::BUILTIN.iter().any(|k| k.name() == e.name) {
                return Err(EngineError::Config(format!(
                    "enumeration '{}': name is reserved for a built-in type",
                    e.name
                )));
            }
            if e.members.is_empty() {
                return Err(EngineError::Config(format!("enumeration '{}': no members", e.name)));
            }
            if let Some(dup) = e
                .members
                .iter()
                .enumerate()
                .find_map(|(j, m)| e.members[..j].contains(m).then_some(m))
            {
                return Err(EngineError::Config(format!(
                    "enumeration '{}': duplicate member '{dup}'",
                    e.name
                )));
            }
            if self.enumerations[..i].iter().any(|other| other.name == e.name) {
                return Err(EngineError::Config(format!("enumeration '{}' defined twice", e.name)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use typeconv_api::config::Zone;

    #[test]
    fn empty_config_uses_defaults() {
        let config = TypeconvConfig::parse("").unwrap();
        assert_eq!(config.settings, ConverterSettings::default());
        assert!(config.enumerations.is_empty());
    }

    #[test]
    fn parses_settings_and_enumerations() {
        let config = TypeconvConfig::parse(
            r#"
            [settings]
            date_format = "%d.%m.%Y"
            zone = "+03:00"

            [[enumerations]]
            name = "client-kind"
            members = ["JURIDICAL", "PHYSICAL"]
            "#,
        )
        .unwrap();
        assert_eq!(config.settings.date_format, "%d.%m.%Y");
        assert_eq!(config.settings.date_time_format, "%Y-%m-%dT%H:%M:%S%.f");
        assert!(matches!(config.settings.zone, Zone::Fixed(_)));
        assert_eq!(
            config.enumerations,
            vec![EnumerationConfig {
                name: "client-kind".into(),
                members: vec!["JURIDICAL".into(), "PHYSICAL".into()],
            }]
        );
    }

    #[test]
    fn rejects_bad_zone() {
        let err = TypeconvConfig::parse("[settings]\nzone = \"mars\"").unwrap_err();
        assert!(err.to_string().contains("invalid time zone"));
    }

    #[test]
    fn rejects_malformed_enumerations() {
        let empty = "[[enumerations]]\nname = \"e\"\nmembers = []";
        assert!(TypeconvConfig::parse(empty).unwrap_err().to_string().contains("no members"));

        let dup = "[[enumerations]]\nname = \"e\"\nmembers = [\"A\", \"A\"]";
        assert!(TypeconvConfig::parse(dup).unwrap_err().to_string().contains("duplicate member"));

        let twice = "[[enumerations]]\nname = \"e\"\nmembers = [\"A\"]\n\
                     [[enumerations]]\nname = \"e\"\nmembers = [\"B\"]";
        assert!(TypeconvConfig::parse(twice).unwrap_err().to_string().contains("defined twice"));

        let reserved = "[[enumerations]]\nname = \"date\"\nmembers = [\"A\"]";
        assert!(TypeconvConfig::parse(reserved).unwrap_err().to_string().contains("reserved"));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = TypeconvConfig::load("/nonexistent/typeconv.toml").unwrap_err();
        assert!(matches!(err, EngineError::Io(ref e) if e.kind() == std::io::ErrorKind::NotFound));
    }
}
