use std::sync::Arc;

use typeconv_api::enumeration::EnumType;

use crate::config::TypeconvConfig;
use crate::error::EngineError;
use crate::registry::ConversionRegistry;

/// Build a registry from configuration.
///
/// Creates the seed table with the configured settings, then registers every
/// configured enumeration in declaration order.
pub fn build_registry(config: &TypeconvConfig) -> Result<ConversionRegistry, EngineError> {
    let registry = ConversionRegistry::new(config.settings.clone());

    for enum_cfg in &config.enumerations {
        let ctx = format!("enumeration '{}'", enum_cfg.name);
        let enum_type = Arc::new(EnumType::new(
            enum_cfg.name.as_str(),
            enum_cfg.members.iter().map(String::as_str),
        ));
        registry
            .register_enumeration_default(enum_type)
            .map_err(|e| EngineError::from(e).with_context(&ctx))?;
        tracing::info!(enumeration = %enum_cfg.name, members = enum_cfg.members.len(), "registered enumeration");
    }

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use typeconv_api::value::{TypeKey, Value};

    #[test]
    fn registers_configured_enumerations() {
        let config = TypeconvConfig::parse(
            "[[enumerations]]\nname = \"color\"\nmembers = [\"RED\", \"GREEN\", \"BLUE\"]",
        )
        .unwrap();
        let registry = build_registry(&config).unwrap();
        let color = TypeKey::named("color");
        assert!(registry.contains(&color));
        assert_eq!(registry.types().len(), 11);

        let green = registry.convert(&color, Some(&Value::Int32(1))).unwrap().unwrap();
        assert_eq!(green.to_string(), "GREEN");
    }

    #[test]
    fn settings_reach_the_registry() {
        let config = TypeconvConfig::parse("[settings]\ndate_format = \"%d.%m.%Y\"\nzone = \"utc\"").unwrap();
        let registry = build_registry(&config).unwrap();
        assert_eq!(registry.date_format(), "%d.%m.%Y");

        let date = registry.convert(&TypeKey::Date, Some(&Value::text("09.09.2001"))).unwrap();
        let text = registry.convert(&TypeKey::Text, date.as_ref()).unwrap();
        assert_eq!(text, Some(Value::text("09.09.2001")));
    }
}
