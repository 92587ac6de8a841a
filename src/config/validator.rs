//! Config validation: identifiers, uniqueness, and validation-rule sanity.

use crate::config::FullConfig;
use crate::error::ConfigError;
use crate::service::AttributeRules;
use std::collections::HashSet;

/// Longest physical collection name; PostgreSQL truncates identifiers past 63 bytes.
pub const MAX_COLLECTION_NAME_LEN: usize = 63;

/// Top-level paths taken by the operational routes.
pub const RESERVED_SEGMENTS: &[&str] = &["health", "ready", "version", "info", "openapi.json"];

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

pub fn validate(config: &FullConfig) -> Result<(), ConfigError> {
    if config.collections.is_empty() {
        return Err(ConfigError::Validation("at least one collection required".into()));
    }

    let mut names = HashSet::new();
    let mut path_segments = HashSet::new();
    for c in &config.collections {
        if !is_identifier(&c.name) || c.name.len() > MAX_COLLECTION_NAME_LEN {
            return Err(ConfigError::InvalidIdentifier {
                kind: "collection",
                value: c.name.clone(),
            });
        }
        if !names.insert(c.name.as_str()) {
            return Err(ConfigError::DuplicateCollection(c.name.clone()));
        }
        let segment = c.path_segment.as_deref().unwrap_or(&c.name);
        if !is_identifier(segment) || RESERVED_SEGMENTS.contains(&segment) {
            return Err(ConfigError::InvalidIdentifier {
                kind: "path segment",
                value: segment.to_string(),
            });
        }
        if !path_segments.insert(segment) {
            return Err(ConfigError::DuplicatePathSegment(segment.to_string()));
        }
        AttributeRules::compile(&c.name, &c.validation)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CollectionConfig, CollectionKind, ValidationRule};

    #[test]
    fn builtin_config_is_valid() {
        validate(&FullConfig::builtin()).unwrap();
    }

    #[test]
    fn rejects_duplicates() {
        let mut config = FullConfig::builtin();
        config.collections.push(CollectionConfig::new("land", CollectionKind::Edge));
        assert!(matches!(validate(&config), Err(ConfigError::DuplicateCollection(n)) if n == "land"));

        let mut config = FullConfig::builtin();
        let mut other = CollectionConfig::new("plots", CollectionKind::Document);
        other.path_segment = Some("land".into());
        config.collections.push(other);
        assert!(matches!(validate(&config), Err(ConfigError::DuplicatePathSegment(_))));
    }

    #[test]
    fn rejects_bad_identifiers_and_rules() {
        let config = FullConfig {
            collections: vec![CollectionConfig::new("1land", CollectionKind::Document)],
        };
        assert!(matches!(validate(&config), Err(ConfigError::InvalidIdentifier { .. })));

        let mut land = CollectionConfig::new("land", CollectionKind::Document);
        land.validation.insert(
            "name".into(),
            ValidationRule {
                pattern: Some("(".into()),
                ..Default::default()
            },
        );
        let config = FullConfig { collections: vec![land] };
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));

        assert!(matches!(
            validate(&FullConfig::default()),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn rejects_reserved_segments() {
        for reserved in ["health", "ready", "version", "info"] {
            let config = FullConfig {
                collections: vec![CollectionConfig::new(reserved, CollectionKind::Document)],
            };
            assert!(
                matches!(
                    validate(&config),
                    Err(ConfigError::InvalidIdentifier { kind: "path segment", .. })
                ),
                "{} accepted",
                reserved
            );
        }

        let mut info = CollectionConfig::new("info", CollectionKind::Document);
        info.path_segment = Some("infos".into());
        validate(&FullConfig { collections: vec![info] }).unwrap();
    }
}
