//! Load collection config from a directory or the built-in set, and resolve it.

use crate::config::resolved::{ResolvedCollection, ResolvedModel};
use crate::config::types::*;
use crate::config::{validate, MAX_COLLECTION_NAME_LEN};
use crate::error::ConfigError;
use crate::service::AttributeRules;
use std::collections::HashMap;
use std::path::Path;

/// File read from the config directory.
pub const COLLECTIONS_FILE: &str = "collections.json";

/// Build resolved model from full config. Physical names are `prefix + name`.
pub fn resolve(config: &FullConfig, prefix: &str) -> Result<ResolvedModel, ConfigError> {
    validate(config)?;
    if !prefix
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ConfigError::InvalidIdentifier {
            kind: "collection prefix",
            value: prefix.to_string(),
        });
    }

    let mut collections = Vec::with_capacity(config.collections.len());
    let mut collection_by_path = HashMap::new();

    for c in &config.collections {
        let physical_name = format!("{}{}", prefix, c.name);
        if physical_name.len() > MAX_COLLECTION_NAME_LEN {
            return Err(ConfigError::InvalidIdentifier {
                kind: "collection",
                value: physical_name,
            });
        }
        let path_segment = c.path_segment.clone().unwrap_or_else(|| c.name.clone());
        collection_by_path.insert(path_segment.clone(), collections.len());
        collections.push(ResolvedCollection {
            name: c.name.clone(),
            physical_name,
            kind: c.kind,
            path_segment,
            rules: AttributeRules::compile(&c.name, &c.validation)?,
        });
    }

    Ok(ResolvedModel {
        collections,
        collection_by_path,
    })
}

/// Load `collections.json` from `dir`. A missing file yields the built-in collections.
pub async fn load_from_dir(dir: &Path) -> Result<FullConfig, ConfigError> {
    let path = dir.join(COLLECTIONS_FILE);
    let raw = match tokio::fs::read_to_string(&path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "no collections file, using built-in collections");
            return Ok(FullConfig::builtin());
        }
        Err(e) => return Err(ConfigError::Load(format!("{}: {}", path.display(), e))),
    };
    let collections: Vec<CollectionConfig> =
        serde_json::from_str(&raw).map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    Ok(FullConfig { collections })
}
