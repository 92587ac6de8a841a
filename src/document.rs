//! Records: an open attribute map plus the system attributes `_key`, `_id`, `_rev`
//! and, in edge collections, `_from` / `_to`.

use crate::config::CollectionKind;
use crate::error::AppError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const KEY: &str = "_key";
pub const ID: &str = "_id";
pub const REV: &str = "_rev";
pub const FROM: &str = "_from";
pub const TO: &str = "_to";

/// Longest client-supplied key accepted, in bytes.
pub const MAX_KEY_LEN: usize = 254;

/// A stored record as returned by the store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "_key")]
    pub key: String,
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev")]
    pub rev: String,
    #[serde(rename = "_from", default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(rename = "_to", default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// Inbound record body with system attributes split out of the attribute map.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DocumentBody {
    pub key: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub attributes: Map<String, Value>,
}

impl DocumentBody {
    pub fn new(attributes: Map<String, Value>) -> Self {
        DocumentBody {
            attributes,
            ..Default::default()
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self.to = Some(to.into());
        self
    }

    /// Split a JSON request body. `_id` and `_rev` are read-only and dropped;
    /// `_from` / `_to` are only system attributes in edge collections.
    pub fn from_value(value: Value, kind: CollectionKind) -> Result<Self, AppError> {
        let mut attributes = match value {
            Value::Object(m) => m,
            _ => return Err(AppError::BadRequest("body must be a JSON object".into())),
        };
        if attributes.iter().any(|(k, v)| k.contains('\0') || has_nul(v)) {
            return Err(AppError::BadRequest("strings must not contain NUL characters".into()));
        }
        attributes.remove(ID);
        attributes.remove(REV);
        let key = match attributes.remove(KEY) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s),
            Some(_) => return Err(AppError::BadRequest("_key must be a string".into())),
        };
        let (from, to) = match kind {
            CollectionKind::Edge => (
                take_handle(&mut attributes, FROM)?,
                take_handle(&mut attributes, TO)?,
            ),
            CollectionKind::Document => (None, None),
        };
        Ok(DocumentBody {
            key,
            from,
            to,
            attributes,
        })
    }

    /// Build the stored record from this body and server-assigned metadata.
    pub fn into_document(self, collection: &str, key: String, rev: String) -> Document {
        Document {
            id: handle(collection, &key),
            key,
            rev,
            from: self.from,
            to: self.to,
            attributes: self.attributes,
        }
    }
}

/// PostgreSQL JSONB cannot store `\u0000`, so it is refused for every engine.
fn has_nul(value: &Value) -> bool {
    match value {
        Value::String(s) => s.contains('\0'),
        Value::Array(items) => items.iter().any(has_nul),
        Value::Object(m) => m.iter().any(|(k, v)| k.contains('\0') || has_nul(v)),
        _ => false,
    }
}

fn take_handle(attributes: &mut Map<String, Value>, name: &str) -> Result<Option<String>, AppError> {
    match attributes.remove(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(AppError::Validation(format!("{} must be a string", name))),
    }
}

/// `collection/key` document handle.
pub fn handle(collection: &str, key: &str) -> String {
    format!("{}/{}", collection, key)
}

/// True for a well-formed `collection/key` handle.
pub fn is_handle(s: &str) -> bool {
    match s.split_once('/') {
        Some((collection, key)) => !collection.is_empty() && validate_key(key).is_ok(),
        None => false,
    }
}

/// Check a client-supplied key against the allowed key characters and length.
pub fn validate_key(key: &str) -> Result<(), AppError> {
    if key.is_empty() {
        return Err(AppError::BadRequest("key must not be empty".into()));
    }
    if key.len() > MAX_KEY_LEN {
        return Err(AppError::BadRequest(format!(
            "key must be at most {} bytes",
            MAX_KEY_LEN
        )));
    }
    let allowed = |c: char| c.is_ascii_alphanumeric() || "_-:.@()+,=;$!*'%".contains(c);
    if let Some(bad) = key.chars().find(|c| !allowed(*c)) {
        return Err(AppError::BadRequest(format!("illegal character {:?} in key", bad)));
    }
    Ok(())
}

pub fn generate_key() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Fresh revision token; changes on every write.
pub fn generate_rev() -> String {
    let mut rev = uuid::Uuid::new_v4().simple().to_string();
    rev.truncate(12);
    format!("_{}", rev)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn splits_system_attributes() {
        let body = DocumentBody::from_value(
            json!({"_key": "k1", "_id": "x/y", "_rev": "_abc", "name": "a"}),
            CollectionKind::Document,
        )
        .unwrap();
        assert_eq!(body.key.as_deref(), Some("k1"));
        assert_eq!(body.attributes.len(), 1);
        assert_eq!(body.attributes["name"], "a");
    }

    #[test]
    fn endpoints_are_plain_attributes_outside_edges() {
        let body = DocumentBody::from_value(json!({"_from": "land/A"}), CollectionKind::Document).unwrap();
        assert_eq!(body.from, None);
        assert_eq!(body.attributes["_from"], "land/A");

        let edge = DocumentBody::from_value(json!({"_from": "land/A", "_to": "land/B"}), CollectionKind::Edge).unwrap();
        assert_eq!(edge.from.as_deref(), Some("land/A"));
        assert_eq!(edge.to.as_deref(), Some("land/B"));
        assert!(edge.attributes.is_empty());
    }

    #[test]
    fn rejects_nul_characters() {
        for bad in [
            json!({"name": "a\u{0}b"}),
            json!({"nested": {"list": ["ok", "\u{0}"]}}),
            json!({"a\u{0}": 1}),
        ] {
            assert!(matches!(
                DocumentBody::from_value(bad, CollectionKind::Document),
                Err(AppError::BadRequest(_))
            ));
        }
    }

    #[test]
    fn rejects_non_object_bodies() {
        assert!(matches!(
            DocumentBody::from_value(json!([1, 2]), CollectionKind::Document),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            DocumentBody::from_value(json!({"_key": 5}), CollectionKind::Document),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            DocumentBody::from_value(json!({"_from": 5}), CollectionKind::Edge),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn key_grammar() {
        assert!(validate_key("abc-123_:.@()+,=;$!*'%").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("has space").is_err());
        assert!(validate_key("a/b").is_err());
        assert!(validate_key(&"k".repeat(MAX_KEY_LEN + 1)).is_err());
    }

    #[test]
    fn handles() {
        assert!(is_handle("land/A"));
        assert!(!is_handle("land"));
        assert!(!is_handle("/A"));
        assert!(!is_handle("land/"));
    }

    #[test]
    fn serializes_flat() {
        let doc = DocumentBody::new(json!({"a": 1}).as_object().cloned().unwrap())
            .into_document("land", "K".into(), "_r".into());
        let v = serde_json::to_value(&doc).unwrap();
        assert_eq!(v, json!({"_key": "K", "_id": "land/K", "_rev": "_r", "a": 1}));
    }
}
