//! Per-collection attribute rules, compiled once when the model is resolved and
//! checked on every write.

use crate::config::ValidationRule;
use crate::error::{AppError, ConfigError};
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    Email,
    Uuid,
}

impl Format {
    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "email" => Some(Format::Email),
            "uuid" => Some(Format::Uuid),
            _ => None,
        }
    }

    fn accepts(self, s: &str) -> bool {
        match self {
            Format::Email => s.len() >= 3 && s.contains('@'),
            Format::Uuid => uuid::Uuid::parse_str(s).is_ok(),
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Format::Email => "a valid email",
            Format::Uuid => "a valid UUID",
        }
    }
}

/// One attribute's rule with its pattern already compiled.
#[derive(Clone, Debug)]
pub struct AttributeRule {
    required: bool,
    format: Option<Format>,
    min_length: Option<usize>,
    max_length: Option<usize>,
    pattern: Option<Regex>,
    allowed: Option<Vec<Value>>,
    minimum: Option<f64>,
    maximum: Option<f64>,
}

impl AttributeRule {
    /// Compile a configured rule. Bad patterns, unknown formats and inverted bounds are config errors.
    pub fn compile(collection: &str, attr: &str, rule: &ValidationRule) -> Result<Self, ConfigError> {
        let invalid = |what: String| ConfigError::Validation(format!("{}.{}: {}", collection, attr, what));

        let pattern = match rule.pattern.as_deref() {
            Some(p) => Some(Regex::new(p).map_err(|e| invalid(format!("invalid pattern: {}", e)))?),
            None => None,
        };
        let format = match rule.format.as_deref() {
            Some(f) => Some(Format::parse(f).ok_or_else(|| invalid(format!("unknown format '{}'", f)))?),
            None => None,
        };
        if let (Some(min), Some(max)) = (rule.min_length, rule.max_length) {
            if min > max {
                return Err(invalid("min_length greater than max_length".into()));
            }
        }
        if let (Some(min), Some(max)) = (rule.minimum, rule.maximum) {
            if min > max {
                return Err(invalid("minimum greater than maximum".into()));
            }
        }

        Ok(AttributeRule {
            required: rule.required == Some(true),
            format,
            min_length: rule.min_length.map(|n| n as usize),
            max_length: rule.max_length.map(|n| n as usize),
            pattern,
            allowed: rule.allowed.clone(),
            minimum: rule.minimum,
            maximum: rule.maximum,
        })
    }

    /// Check one present value. Null passes every constraint except `required`.
    fn check(&self, attr: &str, v: &Value) -> Result<(), AppError> {
        let fail = |what: String| Err(AppError::Validation(format!("{} {}", attr, what)));
        if v.is_null() {
            return Ok(());
        }
        if let Some(s) = v.as_str() {
            if let Some(format) = self.format {
                if !format.accepts(s) {
                    return fail(format!("must be {}", format.describe()));
                }
            }
            let len = s.chars().count();
            if let Some(min) = self.min_length.filter(|min| len < *min) {
                return fail(format!("must be at least {} characters", min));
            }
            if let Some(max) = self.max_length.filter(|max| len > *max) {
                return fail(format!("must be at most {} characters", max));
            }
            if let Some(re) = &self.pattern {
                if !re.is_match(s) {
                    return fail("does not match required pattern".into());
                }
            }
        }
        if let Some(allowed) = &self.allowed {
            if !allowed.iter().any(|a| same_value(v, a)) {
                let shown: Vec<String> = allowed.iter().take(5).map(Value::to_string).collect();
                return fail(format!("must be one of: {}", shown.join(", ")));
            }
        }
        if let Some(n) = v.as_f64() {
            if let Some(min) = self.minimum.filter(|min| n < *min) {
                return fail(format!("must be at least {}", min));
            }
            if let Some(max) = self.maximum.filter(|max| n > *max) {
                return fail(format!("must be at most {}", max));
            }
        }
        Ok(())
    }
}

/// Numbers compare by value so `1` matches `1.0`.
fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(n), Value::Number(m)) => n.as_f64() == m.as_f64(),
        _ => a == b,
    }
}

/// Every rule of one collection, keyed by attribute. Empty accepts any attributes.
#[derive(Clone, Debug, Default)]
pub struct AttributeRules {
    rules: Vec<(String, AttributeRule)>,
}

impl AttributeRules {
    pub fn compile(collection: &str, rules: &HashMap<String, ValidationRule>) -> Result<Self, ConfigError> {
        let mut compiled = rules
            .iter()
            .map(|(attr, rule)| Ok((attr.clone(), AttributeRule::compile(collection, attr, rule)?)))
            .collect::<Result<Vec<_>, ConfigError>>()?;
        compiled.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(AttributeRules { rules: compiled })
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, attr: &str) -> Option<&AttributeRule> {
        self.rules.iter().find(|(a, _)| a == attr).map(|(_, r)| r)
    }

    /// Full body (create, replace): required attributes must be present and non-null.
    pub fn check(&self, body: &Map<String, Value>) -> Result<(), AppError> {
        for (attr, rule) in &self.rules {
            match body.get(attr) {
                None | Some(Value::Null) if rule.required => {
                    return Err(AppError::Validation(format!("{} is required", attr)));
                }
                Some(v) => rule.check(attr, v)?,
                None => {}
            }
        }
        Ok(())
    }

    /// Partial body (patch): only the attributes present are checked.
    pub fn check_present(&self, body: &Map<String, Value>) -> Result<(), AppError> {
        for (attr, rule) in &self.rules {
            if let Some(v) = body.get(attr) {
                rule.check(attr, v)?;
            }
        }
        Ok(())
    }
}
