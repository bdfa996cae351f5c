use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::config::ConfigError;

/// Application properties addressed by dotted keys (`app.name`).
///
/// Nested YAML or JSON documents are flattened on load; sequences of scalars
/// become comma separated values so they can feed option lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    values: BTreeMap<String, String>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse properties from a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let document: serde_yaml::Value = serde_yaml::from_str(yaml)?;
        let mut properties = Self::new();
        properties.flatten_yaml("", &document)?;
        Ok(properties)
    }

    /// Parse properties from a JSON document
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let document: serde_json::Value = serde_json::from_str(json)?;
        let mut properties = Self::new();
        properties.flatten_json("", &document);
        Ok(properties)
    }

    /// Load a `.yml`, `.yaml` or `.json` file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yml") | Some("yaml") => Self::from_yaml_str(&content),
            Some("json") => Self::from_json_str(&content),
            _ => Err(ConfigError::parsing(format!(
                "unsupported properties file: {}",
                path.display()
            ))),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Overlay `other` onto these properties
    pub fn merge(&mut self, other: Properties) {
        self.values.extend(other.values);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Replace `${key}` and `${key:default}` placeholders.
    ///
    /// Placeholders naming an unknown key without a default are kept as
    /// written.
    pub fn resolve(&self, literal: &str) -> String {
        let mut resolved = String::with_capacity(literal.len());
        let mut rest = literal;

        while let Some(start) = rest.find("${") {
            resolved.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find('}') else {
                resolved.push_str(&rest[start..]);
                return resolved;
            };

            let placeholder = &after[..end];
            let (key, default) = match placeholder.split_once(':') {
                Some((key, default)) => (key.trim(), Some(default)),
                None => (placeholder.trim(), None),
            };

            match self.get(key).or(default) {
                Some(value) => resolved.push_str(value),
                None => resolved.push_str(&rest[start..start + 2 + end + 1]),
            }
            rest = &after[end + 1..];
        }

        resolved.push_str(rest);
        resolved
    }

    fn flatten_yaml(&mut self, prefix: &str, value: &serde_yaml::Value) -> Result<(), ConfigError> {
        use serde_yaml::Value;

        match value {
            Value::Mapping(mapping) => {
                for (key, child) in mapping {
                    let key = match key {
                        Value::String(key) => key.clone(),
                        Value::Number(number) => number.to_string(),
                        Value::Bool(flag) => flag.to_string(),
                        other => {
                            return Err(ConfigError::parsing(format!(
                                "unsupported property key: {:?}",
                                other
                            )))
                        }
                    };
                    self.flatten_yaml(&join_key(prefix, &key), child)?;
                }
            }
            Value::Sequence(items) => {
                let items = items
                    .iter()
                    .filter_map(yaml_scalar)
                    .collect::<Vec<_>>();
                self.set(prefix, items.join(","));
            }
            Value::Tagged(tagged) => self.flatten_yaml(prefix, &tagged.value)?,
            scalar => {
                if let Some(text) = yaml_scalar(scalar) {
                    self.set(prefix, text);
                }
            }
        }
        Ok(())
    }

    fn flatten_json(&mut self, prefix: &str, value: &serde_json::Value) {
        use serde_json::Value;

        match value {
            Value::Object(map) => {
                for (key, child) in map {
                    self.flatten_json(&join_key(prefix, key), child);
                }
            }
            Value::Array(items) => {
                let items = items
                    .iter()
                    .filter_map(json_scalar)
                    .collect::<Vec<_>>();
                self.set(prefix, items.join(","));
            }
            scalar => {
                if let Some(text) = json_scalar(scalar) {
                    self.set(prefix, text);
                }
            }
        }
    }
}

impl FromIterator<(String, String)> for Properties {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

fn join_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

fn yaml_scalar(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(text) => Some(text.clone()),
        serde_yaml::Value::Number(number) => Some(number.to_string()),
        serde_yaml::Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn json_scalar(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(text) => Some(text.clone()),
        serde_json::Value::Number(number) => Some(number.to_string()),
        serde_json::Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}
