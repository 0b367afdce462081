use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One `{ key, value, enabled }` binding, Postman-compatible on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVariable {
    #[serde(default)]
    pub key: String,
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub value: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub var_type: Option<String>,
}

impl Default for EnvVariable {
    fn default() -> Self {
        Self {
            key: String::new(),
            value: String::new(),
            enabled: true,
            var_type: None,
        }
    }
}

impl EnvVariable {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            ..Default::default()
        }
    }

    /// Only enabled variables with a non-empty key take part in substitution.
    pub fn is_active(&self) -> bool {
        self.enabled && !self.key.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "values", default)]
    pub variables: Vec<EnvVariable>,
    /// `id`, `_postman_variable_scope`, ... kept for export.
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            name: String::from("New Environment"),
            variables: Vec::new(),
            rest: Map::new(),
        }
    }
}

impl Environment {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_variables(name: impl Into<String>, variables: Vec<EnvVariable>) -> Self {
        Self {
            name: name.into(),
            variables,
            rest: Map::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Exported environments sometimes carry numbers or booleans as values.
fn scalar_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_with_defaults() {
        let json = r#"{"name":"dev","values":[{"key":"k"}]}"#;
        let env: Environment = serde_json::from_str(json).unwrap();
        assert_eq!(env.variables[0].value, "");
        assert!(env.variables[0].enabled);
    }

    #[test]
    fn test_numeric_values_become_strings() {
        let json = r#"{"name":"dev","values":[{"key":"port","value":8080,"enabled":true}]}"#;
        let env: Environment = serde_json::from_str(json).unwrap();
        assert_eq!(env.variables[0].value, "8080");
    }

    #[test]
    fn test_unknown_fields_round_trip() {
        let json = r#"{"id":"abc","name":"dev","values":[],"_postman_variable_scope":"environment"}"#;
        let env: Environment = serde_json::from_str(json).unwrap();
        let back = serde_json::to_value(&env).unwrap();
        assert_eq!(back["id"], "abc");
        assert_eq!(back["_postman_variable_scope"], "environment");
        assert_eq!(back["values"], serde_json::json!([]));
    }

    #[test]
    fn test_is_active() {
        assert!(EnvVariable::new("host", "x").is_active());
        assert!(!EnvVariable::new("", "x").is_active());
        let disabled = EnvVariable {
            enabled: false,
            ..EnvVariable::new("host", "x")
        };
        assert!(!disabled.is_active());
    }
}
