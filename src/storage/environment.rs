use serde_json::Value;

use crate::error::{Error, Result};
use crate::state::environment::Environment;

/// Parses an uploaded Postman environment (`{ name, values: [...] }`).
pub fn parse(doc: &str) -> Result<Environment> {
    let value: Value = serde_json::from_str(doc)?;
    if !value.is_object() {
        return Err(Error::Format(serde::de::Error::custom(
            "an environment document must be a JSON object",
        )));
    }
    Ok(serde_json::from_value(value)?)
}

pub fn to_json(env: &Environment) -> Result<String> {
    Ok(serde_json::to_string_pretty(env)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_postman_environment() {
        let env = parse(
            r#"{"name":"dev","values":[
                {"key":"host","value":"api.example.com","enabled":true},
                {"key":"token","value":"t","enabled":false,"type":"secret"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(env.name, "dev");
        assert_eq!(env.variables.len(), 2);
        assert!(!env.variables[1].enabled);
        assert_eq!(env.variables[1].var_type.as_deref(), Some("secret"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(parse("not json"), Err(Error::Format(_))));
        assert!(matches!(parse("\"dev\""), Err(Error::Format(_))));
        assert!(parse(r#"{"name":"x","values":"nope"}"#).is_err());
    }

    #[test]
    fn test_to_json_uses_values_key() {
        let env = Environment::new("prod");
        let json = to_json(&env).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["name"], "prod");
        assert!(value["values"].as_array().unwrap().is_empty());
    }
}
