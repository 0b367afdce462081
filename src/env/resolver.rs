use std::cmp::Reverse;
use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::env::interpolator::parse_placeholders;
use crate::state::environment::Environment;

/// Lookup table built from an environment's active variables.
///
/// Disabled variables and empty keys are skipped. When a key repeats, the first
/// enabled definition wins. Keys are matched as literal text, so a key may
/// contain braces.
#[derive(Debug, Clone, Default)]
pub struct Variables<'a> {
    map: HashMap<&'a str, &'a str>,
    /// Distinct active entries, longest key first.
    entries: Vec<(&'a str, &'a str)>,
}

impl<'a> Variables<'a> {
    pub fn from_env(env: Option<&'a Environment>) -> Self {
        let mut map = HashMap::new();
        let mut entries = Vec::new();
        for var in env.into_iter().flat_map(|e| e.variables.iter()) {
            if var.is_active() && !map.contains_key(var.key.as_str()) {
                map.insert(var.key.as_str(), var.value.as_str());
                entries.push((var.key.as_str(), var.value.as_str()));
            }
        }
        entries.sort_by_key(|(key, _)| Reverse(key.len()));
        Self { map, entries }
    }

    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.map.get(key).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Single pass over `input`: every `{{key}}` naming a known variable is
    /// replaced, everything else is copied verbatim. Replacement text is never
    /// scanned again.
    pub fn substitute_str(&self, input: &str) -> String {
        if self.entries.is_empty() || !input.contains("{{") {
            return input.to_string();
        }
        let mut out = String::with_capacity(input.len());
        let mut rest = input;
        while !rest.is_empty() {
            if let Some((len, value)) = self.match_at(rest) {
                out.push_str(value);
                rest = &rest[len..];
                continue;
            }
            let Some(ch) = rest.chars().next() else {
                break;
            };
            out.push(ch);
            rest = &rest[ch.len_utf8()..];
        }
        out
    }

    /// The variable whose `{{key}}` opens `text`, with the matched byte length.
    fn match_at(&self, text: &str) -> Option<(usize, &'a str)> {
        let inner = text.strip_prefix("{{")?;
        self.entries.iter().find_map(|&(key, value)| {
            inner
                .strip_prefix(key)?
                .starts_with("}}")
                .then_some((key.len() + 4, value))
        })
    }

    /// Structural recursion over a JSON value. Object keys are left alone.
    pub fn substitute(&self, value: &Value) -> Value {
        match value {
            Value::String(s) => Value::String(self.substitute_str(s)),
            Value::Array(items) => Value::Array(items.iter().map(|v| self.substitute(v)).collect()),
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), self.substitute(v)))
                    .collect::<Map<String, Value>>(),
            ),
            Value::Null | Value::Bool(_) | Value::Number(_) => value.clone(),
        }
    }

    /// Names of the placeholders `input` contains that this table cannot resolve.
    pub fn unresolved<'s>(&self, input: &'s str) -> Vec<&'s str> {
        parse_placeholders(input)
            .into_iter()
            .filter(|p| self.match_at(&input[p.start..]).is_none())
            .map(|p| p.name)
            .collect()
    }
}

/// Substitutes `{{key}}` placeholders throughout `value` using `env`.
pub fn substitute(value: &Value, env: &Environment) -> Value {
    Variables::from_env(Some(env)).substitute(value)
}

pub fn substitute_str(input: &str, env: &Environment) -> String {
    Variables::from_env(Some(env)).substitute_str(input)
}

/// Placeholder names left in `input` after resolving against `env` (or none).
pub fn unresolved_placeholders<'s>(input: &'s str, env: Option<&Environment>) -> Vec<&'s str> {
    Variables::from_env(env).unresolved(input)
}
