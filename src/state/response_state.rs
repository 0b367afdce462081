use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// A request after substitution, header filtering and auth: exactly what goes on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct ResolvedRequest {
    pub method: String,
    pub url: String,
    #[serde(serialize_with = "headers_as_map")]
    pub headers: Vec<(String, String)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl ResolvedRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Sets `name`, replacing an existing header of the same name (any case) in place.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .headers
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(&name))
        {
            Some(slot) => *slot = (name, value),
            None => self.headers.push((name, value)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
}

impl ResponseBody {
    /// JSON when the text parses, otherwise the text itself.
    pub fn from_text(text: String) -> Self {
        match serde_json::from_str::<Value>(&text) {
            Ok(json) => ResponseBody::Json(json),
            Err(_) => ResponseBody::Text(text),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(json) => Some(json),
            ResponseBody::Text(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseData {
    pub status: u16,
    pub status_text: String,
    #[serde(serialize_with = "headers_as_map")]
    pub headers: Vec<(String, String)>,
    pub body: ResponseBody,
    pub duration_ms: u64,
    pub received_at: DateTime<Utc>,
}

/// Result of a direct execution. Failures are values, never errors.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Outcome {
    Response(ResponseData),
    Failure { error: String },
}

impl Outcome {
    pub fn failure(error: impl Into<String>) -> Self {
        Outcome::Failure { error: error.into() }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure { .. })
    }

    pub fn response(&self) -> Option<&ResponseData> {
        match self {
            Outcome::Response(data) => Some(data),
            Outcome::Failure { .. } => None,
        }
    }
}

/// What was sent, how to reproduce it, and what came back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Execution {
    pub request: ResolvedRequest,
    pub curl: String,
    pub outcome: Outcome,
}

/// Repeated names are folded into one comma-separated entry, as fetch does.
fn headers_as_map<S>(headers: &[(String, String)], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut map = Map::new();
    for (key, value) in headers {
        match map.get_mut(key) {
            Some(Value::String(existing)) => {
                existing.push_str(", ");
                existing.push_str(value);
            }
            _ => {
                map.insert(key.clone(), Value::String(value.clone()));
            }
        }
    }
    map.serialize(serializer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_header_replaces_case_insensitively() {
        let mut req = ResolvedRequest::default();
        req.set_header("authorization", "Bearer old");
        req.set_header("Accept", "*/*");
        req.set_header("Authorization", "Bearer new");
        assert_eq!(req.headers.len(), 2);
        assert_eq!(req.headers[0], ("Authorization".into(), "Bearer new".into()));
        assert_eq!(req.header("AUTHORIZATION"), Some("Bearer new"));
    }

    #[test]
    fn test_body_from_text() {
        assert_eq!(
            ResponseBody::from_text(r#"{"ok":true}"#.into()),
            ResponseBody::Json(json!({"ok": true}))
        );
        assert_eq!(
            ResponseBody::from_text("pong".into()),
            ResponseBody::Text("pong".into())
        );
    }

    #[test]
    fn test_failure_serializes_as_error_object() {
        let value = serde_json::to_value(Outcome::failure("connection refused")).unwrap();
        assert_eq!(value, json!({"error": "connection refused"}));
    }

    #[test]
    fn test_headers_serialize_as_object() {
        let req = ResolvedRequest {
            method: "GET".into(),
            url: "https://x".into(),
            headers: vec![
                ("set-cookie".into(), "a=1".into()),
                ("set-cookie".into(), "b=2".into()),
            ],
            body: None,
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["headers"], json!({"set-cookie": "a=1, b=2"}));
        assert!(value.get("body").is_none());
    }
}
