use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Pass,
    Fail,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssertionResult {
    pub name: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One executed request of a collection run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepReport {
    pub name: String,
    pub status: StepStatus,
    /// `{method, url}` as the runner saw it.
    pub request: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
    pub assertions: Vec<AssertionResult>,
}

impl StepReport {
    pub fn passed(&self) -> bool {
        self.status == StepStatus::Pass
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    pub steps: Vec<StepReport>,
}

impl RunReport {
    pub fn passed(&self) -> bool {
        self.steps.iter().all(StepReport::passed)
    }

    pub fn failed_steps(&self) -> impl Iterator<Item = &StepReport> {
        self.steps.iter().filter(|s| !s.passed())
    }

    /// Reads whatever a runner sent back: a bare step array, `{steps: [...]}`,
    /// or a newman JSON summary (`run.executions`). An `{error}` body, or any
    /// other shape, is returned as the error message.
    pub fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Array(steps) => Ok(Self::from_steps(steps)),
            Value::Object(mut map) => {
                if let Some(Value::String(error)) = map.remove("error") {
                    return Err(error);
                }
                if let Some(Value::Array(steps)) = map.remove("steps") {
                    return Ok(Self::from_steps(steps));
                }
                match map.get("run").and_then(|run| run.get("executions")) {
                    Some(Value::Array(executions)) => Ok(Self::from_newman(executions)),
                    _ => Err("unrecognised run report".to_string()),
                }
            }
            _ => Err("unrecognised run report".to_string()),
        }
    }

    fn from_steps(steps: Vec<Value>) -> Self {
        Self {
            steps: steps.iter().map(step_from_value).collect(),
        }
    }

    fn from_newman(executions: &[Value]) -> Self {
        Self {
            steps: executions.iter().map(step_from_execution).collect(),
        }
    }
}

fn step_from_value(step: &Value) -> StepReport {
    let assertions: Vec<AssertionResult> = step
        .get("assertions")
        .and_then(Value::as_array)
        .map(|list| list.iter().map(assertion_from_value).collect())
        .unwrap_or_default();
    let status = match step.get("status").and_then(Value::as_str) {
        Some("pass") => StepStatus::Pass,
        Some(_) => StepStatus::Fail,
        None if assertions.iter().all(|a| a.passed) => StepStatus::Pass,
        None => StepStatus::Fail,
    };
    StepReport {
        name: str_field(step, "name"),
        status,
        request: step.get("request").cloned().unwrap_or(Value::Null),
        response: step.get("response").filter(|r| !r.is_null()).cloned(),
        assertions,
    }
}

fn assertion_from_value(value: &Value) -> AssertionResult {
    let name = value
        .get("name")
        .or_else(|| value.get("assertion"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let error = error_message(value.get("error"));
    let passed = value
        .get("passed")
        .and_then(Value::as_bool)
        .unwrap_or(error.is_none());
    AssertionResult {
        name,
        passed,
        error,
    }
}

fn error_message(error: Option<&Value>) -> Option<String> {
    match error? {
        Value::Null => None,
        Value::String(msg) => Some(msg.clone()),
        other => Some(
            other
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| other.to_string()),
        ),
    }
}

fn step_from_execution(exec: &Value) -> StepReport {
    let name = exec
        .get("item")
        .map(|item| str_field(item, "name"))
        .unwrap_or_default();

    let request = exec.get("request").map(|req| {
        json!({
            "method": req.get("method").and_then(Value::as_str).unwrap_or("GET"),
            "url": req.get("url").map(url_text).unwrap_or_default(),
        })
    });

    let response = exec.get("response").filter(|r| !r.is_null()).map(|res| {
        let mut out = Map::new();
        out.insert("code".into(), res.get("code").cloned().unwrap_or(Value::Null));
        out.insert("status".into(), json!(str_field(res, "status")));
        if let Some(body) = res.get("stream").and_then(stream_text) {
            out.insert("body".into(), Value::String(body));
        }
        if let Some(time) = res.get("responseTime") {
            out.insert("responseTime".into(), time.clone());
        }
        Value::Object(out)
    });

    let assertions: Vec<AssertionResult> = exec
        .get("assertions")
        .and_then(Value::as_array)
        .map(|list| list.iter().map(assertion_from_value).collect())
        .unwrap_or_default();

    let request_error = error_message(exec.get("requestError"));
    let status = if request_error.is_none() && assertions.iter().all(|a| a.passed) {
        StepStatus::Pass
    } else {
        StepStatus::Fail
    };

    StepReport {
        name,
        status,
        request: request.unwrap_or(Value::Null),
        response,
        assertions,
    }
}

fn str_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Newman serialises URLs as `{protocol, host: [..], port, path: [..], query: [..]}`.
fn url_text(url: &Value) -> String {
    if let Some(raw) = url.as_str().or_else(|| url.get("raw").and_then(Value::as_str)) {
        return raw.to_string();
    }
    let join = |key: &str, sep: &str| -> String {
        url.get(key)
            .and_then(Value::as_array)
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(sep)
            })
            .unwrap_or_default()
    };

    let mut out = String::new();
    if let Some(protocol) = url.get("protocol").and_then(Value::as_str) {
        out.push_str(protocol);
        out.push_str("://");
    }
    out.push_str(&join("host", "."));
    if let Some(port) = url.get("port").and_then(Value::as_str) {
        out.push(':');
        out.push_str(port);
    }
    let path = join("path", "/");
    if !path.is_empty() {
        out.push('/');
        out.push_str(&path);
    }
    let query: Vec<String> = url
        .get("query")
        .and_then(Value::as_array)
        .map(|pairs| {
            pairs
                .iter()
                .filter(|p| !p.get("disabled").and_then(Value::as_bool).unwrap_or(false))
                .map(|p| format!("{}={}", str_field(p, "key"), str_field(p, "value")))
                .collect()
        })
        .unwrap_or_default();
    if !query.is_empty() {
        out.push('?');
        out.push_str(&query.join("&"));
    }
    out
}

/// Response streams are exported as `{type: "Buffer", data: [bytes]}`.
fn stream_text(stream: &Value) -> Option<String> {
    if let Some(text) = stream.as_str() {
        return Some(text.to_string());
    }
    let bytes: Vec<u8> = stream
        .get("data")?
        .as_array()?
        .iter()
        .filter_map(|b| b.as_u64().and_then(|b| u8::try_from(b).ok()))
        .collect();
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_step_array() {
        let report = RunReport::from_value(json!([
            {
                "name": "Get users",
                "status": "pass",
                "request": {"method": "GET", "url": "https://x.com/users"},
                "response": {"code": 200, "status": "OK"},
                "assertions": [{"assertion": "Status is 200"}]
            },
            {
                "name": "Create user",
                "status": "fail",
                "request": {"method": "POST", "url": "https://x.com/users"},
                "assertions": [{"assertion": "Created", "error": {"message": "expected 201"}}]
            }
        ]))
        .unwrap();

        assert_eq!(report.steps.len(), 2);
        assert!(report.steps[0].passed());
        assert_eq!(
            report.steps[0].assertions,
            vec![AssertionResult {
                name: "Status is 200".into(),
                passed: true,
                error: None
            }]
        );
        assert_eq!(report.steps[1].status, StepStatus::Fail);
        assert_eq!(report.steps[1].response, None);
        assert_eq!(
            report.steps[1].assertions[0].error.as_deref(),
            Some("expected 201")
        );
        assert!(!report.passed());
        assert_eq!(report.failed_steps().count(), 1);
    }

    #[test]
    fn test_steps_object() {
        let report = RunReport::from_value(json!({"steps": [{"name": "a", "status": "pass"}]})).unwrap();
        assert_eq!(report.steps[0].name, "a");
        assert!(report.passed());
    }

    #[test]
    fn test_error_body() {
        assert_eq!(
            RunReport::from_value(json!({"error": "collection could not be loaded"})),
            Err("collection could not be loaded".to_string())
        );
        assert!(RunReport::from_value(json!({"something": "else"})).is_err());
        assert!(RunReport::from_value(json!("text")).is_err());
    }

    #[test]
    fn test_newman_summary() {
        let summary = json!({
            "collection": {"info": {"name": "demo"}},
            "run": {
                "stats": {},
                "executions": [
                    {
                        "item": {"name": "Ping"},
                        "request": {
                            "method": "GET",
                            "url": {
                                "protocol": "https",
                                "host": ["api", "example", "com"],
                                "path": ["v1", "ping"],
                                "query": [{"key": "a", "value": "1"}, {"key": "b", "value": "2", "disabled": true}]
                            }
                        },
                        "response": {
                            "code": 200,
                            "status": "OK",
                            "responseTime": 12,
                            "stream": {"type": "Buffer", "data": [111, 107]}
                        },
                        "assertions": [{"assertion": "ok"}]
                    },
                    {
                        "item": {"name": "Down"},
                        "request": {"method": "GET", "url": {"raw": "http://down.local"}},
                        "requestError": {"message": "ECONNREFUSED"}
                    }
                ]
            }
        });
        let report = RunReport::from_value(summary).unwrap();
        assert_eq!(report.steps.len(), 2);

        let ping = &report.steps[0];
        assert_eq!(ping.name, "Ping");
        assert!(ping.passed());
        assert_eq!(
            ping.request,
            json!({"method": "GET", "url": "https://api.example.com/v1/ping?a=1"})
        );
        assert_eq!(
            ping.response,
            Some(json!({"code": 200, "status": "OK", "body": "ok", "responseTime": 12}))
        );

        let down = &report.steps[1];
        assert_eq!(down.status, StepStatus::Fail);
        assert_eq!(down.request["url"], "http://down.local");
        assert_eq!(down.response, None);
    }

    #[test]
    fn test_serialises_status_lowercase() {
        let step = StepReport {
            name: "a".into(),
            status: StepStatus::Fail,
            request: Value::Null,
            response: None,
            assertions: vec![],
        };
        assert_eq!(
            serde_json::to_value(&step).unwrap(),
            json!({"name": "a", "status": "fail", "request": null, "assertions": []})
        );
    }
}
