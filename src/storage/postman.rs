//! Postman collection v2.1 documents <-> the in-memory [`Collection`].
//!
//! Nodes with a nested `item` array are folders, everything else is a request.
//! Fields the editor does not model are carried through untouched.

use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::warn;

use crate::error::{Error, Result};
use crate::state::collection::{Collection, CollectionInfo, Folder, FolderId, SCHEMA_V2_1};
use crate::state::request_state::{
    ApiKeyPlacement, AuthSpec, HttpMethod, KeyValuePair, RequestBody, RequestId,
    RequestItem, RequestUrl,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireHeader {
    #[serde(default)]
    key: String,
    #[serde(default)]
    value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    disabled: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireAttribute {
    key: String,
    value: Value,
    #[serde(rename = "type")]
    attr_type: String,
}

fn format_error(msg: impl std::fmt::Display) -> Error {
    Error::Format(serde_json::Error::custom(msg))
}

fn take_string(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    match map.remove(key)? {
        Value::String(s) => Some(s),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

// --- Reading ---

pub fn from_document(doc: Value) -> Result<Collection> {
    let Value::Object(mut root) = doc else {
        return Err(format_error("a collection document must be a JSON object"));
    };

    let info = match root.remove("info") {
        Some(Value::Object(mut info)) => CollectionInfo {
            name: take_string(&mut info, "name").unwrap_or_default(),
            schema: take_string(&mut info, "schema").unwrap_or_else(|| SCHEMA_V2_1.to_string()),
            rest: info,
        },
        Some(Value::Null) | None => CollectionInfo::new("Untitled Collection"),
        Some(_) => return Err(format_error("`info` must be an object")),
    };

    let nodes = match root.remove("item").or_else(|| root.remove("nodes")) {
        Some(Value::Array(nodes)) => nodes,
        Some(Value::Null) | None => Vec::new(),
        Some(_) => return Err(format_error("`item` must be an array")),
    };

    let mut collection = Collection {
        info,
        requests: Vec::new(),
        folders: Vec::new(),
        rest: root,
    };

    for node in nodes {
        let Value::Object(mut node) = node else {
            return Err(format_error("collection items must be objects"));
        };
        if node.get("item").is_some_and(Value::is_array) {
            collection.folders.push(folder_from_map(&mut node)?);
        } else {
            collection.requests.push(item_from_map(node)?);
        }
    }
    Ok(collection)
}

fn folder_from_map(node: &mut Map<String, Value>) -> Result<Folder> {
    let name = take_string(node, "name").unwrap_or_default();
    let children = match node.remove("item") {
        Some(Value::Array(children)) => children,
        _ => Vec::new(),
    };
    let mut items = Vec::new();
    collect_requests(&name, children, &mut items)?;
    Ok(Folder {
        id: FolderId::new(),
        name,
        items,
        rest: std::mem::take(node),
    })
}

/// Sub-folders are flattened depth-first into the enclosing folder.
fn collect_requests(folder: &str, children: Vec<Value>, out: &mut Vec<RequestItem>) -> Result<()> {
    for child in children {
        let Value::Object(mut child) = child else {
            return Err(format_error("collection items must be objects"));
        };
        match child.remove("item") {
            Some(Value::Array(grandchildren)) => {
                let subfolder = child.get("name").and_then(Value::as_str).unwrap_or_default();
                warn!(folder, subfolder, "nested folder flattened into its parent");
                collect_requests(folder, grandchildren, out)?;
            }
            Some(other) => {
                child.insert("item".into(), other);
                out.push(item_from_map(child)?);
            }
            None => out.push(item_from_map(child)?),
        }
    }
    Ok(())
}

pub fn item_from_value(value: Value) -> Result<RequestItem> {
    match value {
        Value::Object(map) => item_from_map(map),
        _ => Err(format_error("a request item must be a JSON object")),
    }
}

fn item_from_map(mut node: Map<String, Value>) -> Result<RequestItem> {
    let name = take_string(&mut node, "name").unwrap_or_default();
    let events = match node.remove("event") {
        Some(Value::Array(events)) => events,
        _ => Vec::new(),
    };
    let test_script = events.iter().find_map(test_exec).unwrap_or_default();

    let mut item = RequestItem {
        id: RequestId::new(),
        name,
        test_script,
        body: None,
        ..Default::default()
    };

    match node.remove("request") {
        Some(Value::Object(request)) => read_request(&mut item, request)?,
        // A bare string request is shorthand for `GET <url>`.
        Some(Value::String(url)) => item.url = RequestUrl::Plain(url),
        _ => {}
    }

    item.passthrough.item = node;
    item.passthrough.events = events;
    Ok(item)
}

fn read_request(item: &mut RequestItem, mut request: Map<String, Value>) -> Result<()> {
    item.method = HttpMethod::parse(&take_string(&mut request, "method").unwrap_or_default());

    item.url = match request.remove("url") {
        Some(Value::String(raw)) => RequestUrl::Plain(raw),
        Some(Value::Object(mut parts)) => RequestUrl::Detailed {
            raw: take_string(&mut parts, "raw").unwrap_or_default(),
            parts,
        },
        _ => RequestUrl::default(),
    };

    item.headers = match request.remove("header") {
        Some(Value::Array(headers)) => headers
            .into_iter()
            .map(serde_json::from_value::<WireHeader>)
            .map(|h| {
                h.map(|h| KeyValuePair {
                    key: h.key,
                    value: h.value,
                    enabled: h.disabled != Some(true),
                })
            })
            .collect::<std::result::Result<_, _>>()?,
        _ => Vec::new(),
    };

    item.body = match request.remove("body") {
        Some(Value::Object(mut body)) => Some(RequestBody {
            mode: take_string(&mut body, "mode").unwrap_or_default(),
            raw: take_string(&mut body, "raw").unwrap_or_default(),
            rest: body,
        }),
        _ => None,
    };

    if let Some(auth) = request.remove("auth") {
        match read_auth(&auth) {
            Some(spec) => item.auth = spec,
            None => {
                // oauth2, digest, ... are not executed but survive export.
                request.insert("auth".into(), auth);
            }
        }
    }

    item.passthrough.request = request;
    Ok(())
}

/// `script.exec` as a single string, array lines joined with `\n`.
fn test_exec(event: &Value) -> Option<String> {
    if event.get("listen").and_then(Value::as_str) != Some("test") {
        return None;
    }
    match event.get("script")?.get("exec")? {
        Value::String(s) => Some(s.clone()),
        Value::Array(lines) => Some(
            lines
                .iter()
                .map(|l| l.as_str().unwrap_or_default())
                .collect::<Vec<_>>()
                .join("\n"),
        ),
        _ => None,
    }
}

/// Reads the v2.1 attribute-array form, falling back to the flat form
/// (`{type, token}`, `{type, key, value, addTo}`) some editors write.
fn read_auth(auth: &Value) -> Option<AuthSpec> {
    let kind = auth.get("type").and_then(Value::as_str)?;
    let attr = |name: &str| -> String {
        let from_array = auth
            .get(kind)
            .and_then(Value::as_array)
            .and_then(|attrs| {
                attrs
                    .iter()
                    .find(|a| a.get("key").and_then(Value::as_str) == Some(name))
            })
            .and_then(|a| a.get("value"));
        match from_array.or_else(|| auth.get(name)) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        }
    };

    match kind {
        "noauth" | "none" => Some(AuthSpec::None),
        "bearer" => Some(AuthSpec::Bearer {
            token: attr("token"),
        }),
        "basic" => Some(AuthSpec::Basic {
            username: attr("username"),
            password: attr("password"),
        }),
        "apikey" => {
            let placement = match attr("in").as_str() {
                "query" => ApiKeyPlacement::Query,
                "" => match attr("addTo").as_str() {
                    "query" => ApiKeyPlacement::Query,
                    _ => ApiKeyPlacement::Header,
                },
                _ => ApiKeyPlacement::Header,
            };
            Some(AuthSpec::ApiKey {
                key: attr("key"),
                value: attr("value"),
                placement,
            })
        }
        _ => None,
    }
}

// --- Writing ---

pub fn to_document(collection: &Collection) -> Value {
    let mut info = Map::new();
    info.insert("name".into(), Value::String(collection.info.name.clone()));
    info.insert("schema".into(), Value::String(collection.info.schema.clone()));
    info.extend(collection.info.rest.clone());

    let items: Vec<Value> = collection
        .requests
        .iter()
        .map(item_to_value)
        .chain(collection.folders.iter().map(folder_to_value))
        .collect();

    let mut root = Map::new();
    root.insert("info".into(), Value::Object(info));
    root.insert("item".into(), Value::Array(items));
    root.extend(collection.rest.clone());
    Value::Object(root)
}

fn folder_to_value(folder: &Folder) -> Value {
    let mut map = Map::new();
    map.insert("name".into(), Value::String(folder.name.clone()));
    map.insert(
        "item".into(),
        Value::Array(folder.items.iter().map(item_to_value).collect()),
    );
    map.extend(folder.rest.clone());
    Value::Object(map)
}

pub fn item_to_value(item: &RequestItem) -> Value {
    let mut request = Map::new();
    request.insert("method".into(), Value::String(item.method.as_str().to_string()));
    request.insert("url".into(), url_to_value(&item.url));
    let headers: Vec<WireHeader> = item
        .headers
        .iter()
        .map(|h| WireHeader {
            key: h.key.clone(),
            value: h.value.clone(),
            disabled: (!h.enabled).then_some(true),
        })
        .collect();
    request.insert("header".into(), json!(headers));
    if let Some(body) = &item.body {
        request.insert("body".into(), body_to_value(body));
    }
    request.extend(item.passthrough.request.clone());
    if item.auth != AuthSpec::None {
        request.insert("auth".into(), auth_to_value(&item.auth));
    }

    let mut map = Map::new();
    map.insert("name".into(), Value::String(item.name.clone()));
    map.insert("request".into(), Value::Object(request));
    let events = events_with_script(&item.passthrough.events, &item.test_script);
    if !events.is_empty() {
        map.insert("event".into(), Value::Array(events));
    }
    map.extend(item.passthrough.item.clone());
    Value::Object(map)
}

fn url_to_value(url: &RequestUrl) -> Value {
    match url {
        RequestUrl::Plain(raw) => Value::String(raw.clone()),
        RequestUrl::Detailed { raw, parts } => {
            let mut map = Map::new();
            map.insert("raw".into(), Value::String(raw.clone()));
            map.extend(parts.clone());
            Value::Object(map)
        }
    }
}

fn body_to_value(body: &RequestBody) -> Value {
    let mut map = Map::new();
    if !body.mode.is_empty() {
        map.insert("mode".into(), Value::String(body.mode.clone()));
    }
    if body.is_raw() || !body.raw.is_empty() {
        map.insert("raw".into(), Value::String(body.raw.clone()));
    }
    map.extend(body.rest.clone());
    Value::Object(map)
}

fn auth_to_value(auth: &AuthSpec) -> Value {
    let attr = |key: &str, value: &str| WireAttribute {
        key: key.to_string(),
        value: Value::String(value.to_string()),
        attr_type: "string".into(),
    };
    match auth {
        AuthSpec::None => json!({ "type": "noauth" }),
        AuthSpec::Bearer { token } => json!({
            "type": "bearer",
            "bearer": [attr("token", token)],
        }),
        AuthSpec::Basic { username, password } => json!({
            "type": "basic",
            "basic": [attr("username", username), attr("password", password)],
        }),
        AuthSpec::ApiKey {
            key,
            value,
            placement,
        } => json!({
            "type": "apikey",
            "apikey": [attr("key", key), attr("value", value), attr("in", placement.as_str())],
        }),
    }
}

/// Rewrites the first `test` event's lines; adds one only for a non-blank script.
fn events_with_script(events: &[Value], script: &str) -> Vec<Value> {
    let lines: Vec<Value> = script
        .split('\n')
        .map(|l| Value::String(l.to_string()))
        .collect();
    let mut events = events.to_vec();
    let existing = events
        .iter_mut()
        .find(|e| e.get("listen").and_then(Value::as_str) == Some("test"));
    match existing {
        Some(event) => {
            if let Some(event) = event.as_object_mut() {
                let script_obj = event
                    .entry("script")
                    .or_insert_with(|| json!({ "type": "text/javascript" }));
                if let Some(script_obj) = script_obj.as_object_mut() {
                    script_obj.insert("exec".into(), Value::Array(lines));
                }
            }
        }
        None if !script.trim().is_empty() => events.push(json!({
            "listen": "test",
            "script": { "type": "text/javascript", "exec": lines },
        })),
        None => {}
    }
    events
}
