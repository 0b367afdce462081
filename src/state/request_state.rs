use std::fmt;

use serde_json::{Map, Value};
use uuid::Uuid;

/// Stable identity of a request inside a [`CollectionTree`](crate::state::tree::CollectionTree).
///
/// Assigned when the item enters the tree and never written to the exported document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    /// Anything else found in an imported collection, kept verbatim.
    Other(String),
}

impl HttpMethod {
    /// Case-insensitive; unknown verbs are upper-cased into [`HttpMethod::Other`].
    pub fn parse(method: &str) -> HttpMethod {
        let upper = method.trim().to_ascii_uppercase();
        match upper.as_str() {
            "" | "GET" => HttpMethod::Get,
            "POST" => HttpMethod::Post,
            "PUT" => HttpMethod::Put,
            "PATCH" => HttpMethod::Patch,
            "DELETE" => HttpMethod::Delete,
            "HEAD" => HttpMethod::Head,
            "OPTIONS" => HttpMethod::Options,
            _ => HttpMethod::Other(upper),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Other(verb) => verb,
        }
    }

    /// GET and HEAD never carry a request body.
    pub fn allows_body(&self) -> bool {
        !matches!(self, HttpMethod::Get | HttpMethod::Head)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValuePair {
    pub key: String,
    pub value: String,
    pub enabled: bool,
}

impl Default for KeyValuePair {
    fn default() -> Self {
        Self {
            key: String::new(),
            value: String::new(),
            enabled: true,
        }
    }
}

impl KeyValuePair {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            enabled: true,
        }
    }

    /// A pair is sent only when it is enabled and both sides are non-empty.
    pub fn is_effective(&self) -> bool {
        self.enabled && !self.key.is_empty() && !self.value.is_empty()
    }
}

/// A request URL in either of the two shapes a collection may use.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestUrl {
    Plain(String),
    /// `{ "raw": ..., "host": [...], ... }`; the parts besides `raw` are kept for export.
    Detailed { raw: String, parts: Map<String, Value> },
}

impl Default for RequestUrl {
    fn default() -> Self {
        RequestUrl::Plain(String::new())
    }
}

impl RequestUrl {
    pub fn raw(&self) -> &str {
        match self {
            RequestUrl::Plain(raw) | RequestUrl::Detailed { raw, .. } => raw,
        }
    }

    /// Replaces the raw text while keeping the original shape.
    pub fn set_raw(&mut self, url: impl Into<String>) {
        match self {
            RequestUrl::Plain(raw) | RequestUrl::Detailed { raw, .. } => *raw = url.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequestBody {
    pub mode: String,
    pub raw: String,
    /// Mode specific fields (`options`, `urlencoded`, `formdata`, ...) round-tripped untouched.
    pub rest: Map<String, Value>,
}

impl RequestBody {
    pub fn raw(text: impl Into<String>) -> Self {
        Self {
            mode: "raw".into(),
            raw: text.into(),
            rest: Map::new(),
        }
    }

    pub fn is_raw(&self) -> bool {
        self.mode == "raw"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiKeyPlacement {
    #[default]
    Header,
    Query,
}

impl ApiKeyPlacement {
    pub fn as_str(self) -> &'static str {
        match self {
            ApiKeyPlacement::Header => "header",
            ApiKeyPlacement::Query => "query",
        }
    }
}

/// How credentials are injected into a request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthSpec {
    #[default]
    None,
    Bearer { token: String },
    Basic { username: String, password: String },
    ApiKey { key: String, value: String, placement: ApiKeyPlacement },
}

impl AuthSpec {
    pub fn kind(&self) -> &'static str {
        match self {
            AuthSpec::None => "noauth",
            AuthSpec::Bearer { .. } => "bearer",
            AuthSpec::Basic { .. } => "basic",
            AuthSpec::ApiKey { .. } => "apikey",
        }
    }
}

/// Document fields the editor does not model, carried so export loses nothing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Passthrough {
    pub item: Map<String, Value>,
    pub request: Map<String, Value>,
    /// The item's `event` list as loaded; the `test` entry's lines are rewritten
    /// from `RequestItem::test_script` on export.
    pub events: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequestItem {
    pub id: RequestId,
    pub name: String,
    pub method: HttpMethod,
    pub url: RequestUrl,
    pub headers: Vec<KeyValuePair>,
    pub body: Option<RequestBody>,
    pub auth: AuthSpec,
    pub test_script: String,
    pub passthrough: Passthrough,
}

impl Default for RequestItem {
    fn default() -> Self {
        Self {
            id: RequestId::new(),
            name: String::from("New Request"),
            method: HttpMethod::Get,
            url: RequestUrl::default(),
            headers: Vec::new(),
            body: Some(RequestBody::raw("")),
            auth: AuthSpec::None,
            test_script: String::new(),
            passthrough: Passthrough::default(),
        }
    }
}

impl RequestItem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Deep copy with a fresh id, named `"<name> (Copy)"`.
    pub fn duplicate(&self) -> Self {
        Self {
            id: RequestId::new(),
            name: format!("{} (Copy)", self.name),
            ..self.clone()
        }
    }
}
