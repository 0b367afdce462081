use reqwest::{Client, Method, RequestBuilder};
use tracing::{debug, warn};

use crate::env::resolver::Variables;
use crate::error::{Error, Result};
use crate::http::auth;
use crate::state::environment::Environment;
use crate::state::request_state::{RequestBody, RequestItem, RequestUrl};
use crate::state::response_state::ResolvedRequest;

/// Turns a stored request plus the active environment into the concrete request
/// that will be sent.
///
/// 1. URL (plain or `{raw}`) resolved.
/// 2. Headers resolved; empty keys, empty values and disabled rows dropped.
/// 3. Raw body resolved; with a JSON content type it is re-serialised compactly,
///    or kept as-is when it does not parse.
/// 4. Auth resolved and applied.
/// 5. GET and HEAD lose any body.
pub fn build(item: &RequestItem, env: Option<&Environment>) -> ResolvedRequest {
    let vars = Variables::from_env(env);
    let resolved = resolve_item(item, &vars);

    let mut request = ResolvedRequest {
        method: resolved.method.as_str().to_string(),
        url: resolved.url.raw().to_string(),
        headers: resolved
            .headers
            .iter()
            .filter(|h| h.is_effective())
            .map(|h| (h.key.clone(), h.value.clone()))
            .collect(),
        body: None,
    };

    if let Some(body) = resolved.body.filter(|b| b.is_raw() && !b.raw.is_empty()) {
        request.body = Some(canonical_body(&request, body.raw));
    }

    auth::apply(&mut request, &resolved.auth);

    if !resolved.method.allows_body() {
        request.body = None;
    }

    let unresolved = vars.unresolved(&request.url);
    if !unresolved.is_empty() {
        warn!(request = %item.name, ?unresolved, "URL still contains placeholders");
    }
    debug!(method = %request.method, url = %request.url, "request built");
    request
}

/// A copy of `item` with every templated field substituted once.
pub fn resolve_item(item: &RequestItem, vars: &Variables<'_>) -> RequestItem {
    let mut resolved = item.clone();
    resolved.url = match &item.url {
        RequestUrl::Plain(raw) => RequestUrl::Plain(vars.substitute_str(raw)),
        RequestUrl::Detailed { raw, parts } => RequestUrl::Detailed {
            raw: vars.substitute_str(raw),
            parts: parts
                .iter()
                .map(|(k, v)| (k.clone(), vars.substitute(v)))
                .collect(),
        },
    };
    for header in &mut resolved.headers {
        header.key = vars.substitute_str(&header.key);
        header.value = vars.substitute_str(&header.value);
    }
    resolved.body = item.body.as_ref().map(|body| RequestBody {
        mode: body.mode.clone(),
        raw: vars.substitute_str(&body.raw),
        rest: body
            .rest
            .iter()
            .map(|(k, v)| (k.clone(), vars.substitute(v)))
            .collect(),
    });
    resolved.auth = auth::resolve(&item.auth, vars);
    resolved
}

fn canonical_body(request: &ResolvedRequest, raw: String) -> String {
    let is_json = request
        .header("Content-Type")
        .is_some_and(|ct| ct.to_ascii_lowercase().contains("application/json"));
    if !is_json {
        return raw;
    }
    match serde_json::from_str::<serde_json::Value>(&raw) {
        Ok(json) => serde_json::to_string(&json).unwrap_or(raw),
        Err(err) => {
            warn!(%err, "JSON body does not parse, sending it unchanged");
            raw
        }
    }
}

/// Prepares a reqwest builder for an already-resolved request.
pub fn to_reqwest(client: &Client, request: &ResolvedRequest) -> Result<RequestBuilder> {
    let method = Method::from_bytes(request.method.to_ascii_uppercase().as_bytes())
        .map_err(|_| Error::InvalidRequest(format!("invalid HTTP method '{}'", request.method)))?;

    let mut builder = client.request(method, &request.url);
    for (key, value) in &request.headers {
        builder = builder.header(key.as_str(), value.as_str());
    }
    if let Some(body) = &request.body {
        builder = builder.body(body.clone());
    }
    Ok(builder)
}
