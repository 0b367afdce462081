use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use url::Url;
use url::form_urlencoded;

use crate::env::resolver::Variables;
use crate::state::environment::Environment;
use crate::state::request_state::{ApiKeyPlacement, AuthSpec};
use crate::state::response_state::ResolvedRequest;

/// Runs every credential field through the variable table.
pub fn resolve(auth: &AuthSpec, vars: &Variables<'_>) -> AuthSpec {
    let sub = |s: &String| vars.substitute_str(s);
    match auth {
        AuthSpec::None => AuthSpec::None,
        AuthSpec::Bearer { token } => AuthSpec::Bearer { token: sub(token) },
        AuthSpec::Basic { username, password } => AuthSpec::Basic {
            username: sub(username),
            password: sub(password),
        },
        AuthSpec::ApiKey {
            key,
            value,
            placement,
        } => AuthSpec::ApiKey {
            key: sub(key),
            value: sub(value),
            placement: *placement,
        },
    }
}

impl AuthSpec {
    /// This auth with its credential fields substituted from `env`.
    pub fn resolve(&self, env: &Environment) -> AuthSpec {
        resolve(self, &Variables::from_env(Some(env)))
    }
}

/// Injects already-resolved credentials. Schemes with missing required fields
/// (empty token, username or key) leave the request untouched.
pub fn apply(request: &mut ResolvedRequest, auth: &AuthSpec) {
    match auth {
        AuthSpec::None => {}
        AuthSpec::Bearer { token } => {
            if !token.is_empty() {
                request.set_header("Authorization", format!("Bearer {token}"));
            }
        }
        AuthSpec::Basic { username, password } => {
            if !username.is_empty() {
                let encoded = STANDARD.encode(format!("{username}:{password}"));
                request.set_header("Authorization", format!("Basic {encoded}"));
            }
        }
        AuthSpec::ApiKey {
            key,
            value,
            placement,
        } => {
            if key.is_empty() {
                return;
            }
            match placement {
                ApiKeyPlacement::Header => request.set_header(key.as_str(), value.as_str()),
                ApiKeyPlacement::Query => request.url = set_query_param(&request.url, key, value),
            }
        }
    }
}

/// Sets `key=value` on the query string, replacing earlier values of `key` and
/// keeping every other pair and the fragment.
pub fn set_query_param(url: &str, key: &str, value: &str) -> String {
    if let Ok(mut parsed) = Url::parse(url) {
        let kept: Vec<(String, String)> = parsed
            .query_pairs()
            .filter(|(k, _)| k != key)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        parsed
            .query_pairs_mut()
            .clear()
            .extend_pairs(kept)
            .append_pair(key, value);
        return parsed.into();
    }

    // Not an absolute URL (typically an unresolved `{{base}}`): append textually.
    let (base, fragment) = match url.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (url, None),
    };
    let pair = form_urlencoded::Serializer::new(String::new())
        .append_pair(key, value)
        .finish();
    let separator = if !base.contains('?') {
        "?"
    } else if base.ends_with('?') || base.ends_with('&') {
        ""
    } else {
        "&"
    };
    let mut out = format!("{base}{separator}{pair}");
    if let Some(fragment) = fragment {
        out.push('#');
        out.push_str(fragment);
    }
    out
}
