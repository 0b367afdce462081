use crate::state::response_state::ResolvedRequest;

/// A single-line `curl` invocation reproducing `request`: method flag (omitted
/// for GET), one `-H` per header, `--data` for the body, URL last. Every
/// argument is single-quoted.
pub fn to_curl(request: &ResolvedRequest) -> String {
    let mut parts = vec!["curl".to_string()];

    let method = request.method.to_ascii_uppercase();
    if method != "GET" {
        parts.push("-X".into());
        parts.push(method);
    }

    for (key, value) in &request.headers {
        parts.push("-H".into());
        parts.push(quote(&format!("{key}: {value}")));
    }

    if let Some(body) = request.body.as_deref().filter(|b| !b.is_empty()) {
        parts.push("--data".into());
        parts.push(quote(body));
    }

    parts.push(quote(&request.url));
    parts.join(" ")
}

/// POSIX single quoting: `'` becomes `'\''`.
fn quote(arg: &str) -> String {
    format!("'{}'", arg.replace('\'', "'\\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_has_no_method_flag() {
        let req = ResolvedRequest {
            method: "get".into(),
            url: "https://api.example.com/v1/ping".into(),
            ..Default::default()
        };
        assert_eq!(to_curl(&req), "curl 'https://api.example.com/v1/ping'");
    }

    #[test]
    fn test_post_with_headers_and_body() {
        let req = ResolvedRequest {
            method: "POST".into(),
            url: "https://x.com/users?a=1&b=2".into(),
            headers: vec![
                ("Content-Type".into(), "application/json".into()),
                ("Authorization".into(), "Bearer t".into()),
            ],
            body: Some(r#"{"name":"O'Brien"}"#.into()),
        };
        assert_eq!(
            to_curl(&req),
            r#"curl -X POST -H 'Content-Type: application/json' -H 'Authorization: Bearer t' --data '{"name":"O'\''Brien"}' 'https://x.com/users?a=1&b=2'"#
        );
    }

    #[test]
    fn test_quote_neutralises_shell_syntax() {
        assert_eq!(quote("$(rm -rf /)"), "'$(rm -rf /)'");
        assert_eq!(quote("it's"), r"'it'\''s'");
        assert_eq!(quote(""), "''");
    }
}
