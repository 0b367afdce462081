use std::time::Instant;

use chrono::Utc;
use reqwest::Client;
use tracing::{info, warn};

use super::builder::{build, to_reqwest};
use super::curl::to_curl;
use crate::state::environment::Environment;
use crate::state::request_state::RequestItem;
use crate::state::response_state::{Execution, Outcome, ResolvedRequest, ResponseBody, ResponseData};

/// Builds `item` against `env` and sends it.
pub async fn run(client: &Client, item: &RequestItem, env: Option<&Environment>) -> Execution {
    execute(client, build(item, env)).await
}

/// Sends an already-resolved request. Every failure is reported in the
/// returned outcome.
pub async fn execute(client: &Client, request: ResolvedRequest) -> Execution {
    let curl = to_curl(&request);
    let outcome = match send(client, &request).await {
        Ok(data) => {
            info!(
                method = %request.method,
                url = %request.url,
                status = data.status,
                duration_ms = data.duration_ms,
                "request finished"
            );
            Outcome::Response(data)
        }
        Err(error) => {
            warn!(method = %request.method, url = %request.url, %error, "request failed");
            Outcome::failure(error)
        }
    };
    Execution {
        request,
        curl,
        outcome,
    }
}

async fn send(client: &Client, request: &ResolvedRequest) -> Result<ResponseData, String> {
    let built = to_reqwest(client, request)
        .map_err(|err| err.to_string())?
        .build()
        .map_err(describe_build_error)?;

    let start = Instant::now();
    let response = client.execute(built).await.map_err(describe_error)?;

    let status = response.status();
    let status_text = status.canonical_reason().unwrap_or("Unknown").to_string();
    let headers: Vec<(String, String)> = response
        .headers()
        .iter()
        .map(|(k, v)| (k.to_string(), String::from_utf8_lossy(v.as_bytes()).into_owned()))
        .collect();

    let text = response.text().await.map_err(describe_error)?;
    let duration_ms = start.elapsed().as_millis() as u64;

    Ok(ResponseData {
        status: status.as_u16(),
        status_text,
        headers,
        body: ResponseBody::from_text(text),
        duration_ms,
        received_at: Utc::now(),
    })
}

fn describe_build_error(err: reqwest::Error) -> String {
    let msg = err.to_string();
    if msg.contains("relative URL without a base") {
        return "Invalid URL: missing scheme (try https://)".to_string();
    }
    if err.url().is_none() {
        return format!("Invalid URL: {msg}");
    }
    format!("Invalid request: {msg}")
}

fn describe_error(err: reqwest::Error) -> String {
    if err.is_timeout() {
        return "Request timed out".to_string();
    }
    if err.is_connect() {
        if let Some(host) = err.url().and_then(|url| url.host_str()) {
            return format!("Connection failed: {host}");
        }
        return "Connection failed".to_string();
    }
    if err.is_builder() {
        return describe_build_error(err);
    }
    if err.is_redirect() {
        return "Too many redirects".to_string();
    }
    if err.is_decode() {
        return "Failed to decode response body".to_string();
    }
    format!("Request failed: {err}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(method: &str, url: &str) -> ResolvedRequest {
        ResolvedRequest {
            method: method.into(),
            url: url.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_relative_url_is_failure() {
        let exec = execute(&Client::new(), request("GET", "/no/scheme")).await;
        assert!(exec.outcome.is_failure());
        assert_eq!(exec.curl, "curl '/no/scheme'");
    }

    #[tokio::test]
    async fn test_invalid_method_is_failure() {
        let exec = execute(&Client::new(), request("BAD METHOD", "http://localhost")).await;
        match exec.outcome {
            Outcome::Failure { error } => assert!(error.contains("invalid HTTP method")),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_header_is_failure() {
        let mut req = request("GET", "http://localhost:1");
        req.headers.push(("Bad Header".into(), "v".into()));
        let exec = execute(&Client::new(), req).await;
        assert!(exec.outcome.is_failure());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_failure() {
        let exec = execute(&Client::new(), request("GET", "http://127.0.0.1:1/")).await;
        match exec.outcome {
            Outcome::Failure { error } => assert!(!error.is_empty()),
            other => panic!("expected failure, got {other:?}"),
        }
    }
}
