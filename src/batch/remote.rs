use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{info, warn};

use super::{BatchJob, BatchOutcome, BatchRunner, RunReport};
use crate::config::Config;
use crate::error::{Error, Result};

/// Talks to a runner service over HTTP: `POST <base>/run-collection`.
#[derive(Debug, Clone)]
pub struct RemoteRunner {
    client: Client,
    base_url: String,
}

impl RemoteRunner {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .use_rustls_tls()
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.runner_url.clone(), config.batch_timeout())
    }

    /// Uses `client` as-is; its timeout is the run timeout.
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/run-collection", self.base_url.trim_end_matches('/'))
    }

    async fn post(&self, job: &BatchJob) -> Result<RunReport> {
        let response = self
            .client
            .post(self.endpoint())
            .json(job)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    Error::Timeout
                } else {
                    Error::ExternalService(format!("runner unreachable: {err}"))
                }
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|err| {
            Error::ExternalService(format!("failed to read runner response: {err}"))
        })?;
        let body: Option<Value> = serde_json::from_str(&text).ok();

        if !status.is_success() {
            let error = body
                .as_ref()
                .and_then(|b| b.get("error"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("runner returned {status}"));
            return Err(Error::ExternalService(error));
        }

        let body = body
            .ok_or_else(|| Error::ExternalService("runner response is not JSON".to_string()))?;
        RunReport::from_value(body).map_err(Error::ExternalService)
    }
}

#[async_trait]
impl BatchRunner for RemoteRunner {
    async fn run(&self, job: BatchJob) -> BatchOutcome {
        info!(endpoint = %self.endpoint(), "collection run started");
        match self.post(&job).await {
            Ok(report) => {
                info!(steps = report.steps.len(), passed = report.passed(), "collection run finished");
                BatchOutcome::Report(report)
            }
            Err(error) => {
                warn!(%error, "collection run failed");
                error.into()
            }
        }
    }
}
