use std::io::Write;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::{BatchJob, BatchOutcome, BatchRunner, RunReport};
use crate::config::Config;
use crate::error::{Error, Result};

/// Per-request timeout handed to newman.
const REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Runs collections with a local `newman` install. The collection and
/// environment are staged as temp files that are removed once the run ends,
/// whatever the result.
#[derive(Debug, Clone)]
pub struct NewmanRunner {
    bin: String,
    timeout: Duration,
    max_payload_bytes: usize,
}

impl NewmanRunner {
    pub fn new(bin: impl Into<String>, timeout: Duration, max_payload_bytes: usize) -> Self {
        Self {
            bin: bin.into(),
            timeout,
            max_payload_bytes,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.newman_bin.clone(),
            config.batch_timeout(),
            config.max_payload_bytes,
        )
    }

    async fn execute(&self, job: &BatchJob) -> Result<RunReport> {
        let collection = serde_json::to_vec_pretty(&job.collection)?;
        let environment = job
            .environment
            .as_ref()
            .map(serde_json::to_vec_pretty)
            .transpose()?;

        let size = collection.len() + environment.as_ref().map_or(0, Vec::len);
        if size > self.max_payload_bytes {
            return Err(Error::ExternalService(format!(
                "payload of {size} bytes exceeds the {} byte limit",
                self.max_payload_bytes
            )));
        }

        let collection_file = stage("courier-collection-", &collection)?;
        let environment_file = environment
            .as_deref()
            .map(|bytes| stage("courier-environment-", bytes))
            .transpose()?;
        let report_file = stage("courier-report-", b"")?;

        let mut command = Command::new(&self.bin);
        command.arg("run").arg(collection_file.path());
        if let Some(file) = &environment_file {
            command.arg("--environment").arg(file.path());
        }
        command
            .args(["--reporters", "json", "--reporter-json-export"])
            .arg(report_file.path())
            .arg("--timeout-request")
            .arg(REQUEST_TIMEOUT_MS.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(bin = %self.bin, collection = %collection_file.path().display(), "spawning newman");
        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Err(_) => return Err(Error::Timeout),
            Ok(Err(err)) => {
                return Err(Error::ExternalService(format!(
                    "failed to start {}: {err}",
                    self.bin
                )));
            }
            Ok(Ok(output)) => output,
        };

        // Failing assertions also exit non-zero, so prefer the exported report.
        let exported = tokio::fs::read_to_string(report_file.path())
            .await
            .ok()
            .and_then(|text| serde_json::from_str::<Value>(&text).ok());
        match exported {
            Some(summary) => RunReport::from_value(summary).map_err(Error::ExternalService),
            None if !output.status.success() => {
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                if stderr.is_empty() {
                    Err(Error::ExternalService(format!(
                        "{} exited with {}",
                        self.bin, output.status
                    )))
                } else {
                    Err(Error::ExternalService(stderr))
                }
            }
            None => Err(Error::ExternalService("newman produced no report".to_string())),
        }
    }
}

impl Default for NewmanRunner {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

fn stage(prefix: &str, contents: &[u8]) -> Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix(prefix)
        .suffix(".json")
        .tempfile()?;
    file.write_all(contents)?;
    file.flush()?;
    Ok(file)
}

#[async_trait]
impl BatchRunner for NewmanRunner {
    async fn run(&self, job: BatchJob) -> BatchOutcome {
        info!(bin = %self.bin, "collection run started");
        match self.execute(&job).await {
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn job() -> BatchJob {
        BatchJob {
            collection: json!({"info": {"name": "c"}, "item": []}),
            environment: None,
        }
    }

    #[tokio::test]
    async fn test_oversized_payload_rejected() {
        let runner = NewmanRunner::new("newman", Duration::from_secs(5), 8);
        match runner.run(job()).await {
            BatchOutcome::Error { error } => assert!(error.contains("exceeds")),
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_binary_is_error_outcome() {
        let runner = NewmanRunner::new(
            "courier-test-no-such-newman-binary",
            Duration::from_secs(5),
            1024,
        );
        match runner.run(job()).await {
            BatchOutcome::Error { error } => assert!(error.contains("failed to start")),
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_execute_reports_typed_errors() {
        let runner = NewmanRunner::new("newman", Duration::from_secs(5), 8);
        assert!(matches!(
            runner.execute(&job()).await,
            Err(Error::ExternalService(msg)) if msg.contains("exceeds")
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exported_report_wins_over_exit_status() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("fake-newman");
        std::fs::write(
            &bin,
            r#"#!/bin/sh
while [ "$#" -gt 0 ]; do
  if [ "$1" = "--reporter-json-export" ]; then
    printf '%s' '{"steps":[{"name":"Ping","status":"fail","request":{},"assertions":[]}]}' > "$2"
  fi
  shift
done
exit 1
"#,
        )
        .unwrap();
        std::fs::set_permissions(&bin, std::fs::Permissions::from_mode(0o755)).unwrap();

        let runner = NewmanRunner::new(bin.to_string_lossy(), Duration::from_secs(10), 1024);
        let report = runner.execute(&job()).await.unwrap();
        assert_eq!(report.steps.len(), 1);
        assert_eq!(report.steps[0].name, "Ping");
        assert!(!report.passed());
    }

    #[test]
    fn test_staged_file_is_removed_on_drop() {
        let file = stage("courier-test-", b"{}").unwrap();
        let path = file.path().to_path_buf();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
        drop(file);
        assert!(!path.exists());
    }
}
