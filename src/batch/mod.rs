//! Whole-collection runs delegated to an external runner.

pub mod newman;
pub mod remote;
pub mod report;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::error::Error;
use crate::state::environment::Environment;

pub use newman::NewmanRunner;
pub use remote::RemoteRunner;
pub use report::{AssertionResult, RunReport, StepReport, StepStatus};

/// Everything a run needs, passed explicitly. Serialises as
/// `{collection, environment?}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchJob {
    pub collection: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<Environment>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BatchOutcome {
    Report(RunReport),
    Error { error: String },
}

impl BatchOutcome {
    pub fn error(error: impl Into<String>) -> Self {
        BatchOutcome::Error {
            error: error.into(),
        }
    }

    pub fn report(&self) -> Option<&RunReport> {
        match self {
            BatchOutcome::Report(report) => Some(report),
            BatchOutcome::Error { .. } => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, BatchOutcome::Error { .. })
    }
}

impl From<Error> for BatchOutcome {
    fn from(err: Error) -> Self {
        BatchOutcome::error(err.to_string())
    }
}

/// Executes a full collection and reports per step. Implementations never
/// fail: problems come back as [`BatchOutcome::Error`].
#[async_trait]
pub trait BatchRunner: Send + Sync {
    async fn run(&self, job: BatchJob) -> BatchOutcome;
}
