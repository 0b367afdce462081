use crate::batch::BatchOutcome;
use crate::state::request_state::RequestId;
use crate::state::response_state::Execution;

/// Results of spawned runs, delivered over the app's channel.
#[derive(Debug)]
pub enum Event {
    RequestFinished {
        request_id: RequestId,
        execution: Execution,
    },
    /// `request_id` is set when a single request was sent through the runner.
    CollectionFinished {
        request_id: Option<RequestId>,
        outcome: BatchOutcome,
    },
}
