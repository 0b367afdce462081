use std::sync::Arc;

use reqwest::Client;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::batch::{BatchJob, BatchRunner, RemoteRunner};
use crate::config::Config;
use crate::env::store::EnvironmentStore;
use crate::error::{Error, Result};
use crate::event::Event;
use crate::http::{client::build_client, executor};
use crate::state::request_state::RequestId;
use crate::state::tree::CollectionTree;

/// Owns the editable state and launches runs.
///
/// Edits are plain `&mut self` calls on [`App::tree`] and [`App::environments`].
/// Every run works on clones taken when it is started and reports back through
/// the event channel, so later edits never reach an in-flight run.
pub struct App {
    pub tree: CollectionTree,
    pub environments: EnvironmentStore,
    client: Client,
    runner: Arc<dyn BatchRunner>,
    tx: UnboundedSender<Event>,
}

impl App {
    /// Direct client and remote runner configured from `config`.
    pub fn new(config: &Config, tx: UnboundedSender<Event>) -> Result<Self> {
        let client = build_client(config)?;
        let runner = Arc::new(RemoteRunner::from_config(config)?);
        Ok(Self::with_parts(client, runner, tx))
    }

    pub fn with_parts(client: Client, runner: Arc<dyn BatchRunner>, tx: UnboundedSender<Event>) -> Self {
        Self {
            tree: CollectionTree::new(),
            environments: EnvironmentStore::new(),
            client,
            runner,
            tx,
        }
    }

    /// Sends request `id` directly with the active environment.
    pub fn run_request(&self, id: RequestId) -> Result<JoinHandle<()>> {
        let item = self
            .tree
            .request(id)
            .cloned()
            .ok_or_else(|| Error::UnknownRequest(id.to_string()))?;
        let env = self.environments.active().cloned();
        let client = self.client.clone();
        let tx = self.tx.clone();

        info!(request = %item.name, "request started");
        Ok(tokio::spawn(async move {
            let execution = executor::run(&client, &item, env.as_ref()).await;
            let _ = tx.send(Event::RequestFinished {
                request_id: id,
                execution,
            });
        }))
    }

    pub fn run_selected(&self) -> Result<JoinHandle<()>> {
        let id = self.tree.selection().request.ok_or(Error::NoSelection)?;
        self.run_request(id)
    }

    /// Hands the exported collection and the active environment to the runner.
    pub fn run_collection(&self) -> Result<JoinHandle<()>> {
        let collection = self.tree.export().ok_or(Error::NoCollection)?;
        Ok(self.spawn_batch(collection, None))
    }

    /// Runs one request through the batch runner as a one-item collection.
    pub fn run_request_in_runner(&self, id: RequestId) -> Result<JoinHandle<()>> {
        let collection = self.tree.single_request_collection(id)?;
        Ok(self.spawn_batch(collection, Some(id)))
    }

    fn spawn_batch(&self, collection: serde_json::Value, request_id: Option<RequestId>) -> JoinHandle<()> {
        let job = BatchJob {
            collection,
            environment: self.environments.active().cloned(),
        };
        let runner = Arc::clone(&self.runner);
        let tx = self.tx.clone();

        debug!(single = request_id.is_some(), "batch run spawned");
        tokio::spawn(async move {
            let outcome = runner.run(job).await;
            let _ = tx.send(Event::CollectionFinished {
                request_id,
                outcome,
            });
        })
    }
}
