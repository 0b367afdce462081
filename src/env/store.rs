use tracing::debug;

use crate::error::{Error, Result};
use crate::state::environment::{EnvVariable, Environment};
use crate::storage::environment as env_storage;

/// The uploaded environments and which one is active.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentStore {
    environments: Vec<Environment>,
    active: Option<usize>,
}

/// A detached copy of one environment. Edits here are invisible until
/// [`EnvironmentStore::commit_edit`].
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentDraft {
    index: usize,
    pub name: String,
    pub variables: Vec<EnvVariable>,
    base: Environment,
}

impl EnvironmentDraft {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn add_variable(&mut self) -> &mut EnvVariable {
        self.variables.push(EnvVariable::default());
        let last = self.variables.len() - 1;
        &mut self.variables[last]
    }

    pub fn remove_variable(&mut self, idx: usize) -> Option<EnvVariable> {
        (idx < self.variables.len()).then(|| self.variables.remove(idx))
    }

    fn into_environment(self) -> Environment {
        Environment {
            name: self.name,
            variables: self.variables,
            rest: self.base.rest,
        }
    }
}

impl EnvironmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn environments(&self) -> &[Environment] {
        &self.environments
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn active(&self) -> Option<&Environment> {
        self.environments.get(self.active?)
    }

    /// Parses and appends an uploaded environment, activating it when nothing
    /// is active yet. Returns its index.
    pub fn upload(&mut self, doc: &str) -> Result<usize> {
        let env = env_storage::parse(doc)?;
        Ok(self.push(env))
    }

    pub fn create(&mut self, name: impl Into<String>) -> usize {
        self.push(Environment::new(name))
    }

    pub fn push(&mut self, env: Environment) -> usize {
        debug!(name = %env.name, variables = env.variables.len(), "environment added");
        self.environments.push(env);
        let idx = self.environments.len() - 1;
        if self.active.is_none() {
            self.active = Some(idx);
        }
        idx
    }

    pub fn select(&mut self, index: usize) -> Result<()> {
        self.check(index)?;
        self.active = Some(index);
        Ok(())
    }

    pub fn begin_edit(&self, index: usize) -> Result<EnvironmentDraft> {
        let env = self
            .environments
            .get(index)
            .ok_or(Error::UnknownEnvironment(index))?;
        Ok(EnvironmentDraft {
            index,
            name: env.name.clone(),
            variables: env.variables.clone(),
            base: env.clone(),
        })
    }

    /// Replaces the environment at the draft's index wholesale.
    pub fn commit_edit(&mut self, draft: EnvironmentDraft) -> Result<()> {
        let index = draft.index;
        let slot = self
            .environments
            .get_mut(index)
            .ok_or(Error::UnknownEnvironment(index))?;
        *slot = draft.into_environment();
        debug!(index, name = %slot.name, "environment saved");
        Ok(())
    }

    pub fn export(&self, index: usize) -> Result<String> {
        self.check(index)?;
        env_storage::to_json(&self.environments[index])
    }

    fn check(&self, index: usize) -> Result<()> {
        if index < self.environments.len() {
            Ok(())
        } else {
            Err(Error::UnknownEnvironment(index))
        }
    }
}
