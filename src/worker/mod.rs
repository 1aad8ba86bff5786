//! Background execution for handlers
//!
//! A [`WorkerManager`] creates named [`TaskRunner`]s; each runner is one OS
//! thread that executes posted tasks in order. Handlers hold their runner
//! in a [`LazyRunner`] so it is created on the first asynchronous request
//! and never twice.

pub mod runner;

pub use runner::{Task, TaskRunner};

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("task runner '{0}' has been terminated")]
    Terminated(String),

    #[error("failed to spawn runner thread: {0}")]
    Spawn(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, WorkerError>;

/// Creates and owns the task runners of one engine instance
#[derive(Default)]
pub struct WorkerManager {
    runners: Mutex<Vec<Arc<TaskRunner>>>,
    created: AtomicUsize,
}

impl WorkerManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_task_runner(&self, name: &str) -> Result<Arc<TaskRunner>> {
        let runner = Arc::new(TaskRunner::spawn(name)?);
        self.created.fetch_add(1, Ordering::SeqCst);
        self.runners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(runner.clone());

        info!(runner = name, "Created task runner");
        Ok(runner)
    }

    /// Number of runners created so far
    pub fn runner_count(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Terminate every runner, letting queued tasks finish
    pub fn terminate(&self) {
        let runners = std::mem::take(
            &mut *self.runners.lock().unwrap_or_else(PoisonError::into_inner),
        );
        for runner in runners {
            debug!(runner = runner.name(), "Terminating task runner");
            runner.terminate();
        }
    }
}

impl fmt::Debug for WorkerManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerManager")
            .field("runner_count", &self.runner_count())
            .finish()
    }
}

impl Drop for WorkerManager {
    fn drop(&mut self) {
        self.terminate();
    }
}

/// Runner slot created on first use
///
/// The check for an existing runner, its creation and its storage happen
/// under one lock, so concurrent first callers share a single runner.
pub struct LazyRunner {
    name: String,
    slot: Mutex<Option<Arc<TaskRunner>>>,
}

impl LazyRunner {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slot: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get_or_create(&self, workers: &WorkerManager) -> Result<Arc<TaskRunner>> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(runner) = slot.as_ref() {
            return Ok(runner.clone());
        }

        let runner = workers.create_task_runner(&self.name)?;
        *slot = Some(runner.clone());
        Ok(runner)
    }

    pub fn is_created(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl fmt::Debug for LazyRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyRunner")
            .field("name", &self.name)
            .field("created", &self.is_created())
            .finish()
    }
}
