//! Task runner - one named thread draining a queue of tasks in order

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use super::{Result, WorkerError};

/// Zero-argument unit of work; nothing is awaited by the poster
pub type Task = Box<dyn FnOnce() + Send + 'static>;

pub struct TaskRunner {
    name: String,
    sender: Mutex<Option<mpsc::UnboundedSender<Task>>>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl TaskRunner {
    pub(crate) fn spawn(name: &str) -> Result<Self> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Task>();
        let thread_name = name.to_string();

        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                debug!(runner = %thread_name, "Task runner started");
                while let Some(task) = rx.blocking_recv() {
                    if catch_unwind(AssertUnwindSafe(task)).is_err() {
                        error!(runner = %thread_name, "Task panicked");
                    }
                }
                debug!(runner = %thread_name, "Task runner stopped");
            })?;

        Ok(Self {
            name: name.to_string(),
            sender: Mutex::new(Some(tx)),
            thread: Mutex::new(Some(handle)),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue `task` behind everything already posted
    ///
    /// A task posted after [`terminate`](Self::terminate) is dropped without
    /// running and `WorkerError::Terminated` is returned.
    pub fn post_task(&self, task: impl FnOnce() + Send + 'static) -> Result<()> {
        let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        match sender.as_ref() {
            Some(tx) => tx
                .send(Box::new(task))
                .map_err(|_| WorkerError::Terminated(self.name.clone())),
            None => {
                warn!(runner = %self.name, "Task posted to terminated runner");
                Err(WorkerError::Terminated(self.name.clone()))
            }
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Stop accepting tasks and wait for the queued ones to finish
    ///
    /// Called from the runner's own thread it only stops accepting tasks.
    pub fn terminate(&self) {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let handle = self
            .thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.thread().id() == thread::current().id() {
                return;
            }
            if handle.join().is_err() {
                error!(runner = %self.name, "Task runner thread panicked");
            }
        }
    }
}

impl fmt::Debug for TaskRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskRunner")
            .field("name", &self.name)
            .field("terminated", &self.is_terminated())
            .finish()
    }
}

impl Drop for TaskRunner {
    fn drop(&mut self) {
        self.terminate();
    }
}
