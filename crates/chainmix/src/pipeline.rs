//! Pipeline Builder: composes forwarding stages into a linear chain.
//!
//! A pipeline is built fresh for every repetition. Tokens go in at
//! [`Pipeline::entry`] and come out, in the same order, at
//! [`Pipeline::exit`]. Every stage task lives in the pipeline's
//! [`PipelineTasks`], so whoever drives the pipeline can prove that all of
//! them have finished before moving on.
//!
//! Despite the benchmark's "ring" terminology the chain is never closed into
//! a cycle: the exit is handed to the caller, not fed back to the entry.

use crate::{Error, Result, conduit::Token, stage::spawn_stage};
use tokio::{sync::mpsc, task::JoinSet};
use tokio_util::sync::CancellationToken;

/// A freshly built chain of `ring_size` forwarding stages.
pub struct Pipeline {
    /// Sending half of the first conduit in the chain.
    pub entry: mpsc::Sender<Token>,
    /// Receiving half of the last conduit in the chain. For an empty chain
    /// this is the other half of `entry`'s own conduit.
    pub exit: mpsc::Receiver<Token>,
    /// The stage tasks, to be joined once the sentinel has gone through.
    pub tasks: PipelineTasks,
}

impl Pipeline {
    /// Allocates an entry conduit of `capacity` slots and chains `ring_size`
    /// stages behind it, each with an output conduit of the same capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or if called outside of a tokio runtime.
    pub fn build(ring_size: usize, capacity: usize, cancel: &CancellationToken) -> Self {
        let (entry, mut exit) = mpsc::channel(capacity);
        let mut tasks = JoinSet::new();

        for stage_id in 0..ring_size {
            exit = spawn_stage(stage_id, exit, capacity, cancel, &mut tasks);
        }

        Self {
            entry,
            exit,
            tasks: PipelineTasks { tasks, ring_size },
        }
    }
}

/// Tasks belonging to one pipeline: its stages, plus any helper tasks the
/// driver attaches (such as the exit monitor).
pub struct PipelineTasks {
    tasks: JoinSet<Result<u64>>,
    ring_size: usize,
}

impl PipelineTasks {
    /// Number of forwarding stages in the chain.
    pub const fn ring_size(&self) -> usize {
        self.ring_size
    }

    /// Number of tasks that have not been joined yet.
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Attaches another task to this pipeline's lifetime.
    pub fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = Result<u64>> + Send + 'static,
    {
        self.tasks.spawn(task);
    }

    /// Joins every task. All tasks are awaited even after a failure; the
    /// first error encountered is returned.
    ///
    /// # Errors
    ///
    /// Returns the first task error, or [`Error::TaskFailed`] if a task
    /// panicked.
    pub async fn join(mut self) -> Result<()> {
        let mut first_err = None;

        while let Some(joined) = self.tasks.join_next().await {
            let outcome = joined.map_err(Error::from).and_then(|res| res);
            if let Err(e) = outcome {
                first_err.get_or_insert(e);
            }
        }

        first_err.map_or(Ok(()), Err)
    }
}
