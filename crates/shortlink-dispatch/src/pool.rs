// Pool actor
//
// One task owns every piece of pool state: desired size, live worker
// handles, workers winding down, and the submission counter. Everything
// else talks to it through `PoolHandle`, so updates are serialized without
// locks. The one exception is the submission counter: submitters bump a
// shared atomic in the same poll that completes their enqueue, and the actor
// only reads and resets it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{DispatchError, Result};
use crate::worker::{spawn_worker, WorkerContext, WorkerHandle};

/// Point-in-time view of the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolSnapshot {
    /// Target worker count
    pub desired: usize,
    /// Live workers not asked to stop
    pub actual: usize,
    /// Units queued but not yet picked up
    pub backlog: usize,
    /// Workers asked to stop that are still finishing a unit
    pub retiring: usize,
    /// Submissions in the current window
    pub submissions_in_window: u64,
    /// Submissions in the previous, completed window
    pub submissions_last_window: u64,
}

#[derive(Debug)]
enum PoolCommand {
    Grow,
    Shrink,
    SetDesired(usize),
    ResetSubmissionWindow,
    Snapshot(oneshot::Sender<PoolSnapshot>),
    Shutdown(oneshot::Sender<Vec<JoinHandle<()>>>),
}

/// Cloneable mailbox for the pool actor
#[derive(Debug, Clone)]
pub struct PoolHandle {
    tx: mpsc::Sender<PoolCommand>,
    submissions: Arc<AtomicU64>,
}

impl PoolHandle {
    /// Start exactly one more worker
    pub async fn grow(&self) -> Result<()> {
        self.send(PoolCommand::Grow).await
    }

    /// Ask exactly one worker to stop after its current unit
    pub async fn shrink(&self) -> Result<()> {
        self.send(PoolCommand::Shrink).await
    }

    pub async fn set_desired(&self, desired: usize) -> Result<()> {
        self.send(PoolCommand::SetDesired(desired)).await
    }

    /// Count one accepted submission in the current window. Never blocks.
    pub fn record_submission(&self) {
        self.submissions.fetch_add(1, Ordering::AcqRel);
    }

    pub async fn reset_submission_window(&self) -> Result<()> {
        self.send(PoolCommand::ResetSubmissionWindow).await
    }

    pub async fn snapshot(&self) -> Result<PoolSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.send(PoolCommand::Snapshot(tx)).await?;
        rx.await.map_err(|_| DispatchError::ShutDown)
    }

    /// Stop the actor and collect every worker task it was tracking
    pub async fn shutdown(&self) -> Result<Vec<JoinHandle<()>>> {
        let (tx, rx) = oneshot::channel();
        self.send(PoolCommand::Shutdown(tx)).await?;
        rx.await.map_err(|_| DispatchError::ShutDown)
    }

    async fn send(&self, command: PoolCommand) -> Result<()> {
        self.tx
            .send(command)
            .await
            .map_err(|_| DispatchError::ShutDown)
    }
}

/// Spawn the pool actor with `initial` workers already running
pub fn spawn_pool(
    ctx: WorkerContext,
    initial: usize,
    buffer: usize,
) -> (PoolHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(buffer.max(1));
    let submissions = Arc::new(AtomicU64::new(0));
    let mut actor = PoolActor {
        rx,
        ctx,
        desired: initial,
        workers: Vec::with_capacity(initial),
        retiring: Vec::new(),
        next_worker_id: 0,
        submissions: Arc::clone(&submissions),
        submissions_last_window: 0,
    };

    for _ in 0..initial {
        actor.start_worker();
    }
    info!(workers = initial, "Worker pool started");

    let join = tokio::spawn(actor.run());
    (PoolHandle { tx, submissions }, join)
}

struct PoolActor {
    rx: mpsc::Receiver<PoolCommand>,
    ctx: WorkerContext,
    desired: usize,
    workers: Vec<WorkerHandle>,
    retiring: Vec<WorkerHandle>,
    next_worker_id: usize,
    submissions: Arc<AtomicU64>,
    submissions_last_window: u64,
}

impl PoolActor {
    async fn run(mut self) {
        while let Some(command) = self.rx.recv().await {
            self.reap();

            match command {
                PoolCommand::Grow => self.start_worker(),
                PoolCommand::Shrink => self.stop_worker(),
                PoolCommand::SetDesired(desired) => {
                    info!(from = self.desired, to = desired, "Desired pool size changed");
                    self.desired = desired;
                }
                PoolCommand::ResetSubmissionWindow => {
                    let closed = self.submissions.swap(0, Ordering::AcqRel);
                    if closed > 0 {
                        debug!(submissions = closed, "Submission window closed");
                    }
                    self.submissions_last_window = closed;
                }
                PoolCommand::Snapshot(reply) => {
                    let _ = reply.send(self.snapshot());
                }
                PoolCommand::Shutdown(reply) => {
                    let handles = self
                        .workers
                        .drain(..)
                        .chain(self.retiring.drain(..))
                        .map(WorkerHandle::into_join_handle)
                        .collect();
                    let _ = reply.send(handles);
                    break;
                }
            }
        }

        debug!("Pool actor exited");
    }

    fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            desired: self.desired,
            actual: self.workers.len(),
            backlog: self.ctx.queue.len(),
            retiring: self.retiring.len(),
            submissions_in_window: self.submissions.load(Ordering::Acquire),
            submissions_last_window: self.submissions_last_window,
        }
    }

    fn start_worker(&mut self) {
        let id = self.next_worker_id;
        self.next_worker_id += 1;
        self.workers.push(spawn_worker(id, self.ctx.clone()));
        debug!(worker_id = id, actual = self.workers.len(), "Worker spawned");
    }

    fn stop_worker(&mut self) {
        // Newest worker goes first
        let Some(worker) = self.workers.pop() else {
            warn!("Shrink requested with no live workers");
            return;
        };

        worker.request_stop();
        debug!(
            worker_id = worker.id(),
            actual = self.workers.len(),
            "Worker asked to stop"
        );
        self.retiring.push(worker);
    }

    /// Drop handles of workers whose task has ended
    fn reap(&mut self) {
        self.retiring.retain(|w| !w.is_finished());
        self.workers.retain(|w| {
            if w.is_finished() {
                warn!(worker_id = w.id(), "Worker exited without a stop request");
                false
            } else {
                true
            }
        });
    }
}
