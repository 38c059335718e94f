// Worker task
//
// A worker pulls one unit at a time off the shared dispatch queue, runs it
// against the remote adapter and publishes the completion into the result
// table. Stop requests are only honoured between units. A panicking adapter
// call completes its unit with an error instead of taking the worker down.

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, trace, warn};

use crate::error::RemoteError;
use crate::remote::RemoteOperations;
use crate::results::ResultTable;
use crate::work::{Operation, Output, UnitOfWork};

/// Worker lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Pulling and executing units
    Running,
    /// Asked to stop; exits once the current unit (if any) is done
    StopRequested,
    /// Loop has exited
    Stopped,
}

/// What every worker shares
#[derive(Clone)]
pub struct WorkerContext {
    pub queue: async_channel::Receiver<UnitOfWork>,
    pub remote: Arc<dyn RemoteOperations>,
    pub results: Arc<ResultTable>,
}

/// The pool's grip on a running worker
#[derive(Debug)]
pub struct WorkerHandle {
    id: usize,
    state: Arc<watch::Sender<WorkerState>>,
    join: JoinHandle<()>,
}

impl WorkerHandle {
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn state(&self) -> WorkerState {
        *self.state.borrow()
    }

    /// Move a running worker to `StopRequested`. Returns false if it was
    /// already stopping or stopped.
    pub fn request_stop(&self) -> bool {
        self.state.send_if_modified(|state| {
            if *state == WorkerState::Running {
                *state = WorkerState::StopRequested;
                true
            } else {
                false
            }
        })
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    pub fn into_join_handle(self) -> JoinHandle<()> {
        self.join
    }
}

/// Spawn a worker loop on the current runtime
pub fn spawn_worker(id: usize, ctx: WorkerContext) -> WorkerHandle {
    let (state_tx, _) = watch::channel(WorkerState::Running);
    let state = Arc::new(state_tx);
    let join = tokio::spawn(run_worker(id, ctx, Arc::clone(&state)));

    WorkerHandle { id, state, join }
}

async fn run_worker(worker_id: usize, ctx: WorkerContext, state: Arc<watch::Sender<WorkerState>>) {
    let mut state_rx = state.subscribe();
    debug!(worker_id, "Worker started");

    loop {
        if *state_rx.borrow_and_update() != WorkerState::Running {
            debug!(worker_id, "Worker honouring stop request");
            break;
        }

        let unit = tokio::select! {
            biased;
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                continue;
            }
            received = ctx.queue.recv() => match received {
                Ok(unit) => unit,
                Err(_) => {
                    debug!(worker_id, "Dispatch queue closed");
                    break;
                }
            },
        };

        execute(worker_id, &ctx, unit).await;
    }

    state.send_replace(WorkerState::Stopped);
    debug!(worker_id, "Worker stopped");
}

async fn execute(worker_id: usize, ctx: &WorkerContext, unit: UnitOfWork) {
    let id = unit.id;
    let tag = unit.tag();
    trace!(
        worker_id,
        %id,
        operation = %tag,
        queued_ms = unit.enqueued_at.elapsed().as_millis() as u64,
        "Executing unit of work"
    );

    let call = async {
        match &unit.operation {
            Operation::ShortenUrl(request) => ctx
                .remote
                .shorten_url(request)
                .await
                .map(Output::Collection),
            Operation::HealthCheck => ctx.remote.check_health().await.map(Output::Health),
        }
    };

    let result = match AssertUnwindSafe(call).catch_unwind().await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => {
            warn!(worker_id, %id, operation = %tag, error = %e, "Remote operation failed");
            Err(e)
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(worker_id, %id, operation = %tag, panic = %message, "Remote operation panicked");
            Err(RemoteError::panicked(message))
        }
    };

    ctx.results.complete(unit.complete(result));
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
