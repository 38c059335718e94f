// Dispatcher facade
//
// Callers submit an operation and await its result. Under the hood the unit
// of work is registered in the result table, pushed onto the bounded dispatch
// queue (blocking while it is full), executed by whichever worker picks it
// up, and handed back through its result slot.

use futures::future::join_all;
use shortlink_contracts::{
    validate_url_exists, validate_url_length, validate_url_syntax, ShortenUrlRequest,
    UrlCollection,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::config::DispatcherConfig;
use crate::controller::{run_controller, run_submission_window};
use crate::error::{DispatchError, Result};
use crate::pool::{spawn_pool, PoolHandle, PoolSnapshot};
use crate::remote::RemoteOperations;
use crate::results::ResultTable;
use crate::work::{Operation, OperationTag, Output, UnitOfWork};
use crate::worker::WorkerContext;

/// Handle to a running dispatcher. Cheap to clone; all clones share the same
/// queue, pool and result table.
///
/// # Example
///
/// ```ignore
/// use shortlink_dispatch::{Dispatcher, DispatcherConfig};
///
/// let dispatcher = Dispatcher::start(DispatcherConfig::new().with_pool_size(10), remote);
///
/// let healthy = dispatcher.check_health().await?;
/// let link = dispatcher
///     .shorten_url(ShortenUrlRequest::new("https://www.google.com/search?q=rust"))
///     .await?;
/// println!("{}", link.compose_url_string());
///
/// dispatcher.shutdown().await?;
/// ```
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

struct Inner {
    config: DispatcherConfig,
    queue: async_channel::Sender<UnitOfWork>,
    results: Arc<ResultTable>,
    pool: PoolHandle,
    shutdown_tx: watch::Sender<bool>,
    background: Mutex<Vec<JoinHandle<()>>>,
}

impl Dispatcher {
    /// Spawn the pool actor, its initial workers, the controller and the
    /// submission window task.
    ///
    /// # Panics
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(config: DispatcherConfig, remote: Arc<dyn RemoteOperations>) -> Self {
        let (queue_tx, queue_rx) = async_channel::bounded(config.queue_capacity.max(1));
        let results = ResultTable::new();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let ctx = WorkerContext {
            queue: queue_rx,
            remote,
            results: Arc::clone(&results),
        };
        let (pool, actor) = spawn_pool(ctx, config.initial_pool_size, config.command_buffer);

        let controller = tokio::spawn(run_controller(
            pool.clone(),
            config.control_interval,
            shutdown_rx.clone(),
        ));
        let window = tokio::spawn(run_submission_window(
            pool.clone(),
            config.submission_window,
            shutdown_rx,
        ));

        info!(
            pool_size = config.initial_pool_size,
            queue_capacity = config.queue_capacity,
            control_interval_ms = config.control_interval.as_millis() as u64,
            "Dispatcher started"
        );

        Self {
            inner: Arc::new(Inner {
                config,
                queue: queue_tx,
                results,
                pool,
                shutdown_tx,
                background: Mutex::new(vec![actor, controller, window]),
            }),
        }
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.inner.config
    }

    /// Shorten a URL through the worker pool
    pub async fn shorten_url(&self, request: ShortenUrlRequest) -> Result<UrlCollection> {
        match self.submit(Operation::ShortenUrl(request)).await? {
            Output::Collection(collection) => Ok(collection),
            Output::Health(_) => Err(DispatchError::UnexpectedOutput(
                OperationTag::ShortenUrl.as_str(),
            )),
        }
    }

    /// Check remote health through the worker pool. `Ok(true)` on success;
    /// an unhealthy service surfaces as an error carrying its response body.
    pub async fn check_health(&self) -> Result<bool> {
        match self.submit(Operation::HealthCheck).await? {
            Output::Health(_) => Ok(true),
            Output::Collection(_) => Err(DispatchError::UnexpectedOutput(
                OperationTag::HealthCheck.as_str(),
            )),
        }
    }

    /// Submit an operation using the configured default deadline
    pub async fn submit(&self, operation: Operation) -> Result<Output> {
        match self.inner.config.result_timeout {
            Some(deadline) => self.submit_with_deadline(operation, deadline).await,
            None => self.run(operation).await,
        }
    }

    /// Submit an operation, failing with [`DispatchError::Timeout`] if no
    /// result arrives within `deadline`. The deadline covers validation,
    /// enqueueing and waiting.
    pub async fn submit_with_deadline(
        &self,
        operation: Operation,
        deadline: Duration,
    ) -> Result<Output> {
        match tokio::time::timeout(deadline, self.run(operation)).await {
            Ok(result) => result,
            Err(_) => Err(DispatchError::Timeout { waited: deadline }),
        }
    }

    /// Change the desired worker count. The controller converges toward it
    /// one worker per tick.
    pub async fn set_pool_size(&self, desired: usize) -> Result<()> {
        self.inner.pool.set_desired(desired).await
    }

    pub async fn pool_stats(&self) -> Result<PoolSnapshot> {
        self.inner.pool.snapshot().await
    }

    /// Units submitted and still waiting for a worker's result
    pub fn pending_results(&self) -> usize {
        self.inner.results.len()
    }

    /// Stop accepting work, let workers drain the queue, and wait for every
    /// background task to finish (up to the configured shutdown timeout).
    ///
    /// Callers still waiting once the workers are gone receive
    /// [`DispatchError::Abandoned`].
    pub async fn shutdown(&self) -> Result<()> {
        info!(
            pending = self.inner.results.len(),
            "Initiating dispatcher shutdown"
        );

        // Phase 1: stop the controller and window tasks, refuse new units
        let _ = self.inner.shutdown_tx.send(true);
        self.inner.queue.close();

        // Phase 2: collect workers from the pool actor
        let workers = match self.inner.pool.shutdown().await {
            Ok(handles) => handles,
            Err(_) => {
                debug!("Pool actor already stopped");
                Vec::new()
            }
        };
        let background = self
            .inner
            .background
            .lock()
            .map(|mut guard| std::mem::take(&mut *guard))
            .unwrap_or_default();

        // Phase 3: wait for queued units to drain
        let worker_count = workers.len();
        let tasks = workers.into_iter().chain(background);
        let outcome =
            tokio::time::timeout(self.inner.config.shutdown_timeout, join_all(tasks)).await;

        self.inner.results.clear();

        match outcome {
            Ok(_) => {
                info!(workers = worker_count, "Dispatcher stopped");
                Ok(())
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.inner.config.shutdown_timeout.as_millis() as u64,
                    "Dispatcher shutdown timed out"
                );
                Err(DispatchError::ShutdownTimeout)
            }
        }
    }

    #[instrument(skip(self, operation), fields(operation = %operation.tag()))]
    async fn run(&self, operation: Operation) -> Result<Output> {
        if let Operation::ShortenUrl(request) = &operation {
            self.validate(request).await?;
        }

        let unit = UnitOfWork::new(operation);
        let id = unit.id;
        let pending = self.inner.results.register(id)?;

        self.inner
            .queue
            .send(unit)
            .await
            .map_err(|_| DispatchError::ShutDown)?;
        // No await between the enqueue and the count
        self.inner.pool.record_submission();
        debug!(%id, "Unit of work enqueued");

        let completed = pending.wait().await?;
        completed.result.map_err(DispatchError::from)
    }

    async fn validate(&self, request: &ShortenUrlRequest) -> Result<()> {
        let config = &self.inner.config;
        if config.validate_urls {
            validate_url_length(&request.url)?;
            validate_url_syntax(&request.url)?;
        }
        if config.check_host_exists {
            validate_url_exists(&request.url).await?;
        }
        Ok(())
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        // Background tasks observe the signal (or the dropped sender) and
        // exit; workers drain what is queued, then see the closed queue.
        let _ = self.shutdown_tx.send(true);
        self.queue.close();
    }
}
