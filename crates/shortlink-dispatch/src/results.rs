// Result correlation
//
// Every submitted unit registers a one-shot slot under its id before it is
// enqueued. The worker that executes the unit removes the slot and fulfils
// it, so an id is present from submission until completion and absent
// afterwards. Dropping the caller's `PendingResult` removes the slot, which
// makes an in-progress wait cancellable.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DispatchError, Result};
use crate::work::CompletedWork;

/// Pending completions keyed by unit id
#[derive(Debug, Default)]
pub struct ResultTable {
    pending: DashMap<Uuid, oneshot::Sender<CompletedWork>>,
}

impl ResultTable {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Open a slot for `id`. Fails if the id is already pending.
    pub fn register(self: &Arc<Self>, id: Uuid) -> Result<PendingResult> {
        match self.pending.entry(id) {
            Entry::Occupied(_) => Err(DispatchError::DuplicateId(id)),
            Entry::Vacant(slot) => {
                let (tx, rx) = oneshot::channel();
                slot.insert(tx);
                Ok(PendingResult {
                    id,
                    rx,
                    table: Arc::clone(self),
                })
            }
        }
    }

    /// Deliver a completion to its caller.
    ///
    /// Returns false when nobody is waiting any more (the caller gave up or
    /// timed out); the completion is dropped in that case.
    pub fn complete(&self, work: CompletedWork) -> bool {
        let id = work.id;
        match self.pending.remove(&id) {
            Some((_, tx)) => {
                if tx.send(work).is_err() {
                    debug!(%id, "Caller dropped before result was delivered");
                    return false;
                }
                true
            }
            None => {
                debug!(%id, "Discarding result for abandoned unit of work");
                false
            }
        }
    }

    /// Drop every open slot; their callers see `Abandoned`
    pub fn clear(&self) {
        let open = self.pending.len();
        if open > 0 {
            debug!(open, "Abandoning pending results");
        }
        self.pending.clear();
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.pending.contains_key(id)
    }

    /// Number of units submitted but not yet completed
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// The caller's side of a registered slot
#[derive(Debug)]
pub struct PendingResult {
    id: Uuid,
    rx: oneshot::Receiver<CompletedWork>,
    table: Arc<ResultTable>,
}

impl PendingResult {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Wait for the worker's completion.
    ///
    /// Fails with [`DispatchError::Abandoned`] if the slot's sender was
    /// dropped without a result.
    pub async fn wait(mut self) -> Result<CompletedWork> {
        let id = self.id;
        (&mut self.rx)
            .await
            .map_err(|_| DispatchError::Abandoned(id))
    }
}

impl Drop for PendingResult {
    fn drop(&mut self) {
        self.table.pending.remove(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RemoteError;
    use crate::work::{Operation, Output, UnitOfWork};

    #[tokio::test]
    async fn test_complete_delivers_once_and_clears_slot() {
        let table = ResultTable::new();
        let unit = UnitOfWork::new(Operation::HealthCheck);
        let pending = table.register(unit.id).unwrap();
        assert!(table.contains(&unit.id));

        let id = unit.id;
        assert!(table.complete(unit.complete(Ok(Output::Health("success".into())))));
        assert!(!table.contains(&id));

        let done = pending.wait().await.unwrap();
        assert_eq!(done.id, id);
        assert_eq!(done.result, Ok(Output::Health("success".into())));
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_registration_rejected() {
        let table = ResultTable::new();
        let id = Uuid::now_v7();
        let _first = table.register(id).unwrap();

        assert!(matches!(
            table.register(id),
            Err(DispatchError::DuplicateId(dup)) if dup == id
        ));
        assert_eq!(table.len(), 1);
    }

    #[tokio::test]
    async fn test_dropping_pending_removes_slot() {
        let table = ResultTable::new();
        let unit = UnitOfWork::new(Operation::HealthCheck);
        let pending = table.register(unit.id).unwrap();
        drop(pending);

        assert!(table.is_empty());
        assert!(!table.complete(unit.complete(Err(RemoteError::transport("late")))));
    }

    #[tokio::test]
    async fn test_clear_abandons_waiters() {
        let table = ResultTable::new();
        let id = Uuid::now_v7();
        let pending = table.register(id).unwrap();

        table.clear();
        assert!(matches!(
            pending.wait().await,
            Err(DispatchError::Abandoned(abandoned)) if abandoned == id
        ));
    }

    #[tokio::test]
    async fn test_second_completion_is_discarded() {
        let table = ResultTable::new();
        let id = Uuid::now_v7();
        let pending = table.register(id).unwrap();

        let done = CompletedWork {
            id,
            tag: crate::work::OperationTag::HealthCheck,
            result: Ok(Output::Health("success".into())),
        };
        assert!(table.complete(done.clone()));
        assert!(!table.complete(done));
        assert!(pending.wait().await.is_ok());
    }
}
