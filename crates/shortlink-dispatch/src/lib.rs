//! # Shortlink dispatcher
//!
//! A client-side request dispatcher in front of the shortlink service.
//! Callers await `shorten_url` / `check_health`; a self-scaling pool of
//! workers performs the remote calls.
//!
//! ## Architecture
//!
//! ```text
//!  callers ──submit──▶ ┌──────────────────────┐
//!                      │ Dispatch queue (MPMC, │ ◀── backlog ── Pool controller (5s)
//!                      │ bounded, cap 1)       │                    │ grow / shrink
//!                      └──────────┬────────────┘                    ▼
//!                                 │                           ┌────────────┐
//!            ┌────────────────────┼──────────────────┐        │ Pool actor │
//!            ▼                    ▼                  ▼        │ (desired,  │
//!       [Worker 0]           [Worker 1]   ...   [Worker N]◀───│  workers,  │
//!            │                    │                  │        │  counter)  │
//!            └──────── RemoteOperations adapter ─────┘        └────────────┘
//!                                 │
//!                                 ▼
//!                      Result table (id ─▶ oneshot) ──▶ awaiting caller
//! ```
//!
//! - Every unit of work is executed by exactly one worker and delivered to
//!   exactly one caller.
//! - The controller changes capacity by at most one worker per tick. It only
//!   retires workers while the backlog exceeds the desired size, so an idle
//!   pool keeps its workers.
//! - Workers stop cooperatively, between units, never mid-call.

pub mod config;
pub mod controller;
pub mod dispatcher;
pub mod error;
pub mod pool;
pub mod remote;
pub mod results;
pub mod work;
pub mod worker;

pub use config::DispatcherConfig;
pub use controller::{decide, ControlAction};
pub use dispatcher::Dispatcher;
pub use error::{DispatchError, RemoteError, Result};
pub use pool::{PoolHandle, PoolSnapshot};
pub use remote::RemoteOperations;
pub use results::{PendingResult, ResultTable};
pub use work::{CompletedWork, Operation, OperationTag, Output, UnitOfWork};
pub use worker::{WorkerHandle, WorkerState};

// Re-export contract types used in the public API
pub use shortlink_contracts::{ShortenUrlRequest, UrlCollection, ValidationError};
