// Units of work flowing through the dispatcher

use shortlink_contracts::{ShortenUrlRequest, UrlCollection};
use std::time::Instant;
use uuid::Uuid;

use crate::error::RemoteError;

/// Operation discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationTag {
    ShortenUrl,
    HealthCheck,
}

impl OperationTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationTag::ShortenUrl => "shorten_url",
            OperationTag::HealthCheck => "health_check",
        }
    }
}

impl std::fmt::Display for OperationTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An operation together with its input payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    ShortenUrl(ShortenUrlRequest),
    HealthCheck,
}

impl Operation {
    pub fn tag(&self) -> OperationTag {
        match self {
            Operation::ShortenUrl(_) => OperationTag::ShortenUrl,
            Operation::HealthCheck => OperationTag::HealthCheck,
        }
    }
}

/// Operation-specific result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Collection(UrlCollection),
    Health(String),
}

/// A queued request, identified by an id that is never reused
#[derive(Debug)]
pub struct UnitOfWork {
    pub id: Uuid,
    pub operation: Operation,
    pub enqueued_at: Instant,
}

impl UnitOfWork {
    pub fn new(operation: Operation) -> Self {
        Self {
            id: Uuid::now_v7(),
            operation,
            enqueued_at: Instant::now(),
        }
    }

    pub fn tag(&self) -> OperationTag {
        self.operation.tag()
    }

    /// Seal the unit with the adapter's answer. Consumes the unit so it can
    /// only be completed once.
    pub fn complete(self, result: Result<Output, RemoteError>) -> CompletedWork {
        CompletedWork {
            id: self.id,
            tag: self.operation.tag(),
            result,
        }
    }
}

/// A unit of work after execution: output XOR error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedWork {
    pub id: Uuid,
    pub tag: OperationTag,
    pub result: Result<Output, RemoteError>,
}

impl CompletedWork {
    pub fn is_error(&self) -> bool {
        self.result.is_err()
    }
}
