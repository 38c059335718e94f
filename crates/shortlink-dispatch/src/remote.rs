// Remote operation adapter seam
//
// Workers only see this trait; the HTTP implementation lives in
// shortlink-http and tests plug in stubs.

use async_trait::async_trait;
use shortlink_contracts::{ShortenUrlRequest, UrlCollection};

use crate::error::RemoteError;

/// The calls a worker can make against the shortlink service.
///
/// Each call enforces its own timeout; the dispatcher never cancels an
/// in-flight call.
#[async_trait]
pub trait RemoteOperations: Send + Sync {
    /// Store a URL and return the created short link
    async fn shorten_url(&self, request: &ShortenUrlRequest) -> Result<UrlCollection, RemoteError>;

    /// Check service health, returning a status string on success
    async fn check_health(&self) -> Result<String, RemoteError>;
}
