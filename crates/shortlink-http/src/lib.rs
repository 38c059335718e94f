// Shortlink HTTP client
//
// Wires the reqwest adapter into a dispatcher. Most callers only need
// `connect`:
//
//     let dispatcher = shortlink_http::connect(ClientConfig::from_env())?;
//     let link = dispatcher.shorten_url(ShortenUrlRequest::new(url)).await?;

pub mod config;
pub mod remote;

use std::sync::Arc;

use shortlink_dispatch::Dispatcher;

pub use config::{ClientConfig, RemoteConfig, DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT};
pub use remote::{HttpRemote, HEALTHY};

/// Build the HTTP adapter and start a dispatcher in front of it.
///
/// Must be called from within a Tokio runtime.
pub fn connect(config: ClientConfig) -> shortlink_dispatch::Result<Dispatcher> {
    let remote = HttpRemote::new(&config.remote)?;
    tracing::debug!(base_url = %remote.base_url(), "Using shortlink service");

    Ok(Dispatcher::start(config.dispatcher, Arc::new(remote)))
}
