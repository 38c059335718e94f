// shortlink demo client
//
// Checks service health, then shortens a batch of URLs through the
// dispatcher and prints each composed short link.
//
// Configure via environment variables (a .env file is loaded first):
// - SHORTLINK_BASE_URL: service root (default: staging)
// - SHORTLINK_POOL_SIZE: worker count (default for the demo: 10)
// - SHORTLINK_DEMO_COUNT: number of URLs to shorten (default: 100)
// - RUST_LOG: log filter (default: "shortlink=info,shortlink_dispatch=info")

use anyhow::{Context, Result};
use futures::future::join_all;
use shortlink_contracts::ShortenUrlRequest;
use shortlink_http::{connect, ClientConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEMO_POOL_SIZE: usize = 10;
const DEFAULT_DEMO_COUNT: usize = 100;
const DEMO_URL: &str = "https://www.google.com/search?q=hello+world&oq=hello+world&aqs=chrome..69i57j0l7.1001j0j7&sourceid=chrome&ie=UTF-";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shortlink=info,shortlink_dispatch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = ClientConfig::from_env();
    if std::env::var("SHORTLINK_POOL_SIZE").is_err() {
        config.dispatcher = config.dispatcher.with_pool_size(DEMO_POOL_SIZE);
    }
    let count = match std::env::var("SHORTLINK_DEMO_COUNT") {
        Ok(raw) => raw
            .trim()
            .parse::<usize>()
            .with_context(|| format!("Invalid SHORTLINK_DEMO_COUNT: {raw}"))?,
        Err(_) => DEFAULT_DEMO_COUNT,
    };

    tracing::info!(
        base_url = %config.remote.base_url,
        pool_size = config.dispatcher.initial_pool_size,
        count,
        "shortlink demo starting"
    );

    let dispatcher = connect(config).context("Failed to start dispatcher")?;

    dispatcher
        .check_health()
        .await
        .context("Shortlink service is unhealthy")?;
    tracing::info!("Shortlink service healthy");

    let requests = (0..count).map(|i| {
        let dispatcher = dispatcher.clone();
        async move {
            dispatcher
                .shorten_url(ShortenUrlRequest::new(format!("{DEMO_URL}{i}")))
                .await
        }
    });

    let results = tokio::select! {
        results = join_all(requests) => results,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal");
            Vec::new()
        }
    };

    let mut failed = 0usize;
    for (i, result) in results.into_iter().enumerate() {
        match result {
            Ok(collection) => println!("{} -> {}", collection.code, collection.compose_url_string()),
            Err(e) => {
                failed += 1;
                tracing::error!(index = i, error = %e, "Failed to shorten URL");
            }
        }
    }

    let stats = dispatcher.pool_stats().await?;
    tracing::info!(
        workers = stats.actual,
        failed,
        "Batch complete, shutting down"
    );

    dispatcher.shutdown().await?;
    Ok(())
}
