//! Run coordination: loads shared state, probes the target once, spawns one
//! dispatcher per available CPU, awaits them all, and persists the session.

use std::sync::Arc;
use std::thread;

use tokio::time::Instant;
use tracing::{error, info};

use crate::client::{build_probe_client, ClientSet};
use crate::config::Config;
use crate::errors::Error;
use crate::limiter::RateLimiter;
use crate::probe;
use crate::proxy::ProxyPool;
use crate::session::SessionStore;
use crate::worker::{run_dispatcher, DispatcherConfig};

/// Number of dispatch workers: one per available processing unit.
pub fn worker_count() -> usize {
    thread::available_parallelism()
        .map(usize::from)
        .unwrap_or(1)
}

/// Runs the whole traffic generation pass.
///
/// Fails before any worker starts if the proxy list is missing or empty.
/// Once requests have run, persistence failures are logged, not propagated.
pub async fn run(config: Config) -> Result<(), Error> {
    // Fatal before any worker: nothing to route through otherwise.
    let pool = Arc::new(ProxyPool::load(&config.proxy_file)?);

    let store = SessionStore::new(&config.cookie_file);
    let session = Arc::new(store.load());

    // One unproxied probe decides the method/payload for the entire run.
    let probe_client = build_probe_client(&session)?;
    let payload = probe::detect(&probe_client, &config.target_url).await;

    let clients = Arc::new(ClientSet::build(Arc::clone(&pool), &session)?);
    let limiter = RateLimiter::new(config.max_concurrent, config.rate_per_second);

    let num_workers = worker_count();
    info!(
        workers = num_workers,
        proxies = pool.len(),
        duration_secs = config.duration.as_secs(),
        "spawning dispatch workers"
    );

    let start_time = Instant::now();
    let mut handles = Vec::with_capacity(num_workers);
    for worker_id in 0..num_workers {
        let dispatcher_config = DispatcherConfig {
            worker_id,
            url: config.target_url.clone(),
            payload: payload.clone(),
            max_in_flight: config.max_concurrent,
            test_duration: config.duration,
        };
        let clients = Arc::clone(&clients);
        let limiter = Arc::clone(&limiter);

        handles.push(tokio::spawn(async move {
            run_dispatcher(dispatcher_config, clients, limiter, start_time).await;
        }));
    }

    // A panicking worker must not abort its siblings.
    for handle in handles {
        if let Err(e) = handle.await {
            error!(error = %e, "worker task panicked");
        }
    }
    info!("all workers finished");

    if let Err(e) = store.save(&session) {
        error!(error = %e, "failed to save session cookies");
    }

    Ok(())
}
