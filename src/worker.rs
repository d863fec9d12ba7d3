//! Per-worker request dispatcher.
//!
//! Each worker runs one dispatch loop: until its deadline it keeps a bounded
//! window of in-flight requests, each routed through a randomly drawn proxy
//! and gated by the shared [`RateLimiter`]. After the deadline it drains the
//! window and reports completion. Failures are logged and counted, never
//! retried, and never abort the worker.

use std::sync::Arc;

use tokio::task::JoinSet;
use tokio::time::{Duration, Instant};
use tracing::{debug, error, info};

use crate::client::ClientSet;
use crate::errors::RequestFailure;
use crate::limiter::RateLimiter;
use crate::metrics::{
    status_code_label, REQUESTS_IN_FLIGHT, REQUESTS_TOTAL, REQUEST_DURATION_SECONDS,
    REQUEST_FAILURES, RESPONSE_STATUS_CODES,
};
use crate::probe::{DetectedPayload, RequestMethod};

/// Configuration for a dispatch worker. Identical across workers apart
/// from `worker_id`.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub worker_id: usize,
    pub url: String,
    pub payload: DetectedPayload,
    pub max_in_flight: usize,
    pub test_duration: Duration,
}

/// Runs one dispatcher until `start_time + test_duration`, then drains.
pub async fn run_dispatcher(
    config: DispatcherConfig,
    clients: Arc<ClientSet>,
    limiter: Arc<RateLimiter>,
    start_time: Instant,
) {
    let deadline = start_time + config.test_duration;
    let mut in_flight = JoinSet::new();

    debug!(
        worker_id = config.worker_id,
        url = %config.url,
        max_in_flight = config.max_in_flight,
        "dispatcher running"
    );

    while Instant::now() < deadline {
        // Window full: suspend until any in-flight request resolves,
        // success or failure alike.
        if in_flight.len() >= config.max_in_flight {
            in_flight.join_next().await;
            continue;
        }

        let picked = match clients.pick() {
            Ok(picked) => picked,
            Err(e) => {
                error!(worker_id = config.worker_id, error = %e, "no proxy available, stopping");
                break;
            }
        };

        let request = build_request(&picked.client, &config);
        let endpoint = picked.endpoint.clone();
        let limiter = Arc::clone(&limiter);
        let worker_id = config.worker_id;

        in_flight.spawn(async move {
            if let Err(failure) = limiter.schedule(send_request(request)).await {
                REQUEST_FAILURES
                    .with_label_values(&[failure.category.label()])
                    .inc();
                debug!(
                    worker_id,
                    proxy = %endpoint,
                    error = %failure,
                    "request failed"
                );
            }
        });
    }

    info!(
        worker_id = config.worker_id,
        in_flight = in_flight.len(),
        "deadline reached, draining in-flight requests"
    );

    while in_flight.join_next().await.is_some() {}

    info!(worker_id = config.worker_id, "dispatcher finished");
}

fn build_request(client: &reqwest::Client, config: &DispatcherConfig) -> reqwest::RequestBuilder {
    match config.payload.method {
        RequestMethod::Get => client.get(&config.url),
        RequestMethod::Post => client
            .post(&config.url)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(config.payload.body.clone().unwrap_or_default()),
    }
}

/// Sends one request and resolves it: 2xx/3xx is success, everything else
/// (transport error, timeout, non-success status) is a classified failure.
async fn send_request(request: reqwest::RequestBuilder) -> Result<(), RequestFailure> {
    REQUESTS_TOTAL.inc();
    REQUESTS_IN_FLIGHT.inc();
    let started = Instant::now();

    let result = request.send().await;
    let outcome = match result {
        Ok(mut response) => {
            let status = response.status();
            RESPONSE_STATUS_CODES
                .with_label_values(&[status_code_label(status.as_u16())])
                .inc();

            // Stream and discard the body in chunks; leaving bodies
            // unconsumed lets them accumulate in memory at high rates.
            while let Ok(Some(_chunk)) = response.chunk().await {}

            if status.is_success() || status.is_redirection() {
                Ok(())
            } else {
                Err(RequestFailure::from_status(status))
            }
        }
        Err(e) => {
            RESPONSE_STATUS_CODES.with_label_values(&["error"]).inc();
            Err(RequestFailure::from_reqwest(&e))
        }
    };

    REQUEST_DURATION_SECONDS.observe(started.elapsed().as_secs_f64());
    REQUESTS_IN_FLIGHT.dec();
    outcome
}
