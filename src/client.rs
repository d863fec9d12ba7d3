//! HTTP client construction.
//!
//! reqwest routes through proxies configured on the client, not per request,
//! so the pool is materialized as one client per proxy endpoint, all sharing
//! the same [`Session`] as their cookie provider. Picking a proxy for a
//! request means picking its client. The probe client is the one unproxied
//! client in the process; it shares the session too, so cookies set during
//! the probe carry into the run.

use std::sync::Arc;

use tracing::debug;

use crate::errors::Error;
use crate::proxy::{ProxyEndpoint, ProxyPool};
use crate::session::Session;

/// Per-request timeout. The original transport had none, which let a hung
/// request pin a concurrency slot for the rest of the run.
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// A proxy endpoint paired with the client that routes through it.
#[derive(Debug, Clone)]
pub struct ProxiedClient {
    pub endpoint: ProxyEndpoint,
    pub client: reqwest::Client,
}

/// One HTTP client per proxy endpoint, selected uniformly at random
/// through the pool's draw.
#[derive(Debug)]
pub struct ClientSet {
    pool: Arc<ProxyPool>,
    clients: Vec<ProxiedClient>,
}

impl ClientSet {
    /// Builds a client for every endpoint in the pool. All clients share
    /// `session` as their cookie store.
    pub fn build(pool: Arc<ProxyPool>, session: &Arc<Session>) -> Result<Self, Error> {
        let mut clients = Vec::with_capacity(pool.len());
        for endpoint in pool.endpoints() {
            let proxy = reqwest::Proxy::all(endpoint.proxy_url())?;
            let client = reqwest::Client::builder()
                .proxy(proxy)
                .cookie_provider(Arc::clone(session))
                .timeout(REQUEST_TIMEOUT)
                .build()?;
            clients.push(ProxiedClient {
                endpoint: endpoint.clone(),
                client,
            });
        }
        debug!(clients = clients.len(), "built proxied client set");
        Ok(Self { pool, clients })
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Draws a proxy through the pool and returns its client.
    pub fn pick(&self) -> Result<&ProxiedClient, Error> {
        let (index, _) = self.pool.pick()?;
        Ok(&self.clients[index])
    }
}

/// Builds the unproxied client used for the single payload probe.
pub fn build_probe_client(session: &Arc<Session>) -> Result<reqwest::Client, Error> {
    let client = reqwest::Client::builder()
        .cookie_provider(Arc::clone(session))
        .timeout(REQUEST_TIMEOUT)
        .build()?;
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_one_client_per_endpoint() {
        let pool = Arc::new(ProxyPool::from_endpoints(vec![
            ProxyEndpoint::new("10.0.0.1:8080"),
            ProxyEndpoint::new("10.0.0.2:3128"),
        ]));
        let session = Arc::new(Session::new());
        let clients = ClientSet::build(Arc::clone(&pool), &session).unwrap();
        assert!(!clients.is_empty());
        assert_eq!(clients.len(), pool.len());
    }

    #[test]
    fn pick_returns_client_matching_drawn_endpoint() {
        let pool = Arc::new(ProxyPool::from_endpoints(vec![
            ProxyEndpoint::new("10.0.0.1:8080"),
            ProxyEndpoint::new("10.0.0.2:3128"),
            ProxyEndpoint::new("10.0.0.3:9000"),
        ]));
        let session = Arc::new(Session::new());
        let clients = ClientSet::build(Arc::clone(&pool), &session).unwrap();
        for _ in 0..50 {
            let picked = clients.pick().unwrap();
            assert!(pool.endpoints().contains(&picked.endpoint));
        }
    }

    #[test]
    fn pick_on_empty_set_errors() {
        let pool = Arc::new(ProxyPool::from_endpoints(Vec::new()));
        let session = Arc::new(Session::new());
        let clients = ClientSet::build(pool, &session).unwrap();
        assert!(clients.is_empty());
        assert!(clients.pick().is_err());
    }
}
