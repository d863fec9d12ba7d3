//! Proxy pool: a fixed list of forward-proxy endpoints loaded once from a
//! line-delimited file, with uniform-random selection per request.

use std::fmt;
use std::fs;
use std::path::Path;

use rand::Rng;
use tracing::info;

use crate::errors::Error;

/// A single `host:port` forward-proxy endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProxyEndpoint(String);

impl ProxyEndpoint {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self(endpoint.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The endpoint as a proxy URL usable by the HTTP client.
    pub fn proxy_url(&self) -> String {
        format!("http://{}", self.0)
    }
}

impl fmt::Display for ProxyEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Immutable set of proxy endpoints. No mutation after load.
#[derive(Debug)]
pub struct ProxyPool {
    endpoints: Vec<ProxyEndpoint>,
}

impl ProxyPool {
    /// Loads the pool from a line-delimited file. Blank lines are ignored.
    ///
    /// A missing or unreadable file is fatal, as is a file with no usable
    /// entries: there is nothing to route requests through.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path).map_err(|source| Error::ProxyFile {
            path: path.to_path_buf(),
            source,
        })?;

        let endpoints: Vec<ProxyEndpoint> = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(ProxyEndpoint::new)
            .collect();

        if endpoints.is_empty() {
            return Err(Error::Config(format!(
                "proxy list '{}' contains no endpoints",
                path.display()
            )));
        }

        info!(
            path = %path.display(),
            count = endpoints.len(),
            "loaded proxy pool"
        );

        Ok(Self { endpoints })
    }

    /// Builds a pool directly from endpoints.
    pub fn from_endpoints(endpoints: Vec<ProxyEndpoint>) -> Self {
        Self { endpoints }
    }

    pub fn endpoints(&self) -> &[ProxyEndpoint] {
        &self.endpoints
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Uniform-random draw with replacement: repeated draws may repeat.
    ///
    /// Returns the drawn index alongside the endpoint so callers that keep
    /// per-endpoint state (one HTTP client per proxy) can index into it.
    pub fn pick(&self) -> Result<(usize, &ProxyEndpoint), Error> {
        if self.endpoints.is_empty() {
            return Err(Error::EmptyPool);
        }
        let index = rand::thread_rng().gen_range(0..self.endpoints.len());
        Ok((index, &self.endpoints[index]))
    }
}
