//! Shared session cookie state and its on-disk persistence.
//!
//! The [`Session`] is one cookie jar shared by every client in the process:
//! it plugs into reqwest as a [`cookie::CookieStore`] provider, so every
//! response's `Set-Cookie` is captured and every request carries the cookies
//! recorded for its host. Only the `name=value` part of each cookie is
//! retained; the persisted form is a plain host → name → value map.
//!
//! Persistence is best-effort: a missing or corrupt `cookies.json` yields an
//! empty session with a warning, and saving writes to a temp file in the
//! same directory before renaming it over the target so a partial write
//! never clobbers the previous valid file.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;

use reqwest::cookie;
use reqwest::header::HeaderValue;
use reqwest::Url;
use tracing::{debug, info, warn};

use crate::errors::Error;

/// Serialized shape of the session: host → cookie name → cookie value.
pub type CookieMap = HashMap<String, HashMap<String, String>>;

/// Process-wide cookie jar, safe for concurrent read/update from all workers.
#[derive(Debug, Default)]
pub struct Session {
    cookies: RwLock<CookieMap>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: CookieMap) -> Self {
        Self {
            cookies: RwLock::new(map),
        }
    }

    /// Records a cookie for a host. Later writes for the same name win;
    /// writes for distinct names are never dropped.
    pub fn insert(&self, host: &str, name: &str, value: &str) {
        let mut cookies = self.cookies.write().unwrap();
        cookies
            .entry(host.to_string())
            .or_default()
            .insert(name.to_string(), value.to_string());
    }

    /// Value of a named cookie for a host, if recorded.
    pub fn get(&self, host: &str, name: &str) -> Option<String> {
        let cookies = self.cookies.read().unwrap();
        cookies.get(host)?.get(name).cloned()
    }

    /// Total number of cookies across all hosts.
    pub fn cookie_count(&self) -> usize {
        let cookies = self.cookies.read().unwrap();
        cookies.values().map(HashMap::len).sum()
    }

    /// Clones the current cookie state for serialization.
    pub fn snapshot(&self) -> CookieMap {
        self.cookies.read().unwrap().clone()
    }
}

impl cookie::CookieStore for Session {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        let Some(host) = url.host_str() else {
            return;
        };
        let mut cookies = self.cookies.write().unwrap();
        let jar = cookies.entry(host.to_string()).or_default();
        for header in cookie_headers {
            let Ok(raw) = header.to_str() else {
                continue;
            };
            // Keep the name=value pair, drop attributes (Path, Expires, ...)
            let pair = raw.split(';').next().unwrap_or("");
            if let Some((name, value)) = pair.split_once('=') {
                jar.insert(name.trim().to_string(), value.trim().to_string());
            }
        }
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        let host = url.host_str()?;
        let cookies = self.cookies.read().unwrap();
        let jar = cookies.get(host)?;
        if jar.is_empty() {
            return None;
        }
        let header = jar
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; ");
        HeaderValue::from_str(&header).ok()
    }
}

/// Loads and saves a [`Session`] at a fixed path.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Loads the session from disk. Absence or corruption is not fatal:
    /// the run starts with an empty jar and a warning.
    pub fn load(&self) -> Session {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "could not read cookie file, starting with an empty session"
                );
                return Session::new();
            }
        };

        match serde_json::from_str::<CookieMap>(&contents) {
            Ok(map) => {
                info!(
                    path = %self.path.display(),
                    cookies = map.values().map(HashMap::len).sum::<usize>(),
                    "loaded session cookies"
                );
                Session::from_map(map)
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "cookie file is corrupt, starting with an empty session"
                );
                Session::new()
            }
        }
    }

    /// Saves the session via a temp file in the same directory, then rename.
    pub fn save(&self, session: &Session) -> Result<(), Error> {
        let snapshot = session.snapshot();
        let json = serde_json::to_string_pretty(&snapshot)?;

        let mut tmp_path = self.path.clone();
        tmp_path.set_extension("json.tmp");

        fs::write(&tmp_path, json).map_err(|source| Error::SessionWrite {
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, &self.path).map_err(|source| Error::SessionWrite {
            path: self.path.clone(),
            source,
        })?;

        debug!(
            path = %self.path.display(),
            cookies = snapshot.values().map(HashMap::len).sum::<usize>(),
            "saved session cookies"
        );
        Ok(())
    }
}
