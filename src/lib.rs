//! Concurrent HTTP request generator.
//!
//! Drives sustained traffic at a target URL for a fixed duration,
//! distributing requests across a pool of forward proxies, bounded by a
//! process-wide concurrency ceiling and dispatch rate, with auto-detection
//! of GET vs form-derived POST and a persisted session cookie jar.

pub mod client;
pub mod config;
pub mod coordinator;
pub mod errors;
pub mod limiter;
pub mod metrics;
pub mod probe;
pub mod proxy;
pub mod session;
pub mod worker;
