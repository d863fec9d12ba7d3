use std::path::PathBuf;

use tokio::time::Duration;

use crate::errors::Error;

/// Default proxy list file, read once at startup.
pub const DEFAULT_PROXY_FILE: &str = "proxy.txt";

/// Default cookie persistence file, loaded at startup and saved at exit.
pub const DEFAULT_COOKIE_FILE: &str = "cookies.json";

/// Main configuration for a run. Built once from the command line,
/// read-only afterwards, cloned into every worker.
#[derive(Debug, Clone)]
pub struct Config {
    pub target_url: String,
    pub duration: Duration,
    pub max_concurrent: usize,
    pub rate_per_second: f64,
    pub proxy_file: PathBuf,
    pub cookie_file: PathBuf,
}

impl Config {
    /// Parses configuration from positional CLI arguments
    /// (everything after the program name).
    ///
    /// Expected: `<url> <duration_seconds> <max_concurrent> <rate_per_second>`
    pub fn from_args<I>(mut args: I) -> Result<Self, Error>
    where
        I: Iterator<Item = String>,
    {
        let target_url = args
            .next()
            .ok_or_else(|| Error::Config("missing <url> argument".to_string()))?;
        let duration_str = args
            .next()
            .ok_or_else(|| Error::Config("missing <duration_seconds> argument".to_string()))?;
        let concurrent_str = args
            .next()
            .ok_or_else(|| Error::Config("missing <max_concurrent> argument".to_string()))?;
        let rate_str = args
            .next()
            .ok_or_else(|| Error::Config("missing <rate_per_second> argument".to_string()))?;

        if !target_url.starts_with("http://") && !target_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "url '{}' must start with http:// or https://",
                target_url
            )));
        }

        let duration_secs: u64 = duration_str.parse().map_err(|_| {
            Error::Config(format!(
                "duration '{}' must be a positive integer number of seconds",
                duration_str
            ))
        })?;
        if duration_secs == 0 {
            return Err(Error::Config(
                "duration must be greater than zero".to_string(),
            ));
        }

        let max_concurrent: usize = concurrent_str.parse().map_err(|_| {
            Error::Config(format!(
                "max_concurrent '{}' must be a positive integer",
                concurrent_str
            ))
        })?;
        if max_concurrent == 0 {
            return Err(Error::Config(
                "max_concurrent must be greater than zero".to_string(),
            ));
        }

        let rate_per_second: f64 = rate_str.parse().map_err(|_| {
            Error::Config(format!(
                "rate_per_second '{}' must be a positive number",
                rate_str
            ))
        })?;
        if !rate_per_second.is_finite() || rate_per_second <= 0.0 {
            return Err(Error::Config(
                "rate_per_second must be a positive number".to_string(),
            ));
        }
        // The dispatch spacing is 1/rate; a vanishingly small rate would
        // overflow the Duration it derives.
        if Duration::try_from_secs_f64(1.0 / rate_per_second).is_err() {
            return Err(Error::Config(format!(
                "rate_per_second '{}' is too small to derive a dispatch interval",
                rate_str
            )));
        }

        Ok(Config {
            target_url,
            duration: Duration::from_secs(duration_secs),
            max_concurrent,
            rate_per_second,
            proxy_file: PathBuf::from(DEFAULT_PROXY_FILE),
            cookie_file: PathBuf::from(DEFAULT_COOKIE_FILE),
        })
    }

    /// Prints the configuration summary.
    pub fn print_summary(&self, num_workers: usize) {
        println!("Starting traffic run:");
        println!("  Target URL: {}", self.target_url);
        println!("  Duration: {:?}", self.duration);
        println!("  Max concurrent requests: {}", self.max_concurrent);
        println!("  Rate limit: {} req/s", self.rate_per_second);
        println!("  Workers: {}", num_workers);
        println!("  Proxy list: {}", self.proxy_file.display());
        println!("  Cookie file: {}", self.cookie_file.display());
    }
}

/// Prints the CLI usage message to stderr.
pub fn print_usage() {
    eprintln!("Usage: proxy_loadgen <url> <duration_seconds> <max_concurrent> <rate_per_second>");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  url              Target URL (must start with http:// or https://)");
    eprintln!("  duration_seconds How long to generate traffic, in whole seconds");
    eprintln!("  max_concurrent   Ceiling on simultaneously in-flight requests");
    eprintln!("  rate_per_second  Minimum spacing between dispatches is 1/rate seconds");
    eprintln!();
    eprintln!("Files (in the working directory):");
    eprintln!("  proxy.txt        Line-delimited host:port proxy endpoints (required)");
    eprintln!("  cookies.json     Persisted session cookies (created if absent)");
}
