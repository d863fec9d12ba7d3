use prometheus::{Encoder, Gauge, Histogram, IntCounter, IntCounterVec, Opts, TextEncoder};

lazy_static::lazy_static! {
    pub static ref REQUESTS_TOTAL: IntCounter =
        IntCounter::with_opts(
            Opts::new("requests_total", "Total number of HTTP requests dispatched")
                .namespace("proxy_loadgen")
        ).unwrap();

    pub static ref RESPONSE_STATUS_CODES: IntCounterVec =
        IntCounterVec::new(
            Opts::new("responses_status_codes_total", "Number of HTTP responses by status code")
                .namespace("proxy_loadgen"),
            &["status_code"]
        ).unwrap();

    pub static ref REQUEST_FAILURES: IntCounterVec =
        IntCounterVec::new(
            Opts::new("request_failures_total", "Number of failed requests by category")
                .namespace("proxy_loadgen"),
            &["category"]
        ).unwrap();

    pub static ref REQUESTS_IN_FLIGHT: Gauge =
        Gauge::with_opts(
            Opts::new("requests_in_flight", "Number of HTTP requests currently in flight")
                .namespace("proxy_loadgen")
        ).unwrap();

    pub static ref REQUEST_DURATION_SECONDS: Histogram =
        Histogram::with_opts(
            prometheus::HistogramOpts::new(
                "request_duration_seconds",
                "HTTP request latencies in seconds."
            ).namespace("proxy_loadgen")
        ).unwrap();
}

/// Registers all metrics with the default Prometheus registry.
pub fn register_metrics() -> Result<(), prometheus::Error> {
    prometheus::default_registry().register(Box::new(REQUESTS_TOTAL.clone()))?;
    prometheus::default_registry().register(Box::new(RESPONSE_STATUS_CODES.clone()))?;
    prometheus::default_registry().register(Box::new(REQUEST_FAILURES.clone()))?;
    prometheus::default_registry().register(Box::new(REQUESTS_IN_FLIGHT.clone()))?;
    prometheus::default_registry().register(Box::new(REQUEST_DURATION_SECONDS.clone()))?;
    Ok(())
}

/// Gathers and encodes the default registry as text for final output.
pub fn gather_metrics_string() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::default_registry().gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        eprintln!("Error encoding metrics: {}", e);
        return String::from("# ERROR ENCODING METRICS");
    }
    String::from_utf8(buffer).unwrap_or_else(|e| {
        eprintln!("Error encoding metrics to UTF-8: {}", e);
        String::from("# ERROR ENCODING METRICS TO UTF-8")
    })
}

/// Returns a static string label for common HTTP status codes.
///
/// Avoids a heap `String` allocation on every request in the hot path.
/// Uncommon codes fall back to "other" rather than allocating a unique string.
pub fn status_code_label(code: u16) -> &'static str {
    match code {
        100 => "100",
        200 => "200",
        201 => "201",
        204 => "204",
        301 => "301",
        302 => "302",
        304 => "304",
        400 => "400",
        401 => "401",
        403 => "403",
        404 => "404",
        405 => "405",
        408 => "408",
        409 => "409",
        429 => "429",
        499 => "499",
        500 => "500",
        502 => "502",
        503 => "503",
        504 => "504",
        _ => "other",
    }
}
