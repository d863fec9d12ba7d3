use tracing_subscriber::EnvFilter;

use proxy_loadgen::config::{print_usage, Config};
use proxy_loadgen::coordinator;
use proxy_loadgen::metrics::{gather_metrics_string, register_metrics};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = register_metrics() {
        eprintln!("Failed to register metrics: {}", e);
        std::process::exit(1);
    }

    let config = match Config::from_args(std::env::args().skip(1)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}\n", e);
            print_usage();
            std::process::exit(1);
        }
    };

    config.print_summary(coordinator::worker_count());

    if let Err(e) = coordinator::run(config).await {
        eprintln!("Fatal: {}", e);
        std::process::exit(1);
    }

    println!("\n--- FINAL METRICS ---\n{}", gather_metrics_string());
    println!("--- END OF FINAL METRICS ---");
}
