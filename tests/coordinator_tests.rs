use std::fs;
use std::path::PathBuf;

use tokio::time::Duration;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use proxy_loadgen::config::Config;
use proxy_loadgen::coordinator;
use proxy_loadgen::errors::Error;

fn config(url: String, proxy_file: PathBuf, cookie_file: PathBuf) -> Config {
    Config {
        target_url: url,
        duration: Duration::from_secs(1),
        max_concurrent: 2,
        rate_per_second: 5.0,
        proxy_file,
        cookie_file,
    }
}

#[tokio::test]
async fn missing_proxy_file_fails_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let result = coordinator::run(config(
        server.uri(),
        dir.path().join("absent-proxy.txt"),
        dir.path().join("cookies.json"),
    ))
    .await;

    assert!(matches!(result, Err(Error::ProxyFile { .. })));
    assert!(
        server.received_requests().await.unwrap().is_empty(),
        "no network activity expected when the proxy file is missing"
    );
}

#[tokio::test]
async fn empty_proxy_file_fails_before_any_request() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let proxy_file = dir.path().join("proxy.txt");
    fs::write(&proxy_file, "\n\n   \n").unwrap();

    let result = coordinator::run(config(
        server.uri(),
        proxy_file,
        dir.path().join("cookies.json"),
    ))
    .await;

    assert!(matches!(result, Err(Error::Config(_))));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn full_run_sends_traffic_and_persists_cookies() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Set-Cookie", "sid=fromrun")
                .set_body_raw("<html><body>ok</body></html>", "text/html"),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let proxy_file = dir.path().join("proxy.txt");
    // The mock server doubles as the forward proxy.
    fs::write(&proxy_file, format!("{}\n", server.address())).unwrap();
    let cookie_file = dir.path().join("cookies.json");

    coordinator::run(config(
        format!("http://{}/", server.address()),
        proxy_file,
        cookie_file.clone(),
    ))
    .await
    .unwrap();

    // Probe plus at least one dispatched request.
    assert!(server.received_requests().await.unwrap().len() >= 2);

    let saved = fs::read_to_string(&cookie_file).expect("cookie file written at end of run");
    assert!(saved.contains("fromrun"), "saved cookies were: {}", saved);
}
