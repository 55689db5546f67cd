use std::sync::Mutex;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fetchgate_core::download::{download, download_client};
use fetchgate_core::error::GatewayError;

/// Generates deterministic test data.
fn generate_test_data(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 251) as u8).collect()
}

/// Serves one hand-rolled HTTP response on a raw socket, so tests can
/// control framing (chunked encoding, truncated bodies) that a mock
/// server always normalizes.
async fn serve_raw_once(response: Vec<u8>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut sock, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 1024];
        let _ = sock.read(&mut buf).await;
        sock.write_all(&response).await.unwrap();
        sock.shutdown().await.unwrap();
    });
    format!("http://{}", addr)
}

// ---------------------------------------------------------------
// Sized responses: streaming, progress ticks, file naming
// ---------------------------------------------------------------

#[tokio::test]
async fn test_download_streams_body_and_reports_progress() {
    let body = generate_test_data(512 * 1024);
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/assets/payload.bin"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(body.clone())
                .insert_header("Content-Type", "application/octet-stream"),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let client = download_client();
    let ticks = Mutex::new(Vec::new());

    let name = download(
        &client,
        &format!("{}/assets/payload.bin", server.uri()),
        dir.path(),
        |pct| ticks.lock().unwrap().push(pct),
    )
    .await
    .unwrap();

    assert_eq!(name, "payload.bin", "returned name should be the bare file name");
    let written = std::fs::read(dir.path().join("payload.bin")).unwrap();
    assert_eq!(written, body, "written file should match the served body byte-for-byte");

    let ticks = ticks.lock().unwrap();
    assert!(!ticks.is_empty(), "sized responses should produce progress ticks");
    assert!(
        ticks.windows(2).all(|w| w[0] <= w[1]),
        "percentages should be non-decreasing"
    );
    assert!(ticks.iter().all(|p| *p <= 100));
}

#[tokio::test]
async fn test_download_without_content_length_suppresses_progress() {
    let body = generate_test_data(200 * 1024);
    let mut response = Vec::new();
    response.extend_from_slice(
        b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n",
    );
    response.extend_from_slice(format!("{:x}\r\n", body.len()).as_bytes());
    response.extend_from_slice(&body);
    response.extend_from_slice(b"\r\n0\r\n\r\n");
    let base = serve_raw_once(response).await;

    let dir = tempfile::tempdir().unwrap();
    let client = download_client();
    let ticks = Mutex::new(Vec::new());

    let name = download(&client, &format!("{}/data.bin", base), dir.path(), |pct| {
        ticks.lock().unwrap().push(pct)
    })
    .await
    .unwrap();

    assert_eq!(name, "data.bin");
    let written = std::fs::read(dir.path().join("data.bin")).unwrap();
    assert_eq!(written, body);
    assert!(
        ticks.lock().unwrap().is_empty(),
        "unknown total size should suppress every progress tick"
    );
}

// ---------------------------------------------------------------
// Failure paths
// ---------------------------------------------------------------

#[tokio::test]
async fn test_download_missing_file_maps_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing.bin"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let client = download_client();
    let err = download(
        &client,
        &format!("{}/missing.bin", server.uri()),
        dir.path(),
        |_| {},
    )
    .await
    .unwrap_err();

    assert!(matches!(err, GatewayError::LocalFileNotFound(_)));
    assert_eq!(err.user_text(), "file not found, check link");
    assert!(
        !dir.path().join("missing.bin").exists(),
        "no file should be created for a rejected response"
    );
}

#[tokio::test]
async fn test_download_unreachable_host_fails() {
    let dir = tempfile::tempdir().unwrap();
    let client = download_client();
    let result = download(&client, "http://127.0.0.1:1/nope.bin", dir.path(), |_| {}).await;
    assert!(result.is_err(), "download from unreachable host should fail");
}

#[tokio::test]
async fn test_download_truncated_body_errors_without_further_ticks() {
    let body = generate_test_data(1000);
    let mut response = Vec::new();
    response.extend_from_slice(b"HTTP/1.1 200 OK\r\nContent-Length: 1000000\r\n\r\n");
    response.extend_from_slice(&body);
    let base = serve_raw_once(response).await;

    let dir = tempfile::tempdir().unwrap();
    let client = download_client();
    let ticks = Mutex::new(Vec::new());

    let result = download(&client, &format!("{}/cut.bin", base), dir.path(), |pct| {
        ticks.lock().unwrap().push(pct)
    })
    .await;

    assert!(result.is_err(), "truncated body should surface as an error");
    assert!(
        ticks.lock().unwrap().is_empty(),
        "1000 of 1000000 bytes is below the tick threshold"
    );
    // The partial file is left on disk; cleanup is the caller's concern.
    assert!(dir.path().join("cut.bin").exists());
}
