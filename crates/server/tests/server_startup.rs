use std::io::Write;
use std::net::TcpListener;
use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use tempfile::{NamedTempFile, TempDir};
use tokio::time::{sleep, timeout};

/// Find an available port
fn get_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// Create a minimal valid config rooted in `dir`
fn minimal_config(port: u16, dir: &Path) -> String {
    format!(
        r#"
[library]
movies_root = "{movies}"
shows_root = "{shows}"

[uploads]
dir = "{uploads}"

[server]
host = "127.0.0.1"
port = {port}

[engine]
download_path = "{downloads}"
enable_dht = false
"#,
        movies = dir.join("movies").display(),
        shows = dir.join("shows").display(),
        uploads = dir.join("uploads").display(),
        downloads = dir.join("downloads").display(),
        port = port
    )
}

fn write_config(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

/// Spawn the server and return a handle
async fn spawn_server(config_path: &Path) -> tokio::process::Child {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_sortarr"))
        .env("SORTARR_CONFIG", config_path)
        .env("RUST_LOG", "error") // Quiet logs during tests
        .kill_on_drop(true)
        .spawn()
        .expect("Failed to spawn server")
}

/// Wait for server to be ready
async fn wait_for_server(port: u16, max_attempts: u32) -> bool {
    let client = Client::new();
    for _ in 0..max_attempts {
        if client
            .get(format!("http://127.0.0.1:{}/api/v1/health", port))
            .send()
            .await
            .is_ok()
        {
            return true;
        }
        sleep(Duration::from_millis(50)).await;
    }
    false
}

#[tokio::test]
async fn test_health_endpoint() {
    let port = get_available_port();
    let dir = TempDir::new().unwrap();
    let config = write_config(&minimal_config(port, dir.path()));

    let mut server = spawn_server(config.path()).await;

    assert!(
        wait_for_server(port, 100).await,
        "Server did not start in time"
    );

    let client = Client::new();
    let response = client
        .get(format!("http://127.0.0.1:{}/api/v1/health", port))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let json: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(json["status"], "ok");
    assert_eq!(json["engine"], "librqbit");

    // Cleanup
    server.kill().await.ok();
}

#[tokio::test]
async fn test_root_page_and_empty_upload() {
    let port = get_available_port();
    let dir = TempDir::new().unwrap();
    let config = write_config(&minimal_config(port, dir.path()));

    let mut server = spawn_server(config.path()).await;
    assert!(
        wait_for_server(port, 100).await,
        "Server did not start in time"
    );

    let client = Client::new();
    let page = client
        .get(format!("http://127.0.0.1:{}/", port))
        .send()
        .await
        .expect("Failed to send request")
        .text()
        .await
        .unwrap();
    assert!(page.contains("Upload Torrent"));

    let form = reqwest::multipart::Form::new().text("note", "nothing attached");
    let response = client
        .post(format!("http://127.0.0.1:{}/upload", port))
        .multipart(form)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status().as_u16(), 400);

    server.kill().await.ok();
}

#[tokio::test]
async fn test_missing_config_file_exits_with_error() {
    let result = timeout(
        Duration::from_secs(5),
        tokio::process::Command::new(env!("CARGO_BIN_EXE_sortarr"))
            .env("SORTARR_CONFIG", "/nonexistent/config.toml")
            .env("RUST_LOG", "error")
            .output(),
    )
    .await
    .expect("Command timed out")
    .expect("Failed to execute command");

    assert!(!result.status.success());
}

#[tokio::test]
async fn test_missing_library_section_exits_with_error() {
    let config = write_config(
        r#"
[server]
port = 8080
"#,
    );

    let result = timeout(
        Duration::from_secs(5),
        tokio::process::Command::new(env!("CARGO_BIN_EXE_sortarr"))
            .env("SORTARR_CONFIG", config.path())
            .env("RUST_LOG", "error")
            .output(),
    )
    .await
    .expect("Command timed out")
    .expect("Failed to execute command");

    assert!(!result.status.success());
}
