//! Common test utilities for in-process HTTP testing with a mock engine.
//!
//! This module provides a test fixture that builds the real router over a
//! [`MockTorrentEngine`] and temporary library/upload directories, so
//! uploads can be driven end to end without a BitTorrent session.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tokio::sync::broadcast;
use tower::ServiceExt;

use sortarr_core::{load_config_from_str, testing::MockTorrentEngine, DownloadQueue, Notifier};
use sortarr_server::api::{create_router, WsBroadcaster};
use sortarr_server::state::AppState;

/// Multipart boundary used by [`TestFixture::upload`].
const BOUNDARY: &str = "sortarr-test-boundary";

/// Test fixture wiring the router to a mock engine.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_movie_upload() {
///     let fixture = TestFixture::new();
///     fixture.engine.add_torrent(
///         fixture.staged_path("movie.torrent"),
///         "Movie",
///         vec![("Movie.2020.mkv", b"data".to_vec())],
///     );
///
///     let response = fixture
///         .upload("/upload?wait=true", &[("movie.torrent", b"d4:infoe")])
///         .await;
///
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock engine - register torrents by their staged descriptor path
    pub engine: Arc<MockTorrentEngine>,
    /// Broadcaster the queue notifies through
    pub broadcaster: WsBroadcaster,
    pub movies: PathBuf,
    pub shows: PathBuf,
    pub uploads: PathBuf,
    /// Temporary directory holding the library and staging area
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a fixture with an engine that resolves immediately.
    pub fn new() -> Self {
        Self::with_engine(MockTorrentEngine::new())
    }

    pub fn with_engine(engine: MockTorrentEngine) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let movies = temp_dir.path().join("movies");
        let shows = temp_dir.path().join("shows");
        let uploads = temp_dir.path().join("uploads");

        let config = load_config_from_str(&format!(
            r#"
[library]
movies_root = "{}"
shows_root = "{}"

[uploads]
dir = "{}"

[server]
host = "127.0.0.1"
port = 3000

[placer]
buffer_size = 4096
"#,
            movies.display(),
            shows.display(),
            uploads.display()
        ))
        .expect("Failed to build config");

        let engine = Arc::new(engine);
        let broadcaster = WsBroadcaster::default();
        let notifier = Notifier::new(Arc::new(broadcaster.clone()));
        let queue = DownloadQueue::from_config(engine.clone(), notifier, &config);

        let state = Arc::new(AppState::new(config, queue, broadcaster.clone()));
        let router = create_router(state);

        Self {
            router,
            engine,
            broadcaster,
            movies,
            shows,
            uploads,
            temp_dir,
        }
    }

    /// Path an uploaded file with this name is staged at.
    pub fn staged_path(&self, name: &str) -> PathBuf {
        self.uploads.join(name)
    }

    /// Subscribe to notifications before issuing requests.
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.broadcaster.subscribe()
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Send a GET request and return the raw body text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        let (status, bytes) = self.send_raw(request).await;
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    /// POST a multipart form with one `torrents` part per file.
    pub async fn upload(&self, path: &str, files: &[(&str, &[u8])]) -> TestResponse {
        let parts: Vec<(&str, &str, &[u8])> = files
            .iter()
            .map(|(name, data)| ("torrents", *name, *data))
            .collect();
        self.post_multipart(path, &parts).await
    }

    /// POST a multipart form with arbitrary `(field, file name, data)` parts.
    pub async fn post_multipart(&self, path: &str, parts: &[(&str, &str, &[u8])]) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let (status, body_bytes) = self.send_raw(request).await;

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }

    async fn send_raw(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        (status, body_bytes.to_vec())
    }
}

/// Encodes a multipart/form-data body.
fn multipart_body(parts: &[(&str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (field, file_name, data) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                field, file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/x-bittorrent\r\n\r\n");
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// Drains every notification currently buffered on the receiver.
pub fn drain(rx: &mut broadcast::Receiver<String>) -> Vec<String> {
    let mut messages = Vec::new();
    while let Ok(message) = rx.try_recv() {
        messages.push(message);
    }
    messages
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
