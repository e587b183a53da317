use axum::{
    extract::State,
    http::header,
    response::{Html, IntoResponse},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use sortarr_core::Config;

use crate::metrics::{collect_dynamic_metrics, encode_metrics};
use crate::state::AppState;

/// Upload form with a WebSocket log of server notifications.
const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <title>sortarr</title>
  </head>
  <body>
    <h1>Upload a Movie or Show Torrent</h1>
    <form action="/upload" method="post" enctype="multipart/form-data">
      <input type="file" name="torrents" accept=".torrent" multiple/>
      <button type="submit">Upload Torrent</button>
    </form>
    <br>
    <ul id="log"></ul>
    <script>
      const scheme = window.location.protocol === 'https:' ? 'wss://' : 'ws://';
      const ws = new WebSocket(scheme + window.location.host + '/ws');
      const log = document.getElementById('log');

      ws.onmessage = (event) => {
        const item = document.createElement('li');
        item.textContent = event.data;
        log.prepend(item);
      };
    </script>
  </body>
</html>
"#;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub engine: String,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        engine: state.queue().runner().engine_name().to_string(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<Config> {
    Json(state.config().clone())
}

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    collect_dynamic_metrics(&state);
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}
