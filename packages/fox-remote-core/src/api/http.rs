//! HTTP route handlers.
//!
//! All handlers are thin - they delegate to the player for state and to the
//! command module for validation.

use axum::{
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use bytes::Bytes;
use tower_http::trace::TraceLayer;

use crate::api::command::dispatch;
use crate::api::response::api_ok;
use crate::api::sse::events_handler;
use crate::api::AppState;
use crate::error::{ControlError, ControlResult};
use crate::protocol_constants::{COMMAND_PATH, EVENTS_PATH, MAX_COMMAND_BODY_SIZE, STATUS_PATH};

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

/// Creates the Axum router with all routes.
///
/// Requests with any other method on a known path get `405` with an empty
/// body.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(STATUS_PATH, get(get_status))
        .route(EVENTS_PATH, get(events_handler))
        .route(
            COMMAND_PATH,
            post(handle_command).layer(DefaultBodyLimit::max(MAX_COMMAND_BODY_SIZE)),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/status
///
/// Returns the player's current status, read fresh on every call.
async fn get_status(State(state): State<AppState>) -> ControlResult<Response> {
    let body = serde_json::to_vec(&state.player.status())
        .map_err(|e| ControlError::Serialization(e.to_string()))?;
    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

/// POST /api/v1/command
///
/// The body is read in full by the extractor before dispatch, whatever the
/// outcome.
async fn handle_command(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let result = body
        .map_err(|e| ControlError::InvalidRequest(e.body_text()))
        .and_then(|body| dispatch(state.player.as_ref(), &body));

    match result {
        Ok(command) => {
            log::info!("[Command] {} ok", command.name());
            api_ok().into_response()
        }
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{to_bytes, Body, BodyDataStream};
    use axum::http::{Method, Request, StatusCode, Version};
    use futures::StreamExt;
    use serde_json::{json, Value};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tower::ServiceExt;

    use crate::api::{spawn_server, AppState};
    use crate::events::{NoopStatusEmitter, StatusBroadcaster};
    use crate::player::test_fixtures::RecordingPlayer;
    use crate::player::{MemoryPlayer, PlayMode, PlayerController, StatusSnapshot, Track};

    const READ_TIMEOUT: Duration = Duration::from_secs(2);

    fn recording_state() -> (AppState, Arc<RecordingPlayer>) {
        let player = Arc::new(RecordingPlayer::new());
        let state = AppState::new(player.clone(), StatusBroadcaster::new());
        (state, player)
    }

    fn memory_state() -> (AppState, Arc<MemoryPlayer>) {
        let broadcaster = StatusBroadcaster::new();
        let player = Arc::new(MemoryPlayer::new(
            vec![
                Track::new("First", "Artist", Duration::from_secs(60)),
                Track::new("Second", "Artist", Duration::from_secs(60)),
            ],
            Arc::new(broadcaster.clone()),
        ));
        (AppState::new(player.clone(), broadcaster), player)
    }

    async fn send(state: &AppState, method: Method, uri: &str, body: &str) -> Response {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::from(body.to_string()))
            .unwrap();
        create_router(state.clone()).oneshot(request).await.unwrap()
    }

    async fn post_command(state: &AppState, body: &str) -> (StatusCode, Value) {
        let response = send(state, Method::POST, COMMAND_PATH, body).await;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn get_status_json(state: &AppState) -> StatusSnapshot {
        let response = send(state, Method::GET, STATUS_PATH, "").await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    /// Reads `data:` payloads from an event-stream body.
    struct SseReader {
        body: BodyDataStream,
        buffer: String,
    }

    impl SseReader {
        fn new(response: Response) -> Self {
            Self {
                body: response.into_body().into_data_stream(),
                buffer: String::new(),
            }
        }

        async fn next_data(&mut self) -> Option<String> {
            loop {
                if let Some(end) = self.buffer.find("\n\n") {
                    let frame: String = self.buffer.drain(..end + 2).collect();
                    return frame
                        .lines()
                        .find_map(|line| line.strip_prefix("data: "))
                        .map(str::to_string);
                }
                let chunk = tokio::time::timeout(READ_TIMEOUT, self.body.next())
                    .await
                    .ok()??
                    .ok()?;
                self.buffer.push_str(std::str::from_utf8(&chunk).ok()?);
            }
        }

        async fn next_status(&mut self) -> StatusSnapshot {
            let data = self.next_data().await.expect("event frame");
            serde_json::from_str(&data).unwrap()
        }
    }

    mod status_endpoint {
        use super::*;

        #[tokio::test]
        async fn returns_current_status() {
            let (state, player) = recording_state();
            player.set_status(StatusSnapshot {
                song_title: "Now".into(),
                artist: "Them".into(),
                play_mode: PlayMode::ListRandom,
                ..Default::default()
            });

            let response = send(&state, Method::GET, STATUS_PATH, "").await;
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(
                response.headers()[header::CONTENT_TYPE],
                "application/json"
            );
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let value: Value = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(value["song_title"], "Now");
            assert_eq!(value["play_mode"], 4);
        }

        #[tokio::test]
        async fn reflects_commands_immediately() {
            let (state, _player) = memory_state();

            post_command(&state, r#"{"command":"play"}"#).await;
            assert!(get_status_json(&state).await.is_playing);

            post_command(&state, r#"{"command":"next"}"#).await;
            assert_eq!(get_status_json(&state).await.song_title, "Second");

            post_command(&state, r#"{"command":"set_play_mode","args":["single_loop"]}"#).await;
            assert_eq!(get_status_json(&state).await.play_mode, PlayMode::SingleLoop);
        }

        #[tokio::test]
        async fn rejects_other_methods_with_empty_body() {
            let (state, _player) = recording_state();
            for method in [Method::POST, Method::PUT, Method::DELETE] {
                let response = send(&state, method, STATUS_PATH, "").await;
                assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
                let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
                assert!(bytes.is_empty());
            }
        }
    }

    mod command_endpoint {
        use super::*;

        #[tokio::test]
        async fn valid_play_modes_return_ok_and_rerender() {
            for mode in PlayMode::SETTABLE {
                let (state, player) = recording_state();
                let body = json!({ "command": "set_play_mode", "args": [mode.as_str()] });

                let (status, value) = post_command(&state, &body.to_string()).await;

                assert_eq!(status, StatusCode::OK);
                assert_eq!(value, json!({ "status": "ok" }));
                assert_eq!(
                    player.calls(),
                    vec![format!("set_play_mode:{}", mode), "rerender".to_string()]
                );
            }
        }

        #[tokio::test]
        async fn invalid_play_mode_arguments_are_client_errors() {
            let cases = [
                (json!({ "command": "set_play_mode", "args": [] }), "invalid args"),
                (
                    json!({ "command": "set_play_mode", "args": ["ordered", "ordered"] }),
                    "invalid args",
                ),
                (
                    json!({ "command": "set_play_mode", "args": ["repeat"] }),
                    "invalid play mode",
                ),
            ];

            for (body, message) in cases {
                let (state, player) = recording_state();
                let (status, value) = post_command(&state, &body.to_string()).await;
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert_eq!(value, json!({ "status": "error", "message": message }));
                assert!(player.calls().is_empty());
            }
        }

        #[tokio::test]
        async fn transport_commands_succeed() {
            for name in ["play", "pause", "next", "previous", "next_play_mode"] {
                let (state, player) = recording_state();
                let (status, value) =
                    post_command(&state, &json!({ "command": name, "args": [] }).to_string())
                        .await;
                assert_eq!(status, StatusCode::OK);
                assert_eq!(value, json!({ "status": "ok" }));
                assert_eq!(player.calls(), vec![name]);
            }
        }

        #[tokio::test]
        async fn unknown_command_is_rejected() {
            let (state, player) = recording_state();
            let (status, value) = post_command(&state, r#"{"command":"shuffle"}"#).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(
                value,
                json!({ "status": "error", "message": "unknown command" })
            );
            assert!(player.calls().is_empty());
        }

        #[tokio::test]
        async fn malformed_body_reports_parse_error_every_time() {
            let (state, player) = recording_state();
            for _ in 0..50 {
                let (status, value) = post_command(&state, "{not json").await;
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert_eq!(value["status"], "error");
                assert!(value["message"]
                    .as_str()
                    .unwrap()
                    .contains("key must be a string"));
            }
            assert!(player.calls().is_empty());
        }

        #[tokio::test]
        async fn intelligent_mode_failure_is_server_error_with_message() {
            let (state, player) = recording_state();
            player.fail_intelligent_mode("no liked playlist found");

            let (status, value) =
                post_command(&state, r#"{"command":"activate_intelligent_mode"}"#).await;

            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(
                value,
                json!({ "status": "error", "message": "no liked playlist found" })
            );
        }

        #[tokio::test]
        async fn set_play_mode_failure_is_server_error() {
            let (state, player) = recording_state();
            player.fail_set_play_mode("mode locked");

            let (status, value) =
                post_command(&state, r#"{"command":"set_play_mode","args":["ordered"]}"#).await;

            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(value["message"], "mode locked");
            assert!(!player.calls().contains(&"rerender".to_string()));
        }

        #[tokio::test]
        async fn rejects_other_methods_with_empty_body() {
            let (state, player) = recording_state();
            for method in [Method::GET, Method::PUT] {
                let response = send(&state, method, COMMAND_PATH, r#"{"command":"play"}"#).await;
                assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
                let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
                assert!(bytes.is_empty());
            }
            assert!(player.calls().is_empty());
        }

        #[tokio::test]
        async fn oversized_body_is_client_error() {
            let (state, player) = recording_state();
            let body = format!(
                r#"{{"command":"play","args":["{}"]}}"#,
                "x".repeat(MAX_COMMAND_BODY_SIZE)
            );
            let (status, value) = post_command(&state, &body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(value["status"], "error");
            assert!(player.calls().is_empty());
        }
    }

    mod events_endpoint {
        use super::*;

        async fn open_stream(state: &AppState) -> Response {
            let response = send(state, Method::GET, EVENTS_PATH, "").await;
            assert_eq!(response.status(), StatusCode::OK);
            response
        }

        #[tokio::test]
        async fn sets_streaming_headers() {
            let (state, _player) = recording_state();
            let response = open_stream(&state).await;
            let headers = response.headers();
            assert_eq!(headers[header::CONTENT_TYPE], "text/event-stream");
            assert_eq!(headers[header::CACHE_CONTROL], "no-cache");
            assert_eq!(headers[header::CONNECTION], "keep-alive");
            assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        }

        #[tokio::test]
        async fn first_frame_is_status_at_connect() {
            let (state, player) = memory_state();
            player.play();

            let mut reader = SseReader::new(open_stream(&state).await);

            // Published after connect; must arrive after the initial frame
            player.next();

            let initial = reader.next_status().await;
            assert_eq!(initial.song_title, "First");
            assert!(initial.is_playing);

            let update = reader.next_status().await;
            assert_eq!(update.song_title, "Second");
        }

        #[tokio::test]
        async fn every_stream_gets_latest_publish() {
            let (state, player) = recording_state();
            player.set_status(StatusSnapshot {
                song_title: "Initial".into(),
                ..Default::default()
            });
            let mut readers = Vec::new();
            for _ in 0..3 {
                readers.push(SseReader::new(open_stream(&state).await));
            }
            assert_eq!(state.subscribers().subscriber_count(), 3);

            let status = StatusSnapshot {
                song_title: "Broadcast".into(),
                ..Default::default()
            };
            let outcome = state.broadcaster.broadcast_status(&status);
            assert_eq!(outcome.delivered, 3);

            for reader in &mut readers {
                assert_eq!(reader.next_status().await.song_title, "Initial");
                assert_eq!(reader.next_status().await, status);
            }
        }

        #[tokio::test]
        async fn slow_stream_receives_at_most_initial_plus_publishes() {
            let (state, _player) = recording_state();
            let mut reader = SseReader::new(open_stream(&state).await);

            // Nobody reads while these are published; only the first fits
            for i in 0..5 {
                state.broadcaster.broadcast_status(&StatusSnapshot {
                    song_title: format!("song {}", i),
                    ..Default::default()
                });
            }

            let mut titles = Vec::new();
            while let Some(data) = tokio::time::timeout(
                Duration::from_millis(200),
                reader.next_data(),
            )
            .await
            .ok()
            .flatten()
            {
                let status: StatusSnapshot = serde_json::from_str(&data).unwrap();
                titles.push(status.song_title);
            }

            assert!(titles.len() <= 6);
            assert_eq!(titles[0], "");
            assert_eq!(titles[1], "song 0");
        }

        #[tokio::test]
        async fn disconnect_removes_subscriber() {
            let (state, _player) = recording_state();
            let response = open_stream(&state).await;
            assert_eq!(state.subscribers().subscriber_count(), 1);

            drop(response);

            assert_eq!(state.subscribers().subscriber_count(), 0);
            let outcome = state
                .broadcaster
                .broadcast_status(&StatusSnapshot::default());
            assert_eq!(outcome.delivered + outcome.dropped, 0);
        }

        #[tokio::test]
        async fn close_all_ends_open_streams() {
            let (state, _player) = recording_state();
            let mut reader = SseReader::new(open_stream(&state).await);
            reader.next_status().await;

            state.subscribers().close_all();

            assert!(reader.next_data().await.is_none());
            assert_eq!(state.subscribers().subscriber_count(), 0);
        }

        fn events_request(version: Version) -> Request<Body> {
            Request::builder()
                .uri(EVENTS_PATH)
                .version(version)
                .body(Body::empty())
                .unwrap()
        }

        #[tokio::test]
        async fn http10_request_streams_without_keep_alive() {
            let (state, player) = recording_state();
            player.set_status(StatusSnapshot {
                song_title: "Legacy".into(),
                ..Default::default()
            });

            let response = create_router(state.clone())
                .oneshot(events_request(Version::HTTP_10))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(
                response.headers()[header::CONTENT_TYPE],
                "text/event-stream"
            );
            assert!(response.headers().get(header::CONNECTION).is_none());
            assert_eq!(state.subscribers().subscriber_count(), 1);

            let mut reader = SseReader::new(response);
            assert_eq!(reader.next_status().await.song_title, "Legacy");
        }

        #[tokio::test]
        async fn http09_request_cannot_stream() {
            let (state, _player) = recording_state();

            let response = create_router(state.clone())
                .oneshot(events_request(Version::HTTP_09))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(state.subscribers().subscriber_count(), 0);
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let value: Value = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(
                value,
                json!({ "status": "error", "message": "streaming unsupported" })
            );
        }
    }

    mod server {
        use super::*;

        async fn start() -> (AppState, crate::api::ServerHandle) {
            let player = Arc::new(MemoryPlayer::new(
                Vec::new(),
                Arc::new(NoopStatusEmitter),
            ));
            let state = AppState::new(player, StatusBroadcaster::new());
            let handle = spawn_server(state.clone(), "127.0.0.1:0".parse().unwrap())
                .await
                .unwrap();
            (state, handle)
        }

        /// Sends a raw events request and returns everything read up to and
        /// including the first frame.
        async fn open_events(stream: &mut TcpStream, http_version: &str) -> String {
            stream
                .write_all(
                    format!(
                        "GET {} {}\r\nHost: localhost\r\nAccept: text/event-stream\r\n\r\n",
                        EVENTS_PATH, http_version
                    )
                    .as_bytes(),
                )
                .await
                .unwrap();

            let mut received = Vec::new();
            let mut buf = [0u8; 1024];
            while !String::from_utf8_lossy(&received).contains("data: ") {
                let n = tokio::time::timeout(READ_TIMEOUT, stream.read(&mut buf))
                    .await
                    .unwrap()
                    .unwrap();
                assert!(n > 0, "connection closed before first frame");
                received.extend_from_slice(&buf[..n]);
            }
            String::from_utf8_lossy(&received).into_owned()
        }

        /// Reads until the peer closes the connection.
        async fn read_to_eof(stream: &mut TcpStream) {
            let mut buf = [0u8; 1024];
            loop {
                let n = tokio::time::timeout(READ_TIMEOUT, stream.read(&mut buf))
                    .await
                    .unwrap()
                    .unwrap_or(0);
                if n == 0 {
                    break;
                }
            }
        }

        #[tokio::test]
        async fn shutdown_ends_streaming_connections() {
            let (state, handle) = start().await;

            let mut stream = TcpStream::connect(handle.local_addr()).await.unwrap();
            let head = open_events(&mut stream, "HTTP/1.1").await;
            assert!(head.starts_with("HTTP/1.1 200"));
            assert_eq!(state.subscribers().subscriber_count(), 1);

            tokio::time::timeout(Duration::from_secs(5), handle.shutdown())
                .await
                .expect("shutdown finished")
                .unwrap();

            // Remaining bytes (terminating chunk) then EOF
            read_to_eof(&mut stream).await;
            assert_eq!(state.subscribers().subscriber_count(), 0);
        }

        #[tokio::test]
        async fn http10_client_receives_close_delimited_stream() {
            let (state, handle) = start().await;

            let mut stream = TcpStream::connect(handle.local_addr()).await.unwrap();
            let head = open_events(&mut stream, "HTTP/1.0").await;

            assert!(head.starts_with("HTTP/1.0 200"));
            let lower = head.to_ascii_lowercase();
            assert!(lower.contains("content-type: text/event-stream"));
            assert!(!lower.contains("connection: keep-alive"));
            assert!(!lower.contains("transfer-encoding: chunked"));
            assert_eq!(state.subscribers().subscriber_count(), 1);

            tokio::time::timeout(Duration::from_secs(5), handle.shutdown())
                .await
                .expect("shutdown finished")
                .unwrap();

            read_to_eof(&mut stream).await;
            assert_eq!(state.subscribers().subscriber_count(), 0);
        }

        #[tokio::test]
        async fn bind_failure_is_reported() {
            let (state, _player) = recording_state();
            let first = spawn_server(state.clone(), "127.0.0.1:0".parse().unwrap())
                .await
                .unwrap();

            let err = spawn_server(state, first.local_addr()).await.err().unwrap();
            assert!(matches!(err, crate::api::ServerError::Bind { .. }));

            first.shutdown().await.unwrap();
        }
    }
}
