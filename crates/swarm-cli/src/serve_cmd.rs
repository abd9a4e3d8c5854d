use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use async_stream::stream;
use axum::extract::{Query, State};
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::routing::get;
use axum::{Json, Router};
use futures::Stream;
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;

use swarm_core::{ChannelSink, Orchestrator};

/// Prompt used when `/swarm/stream` is called without one.
pub const DEFAULT_STREAM_PROMPT: &str =
    "Build a dashboard to visualise specialised swarm collaboration.";

const BANNER: &str = "Multi-agent swarm server online. Connect to /swarm/stream?prompt=Your+idea to stream collaboration events.";

/// Events buffered between the pipeline task and the SSE response.
const STREAM_BUFFER: usize = 32;

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    orchestrator: Arc<Orchestrator>,
}

pub fn build_router(orchestrator: Arc<Orchestrator>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/swarm/stream", get(stream_swarm))
        .layer(CorsLayer::permissive())
        .with_state(AppState { orchestrator })
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(orchestrator: Arc<Orchestrator>, bind: &str, port: u16) -> Result<()> {
    let app = build_router(orchestrator);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!("swarm serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("swarm serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn index() -> &'static str {
    BANNER
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Deserialize)]
struct StreamQuery {
    prompt: Option<String>,
}

/// Run one pipeline and stream its events as SSE.
///
/// The run is spawned, so a client that disconnects only detaches the sink;
/// the project is still written.
async fn stream_swarm(
    State(state): State<AppState>,
    Query(query): Query<StreamQuery>,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    let prompt = query
        .prompt
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_STREAM_PROMPT.to_string());

    let (sink, mut rx) = ChannelSink::channel(STREAM_BUFFER);
    let orchestrator = Arc::clone(&state.orchestrator);
    let run = tokio::spawn(async move { orchestrator.run(&prompt, &sink).await });

    let events = stream! {
        yield Ok::<_, Infallible>(SseEvent::default().comment("connected"));

        while let Some(event) = rx.recv().await {
            match SseEvent::default().json_data(&event) {
                Ok(frame) => yield Ok(frame),
                Err(e) => tracing::warn!(error = %e, "failed to encode pipeline event"),
            }
        }

        let failure = match run.await {
            Ok(Ok(_)) => None,
            Ok(Err(e)) => Some(e.to_string()),
            Err(e) => Some(format!("pipeline task failed: {e}")),
        };
        match failure {
            None => yield Ok(SseEvent::default().event("done").data("{}")),
            Some(message) => {
                tracing::warn!(error = %message, "pipeline stream ended with an error");
                yield Ok(SseEvent::default()
                    .event("error")
                    .data(json!({ "error": message }).to_string()));
            }
        }
    };

    Sse::new(events).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use swarm_test_utils::offline_orchestrator;

    // -----------------------------------------------------------------------
    // HTTP helpers
    // -----------------------------------------------------------------------

    async fn send_request(orchestrator: Orchestrator, uri: &str) -> axum::response::Response {
        let app = super::build_router(Arc::new(orchestrator));
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), 16 * 1_048_576)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1_048_576)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    /// `data:` payloads of unnamed frames, parsed as JSON.
    fn data_frames(body: &str) -> Vec<serde_json::Value> {
        body.split("\n\n")
            .filter(|frame| !frame.lines().any(|l| l.starts_with("event:")))
            .filter_map(|frame| frame.lines().find_map(|l| l.strip_prefix("data: ")))
            .map(|data| serde_json::from_str(data).unwrap())
            .collect()
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_index_returns_banner() {
        let tmp = TempDir::new().unwrap();
        let resp = send_request(offline_orchestrator(tmp.path()), "/").await;
        assert_eq!(resp.status(), StatusCode::OK);
        let text = body_text(resp).await;
        assert!(text.contains("/swarm/stream?prompt="));
    }

    #[tokio::test]
    async fn test_health() {
        let tmp = TempDir::new().unwrap();
        let resp = send_request(offline_orchestrator(tmp.path()), "/health").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn test_stream_frames_a_full_run() {
        let tmp = TempDir::new().unwrap();
        let resp = send_request(
            offline_orchestrator(tmp.path()),
            "/swarm/stream?prompt=Build%20a%20chart",
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()[header::CONTENT_TYPE].to_str().unwrap(),
            "text/event-stream"
        );

        let body = body_text(resp).await;
        assert!(body.starts_with(": connected\n\n"), "body: {body}");
        assert!(body.ends_with("event: done\ndata: {}\n\n"), "body: {body}");

        let frames = data_frames(&body);
        assert_eq!(frames.len(), 1 + 6 * 3 + 2);
        assert_eq!(frames[0]["type"], "plan");
        assert_eq!(frames[0]["plan"]["projectName"], "Build A Chart");
        assert_eq!(frames.last().unwrap()["type"], "project");
    }

    #[tokio::test]
    async fn test_stream_uses_default_prompt() {
        let tmp = TempDir::new().unwrap();
        let resp = send_request(offline_orchestrator(tmp.path()), "/swarm/stream").await;
        let frames = data_frames(&body_text(resp).await);
        assert_eq!(frames[0]["plan"]["prompt"], DEFAULT_STREAM_PROMPT);
    }

    #[tokio::test]
    async fn test_stream_reports_materialization_failure() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("projects");
        std::fs::write(&blocker, "not a directory").unwrap();

        let resp = send_request(offline_orchestrator(&blocker), "/swarm/stream?prompt=x").await;
        let body = body_text(resp).await;

        let frames = data_frames(&body);
        assert_eq!(frames.last().unwrap()["type"], "error");
        assert!(!frames.iter().any(|f| f["type"] == "project"));
        assert!(body.contains("event: error\ndata: {\"error\":"), "body: {body}");
        assert!(!body.contains("event: done"));
    }
}
