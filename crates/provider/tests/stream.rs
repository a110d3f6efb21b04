//! Tests for the SSE drain engine, driven through the OpenRouter
//! adapter against a local canned-response server.

use dugong_core::{CompletionRequest, Message, TaskHandle};
use dugong_provider::OpenRouter;
use futures_util::StreamExt;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serve one canned HTTP response on a fresh local port.
async fn serve_once(response: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        // Read the request head; the body length doesn't matter for
        // canned responses.
        let mut request = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                break;
            }
            request.extend_from_slice(&chunk[..n]);
            if request.windows(4).any(|w| w == b"\r\n\r\n") {
                break;
            }
        }
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
    });
    format!("http://{addr}")
}

fn task() -> TaskHandle {
    TaskHandle::new("openai/gpt-4o", vec![Message::user("hi")], None)
}

fn request() -> CompletionRequest {
    CompletionRequest::new("openai/gpt-4o", vec![Message::user("hi")])
}

const STREAM_RESPONSE: &str = "HTTP/1.1 200 OK\r\n\
content-type: text/event-stream\r\n\
connection: close\r\n\
\r\n\
data: {\"id\":\"gen-42\",\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\
\n\
data: not json at all\n\
\n\
data: {\"choices\":[{\"delta\":{\"content\":\"lo\",\"reasoning\":\"hmm\"}}]}\n\
\n\
data: [DONE]\n";

#[tokio::test]
async fn drains_events_and_accumulates_output() {
    let base_url = serve_once(STREAM_RESPONSE).await;
    let provider = OpenRouter::custom(reqwest::Client::new(), "test-key", &base_url).unwrap();

    let task = task();
    let mut stream = std::pin::pin!(provider.create_completion(task.clone(), request()));
    let mut yielded = Vec::new();
    while let Some(event) = stream.next().await {
        yielded.push(event.unwrap());
    }

    // The malformed line is skipped, not fatal.
    assert_eq!(yielded.len(), 2);
    for (i, event) in yielded.iter().enumerate() {
        assert_eq!(event.sequence_number, i as u64);
    }

    let snapshot = task.snapshot();
    assert_eq!(snapshot.events.len(), 2);
    assert_eq!(snapshot.output_text.as_deref(), Some("Hello"));
    assert_eq!(snapshot.reasoning_summary.as_deref(), Some("hmm"));
    assert_eq!(snapshot.generation_ref.as_deref(), Some("gen-42"));
    let output = snapshot.output.unwrap();
    assert_eq!(output.content[0].text, "Hello");
}

#[tokio::test]
async fn non_success_status_is_a_typed_backend_error() {
    let base_url = serve_once(
        "HTTP/1.1 402 Payment Required\r\n\
         content-type: application/json\r\n\
         content-length: 24\r\n\
         connection: close\r\n\
         \r\n\
         {\"error\":\"out of funds\"}",
    )
    .await;
    let provider = OpenRouter::custom(reqwest::Client::new(), "test-key", &base_url).unwrap();

    let task = task();
    let mut stream = std::pin::pin!(provider.create_completion(task.clone(), request()));
    let error = stream.next().await.unwrap().unwrap_err();
    let message = error.to_string();
    assert!(message.contains("402"), "missing status: {message}");
    assert!(message.contains("out of funds"), "missing body: {message}");

    // The error surfaces through the stream; the task itself is left
    // for the executor to fail.
    assert!(task.snapshot().output_text.is_none());
    assert!(task.snapshot().events.is_empty());
}

#[tokio::test]
async fn cancellation_stops_the_drain_and_keeps_partial_output() {
    let base_url = serve_once(STREAM_RESPONSE).await;
    let provider = OpenRouter::custom(reqwest::Client::new(), "test-key", &base_url).unwrap();

    let task = task();
    task.mark_in_progress();
    let mut stream = std::pin::pin!(provider.create_completion(task.clone(), request()));

    // First event arrives, then cancel lands before the next line is
    // consumed.
    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(first.sequence_number, 0);
    task.cancel();
    while let Some(event) = stream.next().await {
        event.unwrap();
    }

    let snapshot = task.snapshot();
    assert_eq!(snapshot.events.len(), 1);
    assert_eq!(snapshot.output_text.as_deref(), Some("Hel"));
}
