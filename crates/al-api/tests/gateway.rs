//! Gateway tests against a one-shot local HTTP server.

use al_api::{ApiError, Client, GENERIC_ERROR_MESSAGE};
use al_core::{ChatContext, EndFocus, ExitType, FocusBackend, PlannedMinutes, SessionId};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Serves a single canned response and returns the raw request it received.
async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0_u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
            if request_complete(&request) {
                break;
            }
        }

        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
        String::from_utf8(request).unwrap()
    });

    (format!("http://{addr}"), handle)
}

fn request_complete(request: &[u8]) -> bool {
    let text = String::from_utf8_lossy(request);
    let Some(header_end) = text.find("\r\n\r\n") else {
        return false;
    };
    let content_length = text[..header_end]
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);
    request.len() >= header_end + 4 + content_length
}

#[tokio::test]
async fn start_focus_sends_bearer_token_and_body() {
    let (url, server) = serve_once("200 OK", r#"{"session_id":42,"message":"started"}"#).await;
    let client = Client::new(url).unwrap().with_token("tok-123");

    let started = client
        .start_focus(PlannedMinutes::try_from(45).unwrap())
        .await
        .unwrap();
    assert_eq!(started.session_id, SessionId::new(42));

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /api/focus/start "));
    assert!(
        request
            .to_ascii_lowercase()
            .contains("authorization: bearer tok-123")
    );
    assert!(request.ends_with(r#"{"planned_minutes":45}"#));
}

#[tokio::test]
async fn requests_without_token_send_no_authorization() {
    let (url, server) = serve_once(
        "200 OK",
        r#"{"token":"t","username":"aziz","message":"Welcome!"}"#,
    )
    .await;
    let client = Client::new(url).unwrap();

    let credential = client.login("aziz", "secret").await.unwrap();
    assert_eq!(credential.username, "aziz");

    let request = server.await.unwrap();
    assert!(!request.to_ascii_lowercase().contains("authorization:"));
    assert!(request.contains(r#""username":"aziz""#));
}

#[tokio::test]
async fn non_success_status_carries_server_detail() {
    let (url, _server) = serve_once(
        "401 Unauthorized",
        r#"{"detail":"Username or password is incorrect"}"#,
    )
    .await;
    let client = Client::new(url).unwrap();

    let err = client.login("aziz", "wrong").await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert_eq!(err.to_string(), "Username or password is incorrect");
}

#[tokio::test]
async fn non_success_without_detail_uses_generic_message() {
    let (url, _server) = serve_once("500 Internal Server Error", "{}").await;
    let client = Client::new(url).unwrap().with_token("tok");

    let err = client.review().await.unwrap_err();
    assert!(matches!(
        err,
        ApiError::Api { status: 500, ref message } if message == GENERIC_ERROR_MESSAGE
    ));
}

#[tokio::test]
async fn end_focus_reports_exit_reason() {
    let (url, server) = serve_once(
        "200 OK",
        r#"{"actual_minutes":3,"ai_response":"Stay focused!","message":"stopped"}"#,
    )
    .await;
    let client = Client::new(url).unwrap().with_token("tok");

    let ended = FocusBackend::end_focus(
        &client,
        &EndFocus {
            session_id: SessionId::new(9),
            exit_type: ExitType::Distracted,
            exit_reason: Some("bored".to_string()),
        },
    )
    .await
    .unwrap();
    assert_eq!(ended.actual_minutes, 3);
    assert_eq!(ended.ai_response.as_deref(), Some("Stay focused!"));

    let request = server.await.unwrap();
    assert!(request.ends_with(
        r#"{"session_id":9,"exit_type":"distracted","exit_reason":"bored"}"#
    ));
}

#[tokio::test]
async fn chat_history_passes_limit() {
    let (url, server) = serve_once(
        "200 OK",
        r#"{"messages":[{"role":"user","content":"hi","created_at":"2025-01-01"},{"role":"assistant","content":"Hello!"}]}"#,
    )
    .await;
    let client = Client::new(url).unwrap().with_token("tok");

    let messages = client.chat_history(Some(5)).await.unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].content, "Hello!");

    let request = server.await.unwrap();
    assert!(request.starts_with("GET /api/chat/history?limit=5 "));
}

#[tokio::test]
async fn chat_sends_context() {
    let (url, server) = serve_once("200 OK", r#"{"reply":"Keep going!"}"#).await;
    let client = Client::new(url).unwrap().with_token("tok");

    let reply = client.chat("can I stop?", ChatContext::Focus).await.unwrap();
    assert_eq!(reply, "Keep going!");

    let request = server.await.unwrap();
    assert!(request.ends_with(r#"{"message":"can I stop?","context":"focus"}"#));
}
