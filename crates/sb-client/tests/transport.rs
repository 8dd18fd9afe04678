//! WebSocket transport tests against a real local server

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;

use sb_client::WsTransport;
use sb_core::config::ClientConfig;
use sb_core::traits::Transport;
use sb_core::TransportError;
use sb_protocol::{CallEnvelope, ProtocolError};

/// What the fake agent does after reading the call
#[derive(Debug, Clone)]
enum Reply {
    /// Answer with the received call wrapped in a successful result
    Echo,
    /// Answer with a raw text frame
    Text(&'static str),
    /// Close with a status code instead of answering
    Close(u16),
    /// Never answer
    Silent,
}

struct FakeAgent {
    url: String,
    origin: Arc<Mutex<Option<String>>>,
}

async fn spawn_agent(reply: Reply) -> FakeAgent {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let origin = Arc::new(Mutex::new(None));
    let seen_origin = origin.clone();

    tokio::spawn(async move {
        loop {
            let (stream, _) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(_) => return,
            };
            let reply = reply.clone();
            let seen_origin = seen_origin.clone();
            tokio::spawn(async move {
                let callback = |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
                    let origin = request
                        .headers()
                        .get("origin")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    *seen_origin.lock().unwrap() = origin;
                    Ok(response)
                };
                let mut ws = tokio_tungstenite::accept_hdr_async(stream, callback)
                    .await
                    .unwrap();
                let request = match ws.next().await {
                    Some(Ok(Message::Text(text))) => text,
                    _ => return,
                };

                match reply {
                    Reply::Echo => {
                        let call: serde_json::Value = serde_json::from_str(&request).unwrap();
                        let result = serde_json::json!({"success": true, "request": call});
                        ws.send(Message::Text(result.to_string())).await.unwrap();
                    }
                    Reply::Text(text) => ws.send(Message::Text(text.to_string())).await.unwrap(),
                    Reply::Close(code) => {
                        let frame = CloseFrame {
                            code: CloseCode::from(code),
                            reason: "".into(),
                        };
                        let _ = ws.close(Some(frame)).await;
                    }
                    Reply::Silent => tokio::time::sleep(Duration::from_secs(30)).await,
                }
                while let Some(Ok(_)) = ws.next().await {}
            });
        }
    });

    FakeAgent {
        url: format!("ws://{}/service/cryptapi", addr),
        origin,
    }
}

fn transport(url: &str, timeout: Duration) -> WsTransport {
    WsTransport::new(url, "http://localhost", timeout)
}

#[tokio::test]
async fn test_round_trip_sends_call_and_origin() {
    let agent = spawn_agent(Reply::Echo).await;
    let transport = transport(&agent.url, Duration::from_secs(5));

    let call = CallEnvelope::plugin("pfx", "verify_password").arg("key-42");
    let result = transport.call(&call).await.unwrap();

    assert!(result.success);
    let echoed = &result.fields["request"];
    assert_eq!(echoed["plugin"], "pfx");
    assert_eq!(echoed["name"], "verify_password");
    assert_eq!(echoed["arguments"][0], "key-42");
    assert_eq!(
        agent.origin.lock().unwrap().as_deref(),
        Some("http://localhost")
    );
}

#[tokio::test]
async fn test_concurrent_calls_use_separate_connections() {
    let agent = spawn_agent(Reply::Echo).await;
    let transport = transport(&agent.url, Duration::from_secs(5));

    let version = CallEnvelope::service("version");
    let readers = CallEnvelope::plugin("idcard", "list_readers");
    let (a, b) = tokio::join!(transport.call(&version), transport.call(&readers));

    assert_eq!(a.unwrap().fields["request"]["name"], "version");
    assert_eq!(b.unwrap().fields["request"]["name"], "list_readers");
}

#[tokio::test]
async fn test_close_before_reply() {
    let agent = spawn_agent(Reply::Close(1011)).await;
    let transport = transport(&agent.url, Duration::from_secs(5));

    let err = transport
        .call(&CallEnvelope::service("version"))
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Closed { code: 1011, .. }));
}

#[tokio::test]
async fn test_silent_agent_hits_deadline() {
    let agent = spawn_agent(Reply::Silent).await;
    let transport = transport(&agent.url, Duration::from_millis(200));

    let err = transport
        .call(&CallEnvelope::service("version"))
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::DeadlineElapsed(d) if d == Duration::from_millis(200)));
}

#[tokio::test]
async fn test_malformed_reply() {
    let agent = spawn_agent(Reply::Text("this is not json")).await;
    let transport = transport(&agent.url, Duration::from_secs(5));

    let err = transport
        .call(&CallEnvelope::service("version"))
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Malformed(ProtocolError::Malformed(_))));
}

#[tokio::test]
async fn test_nothing_listening() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let url = format!("ws://{}/service/cryptapi", addr);
    let err = transport(&url, Duration::from_secs(5))
        .call(&CallEnvelope::service("version"))
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::OpenFailed { .. }));
}

#[test]
fn test_endpoint_from_config() {
    let config = ClientConfig {
        secure: false,
        ..ClientConfig::default()
    };
    let transport = WsTransport::from_config(&config);
    assert_eq!(transport.url(), "ws://127.0.0.1:64646/service/cryptapi");
    assert_eq!(transport.call_timeout(), config.call_timeout);
}
