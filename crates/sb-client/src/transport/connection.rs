//! A single WebSocket connection that lives for exactly one call

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::error::{Error as WsError, UrlError};
use tokio_tungstenite::tungstenite::http::{header::ORIGIN, HeaderValue};
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use sb_core::error::close_code;
use sb_core::TransportError;
use sb_protocol::{codec, ResultEnvelope};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Close code reported when the peer's close frame carried no status
const NO_STATUS: u16 = 1005;

/// Open connection to the agent.
///
/// Closed at most once. Dropping an unclosed connection drops the socket,
/// which is how a deadline forces it shut.
pub(crate) struct Connection {
    url: String,
    ws: WsStream,
    closed: bool,
}

impl Connection {
    /// Open a connection, sending `origin` as the `Origin` header
    pub(crate) async fn open(url: &str, origin: &str) -> Result<Self, TransportError> {
        let mut request = url
            .into_client_request()
            .map_err(|e| open_error(url, e))?;
        let origin = HeaderValue::from_str(origin).map_err(|e| TransportError::OpenFailed {
            url: url.to_string(),
            message: format!("invalid Origin header: {}", e),
        })?;
        request.headers_mut().insert(ORIGIN, origin);

        let (ws, _) = connect_async(request)
            .await
            .map_err(|e| open_error(url, e))?;

        tracing::debug!(url = %url, "Agent connection opened");
        Ok(Self {
            url: url.to_string(),
            ws,
            closed: false,
        })
    }

    /// Send the only outbound message and wait for the only inbound one
    pub(crate) async fn round_trip(
        &mut self,
        payload: String,
    ) -> Result<ResultEnvelope, TransportError> {
        self.ws
            .send(Message::Text(payload))
            .await
            .map_err(|e| TransportError::Socket(e.to_string()))?;

        loop {
            match self.ws.next().await {
                Some(Ok(Message::Text(text))) => return Ok(codec::decode_result(&text)?),
                Some(Ok(Message::Binary(bytes))) => {
                    return Ok(codec::decode_result_bytes(&bytes)?)
                }
                Some(Ok(Message::Close(frame))) => {
                    // tungstenite answers the close handshake itself
                    self.closed = true;
                    let (code, reason) = frame
                        .map(|f| (u16::from(f.code), f.reason.into_owned()))
                        .unwrap_or((NO_STATUS, String::new()));
                    tracing::debug!(url = %self.url, code, "Agent closed connection before replying");
                    return Err(TransportError::Closed { code, reason });
                }
                // Pings are answered automatically
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(TransportError::Socket(e.to_string())),
                None => {
                    self.closed = true;
                    return Err(TransportError::Closed {
                        code: close_code::ABNORMAL,
                        reason: String::new(),
                    });
                }
            }
        }
    }

    /// Close the connection; later calls do nothing
    pub(crate) async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.ws.close(None).await {
            tracing::trace!(url = %self.url, error = %e, "Close handshake failed");
        }
        tracing::debug!(url = %self.url, "Agent connection closed");
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if !self.closed {
            tracing::debug!(url = %self.url, "Agent connection dropped while open");
        }
    }
}

fn open_error(url: &str, error: WsError) -> TransportError {
    match error {
        WsError::Url(UrlError::TlsFeatureNotEnabled) => {
            TransportError::Unavailable("TLS support is not compiled in".to_string())
        }
        other => TransportError::OpenFailed {
            url: url.to_string(),
            message: other.to_string(),
        },
    }
}
