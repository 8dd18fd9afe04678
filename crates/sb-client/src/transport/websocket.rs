//! WebSocket transport: one connection per call
//!
//! Each call opens a connection, sends the call as the only outbound
//! message, takes the first inbound message as the result and closes.
//! Nothing is pooled or reused, so concurrent calls never interfere.

use async_trait::async_trait;
use std::time::Duration;

use sb_core::config::ClientConfig;
use sb_core::traits::Transport;
use sb_core::TransportError;
use sb_protocol::{codec, CallEnvelope, ResultEnvelope};

use super::connection::Connection;

/// Transport to the agent's crypto service endpoint
#[derive(Debug, Clone)]
pub struct WsTransport {
    url: String,
    origin: String,
    call_timeout: Duration,
}

impl WsTransport {
    /// Create a transport for the endpoint described by `config`
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.endpoint_url(), &config.origin, config.call_timeout)
    }

    /// Create a transport with explicit parameters
    pub fn new(url: impl Into<String>, origin: &str, call_timeout: Duration) -> Self {
        Self {
            url: url.into(),
            origin: origin.to_string(),
            call_timeout,
        }
    }

    /// Endpoint URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Deadline for a single call
    pub fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    async fn exchange(&self, payload: String) -> Result<ResultEnvelope, TransportError> {
        let mut connection = Connection::open(&self.url, &self.origin).await?;
        let result = connection.round_trip(payload).await;
        connection.close().await;
        result
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn call(&self, call: &CallEnvelope) -> Result<ResultEnvelope, TransportError> {
        let operation = call.operation();
        let payload = codec::encode_call(call)?;
        tracing::debug!(operation = %operation, url = %self.url, "Calling agent");

        match tokio::time::timeout(self.call_timeout, self.exchange(payload)).await {
            Ok(result) => {
                if let Err(e) = &result {
                    tracing::debug!(operation = %operation, error = %e, "Agent call failed");
                }
                result
            }
            Err(_) => {
                tracing::debug!(
                    operation = %operation,
                    timeout_ms = self.call_timeout.as_millis() as u64,
                    "Agent call deadline elapsed; connection forced closed"
                );
                Err(TransportError::DeadlineElapsed(self.call_timeout))
            }
        }
    }
}
