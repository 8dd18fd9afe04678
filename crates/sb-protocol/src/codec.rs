//! JSON text codec for agent messages
//!
//! One call is one text message; one result is one text message. There is
//! no framing beyond what the WebSocket layer already provides.

use crate::error::ProtocolError;
use crate::message::{CallEnvelope, ResultEnvelope};

/// Serialize a call as the single outbound text message
pub fn encode_call(call: &CallEnvelope) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(call)?)
}

/// Parse the single inbound text message as a result
pub fn decode_result(text: &str) -> Result<ResultEnvelope, ProtocolError> {
    let result: ResultEnvelope = serde_json::from_str(text)?;
    tracing::trace!(success = result.success, "Decoded agent result");
    Ok(result)
}

/// Parse a binary message, which some agent builds send instead of text
pub fn decode_result_bytes(bytes: &[u8]) -> Result<ResultEnvelope, ProtocolError> {
    let text = std::str::from_utf8(bytes).map_err(|_| ProtocolError::NotText)?;
    decode_result(text)
}
