//! Protocol error types

use thiserror::Error;

/// Errors that can occur while encoding or decoding agent messages
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Message was not valid JSON or did not match the expected shape
    #[error("Malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A successful result did not carry a field the operation needs
    #[error("Missing field in agent result: {0}")]
    MissingField(&'static str),

    /// Binary message that is not UTF-8 text
    #[error("Message is not valid UTF-8")]
    NotText,
}
