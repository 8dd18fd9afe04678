//! sb-protocol: Wire protocol for the local signing agent
//!
//! Every exchange with the agent is a single JSON text message in each
//! direction: a [`CallEnvelope`] goes out, a [`ResultEnvelope`] comes back.
//! This crate knows nothing about connections or retries.

pub mod codec;
pub mod error;
pub mod message;
pub mod names;
pub mod record;

pub use codec::{decode_result, encode_call};
pub use error::ProtocolError;
pub use message::{Argument, CallEnvelope, ResultEnvelope, SignaturePayload};
pub use record::{PfxRecord, TokenRecord};
