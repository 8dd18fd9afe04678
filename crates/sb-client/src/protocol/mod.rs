//! Typed agent operations
//!
//! Every operation is a single call (or a short fixed chain of calls) over
//! the transport. Capability-gated operations take the session's
//! [`FeatureTier`](sb_core::FeatureTier) explicitly and fail fast when it is
//! too low. Nothing here retries.

mod client;
mod credentials;
mod directory;
mod signing;

pub use client::ProtocolClient;
pub use directory::{default_item_id, ItemIdGen};
pub use signing::{HardwareSigner, Pkcs7Content};
