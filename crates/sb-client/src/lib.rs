//! sb-client: Driver for the locally installed signing agent
//!
//! Layers, leaves first:
//! - [`transport`]: one WebSocket connection per call
//! - [`resilience`]: timeout, retry with jittered backoff, error classification
//! - [`protocol`]: typed agent operations gated by the feature tier
//! - [`service`]: the stateful facade applications use

pub mod protocol;
pub mod resilience;
pub mod service;
pub mod transport;

pub use protocol::{HardwareSigner, Pkcs7Content, ProtocolClient};
pub use resilience::{with_resilience, with_retry, with_timeout, ResilienceOptions};
pub use service::{SessionState, SigningService};
pub use transport::WsTransport;
