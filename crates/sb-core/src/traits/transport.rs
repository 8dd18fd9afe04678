//! Transport trait

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::TransportError;
use sb_protocol::{CallEnvelope, ResultEnvelope};

/// One request, one response, over a connection nobody else uses.
///
/// Implementations open a fresh connection per call and release it on every
/// exit path. Nothing is shared between calls, so calls may run concurrently.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `call` and wait for the agent's single result
    async fn call(&self, call: &CallEnvelope) -> Result<ResultEnvelope, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn call(&self, call: &CallEnvelope) -> Result<ResultEnvelope, TransportError> {
        (**self).call(call).await
    }
}
