//! Scripted in-memory agent shared by the integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use sb_core::config::{ClientConfig, ResilienceConfig};
use sb_core::traits::Transport;
use sb_core::TransportError;
use sb_protocol::{CallEnvelope, ResultEnvelope};

type Handler = dyn Fn(&CallEnvelope) -> Result<ResultEnvelope, TransportError> + Send + Sync;

/// Agent that answers every call with a handler and records what it saw
pub struct MockAgent {
    handler: Box<Handler>,
    calls: Mutex<Vec<CallEnvelope>>,
}

impl MockAgent {
    pub fn new<F>(handler: F) -> Arc<Self>
    where
        F: Fn(&CallEnvelope) -> Result<ResultEnvelope, TransportError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Every call received so far
    pub fn calls(&self) -> Vec<CallEnvelope> {
        self.calls.lock().unwrap().clone()
    }

    /// `plugin.name` of every call, in order
    pub fn operations(&self) -> Vec<String> {
        self.calls().iter().map(CallEnvelope::operation).collect()
    }

    /// How many times an operation was called
    pub fn count(&self, operation: &str) -> usize {
        self.operations().iter().filter(|o| *o == operation).count()
    }
}

#[async_trait]
impl Transport for MockAgent {
    async fn call(&self, call: &CallEnvelope) -> Result<ResultEnvelope, TransportError> {
        self.calls.lock().unwrap().push(call.clone());
        (self.handler)(call)
    }
}

/// Config whose retries finish in a few milliseconds
pub fn fast_config() -> ClientConfig {
    ClientConfig {
        resilience: ResilienceConfig {
            timeout: Duration::from_millis(500),
            max_retries: 2,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
            jitter: 0.0,
            ..ResilienceConfig::default()
        },
        ..ClientConfig::default()
    }
}

pub fn version_result(major: &str, minor: &str) -> ResultEnvelope {
    ResultEnvelope::ok()
        .with_field("major", major)
        .with_field("minor", minor)
}

/// Distinguished name with a tax id, a personal id and a validity window
pub fn full_name(cn: &str, serial: &str) -> String {
    format!(
        "cn={},serialnumber={},o=acme llc,t=director,1.2.860.3.16.1.1=123456789,1.2.860.3.16.1.2=30101901230012,validfrom=2024.01.01 09:00:00,validto=2026.01.01 09:00:00",
        cn, serial
    )
}

pub fn pfx_entry(alias: &str) -> Value {
    json!({
        "disk": "C:",
        "path": "DSKEYS",
        "name": "key.pfx",
        "alias": alias,
    })
}

pub fn token_entry(card_uid: &str, info: &str) -> Value {
    json!({
        "cardUID": card_uid,
        "statusInfo": "active",
        "ownerName": "OWNER",
        "info": info,
    })
}

pub fn abnormal_close() -> TransportError {
    TransportError::Closed {
        code: 1006,
        reason: String::new(),
    }
}

pub const BAD_PADDING: &str = "javax.crypto.BadPaddingException: pad block corrupted";
