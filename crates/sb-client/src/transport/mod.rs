//! Ephemeral-connection transport to the agent

mod connection;
mod websocket;

pub use websocket::WsTransport;
