//! Transport trait abstraction for message-oriented session backends

use anyhow::Result;
use async_trait::async_trait;

/// Events surfaced by a transport between pump drains
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// One inbound UTF-8 text frame
    Message(String),
    /// The transport was closed by the peer or failed
    Closed { reason: String },
}

/// A live message-oriented session
///
/// Inbound traffic buffers inside the transport until `poll_event` drains it;
/// application to state happens only at the manager's pump interval.
#[async_trait]
pub trait MessageTransport: Send {
    /// Send one text frame
    async fn send(&mut self, text: &str) -> Result<()>;

    /// Take the next buffered event, if any (never blocks)
    fn poll_event(&mut self) -> Option<TransportEvent>;

    /// Close the transport gracefully
    async fn close(&mut self) -> Result<()>;
}

/// Factory for opening transport sessions
#[async_trait]
pub trait TransportConnector: Send + Sync {
    /// The session type this connector produces
    type Transport: MessageTransport;

    /// Attempt to open a session against the given URL
    async fn connect(&self, url: &str) -> Result<Self::Transport>;

    /// Human-readable name for this transport
    fn name(&self) -> &'static str;
}
