//! # wschan - Channel-oriented JSON message session layer
//!
//! `wschan` turns a full-duplex WebSocket-style transport into a pair of
//! channels carrying whole JSON messages. Framing, handshake negotiation and
//! TLS stay behind the [`Transport`] seam; this crate owns everything above
//! it.
//!
//! ## Features
//!
//! - **Whole-message delivery**: text frames are reassembled across
//!   arbitrary split boundaries until a complete JSON object decodes
//! - **Pump pair per connection**: one read loop, one write loop, started
//!   together and blocking only on I/O and channel operations
//! - **Keepalive**: periodic ping probes on both sides; the accept side
//!   unilaterally disconnects peers that stop answering
//! - **Deterministic teardown**: channels and transport are each released
//!   exactly once, no matter which side fails first or how often close is
//!   requested
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use wschan::{Connection, SessionConfig};
//!
//! // Accept side, over a freshly upgraded transport
//! let conn = Connection::accept(transport, SessionConfig::default())?;
//! let mut session = conn.start();
//!
//! session.send(serde_json::json!({"hello": "world"})).await?;
//! while let Some(message) = session.recv().await {
//!     println!("received: {message:?}");
//! }
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod message;
pub mod reassembler;
pub mod transport;

pub use config::SessionConfig;
pub use connection::{Connection, IdGenerator, RandomId, Role, Session, SessionState};
pub use error::{Error, Result};
pub use message::{Message, Outbound};
pub use reassembler::Reassembler;
pub use transport::{FrameKind, Transport, TransportReader, TransportWriter};

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn test_public_types_are_send() {
        assert_send::<Error>();
        assert_send::<SessionConfig>();
        assert_send::<Message>();
        assert_send::<Outbound>();
        assert_send::<FrameKind>();
        assert_send::<Role>();
        assert_send::<SessionState>();
        assert_send::<Session>();
    }

    #[test]
    fn test_public_types_are_sync() {
        assert_sync::<Error>();
        assert_sync::<SessionConfig>();
        assert_sync::<Message>();
        assert_sync::<Outbound>();
        assert_sync::<FrameKind>();
        assert_sync::<Role>();
        assert_sync::<SessionState>();
    }
}
