//! Transport collaborator contract.
//!
//! Upgrade/dial mechanics, RFC 6455 framing, TLS and message-size limiting
//! all live behind this seam: the session layer consumes a ready, full-duplex
//! transport handle and never touches wire-level bytes. Accept-side and
//! connect-side entry points belong to the transport implementation; they
//! yield a value implementing [`Transport`] which is then handed to
//! [`Connection`](crate::Connection).
//!
//! Deadlines are deliberately absent from this contract. The session layer
//! bounds each call with `tokio::time` timeouts, so implementations only
//! provide blocking `receive`/`send` plus teardown.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// Kind of one discrete unit delivered by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// UTF-8 text payload carrying (part of) a message.
    Text,
    /// Binary payload. The session layer discards these.
    Binary,
    /// Keepalive probe.
    Ping,
    /// Keepalive probe acknowledgement.
    Pong,
    /// Connection close notification.
    Close,
}

impl FrameKind {
    /// Returns `true` for control frames (ping, pong, close).
    #[inline]
    #[must_use]
    pub const fn is_control(&self) -> bool {
        matches!(self, FrameKind::Ping | FrameKind::Pong | FrameKind::Close)
    }

    /// Returns `true` for data frames (text, binary).
    #[inline]
    #[must_use]
    pub const fn is_data(&self) -> bool {
        matches!(self, FrameKind::Text | FrameKind::Binary)
    }
}

impl std::fmt::Display for FrameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameKind::Text => write!(f, "Text"),
            FrameKind::Binary => write!(f, "Binary"),
            FrameKind::Ping => write!(f, "Ping"),
            FrameKind::Pong => write!(f, "Pong"),
            FrameKind::Close => write!(f, "Close"),
        }
    }
}

/// A ready, full-duplex WebSocket-style transport.
///
/// The session layer owns the handle exclusively and splits it so that each
/// pump drives exactly one direction; the halves must be safe to use
/// concurrently with each other.
pub trait Transport: Send + 'static {
    /// Read half after splitting.
    type Reader: TransportReader;
    /// Write half after splitting.
    type Writer: TransportWriter;

    /// Split into independently owned read and write halves.
    fn split(self) -> (Self::Reader, Self::Writer);
}

/// Read half of a transport.
#[async_trait]
pub trait TransportReader: Send + 'static {
    /// Receive the next frame.
    ///
    /// Blocks until a frame arrives or the link fails. A returned error is
    /// terminal for the session.
    async fn receive(&mut self) -> Result<(FrameKind, Bytes)>;

    /// Advertise the maximum acceptable message size.
    ///
    /// Transports that enforce a read limit should honor the hint; the
    /// default implementation ignores it.
    fn set_read_limit(&mut self, _limit: usize) {}
}

/// Write half of a transport.
#[async_trait]
pub trait TransportWriter: Send + 'static {
    /// Write one frame.
    async fn send(&mut self, kind: FrameKind, payload: Bytes) -> Result<()>;

    /// Release the underlying socket.
    async fn close(&mut self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_frames() {
        assert!(FrameKind::Ping.is_control());
        assert!(FrameKind::Pong.is_control());
        assert!(FrameKind::Close.is_control());
        assert!(!FrameKind::Text.is_control());
        assert!(!FrameKind::Binary.is_control());
    }

    #[test]
    fn test_data_frames() {
        assert!(FrameKind::Text.is_data());
        assert!(FrameKind::Binary.is_data());
        assert!(!FrameKind::Ping.is_data());
        assert!(!FrameKind::Close.is_data());
    }

    #[test]
    fn test_frame_kind_display() {
        assert_eq!(FrameKind::Text.to_string(), "Text");
        assert_eq!(FrameKind::Pong.to_string(), "Pong");
    }
}
