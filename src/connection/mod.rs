//! Session connection management: roles, lifecycle and the pump pair.
//!
//! This module provides the core [`Connection`] and [`Session`] types. A
//! `Connection` owns a ready transport handle; starting it spawns one read
//! pump and one write pump and hands the caller a `Session` — two channels
//! carrying whole JSON messages, plus keepalive and idempotent teardown
//! handled behind the scenes.
//!
//! ## Lifecycle
//!
//! 1. **Created** - transport open, pumps not yet running
//! 2. **Started** - both pumps running; the only state in which messages flow
//! 3. **Closing** - a pump detected a terminal condition
//! 4. **Closed** - channels and transport released, exactly once
//!
//! ## Example
//!
//! ```rust,ignore
//! use wschan::{Connection, SessionConfig};
//!
//! let conn = Connection::accept(transport, SessionConfig::default())?;
//! let mut session = conn.start();
//!
//! session.send(serde_json::json!({"hello": "world"})).await?;
//! while let Some(message) = session.recv().await {
//!     println!("received: {message:?}");
//! }
//! ```

#[allow(clippy::module_inception)]
mod connection;
mod id;
mod role;
mod state;

pub use connection::{Connection, Session};
pub use id::{IdGenerator, RandomId};
pub use role::Role;
pub use state::SessionState;
