use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::{mpsc, watch};
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::config::SessionConfig;
use crate::connection::id::{IdGenerator, RandomId};
use crate::connection::role::Role;
use crate::connection::state::SessionState;
use crate::error::{Error, Result};
use crate::message::{Message, Outbound};
use crate::reassembler::Reassembler;
use crate::transport::{FrameKind, Transport, TransportReader, TransportWriter};

/// Lifecycle state shared between the pumps and the caller handle.
///
/// The watch sender is the close-once guard: `begin_close` performs a
/// compare-and-set into `Closing`, so exactly one of the racing parties wins
/// the transition, and the cancellation token fans the decision out to both
/// pumps.
#[derive(Debug)]
struct Shared {
    state: watch::Sender<SessionState>,
    shutdown: CancellationToken,
}

impl Shared {
    fn new() -> Self {
        Self {
            state: watch::Sender::new(SessionState::Created),
            shutdown: CancellationToken::new(),
        }
    }

    fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    fn mark_started(&self) {
        self.state.send_replace(SessionState::Started);
    }

    /// Request teardown. Idempotent; every call past the first is a no-op.
    fn begin_close(&self) {
        self.state.send_if_modified(|state| {
            if matches!(state, SessionState::Created | SessionState::Started) {
                *state = SessionState::Closing;
                true
            } else {
                false
            }
        });
        self.shutdown.cancel();
    }

    fn mark_closed(&self) {
        self.state.send_replace(SessionState::Closed);
    }

    async fn closed(&self) {
        let mut state = self.state.subscribe();
        // The sender lives in this Shared, so wait_for cannot fail while we
        // hold &self.
        let _ = state
            .wait_for(|state| matches!(state, SessionState::Closed))
            .await;
    }
}

/// A message-oriented connection over a ready transport handle.
///
/// Created by [`Connection::accept`] (upgrade side) or
/// [`Connection::connect`] (dial side). Holds the transport exclusively
/// until [`Connection::start`] consumes it and hands everything to the pump
/// pair.
pub struct Connection<T> {
    id: String,
    role: Role,
    transport: T,
    config: SessionConfig,
    shared: Arc<Shared>,
}

impl<T: Transport> Connection<T> {
    /// Create an accept-side session over an upgraded transport.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the configuration fails
    /// validation, or an identifier-generation error.
    pub fn accept(transport: T, config: SessionConfig) -> Result<Self> {
        Self::with_id_generator(transport, Role::Server, config, &RandomId)
    }

    /// Create a connect-side session over a dialed transport.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the configuration fails
    /// validation, or an identifier-generation error.
    pub fn connect(transport: T, config: SessionConfig) -> Result<Self> {
        Self::with_id_generator(transport, Role::Client, config, &RandomId)
    }

    /// Create a session with an injected identifier generator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the configuration fails
    /// validation, or whatever the generator reports.
    pub fn with_id_generator(
        transport: T,
        role: Role,
        config: SessionConfig,
        ids: &dyn IdGenerator,
    ) -> Result<Self> {
        config.validate()?;
        let id = ids.generate()?;
        Ok(Self {
            id,
            role,
            transport,
            config,
            shared: Arc::new(Shared::new()),
        })
    }

    /// The session identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The session role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.shared.state()
    }

    /// Start the pump pair and hand the transport over to it.
    ///
    /// Consuming `self` makes a second start unrepresentable: there is at
    /// most one read pump and one write pump per connection.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn start(self) -> Session {
        let Self {
            id,
            role,
            transport,
            config,
            shared,
        } = self;

        let (reader, writer) = transport.split();
        let (inbound_tx, inbound_rx) = mpsc::channel(config.channel_capacity);
        let (outbound_tx, outbound_rx) = mpsc::channel(config.channel_capacity);

        shared.mark_started();
        debug!(id = %id, role = %role, "session started");

        let read_pump = ReadPump {
            id: id.clone(),
            role,
            config: config.clone(),
            reader,
            inbound: inbound_tx,
            shared: Arc::clone(&shared),
        };
        let write_pump = WritePump {
            id: id.clone(),
            config,
            writer,
            outbound: outbound_rx,
            shared: Arc::clone(&shared),
        };

        let read_task = tokio::spawn(read_pump.run());
        let write_task = tokio::spawn(write_pump.run());

        {
            let shared = Arc::clone(&shared);
            let id = id.clone();
            tokio::spawn(async move {
                let _ = read_task.await;
                let _ = write_task.await;
                shared.mark_closed();
                debug!(id = %id, "session closed");
            });
        }

        Session {
            id,
            role,
            outbound: outbound_tx,
            inbound: inbound_rx,
            shared,
        }
    }
}

/// Caller handle for a started connection: the two channels plus lifecycle
/// control.
///
/// Dropping the session (and every sender obtained from
/// [`Session::sender`]) closes the outbound channel, which requests a
/// graceful shutdown: the write pump emits a best-effort close frame and
/// tears the connection down.
pub struct Session {
    id: String,
    role: Role,
    outbound: mpsc::Sender<Outbound>,
    inbound: mpsc::Receiver<Message>,
    shared: Arc<Shared>,
}

impl Session {
    /// The session identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The session role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.shared.state()
    }

    /// Check if teardown has begun.
    pub fn is_closed(&self) -> bool {
        matches!(self.state(), SessionState::Closing | SessionState::Closed)
    }

    /// Submit one outbound message.
    ///
    /// Blocks while the outbound channel is full.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Closed`] if the session has been torn down.
    pub async fn send(&self, message: impl Into<Outbound>) -> Result<()> {
        self.outbound
            .send(message.into())
            .await
            .map_err(|_| Error::Closed)
    }

    /// Clone of the outbound producer, for additional sender tasks.
    pub fn sender(&self) -> mpsc::Sender<Outbound> {
        self.outbound.clone()
    }

    /// Receive the next decoded message.
    ///
    /// Returns `None` once the session has ended (transport error or
    /// peer-initiated close); the caller must stop reading then.
    pub async fn recv(&mut self) -> Option<Message> {
        self.inbound.recv().await
    }

    /// Request teardown. Idempotent and safe to call from any task.
    pub fn close(&self) {
        self.shared.begin_close();
    }

    /// Wait until every session resource has been released.
    pub async fn closed(&self) {
        self.shared.closed().await;
    }

    /// Split into the raw channel pair.
    ///
    /// Dropping the sender (and any clones) requests a graceful shutdown;
    /// the receiver yields `None` once the session ends.
    pub fn into_channels(self) -> (mpsc::Sender<Outbound>, mpsc::Receiver<Message>) {
        (self.outbound, self.inbound)
    }
}

/// Single reader loop: pulls frames, reassembles, delivers inbound messages.
struct ReadPump<R> {
    id: String,
    role: Role,
    config: SessionConfig,
    reader: R,
    inbound: mpsc::Sender<Message>,
    shared: Arc<Shared>,
}

impl<R: TransportReader> ReadPump<R> {
    async fn run(mut self) {
        self.reader.set_read_limit(self.config.max_message_size);

        let shutdown = self.shared.shutdown.clone();
        let mut reassembler = Reassembler::new();
        // Liveness deadline, armed on the accept side only and refreshed
        // exclusively by received pongs.
        let mut deadline = Instant::now() + self.config.pong_wait;

        loop {
            let received = tokio::select! {
                () = shutdown.cancelled() => break,
                received = self.next_frame(deadline) => received,
            };

            let (kind, payload) = match received {
                Ok(frame) => frame,
                Err(err) => {
                    debug!(id = %self.id, error = %err, "read pump terminating");
                    self.shared.begin_close();
                    break;
                }
            };

            match kind {
                FrameKind::Text => {
                    let Some(message) = reassembler.feed(&payload) else {
                        continue;
                    };
                    // Backpressure: delivery blocks until a consumer is
                    // ready, which in turn stalls the socket read side.
                    let delivered = tokio::select! {
                        () = shutdown.cancelled() => break,
                        delivered = self.inbound.send(message) => delivered,
                    };
                    if delivered.is_err() {
                        debug!(id = %self.id, "inbound consumer dropped");
                        self.shared.begin_close();
                        break;
                    }
                }
                FrameKind::Binary => {
                    trace!(id = %self.id, len = payload.len(), "discarding binary frame");
                }
                FrameKind::Pong => {
                    if self.role.enforces_liveness() {
                        deadline = Instant::now() + self.config.pong_wait;
                    }
                    trace!(id = %self.id, "pong received");
                }
                FrameKind::Ping => {
                    trace!(id = %self.id, "ping received");
                }
                FrameKind::Close => {
                    debug!(id = %self.id, "peer closed");
                    self.shared.begin_close();
                    break;
                }
            }
        }
        // The inbound sender drops here, closing the channel exactly once.
    }

    async fn next_frame(&mut self, deadline: Instant) -> Result<(FrameKind, Bytes)> {
        if self.role.enforces_liveness() {
            match time::timeout_at(deadline, self.reader.receive()).await {
                Ok(received) => received,
                Err(_) => Err(Error::LivenessTimeout {
                    elapsed: self.config.pong_wait,
                }),
            }
        } else {
            self.reader.receive().await
        }
    }
}

/// Single writer loop: multiplexes caller messages with keepalive probes.
struct WritePump<W> {
    id: String,
    config: SessionConfig,
    writer: W,
    outbound: mpsc::Receiver<Outbound>,
    shared: Arc<Shared>,
}

impl<W: TransportWriter> WritePump<W> {
    async fn run(mut self) {
        let shutdown = self.shared.shutdown.clone();
        let mut probe = time::interval_at(
            Instant::now() + self.config.ping_period,
            self.config.ping_period,
        );
        probe.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // Cleared when this pump's own write failure proves the link dead;
        // a parting close frame would be pointless then.
        let mut send_close = true;

        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                submitted = self.outbound.recv() => {
                    let Some(payload) = submitted else {
                        // All producers dropped: graceful shutdown.
                        debug!(id = %self.id, "outbound channel closed");
                        self.shared.begin_close();
                        break;
                    };
                    match self.write_message(payload).await {
                        Ok(()) => {}
                        Err(Error::Encode(err)) => {
                            warn!(id = %self.id, error = %err, "dropping unserializable outbound message");
                        }
                        Err(err @ Error::WriteTimeout { .. }) => {
                            debug!(id = %self.id, error = %err, "write pump terminating");
                            send_close = false;
                            self.shared.begin_close();
                            break;
                        }
                        Err(err) => {
                            // A rejected data frame is not fatal: the next
                            // probe surfaces a dead link.
                            warn!(id = %self.id, error = %err, "data frame write failed");
                        }
                    }
                }
                _ = probe.tick() => {
                    if let Err(err) = self.write_frame(FrameKind::Ping, Bytes::new()).await {
                        debug!(id = %self.id, error = %err, "ping write failed");
                        send_close = false;
                        self.shared.begin_close();
                        break;
                    }
                    trace!(id = %self.id, "ping sent");
                }
            }
        }

        if send_close {
            // Parting close frame, best effort.
            let _ = self.write_frame(FrameKind::Close, Bytes::new()).await;
        }
        if let Err(err) = self.writer.close().await {
            debug!(id = %self.id, error = %err, "transport close failed");
        }
        // The outbound receiver drops here, closing the channel exactly
        // once.
    }

    async fn write_message(&mut self, payload: Outbound) -> Result<()> {
        let bytes = match payload {
            Outbound::Raw(raw) => Bytes::from(raw),
            Outbound::Json(value) => Bytes::from(serde_json::to_vec(&value)?),
        };
        self.write_frame(FrameKind::Text, bytes).await
    }

    /// Write one frame under a fresh write deadline.
    async fn write_frame(&mut self, kind: FrameKind, payload: Bytes) -> Result<()> {
        let wait = self.config.write_wait;
        match time::timeout(wait, self.writer.send(kind, payload)).await {
            Ok(sent) => sent,
            Err(_) => Err(Error::WriteTimeout { elapsed: wait }),
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::json;

    use super::*;

    struct MockTransport {
        incoming: mpsc::UnboundedReceiver<Result<(FrameKind, Bytes)>>,
        written: mpsc::UnboundedSender<(FrameKind, Bytes)>,
    }

    struct MockReader {
        incoming: mpsc::UnboundedReceiver<Result<(FrameKind, Bytes)>>,
    }

    struct MockWriter {
        written: mpsc::UnboundedSender<(FrameKind, Bytes)>,
    }

    impl Transport for MockTransport {
        type Reader = MockReader;
        type Writer = MockWriter;

        fn split(self) -> (Self::Reader, Self::Writer) {
            (
                MockReader {
                    incoming: self.incoming,
                },
                MockWriter {
                    written: self.written,
                },
            )
        }
    }

    #[async_trait]
    impl TransportReader for MockReader {
        async fn receive(&mut self) -> Result<(FrameKind, Bytes)> {
            match self.incoming.recv().await {
                Some(frame) => frame,
                None => Err(Error::Io("connection reset by peer".into())),
            }
        }
    }

    #[async_trait]
    impl TransportWriter for MockWriter {
        async fn send(&mut self, kind: FrameKind, payload: Bytes) -> Result<()> {
            self.written
                .send((kind, payload))
                .map_err(|_| Error::Io("peer gone".into()))
        }

        async fn close(&mut self) -> Result<()> {
            Ok(())
        }
    }

    type FrameSender = mpsc::UnboundedSender<Result<(FrameKind, Bytes)>>;
    type FrameReceiver = mpsc::UnboundedReceiver<(FrameKind, Bytes)>;

    fn mock_transport() -> (MockTransport, FrameSender, FrameReceiver) {
        let (frames_tx, frames_rx) = mpsc::unbounded_channel();
        let (written_tx, written_rx) = mpsc::unbounded_channel();
        (
            MockTransport {
                incoming: frames_rx,
                written: written_tx,
            },
            frames_tx,
            written_rx,
        )
    }

    #[test]
    fn test_accept_is_server_role() {
        let (transport, _frames, _written) = mock_transport();
        let conn = Connection::accept(transport, SessionConfig::default()).unwrap();
        assert_eq!(conn.role(), Role::Server);
        assert_eq!(conn.state(), SessionState::Created);
        assert!(!conn.id().is_empty());
    }

    #[test]
    fn test_connect_is_client_role() {
        let (transport, _frames, _written) = mock_transport();
        let conn = Connection::connect(transport, SessionConfig::default()).unwrap();
        assert_eq!(conn.role(), Role::Client);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let (transport, _frames, _written) = mock_transport();
        let config = SessionConfig::default().with_channel_capacity(0);
        let result = Connection::accept(transport, config);
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_injected_id_generator() {
        struct Fixed;
        impl IdGenerator for Fixed {
            fn generate(&self) -> Result<String> {
                Ok("session-1".into())
            }
        }

        let (transport, _frames, _written) = mock_transport();
        let conn =
            Connection::with_id_generator(transport, Role::Client, SessionConfig::default(), &Fixed)
                .unwrap();
        assert_eq!(conn.id(), "session-1");
    }

    #[tokio::test]
    async fn test_outbound_json_written_as_text_frame() {
        let (transport, _frames, mut written) = mock_transport();
        let session = Connection::connect(transport, SessionConfig::default())
            .unwrap()
            .start();

        session.send(json!({"hello": "world"})).await.unwrap();

        let (kind, payload) = written.recv().await.unwrap();
        assert_eq!(kind, FrameKind::Text);
        let value: serde_json::Value = serde_json::from_slice(&payload).unwrap();
        assert_eq!(value, json!({"hello": "world"}));
    }

    #[tokio::test]
    async fn test_inbound_delivery() {
        let (transport, frames, _written) = mock_transport();
        let mut session = Connection::connect(transport, SessionConfig::default())
            .unwrap()
            .start();

        frames
            .send(Ok((
                FrameKind::Text,
                Bytes::from_static(br#"{"hello":"world"}"#),
            )))
            .unwrap();

        let message = session.recv().await.unwrap();
        assert_eq!(message.get("hello"), Some(&json!("world")));
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let (transport, _frames, _written) = mock_transport();
        let session = Connection::connect(transport, SessionConfig::default())
            .unwrap()
            .start();

        session.close();
        session.close();
        session.closed().await;
        assert_eq!(session.state(), SessionState::Closed);
        assert!(session.is_closed());
    }

    #[tokio::test]
    async fn test_send_after_close_fails() {
        let (transport, _frames, _written) = mock_transport();
        let session = Connection::connect(transport, SessionConfig::default())
            .unwrap()
            .start();

        session.close();
        session.closed().await;

        let result = session.send(json!({"late": true})).await;
        assert_eq!(result, Err(Error::Closed));
    }
}
