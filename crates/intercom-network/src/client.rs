//! Persistent control socket client.
//!
//! # Architecture
//!
//! ```text
//!                      ┌──────────────────┐
//! dial/hangup/play ───>│  Link (writer)   │──(TCP)──> baresip ctrl_tcp
//! keepalive loop ─────>│  FramedWrite     │
//!                      └──────────────────┘
//!                      ┌──────────────────┐     ┌─> responses
//! baresip ──(TCP)─────>│  read loop       │─────┼─> events
//!                      │  FramedRead      │     └─> liveness
//!                      └──────────────────┘
//! ```
//!
//! The client runs two tasks for its whole lifetime:
//!
//! - **keepalive loop**: reconnects a dead connection (retrying every
//!   backoff period), then probes a live one every interval.
//! - **read loop**: decodes the current connection's frames in wire order
//!   and routes them. Each reconnect hands it the new read half.
//!
//! # Failure Handling
//!
//! Only the initial connection failure is returned to the caller. After
//! that, a failed write marks the connection dead, closes it and reports
//! the error to the caller of that write; the keepalive loop brings the
//! connection back. Commands are never retried here.
//!
//! Commands in flight during a disconnect are not guaranteed a reply.

use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{Mutex, mpsc};
use tokio::time::Instant;
use tokio_util::codec::{FramedRead, FramedWrite};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use intercom_core::constants::{
    CONNECT_TIMEOUT_SECS, DEFAULT_CONTROL_PORT, EVENT_CHANNEL_CAPACITY, KEEPALIVE_INTERVAL_SECS,
    LIVENESS_CHANNEL_CAPACITY, RECONNECT_BACKOFF_SECS, RESPONSE_CHANNEL_CAPACITY,
    WRITE_TIMEOUT_SECS,
};
use intercom_protocol::{Command, ControlCodec, Event, Frame, Inbound, Response};

/// Configuration for the control client.
#[derive(Debug, Clone)]
pub struct ControlClientConfig {
    /// `host:port` of the control socket.
    pub server_addr: String,

    /// Deadline of each connect attempt.
    pub connect_timeout: Duration,

    /// Deadline of each write.
    pub write_timeout: Duration,

    /// Period between liveness probes.
    pub keepalive_interval: Duration,

    /// Wait after a failed reconnect attempt.
    pub reconnect_backoff: Duration,
}

impl ControlClientConfig {
    pub fn new(server_addr: impl Into<String>) -> Self {
        Self {
            server_addr: server_addr.into(),
            ..Self::default()
        }
    }
}

impl Default for ControlClientConfig {
    fn default() -> Self {
        Self {
            server_addr: format!("localhost:{}", DEFAULT_CONTROL_PORT),
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            write_timeout: Duration::from_secs(WRITE_TIMEOUT_SECS),
            keepalive_interval: Duration::from_secs(KEEPALIVE_INTERVAL_SECS),
            reconnect_backoff: Duration::from_secs(RECONNECT_BACKOFF_SECS),
        }
    }
}

/// Errors that can occur during control client operations
#[derive(Debug, Error)]
pub enum ClientError {
    /// No live connection to the control socket
    #[error("Not connected to control socket")]
    NotConnected,

    /// Connection attempt timed out
    #[error("Connection timeout after {0}ms")]
    ConnectionTimeout(u64),

    /// Write operation timed out
    #[error("Write timeout after {0}ms")]
    WriteTimeout(u64),

    /// Connection was lost during operation
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// Encoding error from ControlCodec
    #[error("Protocol error: {0}")]
    Protocol(#[from] intercom_core::Error),

    /// Low-level I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    fn from_codec(error: intercom_core::Error) -> Self {
        match error {
            intercom_core::Error::Io(e) => ClientError::Io(e),
            other => ClientError::Protocol(other),
        }
    }

    /// Whether the error leaves the transport in an unknown state.
    fn is_transport_fault(&self) -> bool {
        !matches!(self, ClientError::Protocol(_))
    }
}

/// Inbound sequences produced by the read loop.
///
/// Each channel is bounded; a slow consumer back-pressures the read loop.
#[derive(Debug)]
pub struct ControlStreams {
    /// Replies to dial/hangup/play commands.
    pub responses: mpsc::Receiver<Response>,

    /// Unsolicited call events.
    pub events: mpsc::Receiver<Event>,

    /// Replies to liveness probes.
    pub liveness: mpsc::Receiver<Response>,
}

/// Write side of one connection.
struct Link {
    generation: u64,
    sink: FramedWrite<OwnedWriteHalf, ControlCodec>,
    cancel: CancellationToken,
    last_keepalive: Option<Instant>,
}

/// Read side of one connection, handed to the read loop.
struct Reader {
    generation: u64,
    source: FramedRead<OwnedReadHalf, ControlCodec>,
    cancel: CancellationToken,
}

struct Shared {
    config: ControlClientConfig,
    link: Mutex<Option<Link>>,
    alive: AtomicBool,
    generation: AtomicU64,
    readers: mpsc::Sender<Reader>,
}

impl Shared {
    /// Mark the connection dead and close it. The read loop drops its half
    /// once the cancellation is observed.
    fn close(&self, link: &mut Option<Link>) {
        self.alive.store(false, Ordering::SeqCst);
        if let Some(link) = link.take() {
            link.cancel.cancel();
            debug!(generation = link.generation, "Connection closed");
        }
    }

    /// Close the connection only if it is still `generation`.
    async fn close_generation(&self, generation: u64) {
        let mut link = self.link.lock().await;
        if link.as_ref().is_some_and(|l| l.generation == generation) {
            self.close(&mut link);
        }
    }
}

/// Routing targets of the read loop.
struct Routes {
    responses: mpsc::Sender<Response>,
    events: mpsc::Sender<Event>,
    liveness: mpsc::Sender<Response>,
}

impl Routes {
    async fn dispatch(&self, frame: Frame) {
        match frame.classify() {
            Ok(Inbound::Response(response)) if response.is_liveness() => {
                trace!(ok = response.ok, "Liveness reply");
                if self.liveness.send(response).await.is_err() {
                    debug!("Liveness consumer gone, reply dropped");
                }
            }
            Ok(Inbound::Response(response)) => {
                debug!(token = %response.token, ok = response.ok, "Response received");
                if self.responses.send(response).await.is_err() {
                    debug!("Response consumer gone, reply dropped");
                }
            }
            Ok(Inbound::Event(event)) => {
                debug!(kind = %event.kind, id = %event.id, "Event received");
                if self.events.send(event).await.is_err() {
                    debug!("Event consumer gone, event dropped");
                }
            }
            Ok(Inbound::Unrecognized(value)) => {
                warn!("Unrecognized record dropped: {}", value);
            }
            Err(e) => {
                error!("Failed to decode record - {}: {}", e, frame.as_text());
            }
        }
    }
}

/// Client for the baresip control socket.
///
/// Cloning is cheap; clones share the same connection.
///
/// # Example
///
/// ```no_run
/// use intercom_network::{ControlClient, ControlClientConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (client, streams) = ControlClient::connect(ControlClientConfig::default()).await?;
/// assert!(client.is_alive());
///
/// client.play("ringback.wav").await?;
/// client.hangup().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ControlClient {
    shared: Arc<Shared>,
}

impl ControlClient {
    /// Connect to the control socket and start the background loops.
    ///
    /// # Errors
    ///
    /// Returns an error if the first connection cannot be established.
    /// Later reconnections are handled internally.
    pub async fn connect(
        config: ControlClientConfig,
    ) -> Result<(Self, ControlStreams), ClientError> {
        let (reader_tx, reader_rx) = mpsc::channel(1);
        let (response_tx, responses) = mpsc::channel(RESPONSE_CHANNEL_CAPACITY);
        let (event_tx, events) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (liveness_tx, liveness) = mpsc::channel(LIVENESS_CHANNEL_CAPACITY);

        let client = Self {
            shared: Arc::new(Shared {
                config,
                link: Mutex::new(None),
                alive: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                readers: reader_tx,
            }),
        };

        client.establish().await?;

        let routes = Routes {
            responses: response_tx,
            events: event_tx,
            liveness: liveness_tx,
        };
        tokio::spawn(read_loop(reader_rx, routes, Arc::clone(&client.shared)));
        tokio::spawn(client.clone().keepalive_loop());

        let streams = ControlStreams {
            responses,
            events,
            liveness,
        };
        Ok((client, streams))
    }

    /// Open a new connection and replace the current one.
    async fn establish(&self) -> Result<(), ClientError> {
        let config = &self.shared.config;
        debug!("Connecting to control socket at {}", config.server_addr);

        let stream = match tokio::time::timeout(
            config.connect_timeout,
            TcpStream::connect(config.server_addr.as_str()),
        )
        .await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {
                return Err(ClientError::ConnectionTimeout(
                    config.connect_timeout.as_millis() as u64,
                ));
            }
        };

        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY: {}", e);
        }

        let (read_half, write_half) = stream.into_split();
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let cancel = CancellationToken::new();

        {
            let mut link = self.shared.link.lock().await;
            self.shared.close(&mut link);
            *link = Some(Link {
                generation,
                sink: FramedWrite::new(write_half, ControlCodec::new()),
                cancel: cancel.clone(),
                last_keepalive: None,
            });
            self.shared.alive.store(true, Ordering::SeqCst);
        }

        let reader = Reader {
            generation,
            source: FramedRead::new(read_half, ControlCodec::new()),
            cancel,
        };
        if self.shared.readers.send(reader).await.is_err() {
            return Err(ClientError::ConnectionLost("read loop stopped".to_string()));
        }

        info!(generation, "Connected to control socket at {}", config.server_addr);
        Ok(())
    }

    async fn keepalive_loop(self) {
        let interval = self.shared.config.keepalive_interval;
        let backoff = self.shared.config.reconnect_backoff;

        loop {
            if !self.is_alive() {
                if let Err(e) = self.establish().await {
                    warn!("Failed to reconnect to control socket, retrying: {}", e);
                    tokio::time::sleep(backoff).await;
                    continue;
                }
            }

            tokio::time::sleep(interval).await;
            if !self.is_alive() {
                continue;
            }

            match self.send(Command::liveness()).await {
                Ok(()) => {
                    if let Some(link) = self.shared.link.lock().await.as_mut() {
                        link.last_keepalive = Some(Instant::now());
                    }
                }
                Err(e) => warn!("Liveness probe failed: {}", e),
            }
        }
    }

    /// Send a command with the write deadline.
    ///
    /// # Errors
    ///
    /// Returns an error if the client is not connected, the write times out
    /// or the socket fails. Transport failures mark the connection dead and
    /// close it; the keepalive loop reconnects.
    pub async fn send(&self, command: Command) -> Result<(), ClientError> {
        trace!(%command, "Sending command");

        let mut link = self.shared.link.lock().await;
        let Some(current) = link.as_mut() else {
            return Err(ClientError::NotConnected);
        };

        let write_timeout = self.shared.config.write_timeout;
        let error = match tokio::time::timeout(write_timeout, current.sink.send(command)).await {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(e)) => ClientError::from_codec(e),
            Err(_) => ClientError::WriteTimeout(write_timeout.as_millis() as u64),
        };

        if error.is_transport_fault() {
            error!("Control socket write failed, closing connection: {}", error);
            self.shared.close(&mut link);
        }
        Err(error)
    }

    /// Place a call to `number`.
    pub async fn dial(&self, number: &str) -> Result<(), ClientError> {
        self.send(Command::dial(number)).await
    }

    /// Hang up the current call.
    pub async fn hangup(&self) -> Result<(), ClientError> {
        self.send(Command::hangup()).await
    }

    /// Play an audio file on the engine.
    pub async fn play(&self, file: &str) -> Result<(), ClientError> {
        self.send(Command::play(file)).await
    }

    /// Whether the current connection is considered live.
    pub fn is_alive(&self) -> bool {
        self.shared.alive.load(Ordering::SeqCst)
    }

    /// When the last liveness probe was written on the current connection.
    pub async fn last_keepalive(&self) -> Option<Instant> {
        self.shared
            .link
            .lock()
            .await
            .as_ref()
            .and_then(|link| link.last_keepalive)
    }

    pub fn server_addr(&self) -> &str {
        &self.shared.config.server_addr
    }
}

async fn read_loop(mut readers: mpsc::Receiver<Reader>, routes: Routes, shared: Arc<Shared>) {
    while let Some(mut reader) = readers.recv().await {
        debug!(generation = reader.generation, "Reading from control socket");

        loop {
            let next = tokio::select! {
                _ = reader.cancel.cancelled() => {
                    debug!(generation = reader.generation, "Reader cancelled");
                    break;
                }
                next = reader.source.next() => next,
            };

            match next {
                Some(Ok(frame)) => routes.dispatch(frame).await,
                Some(Err(e)) => {
                    warn!("Control socket read failed: {}", e);
                    shared.close_generation(reader.generation).await;
                    break;
                }
                None => {
                    warn!("Control socket closed by peer");
                    shared.close_generation(reader.generation).await;
                    break;
                }
            }
        }
    }
}
