//! WebSocket client for the recognition service.
//!
//! The socket lives on a background thread and reconnects on every error or
//! close after a fixed delay. The engine thread talks to it through channels
//! and never blocks.

use crate::protocol::{ClientMessage, ServerMessage};
use std::net::TcpStream;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, TryRecvError, channel};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket, connect};
use url::Url;

/// Delay between a drop and the next connection attempt.
pub const RECONNECT_DELAY: Duration = Duration::from_millis(250);

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Invalid WebSocket URL scheme: {0}")]
    InvalidScheme(String),
    #[error("Already connected")]
    AlreadyConnected,
    #[error("Not connected")]
    NotConnected,
    #[error("Failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Events from the socket thread
#[derive(Debug, Clone)]
pub enum TransportEvent {
    Connected,
    Disconnected,
    /// A frame from the service.
    Message(ServerMessage),
    /// A connection attempt failed; another follows after the delay.
    Error { message: String },
}

enum WsCommand {
    Send(String),
    Close,
}

type Socket = WebSocket<MaybeTlsStream<TcpStream>>;

/// Reconnecting client for the recognition service.
pub struct SolverSocket {
    state: ConnectionState,
    cmd_tx: Option<Sender<WsCommand>>,
    event_rx: Option<Receiver<TransportEvent>>,
    _thread: Option<JoinHandle<()>>,
}

impl SolverSocket {
    /// Create a disconnected client.
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            cmd_tx: None,
            event_rx: None,
            _thread: None,
        }
    }

    /// Start connecting to `url`. Connection happens in the background.
    pub fn connect(&mut self, url: &str) -> Result<(), TransportError> {
        if self.cmd_tx.is_some() {
            return Err(TransportError::AlreadyConnected);
        }

        let parsed = Url::parse(url)?;
        if parsed.scheme() != "ws" && parsed.scheme() != "wss" {
            return Err(TransportError::InvalidScheme(parsed.scheme().to_string()));
        }

        self.state = ConnectionState::Connecting;
        let (cmd_tx, cmd_rx) = channel::<WsCommand>();
        let (event_tx, event_rx) = channel::<TransportEvent>();
        let url = url.to_string();
        let handle = thread::spawn(move || run(url, cmd_rx, event_tx));

        self.cmd_tx = Some(cmd_tx);
        self.event_rx = Some(event_rx);
        self._thread = Some(handle);
        Ok(())
    }

    /// Stop the socket thread.
    pub fn disconnect(&mut self) {
        if let Some(tx) = self.cmd_tx.take() {
            let _ = tx.send(WsCommand::Close);
        }
        self.event_rx = None;
        self._thread = None;
        self.state = ConnectionState::Disconnected;
    }

    /// Queue a message. Messages queued while the link is down go out after
    /// the next successful connect.
    pub fn send(&self, message: &ClientMessage) -> Result<(), TransportError> {
        let tx = self.cmd_tx.as_ref().ok_or(TransportError::NotConnected)?;
        let json = message.to_json()?;
        tx.send(WsCommand::Send(json)).map_err(|_| TransportError::NotConnected)
    }

    /// Drain pending events (non-blocking).
    pub fn poll_events(&mut self) -> Vec<TransportEvent> {
        let Some(rx) = &self.event_rx else {
            return Vec::new();
        };
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            match &event {
                TransportEvent::Connected => self.state = ConnectionState::Connected,
                TransportEvent::Disconnected => self.state = ConnectionState::Connecting,
                TransportEvent::Error { .. } => self.state = ConnectionState::Error,
                TransportEvent::Message(_) => {}
            }
            events.push(event);
        }
        events
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }
}

impl Default for SolverSocket {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SolverSocket {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn run(url: String, cmd_rx: Receiver<WsCommand>, event_tx: Sender<TransportEvent>) {
    let mut outbox: Vec<String> = Vec::new();
    loop {
        log::info!("Socket thread: connecting to {}", url);
        match connect(url.as_str()) {
            Ok((mut socket, response)) => {
                log::info!("Socket connected, status: {}", response.status());
                if event_tx.send(TransportEvent::Connected).is_err() {
                    return;
                }
                set_timeouts(&mut socket);
                let keep_running = pump(&mut socket, &cmd_rx, &event_tx, &mut outbox);
                let _ = event_tx.send(TransportEvent::Disconnected);
                if !keep_running {
                    log::info!("Socket thread exiting");
                    return;
                }
            }
            Err(e) => {
                log::error!("Socket connection failed: {}", e);
                let event = TransportEvent::Error {
                    message: format!("Connection failed: {}", e),
                };
                if event_tx.send(event).is_err() {
                    return;
                }
            }
        }
        if !wait_before_retry(&cmd_rx, &mut outbox) {
            log::info!("Socket thread exiting");
            return;
        }
    }
}

fn set_timeouts(socket: &mut Socket) {
    match socket.get_mut() {
        MaybeTlsStream::Plain(tcp) => {
            let _ = tcp.set_read_timeout(Some(Duration::from_millis(50)));
            let _ = tcp.set_write_timeout(Some(Duration::from_secs(5)));
        }
        #[allow(unreachable_patterns)]
        _ => log::debug!("TLS or other stream - using default timeout handling"),
    }
}

/// Serve one connection. Returns `false` when the thread should stop.
fn pump(socket: &mut Socket, cmd_rx: &Receiver<WsCommand>, event_tx: &Sender<TransportEvent>, outbox: &mut Vec<String>) -> bool {
    for msg in outbox.drain(..) {
        if let Err(e) = socket.send(Message::Text(msg)) {
            log::error!("Socket send error: {}", e);
            return true;
        }
    }

    loop {
        match cmd_rx.try_recv() {
            Ok(WsCommand::Send(msg)) => {
                log::debug!("Socket sending {} bytes", msg.len());
                if let Err(e) = socket.send(Message::Text(msg)) {
                    log::error!("Socket send error: {}", e);
                    return true;
                }
            }
            Ok(WsCommand::Close) => {
                log::info!("Socket close requested");
                let _ = socket.close(None);
                return false;
            }
            Err(TryRecvError::Disconnected) => return false,
            Err(TryRecvError::Empty) => {}
        }

        match socket.read() {
            Ok(Message::Text(txt)) => {
                log::debug!("Socket received: {}", preview(&txt));
                match ServerMessage::from_json(&txt) {
                    Ok(msg) => {
                        if event_tx.send(TransportEvent::Message(msg)).is_err() {
                            return false;
                        }
                    }
                    Err(e) => log::warn!("Failed to parse server frame: {}", e),
                }
            }
            Ok(Message::Ping(data)) => {
                let _ = socket.send(Message::Pong(data));
            }
            Ok(Message::Close(_)) => {
                log::info!("Socket received close frame");
                return true;
            }
            Ok(_) => {}
            Err(tungstenite::Error::Io(ref e))
                if e.kind() == std::io::ErrorKind::WouldBlock || e.kind() == std::io::ErrorKind::TimedOut => {}
            Err(e) => {
                log::error!("Socket read error: {}", e);
                return true;
            }
        }
    }
}

fn preview(text: &str) -> String {
    text.chars().take(100).collect()
}

/// Sleep out the reconnect delay while still honoring commands. Returns
/// `false` when the thread should stop.
fn wait_before_retry(cmd_rx: &Receiver<WsCommand>, outbox: &mut Vec<String>) -> bool {
    let deadline = Instant::now() + RECONNECT_DELAY;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return true;
        }
        match cmd_rx.recv_timeout(remaining) {
            Ok(WsCommand::Send(msg)) => outbox.push(msg),
            Ok(WsCommand::Close) | Err(RecvTimeoutError::Disconnected) => return false,
            Err(RecvTimeoutError::Timeout) => return true,
        }
    }
}
