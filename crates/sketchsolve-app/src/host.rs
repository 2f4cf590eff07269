//! Headless host: feeds commands into the engine and pumps the service link.

use crate::commands::HostCommand;
use kurbo::Size;
use sketchsolve_core::{
    ClientMessage, ConfigError, Engine, EngineConfig, Instant, ServerMessage, SolverSocket, TransportError,
    TransportEvent,
};
use sketchsolve_render::{PngRasterizer, RasterSurface, RendererError};
use std::io::BufRead;
use std::path::Path;
use std::sync::mpsc::{Receiver, RecvTimeoutError, channel};
use std::thread;
use std::time::Duration;
use thiserror::Error;

/// Initial canvas size until a `resize` command arrives.
pub const DEFAULT_CANVAS: Size = Size::new(1280.0, 720.0);

/// How long the loop waits for input before servicing timers and the socket.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Host errors.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Render error: {0}")]
    Render(#[from] RendererError),
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Whether the command loop should keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Owns the engine, the rasterizer and the service socket.
pub struct Host {
    engine: Engine<RasterSurface>,
    rasterizer: PngRasterizer,
    socket: SolverSocket,
}

impl Host {
    pub fn new(config: EngineConfig, canvas: Size, now: Instant) -> Result<Self, HostError> {
        let surface = RasterSurface::new(canvas.width.ceil() as u32, canvas.height.ceil() as u32)?;
        Ok(Self {
            engine: Engine::new(config, surface, now),
            rasterizer: PngRasterizer::new(),
            socket: SolverSocket::new(),
        })
    }

    /// Start connecting to the configured service.
    pub fn connect(&mut self) -> Result<(), HostError> {
        let url = self.engine.config().solver_url.clone();
        self.socket.connect(&url)?;
        Ok(())
    }

    pub fn engine(&self) -> &Engine<RasterSurface> {
        &self.engine
    }

    /// Parse and apply one input line. Malformed lines are logged and skipped.
    pub fn handle_line(&mut self, line: &str, now: Instant) -> Flow {
        let line = line.trim();
        if line.is_empty() {
            return Flow::Continue;
        }
        match HostCommand::parse(line) {
            Ok(command) => self.apply(command, now),
            Err(e) => {
                log::warn!("Ignoring malformed command {:?}: {}", line, e);
                Flow::Continue
            }
        }
    }

    /// Apply one command.
    pub fn apply(&mut self, command: HostCommand, now: Instant) -> Flow {
        if let Some(event) = command.pointer_event() {
            self.engine.handle_pointer(event, now);
            return Flow::Continue;
        }
        match command {
            HostCommand::SetMode { kind, options } => self.engine.set_mode(kind, options),
            HostCommand::Resize { width, height } => self.engine.resize(Size::new(width, height)),
            HostCommand::Snapshot { path } => {
                if let Err(e) = self.snapshot(&path) {
                    log::error!("Failed to write snapshot {}: {}", path.display(), e);
                }
            }
            HostCommand::Quit => return Flow::Quit,
            _ => {}
        }
        Flow::Continue
    }

    /// Write the canvas as PNG.
    pub fn snapshot(&self, path: &Path) -> Result<(), HostError> {
        let png = self.engine.surface().to_png()?;
        std::fs::write(path, png)?;
        log::info!("Snapshot written to {}", path.display());
        Ok(())
    }

    /// Drain socket events into the engine, then advance the idle timer.
    pub fn pump(&mut self, now: Instant) -> Option<ClientMessage> {
        for event in self.socket.poll_events() {
            match event {
                TransportEvent::Message(frame) => self.deliver(frame),
                TransportEvent::Connected => log::info!("Connected to solver"),
                TransportEvent::Disconnected => log::warn!("Disconnected from solver, reconnecting"),
                TransportEvent::Error { message } => log::warn!("{}", message),
            }
        }
        self.tick(now)
    }

    /// Handle a service frame.
    pub fn deliver(&mut self, frame: ServerMessage) {
        let message = self.engine.handle_server_message(frame);
        if !message.is_empty() {
            log::info!("[solver] {}", message);
        }
    }

    /// Advance the idle timer; an extraction is sent and returned.
    pub fn tick(&mut self, now: Instant) -> Option<ClientMessage> {
        let message = self.engine.tick(now, &mut self.rasterizer)?;
        if let Err(e) = self.socket.send(&message) {
            log::error!("Failed to submit extraction: {}", e);
        }
        Some(message)
    }

    /// Run until `quit` or end of input.
    pub fn run<R: BufRead + Send + 'static>(mut self, input: R) -> Result<(), HostError> {
        let lines = spawn_reader(input);
        loop {
            match lines.recv_timeout(POLL_INTERVAL) {
                Ok(line) => {
                    if self.handle_line(&line, Instant::now()) == Flow::Quit {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    log::info!("Input closed");
                    break;
                }
            }
            self.pump(Instant::now());
        }
        self.socket.disconnect();
        Ok(())
    }
}

fn spawn_reader<R: BufRead + Send + 'static>(input: R) -> Receiver<String> {
    let (tx, rx) = channel();
    thread::spawn(move || {
        for line in input.lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    log::error!("Failed to read input: {}", e);
                    break;
                }
            }
        }
    });
    rx
}
