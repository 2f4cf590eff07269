//! The drawing engine: one owned state machine fed by pointer events, idle
//! ticks and service frames.

use crate::Instant;
use crate::camera::Viewport;
use crate::config::EngineConfig;
use crate::correlator::{Correlator, PlacedResult};
use crate::document::Document;
use crate::eraser::Eraser;
use crate::extract::{ExtractionJob, RasterError, Rasterizer};
use crate::idle::IdleTimer;
use crate::input::{InputState, PointerEvent, PressedButton};
use crate::protocol::{ClientMessage, ServerMessage, SolverEvent};
use crate::scene::{self, RenderSurface};
use crate::tools::{ToolKind, ToolMode, ToolOptions};
use kurbo::{Point, Size};
use std::time::Duration;

/// Drawing engine bound to a render surface.
pub struct Engine<S: RenderSurface> {
    config: EngineConfig,
    viewport: Viewport,
    document: Document,
    eraser: Eraser,
    input: InputState,
    mode: ToolMode,
    idle: IdleTimer,
    correlator: Correlator,
    surface: S,
}

impl<S: RenderSurface> Engine<S> {
    /// Create an engine and paint the empty canvas.
    pub fn new(config: EngineConfig, surface: S, now: Instant) -> Self {
        let mut engine = Self {
            viewport: Viewport::from_config(&config.viewport),
            document: Document::new(&config.index),
            eraser: Eraser::from_config(&config.eraser),
            input: InputState::new(),
            mode: ToolMode::default(),
            idle: IdleTimer::new(&config.idle, now),
            correlator: Correlator::new(),
            surface,
            config,
        };
        engine.redraw();
        engine
    }

    /// Process one pointer event.
    pub fn handle_pointer(&mut self, event: PointerEvent, now: Instant) {
        if event.is_activity() {
            self.idle.touch(now);
        }

        match event {
            PointerEvent::Down { position, button } => {
                // A press mid-stroke ends the stroke.
                if self.input.pressed() == PressedButton::Draw {
                    self.document.close_stroke();
                }
                let pressed = self.input.press(button);
                if pressed == PressedButton::Draw && self.mode == ToolMode::Brush {
                    self.document.begin_stroke();
                }
                self.viewport.prev_cursor = position;
            }
            PointerEvent::Move { position } => self.pointer_moved(position),
            PointerEvent::Up { button, .. } => {
                if self.input.release(button) == PressedButton::Draw {
                    self.document.close_stroke();
                }
            }
            PointerEvent::Leave => {
                if self.input.release_all() == PressedButton::Draw {
                    self.document.close_stroke();
                }
            }
            PointerEvent::Scroll { position, delta } => {
                if self.viewport.zoom_at(position, self.surface.size(), delta.y) {
                    self.redraw();
                }
            }
        }
    }

    fn pointer_moved(&mut self, position: Point) {
        match self.input.pressed() {
            PressedButton::None => return,
            PressedButton::Draw if self.mode == ToolMode::Eraser => {
                self.erase(position);
            }
            PressedButton::Draw => {
                let from = self.viewport.screen_to_world(self.viewport.prev_cursor);
                let to = self.viewport.screen_to_world(position);
                let color = self.config.style.line_color;
                if let Some(id) = self.document.push_segment(from, to, color) {
                    if let Some(segment) = self.document.segment(id) {
                        scene::draw_segment(&mut self.surface, segment, self.viewport.snapshot(), &self.config.style);
                    }
                }
            }
            PressedButton::Pan => {
                self.viewport.pan(position - self.viewport.prev_cursor);
                self.redraw();
            }
        }
        self.viewport.prev_cursor = position;
    }

    /// Apply a toolbar selection.
    pub fn set_mode(&mut self, kind: ToolKind, options: ToolOptions) {
        if kind == ToolKind::Clear {
            self.clear();
            return;
        }
        if let Some(mode) = kind.mode() {
            log::debug!("Tool mode: {:?}", mode);
            self.mode = mode;
        }
        if kind == ToolKind::Eraser {
            if let Some(size) = options.size {
                self.eraser.set_size(size);
            }
        }
    }

    /// Empty the document and repaint.
    pub fn clear(&mut self) {
        self.document.clear();
        log::info!("Document cleared");
        self.redraw();
    }

    /// Erase around a screen-space point and repaint. Returns how many
    /// segments were removed.
    pub fn erase(&mut self, screen: Point) -> usize {
        let center = self.viewport.screen_to_world(screen);
        let hits = self.eraser.collect_hits(&self.document, center);
        let removed = self.document.remove_segments(&hits);
        if removed > 0 {
            log::debug!("Erased {} segments", removed);
        }
        self.redraw();
        removed
    }

    /// Advance the idle timer. On fire, extracts the pending strokes and
    /// returns the message to send.
    pub fn tick(&mut self, now: Instant, rasterizer: &mut impl Rasterizer) -> Option<ClientMessage> {
        if !self.idle.poll(now) {
            return None;
        }
        self.extract(rasterizer)
    }

    /// Extract the pending strokes immediately.
    pub fn extract(&mut self, rasterizer: &mut impl Rasterizer) -> Option<ClientMessage> {
        let job = ExtractionJob::from_pending(&self.document, self.viewport.snapshot(), &self.config.extract)?;
        match rasterizer.rasterize(&job) {
            Ok(image) => {
                log::info!(
                    "Extracted {} lines into {}x{} region at ({}, {})",
                    job.lines.len(),
                    job.region.width,
                    job.region.height,
                    job.region.min_x,
                    job.region.min_y
                );
                self.correlator.record_emitted(job.region);
                self.document.clear_pending();
                Some(ClientMessage::SubmitImage { image })
            }
            Err(RasterError::Surface(e)) => {
                // Retrying can only grow the region, so the cycle is dropped.
                log::error!(
                    "Dropping {} pending strokes, {}x{} region cannot be rasterized: {}",
                    self.document.pending_strokes().count(),
                    job.region.width,
                    job.region.height,
                    e
                );
                self.document.clear_pending();
                None
            }
            Err(e) => {
                log::error!("Failed to rasterize extraction: {}", e);
                None
            }
        }
    }

    /// Handle a frame from the service. Returns the frame's message text.
    pub fn handle_server_message(&mut self, message: ServerMessage) -> String {
        let text = message.message.clone();
        match message.into_event() {
            SolverEvent::TaskAdded { task_id } => {
                self.correlator.accepted(&task_id);
            }
            SolverEvent::Solution { task_id, value, position } => {
                if let Some(placed) = self.correlator.solved(&task_id, &value, position) {
                    self.put_text(placed);
                }
            }
            SolverEvent::Done { task_id } => {
                self.correlator.done(&task_id);
            }
            SolverEvent::Notice { status, message } => {
                if status != 0 {
                    log::warn!("Service error {}: {}", status, message);
                } else {
                    log::info!("Service: {}", message);
                }
            }
        }
        text
    }

    fn put_text(&mut self, placed: PlacedResult) {
        log::info!(
            "Placing {:?} at ({:.1}, {:.1}), {:.0}px",
            placed.value,
            placed.screen_position.x,
            placed.screen_position.y,
            placed.font_size
        );
        let color = self.config.style.text_color;
        self.document.add_text(placed.value, placed.origin, placed.corner, color);
        self.redraw();
    }

    /// Repaint everything.
    pub fn redraw(&mut self) {
        scene::redraw(&mut self.surface, &self.document, self.viewport.snapshot(), &self.config.style);
    }

    /// Resize the surface and repaint.
    pub fn resize(&mut self, size: Size) {
        self.surface.resize(size);
        self.redraw();
    }

    pub fn is_grabbing(&self) -> bool {
        self.input.is_grabbing()
    }

    pub fn time_until_idle(&self, now: Instant) -> Duration {
        self.idle.time_until_idle(now)
    }

    pub fn mode(&self) -> ToolMode {
        self.mode
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn eraser(&self) -> &Eraser {
        &self.eraser
    }

    pub fn correlator(&self) -> &Correlator {
        &self.correlator
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }
}
