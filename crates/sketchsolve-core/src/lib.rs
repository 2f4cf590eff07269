//! SketchSolve Core Library
//!
//! Platform-agnostic drawing engine: viewport, stroke store, spatial index,
//! eraser, idle extraction and service correlation.

pub mod camera;
pub mod config;
pub mod correlator;
pub mod document;
pub mod engine;
pub mod eraser;
pub mod extract;
pub mod idle;
pub mod input;
pub mod protocol;
pub mod quadtree;
pub mod scene;
pub mod tools;
#[cfg(not(target_arch = "wasm32"))]
pub mod transport;

// Use web_time for WASM compatibility
#[cfg(target_arch = "wasm32")]
pub use web_time::Instant;
#[cfg(not(target_arch = "wasm32"))]
pub use std::time::Instant;

pub use camera::{ViewTransform, Viewport};
pub use config::{ConfigError, EngineConfig};
pub use correlator::{Correlator, PlacedResult};
pub use document::{Document, Segment, SegmentId, SegmentKind, SerializableColor, Stroke, StrokeId};
pub use engine::Engine;
pub use eraser::Eraser;
pub use extract::{ExtractionJob, RasterError, Rasterizer, Region};
pub use idle::IdleTimer;
pub use input::{MouseButton, PointerEvent};
pub use protocol::{ClientMessage, ServerMessage, SolverEvent};
pub use quadtree::QuadTree;
pub use scene::RenderSurface;
pub use tools::{ToolKind, ToolMode, ToolOptions};
#[cfg(not(target_arch = "wasm32"))]
pub use transport::{ConnectionState, SolverSocket, TransportError, TransportEvent};
