//! Input commands read by the host, one JSON object per line.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use sketchsolve_core::input::{MouseButton, PointerEvent};
use sketchsolve_core::tools::{ToolKind, ToolOptions};
use std::path::PathBuf;

fn left() -> MouseButton {
    MouseButton::Left
}

/// A host command. Coordinates are canvas-relative screen pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostCommand {
    PointerDown {
        x: f64,
        y: f64,
        #[serde(default = "left")]
        button: MouseButton,
    },
    PointerUp {
        x: f64,
        y: f64,
        #[serde(default = "left")]
        button: MouseButton,
    },
    PointerMove { x: f64, y: f64 },
    Wheel { x: f64, y: f64, delta_y: f64 },
    PointerLeave,
    SetMode {
        kind: ToolKind,
        #[serde(default)]
        options: ToolOptions,
    },
    Resize { width: f64, height: f64 },
    /// Write the current canvas as PNG.
    Snapshot { path: PathBuf },
    Quit,
}

impl HostCommand {
    pub fn parse(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }

    /// The pointer event this command carries, if any.
    pub fn pointer_event(&self) -> Option<PointerEvent> {
        let event = match *self {
            HostCommand::PointerDown { x, y, button } => PointerEvent::Down {
                position: Point::new(x, y),
                button,
            },
            HostCommand::PointerUp { x, y, button } => PointerEvent::Up {
                position: Point::new(x, y),
                button,
            },
            HostCommand::PointerMove { x, y } => PointerEvent::Move {
                position: Point::new(x, y),
            },
            HostCommand::Wheel { x, y, delta_y } => PointerEvent::Scroll {
                position: Point::new(x, y),
                delta: Vec2::new(0.0, delta_y),
            },
            HostCommand::PointerLeave => PointerEvent::Leave,
            _ => return None,
        };
        Some(event)
    }
}
