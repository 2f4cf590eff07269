//! Pointer input types and button tracking.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Pointer event in canvas-relative screen coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down {
        position: Point,
        button: MouseButton,
    },
    Up {
        position: Point,
        button: MouseButton,
    },
    Move {
        position: Point,
    },
    Scroll {
        position: Point,
        delta: Vec2,
    },
    /// The pointer left the canvas. Handled like a release.
    Leave,
}

impl PointerEvent {
    /// Whether this event counts as user activity for idle detection.
    pub fn is_activity(&self) -> bool {
        !matches!(self, PointerEvent::Leave)
    }
}

/// What the held button is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PressedButton {
    #[default]
    None,
    /// Primary button: drawing or erasing, depending on the tool.
    Draw,
    /// Secondary or middle button: panning.
    Pan,
}

impl From<MouseButton> for PressedButton {
    fn from(button: MouseButton) -> Self {
        match button {
            MouseButton::Left => PressedButton::Draw,
            MouseButton::Right | MouseButton::Middle => PressedButton::Pan,
        }
    }
}

/// Tracks the held button between pointer events.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    held: Option<MouseButton>,
    pressed: PressedButton,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a button press and return what it maps to. A later press
    /// replaces the held button.
    pub fn press(&mut self, button: MouseButton) -> PressedButton {
        self.held = Some(button);
        self.pressed = button.into();
        self.pressed
    }

    /// Release `button`, returning what it was doing. Releasing a button
    /// that is not held changes nothing and returns `None`.
    pub fn release(&mut self, button: MouseButton) -> PressedButton {
        if self.held != Some(button) {
            return PressedButton::None;
        }
        self.release_all()
    }

    /// Release whatever is held, returning what was held.
    pub fn release_all(&mut self) -> PressedButton {
        self.held = None;
        std::mem::take(&mut self.pressed)
    }

    pub fn pressed(&self) -> PressedButton {
        self.pressed
    }

    /// Whether a pan gesture is in progress.
    pub fn is_grabbing(&self) -> bool {
        self.pressed == PressedButton::Pan
    }
}
