//! Tool selection.

use serde::{Deserialize, Serialize};

/// Toolbar actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    Brush,
    Eraser,
    /// One-shot: empties the document. Does not change the active mode.
    Clear,
}

/// Options sent alongside a tool selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolOptions {
    /// Eraser size as chosen in the toolbar, before scaling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
}

/// Persistent mode that primary-button drags act in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolMode {
    #[default]
    Brush,
    Eraser,
}

impl ToolKind {
    /// The mode this selection switches to, if any.
    pub fn mode(self) -> Option<ToolMode> {
        match self {
            ToolKind::Brush => Some(ToolMode::Brush),
            ToolKind::Eraser => Some(ToolMode::Eraser),
            ToolKind::Clear => None,
        }
    }
}
