//! Wire messages exchanged with the recognition service.

use serde::{Deserialize, Serialize};

/// Messages sent to the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Submit a base64-encoded PNG for recognition.
    SubmitImage { image: String },
}

impl ClientMessage {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Lifecycle events a frame can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerEvent {
    TaskAdded,
    Solution,
    Done,
}

/// Placement of a solved value, relative to the submitted image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolutionPosition {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Any frame received from the service. Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerMessage {
    #[serde(default)]
    pub status: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<ServerEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    /// Solved value; the service may send a number or a string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<SolutionPosition>,
}

/// A frame interpreted for the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum SolverEvent {
    TaskAdded { task_id: String },
    Solution {
        task_id: String,
        value: String,
        position: SolutionPosition,
    },
    Done { task_id: String },
    /// Informational or error frame with no lifecycle event.
    Notice { status: i64, message: String },
}

impl ServerMessage {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Interpret this frame. Lifecycle frames missing a required field
    /// degrade to a notice.
    pub fn into_event(self) -> SolverEvent {
        let notice = |status, message| SolverEvent::Notice { status, message };
        let Some(event) = self.event else {
            return notice(self.status, self.message);
        };
        let Some(task_id) = self.task_id else {
            log::warn!("{:?} frame without task id", event);
            return notice(self.status, self.message);
        };
        match event {
            ServerEvent::TaskAdded => SolverEvent::TaskAdded { task_id },
            ServerEvent::Done => SolverEvent::Done { task_id },
            ServerEvent::Solution => match (self.value, self.position) {
                (Some(value), Some(position)) => SolverEvent::Solution {
                    task_id,
                    value: value_text(value),
                    position,
                },
                _ => {
                    log::warn!("Solution for task {} without value or position", task_id);
                    notice(self.status, self.message)
                }
            },
        }
    }
}

fn value_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}
