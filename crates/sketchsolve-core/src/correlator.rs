//! Matching service responses to the regions they were computed from.

use crate::extract::Region;
use crate::protocol::SolutionPosition;
use kurbo::{Point, Vec2};
use std::collections::HashMap;

/// A solved value positioned for insertion into the document.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedResult {
    pub value: String,
    /// Screen position at the time of extraction (region origin applied).
    pub screen_position: Point,
    /// Top-left of the text box in document space.
    pub origin: Point,
    /// Far corner of the text box in document space.
    pub corner: Point,
    /// Font size in screen pixels at the time of extraction.
    pub font_size: f64,
}

/// Request correlator.
///
/// The most recently emitted region is kept until the next emission; each
/// `task_added` acknowledgment copies it under the assigned id.
#[derive(Debug, Clone, Default)]
pub struct Correlator {
    last_emitted: Option<Region>,
    outstanding: HashMap<String, Region>,
}

impl Correlator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember the region of an extraction that was just sent.
    pub fn record_emitted(&mut self, region: Region) {
        self.last_emitted = Some(region);
    }

    /// The service accepted the most recent extraction under `task_id`.
    ///
    /// Returns `false` when nothing has been emitted yet.
    pub fn accepted(&mut self, task_id: &str) -> bool {
        let Some(region) = self.last_emitted else {
            log::warn!("Task {} accepted with no emitted region", task_id);
            return false;
        };
        log::info!("Task {} accepted", task_id);
        self.outstanding.insert(task_id.to_string(), region);
        true
    }

    /// Place a solved value. `position` is relative to the submitted image.
    pub fn solved(&self, task_id: &str, value: &str, position: SolutionPosition) -> Option<PlacedResult> {
        let Some(region) = self.outstanding.get(task_id) else {
            log::warn!("Solution for unknown task {}", task_id);
            return None;
        };

        let screen_position = Point::new(position.x + region.min_x, position.y + region.min_y);
        let span = Vec2::new(position.width, position.height);
        Some(PlacedResult {
            value: value.to_string(),
            screen_position,
            origin: region.view.screen_to_world(screen_position),
            corner: region.view.screen_to_world(screen_position + span),
            font_size: position.width.max(position.height),
        })
    }

    /// Retire `task_id`. Returns whether it was outstanding.
    pub fn done(&mut self, task_id: &str) -> bool {
        let removed = self.outstanding.remove(task_id).is_some();
        if removed {
            log::info!("Task {} done", task_id);
        } else {
            log::debug!("Done for unknown task {}", task_id);
        }
        removed
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding.len()
    }

    pub fn is_outstanding(&self, task_id: &str) -> bool {
        self.outstanding.contains_key(task_id)
    }
}
