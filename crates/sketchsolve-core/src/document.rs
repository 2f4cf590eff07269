//! Segments, strokes and the document store.

use crate::config::IndexConfig;
use crate::quadtree::QuadTree;
use kurbo::{Point, Rect};
use peniko::Color;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Unique identifier for strokes.
pub type StrokeId = Uuid;

/// Document-unique identifier for segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentId(pub u64);

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// What a segment draws.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SegmentKind {
    /// A stroked line from `start` to `end`.
    Freehand,
    /// A text run anchored at `start`; `end` marks the far corner of its box.
    Text { value: String },
}

/// One drawn line between two document-space points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: SegmentId,
    pub start: Point,
    pub end: Point,
    pub color: SerializableColor,
    #[serde(flatten)]
    pub kind: SegmentKind,
}

impl Segment {
    /// Axis-aligned bounding box of the two endpoints.
    pub fn bounds(&self) -> Rect {
        Rect::from_points(self.start, self.end)
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, SegmentKind::Text { .. })
    }

    pub fn is_degenerate(&self) -> bool {
        (self.end - self.start).hypot2() < f64::EPSILON
    }
}

/// An ordered run of segments from one gesture, or a single text segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub id: StrokeId,
    pub segments: Vec<Segment>,
}

impl Stroke {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            segments: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// The authoritative stroke collection.
///
/// Segments are indexed in a quadtree for erase queries; the index is kept in
/// lockstep with `strokes` by every mutating method.
#[derive(Debug, Clone)]
pub struct Document {
    strokes: Vec<Stroke>,
    /// Position of each stroke in `strokes`.
    positions: HashMap<StrokeId, usize>,
    /// Strokes committed since the last idle extraction, oldest first.
    pending: Vec<StrokeId>,
    /// Stroke currently receiving segments.
    open: Option<StrokeId>,
    index: QuadTree<SegmentId>,
    owners: HashMap<SegmentId, StrokeId>,
    next_segment: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new(&IndexConfig::default())
    }
}

impl Document {
    /// Create an empty document.
    pub fn new(config: &IndexConfig) -> Self {
        let half = config.initial_extent / 2.0;
        Self {
            strokes: Vec::new(),
            positions: HashMap::new(),
            pending: Vec::new(),
            open: None,
            index: QuadTree::new(Rect::new(-half, -half, half, half), config.capacity),
            owners: HashMap::new(),
            next_segment: 0,
        }
    }

    /// Open a new empty stroke. Any stroke still open is closed first.
    pub fn begin_stroke(&mut self) -> StrokeId {
        if self.open.is_some() {
            self.close_stroke();
        }
        let stroke = Stroke::new();
        let id = stroke.id;
        self.push_stroke(stroke);
        self.open = Some(id);
        id
    }

    /// Append a freehand segment to the open stroke.
    ///
    /// Returns `None` when no stroke is open.
    pub fn push_segment(&mut self, start: Point, end: Point, color: SerializableColor) -> Option<SegmentId> {
        let stroke_id = self.open?;
        let segment = self.make_segment(start, end, color, SegmentKind::Freehand);
        let id = segment.id;
        self.attach(stroke_id, segment);
        Some(id)
    }

    /// Close the open stroke.
    ///
    /// A non-empty stroke joins the pending set; an empty one is dropped.
    pub fn close_stroke(&mut self) -> Option<StrokeId> {
        let id = self.open.take()?;
        let pos = self.position(id)?;
        if self.strokes[pos].is_empty() {
            self.strokes.remove(pos);
            self.reindex();
            return None;
        }
        self.pending.push(id);
        Some(id)
    }

    /// Add a single-segment text stroke. Text strokes never join the pending set.
    pub fn add_text(&mut self, value: String, origin: Point, corner: Point, color: SerializableColor) -> StrokeId {
        let mut stroke = Stroke::new();
        let id = stroke.id;
        let segment = self.make_segment(origin, corner, color, SegmentKind::Text { value });
        self.index.insert_or_grow(segment.bounds(), segment.id);
        self.owners.insert(segment.id, id);
        stroke.segments.push(segment);
        self.push_stroke(stroke);
        id
    }

    /// Segment ids whose bounding box intersects `range`.
    pub fn query_range(&self, range: Rect) -> Vec<SegmentId> {
        self.index.query_range(range)
    }

    /// Look up a segment by id.
    pub fn segment(&self, id: SegmentId) -> Option<&Segment> {
        let owner = self.owners.get(&id)?;
        self.stroke(*owner)?.segments.iter().find(|s| s.id == id)
    }

    /// Remove the given segments. Strokes left empty are dropped, except the
    /// open one, which keeps receiving segments.
    ///
    /// Returns how many segments were removed.
    pub fn remove_segments(&mut self, ids: &[SegmentId]) -> usize {
        let mut removed = 0;
        for &id in ids {
            let Some(owner) = self.owners.remove(&id) else {
                continue;
            };
            let Some(pos) = self.position(owner) else {
                continue;
            };
            let stroke = &mut self.strokes[pos];
            if let Some(seg_pos) = stroke.segments.iter().position(|s| s.id == id) {
                let segment = stroke.segments.remove(seg_pos);
                self.index.remove(segment.bounds(), segment.id);
                removed += 1;
            }
        }
        if removed > 0 {
            let open = self.open;
            self.strokes.retain(|s| !s.is_empty() || Some(s.id) == open);
            self.reindex();
            let positions = &self.positions;
            self.pending.retain(|id| positions.contains_key(id));
        }
        removed
    }

    /// Empty the document, the pending set and the index.
    pub fn clear(&mut self) {
        self.strokes.clear();
        self.positions.clear();
        self.pending.clear();
        self.open = None;
        self.index.clear();
        self.owners.clear();
    }

    /// All strokes in insertion order.
    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn stroke(&self, id: StrokeId) -> Option<&Stroke> {
        self.strokes.get(self.position(id)?)
    }

    /// Iterate over every segment of every stroke.
    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.strokes.iter().flat_map(|s| s.segments.iter())
    }

    /// Strokes committed since the last extraction.
    pub fn pending_strokes(&self) -> impl Iterator<Item = &Stroke> {
        self.pending.iter().filter_map(|id| self.stroke(*id))
    }

    pub fn has_pending(&self) -> bool {
        self.pending_strokes().any(|s| !s.is_empty())
    }

    /// Forget the pending set (after a successful extraction).
    pub fn clear_pending(&mut self) {
        self.pending.clear();
    }

    pub fn open_stroke(&self) -> Option<StrokeId> {
        self.open
    }

    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    /// Number of segments held by the spatial index.
    pub fn indexed_len(&self) -> usize {
        self.index.len()
    }

    fn position(&self, id: StrokeId) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    fn push_stroke(&mut self, stroke: Stroke) {
        self.positions.insert(stroke.id, self.strokes.len());
        self.strokes.push(stroke);
    }

    /// Rebuild `positions` after strokes were removed.
    fn reindex(&mut self) {
        self.positions = self.strokes.iter().enumerate().map(|(pos, s)| (s.id, pos)).collect();
    }

    fn make_segment(&mut self, start: Point, end: Point, color: SerializableColor, kind: SegmentKind) -> Segment {
        let id = SegmentId(self.next_segment);
        self.next_segment += 1;
        Segment {
            id,
            start,
            end,
            color,
            kind,
        }
    }

    fn attach(&mut self, stroke_id: StrokeId, segment: Segment) {
        let Some(pos) = self.position(stroke_id) else {
            return;
        };
        self.index.insert_or_grow(segment.bounds(), segment.id);
        self.owners.insert(segment.id, stroke_id);
        self.strokes[pos].segments.push(segment);
    }
}
