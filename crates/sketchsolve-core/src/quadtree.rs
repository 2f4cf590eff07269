//! Region quadtree over axis-aligned bounding boxes.
//!
//! Nodes live in a flat arena and refer to their children by index. Each node keeps
//! up to `capacity` entries of its own; once full it splits into four
//! quadrants and forwards new entries to the first quadrant that touches
//! them. An entry is therefore stored exactly once, even if its box spans
//! several quadrants. Entries may overhang their node's region, so queries
//! prune by each node's extent, which covers everything stored beneath it.

use kurbo::Rect;

/// Default number of entries a node holds before it subdivides.
pub const DEFAULT_CAPACITY: usize = 8;

/// Inclusive overlap test (touching edges count as intersecting).
pub fn rects_touch(a: Rect, b: Rect) -> bool {
    !(a.x0 > b.x1 || a.x1 < b.x0 || a.y0 > b.y1 || a.y1 < b.y0)
}

#[derive(Debug, Clone)]
struct Node<T> {
    region: Rect,
    /// Union of `region` and every box stored in this subtree.
    extent: Rect,
    entries: Vec<(Rect, T)>,
    /// NE, NW, SE, SW
    children: Option<[usize; 4]>,
}

impl<T> Node<T> {
    fn new(region: Rect, capacity: usize) -> Self {
        Self {
            region,
            extent: region,
            entries: Vec::with_capacity(capacity),
            children: None,
        }
    }
}

/// Quadtree spatial index.
#[derive(Debug, Clone)]
pub struct QuadTree<T> {
    nodes: Vec<Node<T>>,
    capacity: usize,
    len: usize,
}

impl<T: Copy + PartialEq> QuadTree<T> {
    /// Create an empty tree covering `region`.
    pub fn new(region: Rect, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            nodes: vec![Node::new(region, capacity)],
            capacity,
            len: 0,
        }
    }

    /// Region covered by the root node.
    pub fn region(&self) -> Rect {
        self.nodes[0].region
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of allocated nodes (root included).
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Insert an entry. Returns `false` if `bbox` misses the root region.
    pub fn insert(&mut self, bbox: Rect, item: T) -> bool {
        let mut current = 0;
        loop {
            if !rects_touch(self.nodes[current].region, bbox) {
                return false;
            }
            let node = &mut self.nodes[current];
            node.extent = node.extent.union(bbox);
            if self.nodes[current].entries.len() < self.capacity {
                self.nodes[current].entries.push((bbox, item));
                self.len += 1;
                return true;
            }
            let existing = self.nodes[current].children;
            let children = match existing {
                Some(children) => children,
                None => self.subdivide(current),
            };
            match children
                .iter()
                .copied()
                .find(|&child| rects_touch(self.nodes[child].region, bbox))
            {
                Some(child) => current = child,
                // Quadrants tile the parent, so this only happens for NaN boxes.
                None => return false,
            }
        }
    }

    /// Insert an entry, enlarging the root region first if needed.
    pub fn insert_or_grow(&mut self, bbox: Rect, item: T) {
        if self.insert(bbox, item) {
            return;
        }
        let grown = grow_to_cover(self.region(), bbox);
        log::debug!(
            "Growing spatial index from {:?} to {:?} ({} entries)",
            self.region(),
            grown,
            self.len
        );
        self.rebuild(grown);
        if !self.insert(bbox, item) {
            log::warn!("Spatial index rejected entry with box {:?}", bbox);
        }
    }

    /// Collect every entry whose box intersects `range`.
    pub fn query_range(&self, range: Rect) -> Vec<T> {
        let mut found = Vec::new();
        let mut stack = vec![0usize];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            if !rects_touch(node.extent, range) {
                continue;
            }
            found.extend(
                node.entries
                    .iter()
                    .filter(|(bbox, _)| rects_touch(*bbox, range))
                    .map(|(_, item)| *item),
            );
            if let Some(children) = node.children {
                // Reverse so children are visited NE, NW, SE, SW.
                stack.extend(children.iter().rev());
            }
        }
        found
    }

    /// Remove an entry previously inserted with `bbox`. Returns whether it was found.
    pub fn remove(&mut self, bbox: Rect, item: T) -> bool {
        let mut stack = vec![0usize];
        while let Some(index) = stack.pop() {
            if !rects_touch(self.nodes[index].region, bbox) {
                continue;
            }
            let node = &mut self.nodes[index];
            if let Some(pos) = node.entries.iter().position(|(_, stored)| *stored == item) {
                node.entries.remove(pos);
                self.len -= 1;
                return true;
            }
            if let Some(children) = node.children {
                stack.extend(children.iter().rev());
            }
        }
        false
    }

    /// Drop every entry and all subdivisions, keeping the root region.
    pub fn clear(&mut self) {
        let region = self.region();
        self.nodes.clear();
        self.nodes.push(Node::new(region, self.capacity));
        self.len = 0;
    }

    /// Iterate over all stored entries in arena order.
    pub fn entries(&self) -> impl Iterator<Item = &(Rect, T)> {
        self.nodes.iter().flat_map(|node| node.entries.iter())
    }

    fn subdivide(&mut self, index: usize) -> [usize; 4] {
        let region = self.nodes[index].region;
        let mid = region.center();
        let quadrants = [
            Rect::new(mid.x, region.y0, region.x1, mid.y), // NE
            Rect::new(region.x0, region.y0, mid.x, mid.y), // NW
            Rect::new(mid.x, mid.y, region.x1, region.y1), // SE
            Rect::new(region.x0, mid.y, mid.x, region.y1), // SW
        ];
        let base = self.nodes.len();
        for quadrant in quadrants {
            self.nodes.push(Node::new(quadrant, self.capacity));
        }
        let children = [base, base + 1, base + 2, base + 3];
        self.nodes[index].children = Some(children);
        children
    }

    fn rebuild(&mut self, region: Rect) {
        let entries: Vec<(Rect, T)> = self.entries().copied().collect();
        self.nodes.clear();
        self.nodes.push(Node::new(region, self.capacity));
        self.len = 0;
        for (bbox, item) in entries {
            self.insert(bbox, item);
        }
    }
}

/// Double the region around its center until it covers `bbox`.
fn grow_to_cover(region: Rect, bbox: Rect) -> Rect {
    let mut grown = if region.width() > 0.0 && region.height() > 0.0 {
        region
    } else {
        Rect::from_center_size(region.center(), (1.0, 1.0))
    };
    while !(grown.x0 <= bbox.x0 && grown.y0 <= bbox.y0 && grown.x1 >= bbox.x1 && grown.y1 >= bbox.y1) {
        grown = grown.union(bbox);
        grown = Rect::from_center_size(grown.center(), (grown.width() * 2.0, grown.height() * 2.0));
    }
    grown
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg_box(x0: f64, y0: f64, x1: f64, y1: f64) -> Rect {
        Rect::new(x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1))
    }

    /// Deterministic pseudo-random sequence (xorshift).
    struct XorShift(u64);

    impl XorShift {
        fn next_f64(&mut self) -> f64 {
            self.0 ^= self.0 << 13;
            self.0 ^= self.0 >> 7;
            self.0 ^= self.0 << 17;
            (self.0 % 10_000) as f64 / 10.0
        }
    }

    #[test]
    fn test_insert_outside_root_returns_false() {
        let mut tree = QuadTree::new(Rect::new(0.0, 0.0, 100.0, 100.0), 4);
        assert!(!tree.insert(seg_box(200.0, 200.0, 210.0, 210.0), 1u32));
        assert!(tree.is_empty());
        assert!(tree.insert(seg_box(-10.0, 50.0, 0.0, 50.0), 2u32));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_subdivides_lazily_when_full() {
        let mut tree = QuadTree::new(Rect::new(0.0, 0.0, 100.0, 100.0), 2);
        assert!(tree.insert(seg_box(1.0, 1.0, 2.0, 2.0), 1u32));
        assert!(tree.insert(seg_box(3.0, 3.0, 4.0, 4.0), 2u32));
        assert_eq!(tree.node_count(), 1);
        assert!(tree.insert(seg_box(90.0, 90.0, 95.0, 95.0), 3u32));
        assert_eq!(tree.node_count(), 5);
        assert!(tree.insert(seg_box(91.0, 91.0, 96.0, 96.0), 4u32));
        assert_eq!(tree.node_count(), 5);
    }

    #[test]
    fn test_spanning_entry_is_stored_once() {
        let mut tree = QuadTree::new(Rect::new(0.0, 0.0, 100.0, 100.0), 1);
        assert!(tree.insert(seg_box(10.0, 10.0, 11.0, 11.0), 0u32));
        // Crosses all four quadrants.
        assert!(tree.insert(seg_box(10.0, 10.0, 90.0, 90.0), 1u32));
        assert_eq!(tree.entries().filter(|(_, id)| *id == 1).count(), 1);
        let found = tree.query_range(Rect::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(found.iter().filter(|&&id| id == 1).count(), 1);
    }

    #[test]
    fn test_overhanging_entry_found_from_neighbor_quadrant() {
        let mut tree = QuadTree::new(Rect::new(0.0, 0.0, 100.0, 100.0), 1);
        tree.insert(seg_box(10.0, 10.0, 11.0, 11.0), 0u32);
        // Lands in NE but reaches into NW.
        tree.insert(seg_box(40.0, 40.0, 60.0, 45.0), 1u32);
        assert_eq!(tree.query_range(Rect::new(41.0, 41.0, 42.0, 42.0)), vec![1]);
    }

    #[test]
    fn test_query_prunes_and_filters() {
        let mut tree = QuadTree::new(Rect::new(0.0, 0.0, 100.0, 100.0), 1);
        tree.insert(seg_box(10.0, 10.0, 20.0, 20.0), 1u32);
        tree.insert(seg_box(60.0, 60.0, 70.0, 70.0), 2u32);
        tree.insert(seg_box(80.0, 10.0, 85.0, 15.0), 3u32);

        let found = tree.query_range(Rect::new(55.0, 55.0, 65.0, 65.0));
        assert_eq!(found, vec![2]);
        assert!(tree.query_range(Rect::new(30.0, 30.0, 40.0, 40.0)).is_empty());
    }

    #[test]
    fn test_query_matches_brute_force() {
        let mut rng = XorShift(0x9E37_79B9_7F4A_7C15);
        let mut tree = QuadTree::new(Rect::new(0.0, 0.0, 1000.0, 1000.0), 3);
        let mut all = Vec::new();
        for id in 0..400u32 {
            let (x0, y0) = (rng.next_f64(), rng.next_f64());
            let (dx, dy) = (rng.next_f64() / 20.0, rng.next_f64() / 20.0);
            let bbox = seg_box(x0, y0, x0 + dx - 25.0, y0 + dy - 25.0);
            if tree.insert(bbox, id) {
                all.push((bbox, id));
            }
        }
        assert_eq!(tree.len(), all.len());

        for _ in 0..100 {
            let (cx, cy, r) = (rng.next_f64(), rng.next_f64(), rng.next_f64() / 10.0);
            let range = Rect::new(cx - r, cy - r, cx + r, cy + r);
            let mut indexed = tree.query_range(range);
            let mut brute: Vec<u32> = all
                .iter()
                .filter(|(bbox, _)| rects_touch(*bbox, range))
                .map(|(_, id)| *id)
                .collect();
            indexed.sort_unstable();
            brute.sort_unstable();
            assert_eq!(indexed, brute);
        }
    }

    #[test]
    fn test_remove() {
        let mut tree = QuadTree::new(Rect::new(0.0, 0.0, 100.0, 100.0), 1);
        let a = seg_box(10.0, 10.0, 20.0, 20.0);
        let b = seg_box(12.0, 12.0, 18.0, 18.0);
        tree.insert(a, 1u32);
        tree.insert(b, 2u32);
        assert!(tree.remove(b, 2));
        assert!(!tree.remove(b, 2));
        assert_eq!(tree.query_range(a), vec![1]);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_insert_or_grow_keeps_everything_queryable() {
        let mut tree = QuadTree::new(Rect::new(0.0, 0.0, 100.0, 100.0), 2);
        tree.insert_or_grow(seg_box(10.0, 10.0, 20.0, 20.0), 1u32);
        tree.insert_or_grow(seg_box(-500.0, 40.0, -490.0, 45.0), 2u32);
        tree.insert_or_grow(seg_box(5000.0, 5000.0, 5001.0, 5001.0), 3u32);
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.query_range(Rect::new(-495.0, 41.0, -494.0, 42.0)), vec![2]);
        assert_eq!(tree.query_range(Rect::new(4999.0, 4999.0, 5002.0, 5002.0)), vec![3]);
        assert_eq!(tree.query_range(Rect::new(15.0, 15.0, 16.0, 16.0)), vec![1]);
    }

    #[test]
    fn test_identical_points_do_not_overflow() {
        let mut tree = QuadTree::new(Rect::new(0.0, 0.0, 100.0, 100.0), 2);
        for id in 0..1000u32 {
            assert!(tree.insert(Rect::new(50.0, 50.0, 50.0, 50.0), id));
        }
        assert_eq!(tree.query_range(Rect::new(49.0, 49.0, 51.0, 51.0)).len(), 1000);
    }

    #[test]
    fn test_clear() {
        let mut tree = QuadTree::new(Rect::new(0.0, 0.0, 100.0, 100.0), 1);
        for id in 0..10u32 {
            tree.insert(seg_box(id as f64, 0.0, id as f64 + 1.0, 1.0), id);
        }
        tree.clear();
        assert!(tree.is_empty());
        assert_eq!(tree.node_count(), 1);
        assert!(tree.query_range(tree.region()).is_empty());
    }
}
