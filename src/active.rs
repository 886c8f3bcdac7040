use std::{cell::Cell, cmp::Ordering, iter::successors};

use geo::kernels::Orientation;
use log::error;
use slab::Slab;

use crate::{
    events::{cmp_with_tolerance, SweepPoint},
    segment::{orient, orientation_as_ordering, Segment},
};

/// Vertical order of segments relative to a sweep position.
///
/// Segments are only totally ordered along a vertical line, so the
/// comparison is a function of both segments and the current event
/// point. Smaller means lower.
///
/// The policy, in order:
///
/// 1. a segment is equal only to itself;
/// 2. segments sharing their left end point are ordered by the turn from
///    that point to their right end points (counter-clockwise is lower);
/// 3. otherwise by their `y` at the sweep `x`; a segment through the
///    sweep point takes the sweep `y`, and a vertical segment takes the
///    sweep `y` clamped to its extent;
/// 4. equal `y` values are ordered as they are just after the event
///    point: by the turn from the event point to the right end points;
/// 5. collinear segments (including duplicates) are ordered by key.
pub(crate) struct SweepOrder<'a> {
    segments: &'a [Segment],
    at: SweepPoint,
    fault: Cell<Option<usize>>,
}

impl<'a> SweepOrder<'a> {
    pub fn new(segments: &'a [Segment], at: SweepPoint) -> Self {
        SweepOrder {
            segments,
            at,
            fault: Cell::new(None),
        }
    }

    /// The sweep position comparisons are made at.
    #[inline]
    pub fn at(&self) -> SweepPoint {
        self.at
    }

    /// The first segment that was compared outside its `x`-range.
    pub fn fault(&self) -> Option<usize> {
        self.fault.get()
    }

    /// The `y` value of a segment on the sweep line.
    pub fn y_of(&self, key: usize) -> f64 {
        let segment = &self.segments[key];
        if segment.is_vertical() {
            let (lo, hi) = (segment.left().y(), segment.right().y());
            return self.at.y().max(lo).min(hi);
        }
        match segment.y_at(self.at.x()) {
            // A steep segment can pass within tolerance of the sweep
            // point while its `y` at the sweep `x` is far off.
            Some(y) if cmp_with_tolerance(y, self.at.y()) != Ordering::Equal
                && segment.contains(self.at) =>
            {
                self.at.y()
            }
            Some(y) => y,
            None => {
                error!(
                    "segment {} compared at x = {} outside its range: {:?}",
                    key,
                    self.at.x(),
                    segment
                );
                if self.fault.get().is_none() {
                    self.fault.set(Some(key));
                }
                let x = self.at.x().max(segment.left().x()).min(segment.right().x());
                segment.y_at(x).unwrap_or_else(|| segment.left().y())
            }
        }
    }

    pub fn cmp(&self, a: usize, b: usize) -> Ordering {
        if a == b {
            return Ordering::Equal;
        }
        let (sa, sb) = (&self.segments[a], &self.segments[b]);
        if sa == sb {
            return a.cmp(&b);
        }
        if sa.left().approx_eq(&sb.left()) {
            return orientation_as_ordering(orient(sa.left(), sa.right(), sb.right()))
                .then_with(|| a.cmp(&b));
        }

        let (ya, yb) = (self.y_of(a), self.y_of(b));
        match cmp_with_tolerance(ya, yb) {
            Ordering::Equal => {
                let pivot = SweepPoint::new(self.at.x(), ya);
                self.cmp_after(pivot, a, b)
            }
            ord => ord,
        }
    }

    /// Order two segments meeting at `pivot` as they are just after it.
    fn cmp_after(&self, pivot: SweepPoint, a: usize, b: usize) -> Ordering {
        let (sa, sb) = (&self.segments[a], &self.segments[b]);
        let ord = match orient(pivot, sa.right(), sb.right()) {
            // A right end point at the pivot: fall back to the directions.
            Orientation::Collinear if sa.right().approx_eq(&pivot) || sb.right().approx_eq(&pivot) => {
                orientation_as_ordering(orient(sa.left(), sa.right(), sb.right()))
            }
            o => orientation_as_ordering(o),
        };
        ord.then_with(|| a.cmp(&b))
    }

    /// Whether the segment lies strictly below the sweep point.
    pub fn is_below(&self, key: usize) -> bool {
        cmp_with_tolerance(self.y_of(key), self.at.y()) == Ordering::Less
    }
}

#[derive(Debug, Clone)]
struct Node {
    segment: usize,
    parent: Option<usize>,
    left: Option<usize>,
    right: Option<usize>,
    height: u32,
}

/// The sweep status: segments crossing the sweep line, bottom to top.
///
/// An AVL tree whose nodes live in a [`Slab`] and link to each other by
/// key. Each segment key maps to the node holding it, so removal and
/// neighbour queries need no comparisons; only insertion searches the
/// tree with a [`SweepOrder`]. Neighbours are found by walking the tree
/// structure through parent links.
#[derive(Debug, Default)]
pub(crate) struct ActiveSegments {
    nodes: Slab<Node>,
    root: Option<usize>,
    handles: Vec<Option<usize>>,
}

impl ActiveSegments {
    pub fn with_capacity(segments: usize) -> Self {
        ActiveSegments {
            nodes: Slab::with_capacity(segments),
            root: None,
            handles: vec![None; segments],
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn contains(&self, segment: usize) -> bool {
        self.handle(segment).is_some()
    }

    #[inline]
    fn handle(&self, segment: usize) -> Option<usize> {
        self.handles.get(segment).copied().flatten()
    }

    /// Insert a segment at its position in `order`.
    ///
    /// Panics if the segment is already active.
    pub fn insert(&mut self, segment: usize, order: &SweepOrder<'_>) {
        if segment >= self.handles.len() {
            self.handles.resize(segment + 1, None);
        }
        assert!(
            self.handles[segment].is_none(),
            "segment {} is already active",
            segment
        );

        let mut parent = None;
        let mut go_left = false;
        let mut cur = self.root;
        while let Some(k) = cur {
            parent = Some(k);
            go_left = order.cmp(segment, self.nodes[k].segment) == Ordering::Less;
            cur = if go_left {
                self.nodes[k].left
            } else {
                self.nodes[k].right
            };
        }

        let key = self.nodes.insert(Node {
            segment,
            parent,
            left: None,
            right: None,
            height: 1,
        });
        self.handles[segment] = Some(key);
        match parent {
            None => self.root = Some(key),
            Some(p) if go_left => self.nodes[p].left = Some(key),
            Some(p) => self.nodes[p].right = Some(key),
        }
        self.rebalance(parent);
    }

    /// Remove a segment. Returns `false` if it was not active.
    pub fn remove(&mut self, segment: usize) -> bool {
        let key = match self.handles.get_mut(segment).and_then(Option::take) {
            Some(key) => key,
            None => return false,
        };

        let unlink = match (self.nodes[key].left, self.nodes[key].right) {
            (Some(_), Some(right)) => {
                // Move the successor's segment here and unlink its node.
                let succ = self.min_from(right);
                let succ_segment = self.nodes[succ].segment;
                self.nodes[key].segment = succ_segment;
                self.handles[succ_segment] = Some(key);
                succ
            }
            _ => key,
        };

        let node = self.nodes.remove(unlink);
        let child = node.left.or(node.right);
        self.replace_child(node.parent, unlink, child);
        self.rebalance(node.parent);
        true
    }

    /// Exchange the positions of two active segments.
    ///
    /// The tree shape is unchanged; only the stored segments move.
    pub fn swap(&mut self, a: usize, b: usize) {
        let (ka, kb) = match (self.handle(a), self.handle(b)) {
            (Some(ka), Some(kb)) => (ka, kb),
            _ => panic!("swap of inactive segments {} and {}", a, b),
        };
        self.nodes[ka].segment = b;
        self.nodes[kb].segment = a;
        self.handles[a] = Some(kb);
        self.handles[b] = Some(ka);
    }

    /// The segment directly below `segment`.
    pub fn prev(&self, segment: usize) -> Option<usize> {
        let key = self.handle(segment)?;
        if let Some(left) = self.nodes[key].left {
            return Some(self.nodes[self.max_from(left)].segment);
        }
        let mut child = key;
        let mut parent = self.nodes[key].parent;
        while let Some(p) = parent {
            if self.nodes[p].right == Some(child) {
                return Some(self.nodes[p].segment);
            }
            child = p;
            parent = self.nodes[p].parent;
        }
        None
    }

    /// The segment directly above `segment`.
    pub fn next(&self, segment: usize) -> Option<usize> {
        let key = self.handle(segment)?;
        if let Some(right) = self.nodes[key].right {
            return Some(self.nodes[self.min_from(right)].segment);
        }
        let mut child = key;
        let mut parent = self.nodes[key].parent;
        while let Some(p) = parent {
            if self.nodes[p].left == Some(child) {
                return Some(self.nodes[p].segment);
            }
            child = p;
            parent = self.nodes[p].parent;
        }
        None
    }

    /// The segments directly below and above `segment`.
    pub fn neighbors(&self, segment: usize) -> (Option<usize>, Option<usize>) {
        (self.prev(segment), self.next(segment))
    }

    pub fn first(&self) -> Option<usize> {
        self.root.map(|r| self.nodes[self.min_from(r)].segment)
    }

    pub fn last(&self) -> Option<usize> {
        self.root.map(|r| self.nodes[self.max_from(r)].segment)
    }

    /// The lowest segment for which `is_below` is `false`.
    ///
    /// `is_below` must be monotone along the tree: `true` for a prefix
    /// of the segments and `false` after.
    pub fn locate<F: FnMut(usize) -> bool>(&self, mut is_below: F) -> Option<usize> {
        let mut found = None;
        let mut cur = self.root;
        while let Some(k) = cur {
            if is_below(self.nodes[k].segment) {
                cur = self.nodes[k].right;
            } else {
                found = Some(k);
                cur = self.nodes[k].left;
            }
        }
        found.map(|k| self.nodes[k].segment)
    }

    /// Iterate over the active segments from bottom to top.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        successors(self.first(), move |&s| self.next(s))
    }

    fn min_from(&self, mut key: usize) -> usize {
        while let Some(left) = self.nodes[key].left {
            key = left;
        }
        key
    }

    fn max_from(&self, mut key: usize) -> usize {
        while let Some(right) = self.nodes[key].right {
            key = right;
        }
        key
    }

    #[inline]
    fn height(&self, key: Option<usize>) -> u32 {
        key.map_or(0, |k| self.nodes[k].height)
    }

    #[inline]
    fn balance_factor(&self, key: usize) -> i64 {
        let node = &self.nodes[key];
        self.height(node.left) as i64 - self.height(node.right) as i64
    }

    fn update_height(&mut self, key: usize) {
        let node = &self.nodes[key];
        let height = 1 + self.height(node.left).max(self.height(node.right));
        self.nodes[key].height = height;
    }

    /// Point the link from `parent` that referred to `old` at `new`.
    fn replace_child(&mut self, parent: Option<usize>, old: usize, new: Option<usize>) {
        match parent {
            None => self.root = new,
            Some(p) => {
                if self.nodes[p].left == Some(old) {
                    self.nodes[p].left = new;
                } else {
                    self.nodes[p].right = new;
                }
            }
        }
        if let Some(n) = new {
            self.nodes[n].parent = parent;
        }
    }

    fn rotate_left(&mut self, x: usize) -> usize {
        let y = self.nodes[x]
            .right
            .expect("rotate_left: node must have a right child");
        let parent = self.nodes[x].parent;
        let inner = self.nodes[y].left;

        self.nodes[x].right = inner;
        if let Some(inner) = inner {
            self.nodes[inner].parent = Some(x);
        }
        self.replace_child(parent, x, Some(y));
        self.nodes[y].left = Some(x);
        self.nodes[x].parent = Some(y);

        self.update_height(x);
        self.update_height(y);
        y
    }

    fn rotate_right(&mut self, x: usize) -> usize {
        let y = self.nodes[x]
            .left
            .expect("rotate_right: node must have a left child");
        let parent = self.nodes[x].parent;
        let inner = self.nodes[y].right;

        self.nodes[x].left = inner;
        if let Some(inner) = inner {
            self.nodes[inner].parent = Some(x);
        }
        self.replace_child(parent, x, Some(y));
        self.nodes[y].right = Some(x);
        self.nodes[x].parent = Some(y);

        self.update_height(x);
        self.update_height(y);
        y
    }

    /// Restore heights and balance from `start` up to the root.
    fn rebalance(&mut self, start: Option<usize>) {
        let mut cur = start;
        while let Some(key) = cur {
            self.update_height(key);
            let balance = self.balance_factor(key);
            let top = if balance > 1 {
                let left = self.nodes[key].left.expect("left-heavy node has a left child");
                if self.balance_factor(left) < 0 {
                    self.rotate_left(left);
                }
                self.rotate_right(key)
            } else if balance < -1 {
                let right = self.nodes[key]
                    .right
                    .expect("right-heavy node has a right child");
                if self.balance_factor(right) > 0 {
                    self.rotate_right(right);
                }
                self.rotate_left(key)
            } else {
                key
            };
            cur = self.nodes[top].parent;
        }
    }

    /// Check links, heights and balance of the whole tree.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        fn walk(tree: &ActiveSegments, key: Option<usize>, parent: Option<usize>) -> u32 {
            let key = match key {
                Some(k) => k,
                None => return 0,
            };
            let node = &tree.nodes[key];
            assert_eq!(node.parent, parent, "parent link of node {}", key);
            assert_eq!(tree.handle(node.segment), Some(key), "handle of {}", node.segment);
            let hl = walk(tree, node.left, Some(key));
            let hr = walk(tree, node.right, Some(key));
            assert!((hl as i64 - hr as i64).abs() <= 1, "node {} is unbalanced", key);
            assert_eq!(node.height, 1 + hl.max(hr), "height of node {}", key);
            node.height
        }
        walk(self, self.root, None);
        assert_eq!(self.iter().count(), self.len());
    }
}
