use std::{
    cmp::Ordering,
    collections::{BTreeMap, BinaryHeap},
    ops::Bound::{Excluded, Included, Unbounded},
};

use geo::Coordinate;
use log::trace;
use smallvec::SmallVec;

/// Tolerance used for every floating comparison in the crate: point
/// equality, zero area (collinearity) and interval bounds.
pub const EPSILON: f64 = 1e-9;

/// Pairs of segment keys whose crossing produced an intersection event.
pub(crate) type Pairs = SmallVec<[(usize, usize); 2]>;

/// Wraps a [`Coordinate`] to support lexicographic ordering.
///
/// Ordering and equality are exact: by `x` and then by `y`. Computed
/// crossing points that should coincide usually differ in the last
/// bits, so the event schedule groups and matches points with
/// [`SweepPoint::approx_eq`] instead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepPoint(Coordinate<f64>);

impl SweepPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Coordinate { x, y }.into()
    }

    #[inline]
    pub fn x(&self) -> f64 {
        self.0.x
    }

    #[inline]
    pub fn y(&self) -> f64 {
        self.0.y
    }

    /// Get the underlying coordinate.
    #[inline]
    pub fn coord(&self) -> Coordinate<f64> {
        self.0
    }

    /// Whether the points differ by less than [`EPSILON`] on both axes.
    #[inline]
    pub fn approx_eq(&self, other: &Self) -> bool {
        (self.0.x - other.0.x).abs() < EPSILON && (self.0.y - other.0.y).abs() < EPSILON
    }
}

/// Implement lexicographic ordering by `x` and then by `y`
/// coordinate.
impl PartialOrd for SweepPoint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SweepPoint {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .x
            .total_cmp(&other.0.x)
            .then_with(|| self.0.y.total_cmp(&other.0.y))
    }
}

/// We derive `Eq` manually: coordinates are checked finite, and
/// negative zeros are normalized, on creation.
impl Eq for SweepPoint {}

/// Create from `Coordinate` while checking the components are finite.
impl From<Coordinate<f64>> for SweepPoint {
    fn from(pt: Coordinate<f64>) -> Self {
        assert!(pt.x.is_finite(), "sweep point requires a finite x-coordinate");
        assert!(pt.y.is_finite(), "sweep point requires a finite y-coordinate");
        // Adding zero turns `-0.` into `0.`.
        SweepPoint(Coordinate {
            x: pt.x + 0.,
            y: pt.y + 0.,
        })
    }
}

impl From<(f64, f64)> for SweepPoint {
    fn from((x, y): (f64, f64)) -> Self {
        SweepPoint::new(x, y)
    }
}

#[inline]
pub(crate) fn cmp_with_tolerance(a: f64, b: f64) -> Ordering {
    if (a - b).abs() < EPSILON {
        Ordering::Equal
    } else if a < b {
        Ordering::Less
    } else {
        Ordering::Greater
    }
}

/// A segment end-point event.
#[derive(Debug, Clone)]
pub(crate) struct Event {
    pub(crate) point: SweepPoint,
    pub(crate) ty: EventType,
    pub(crate) segment_key: usize,
}

/// Equality check for usage in ordered sets. Note that it ignores
/// segment_key.
impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.point == other.point && self.ty == other.ty
    }
}

impl Eq for Event {}

/// Ordering for use with a max-heap (`BinaryHeap`). Note that it
/// ignores the segment_key. This suffices for heap usage, where
/// repeated items are allowed.
impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        self.point
            .cmp(&other.point)
            .then_with(|| self.ty.cmp(&other.ty))
            .reverse()
    }
}

/// Event type to associate with an end-point event.
///
/// Right end points sort before left end points at the same point.
/// The driver handles every event at a point as one batch, so this
/// only fixes the order events are reported in.
#[derive(Debug, PartialOrd, Ord, PartialEq, Eq, Clone, Copy)]
pub(crate) enum EventType {
    LineRight,
    LineLeft,
}

/// What happens at an extracted event point.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SweepEvent {
    Left(usize),
    Right(usize),
    Intersection(Pairs),
}

impl From<Event> for SweepEvent {
    fn from(event: Event) -> Self {
        match event.ty {
            EventType::LineLeft => SweepEvent::Left(event.segment_key),
            EventType::LineRight => SweepEvent::Right(event.segment_key),
        }
    }
}

/// The event schedule of one sweep.
///
/// End-point events sit in a binary heap. Intersection events sit in an
/// ordered map keyed by their crossing point. A crossing within
/// tolerance of a pending one joins it, so lookups by point search the
/// keys near it; see [`EventQueue::find_crossing`]. Extraction always
/// yields the smallest point across both.
#[derive(Debug, Default)]
pub(crate) struct EventQueue {
    endpoints: BinaryHeap<Event>,
    crossings: BTreeMap<SweepPoint, Pairs>,
}

impl EventQueue {
    pub fn with_capacity(size: usize) -> Self {
        EventQueue {
            endpoints: BinaryHeap::with_capacity(size),
            crossings: BTreeMap::new(),
        }
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.endpoints.len() + self.crossings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty() && self.crossings.is_empty()
    }

    /// Schedule an end-point event.
    pub fn push(&mut self, event: Event) {
        self.endpoints.push(event);
    }

    /// The key of the pending intersection event within tolerance of
    /// `point`, if any.
    ///
    /// Candidates have `x` within [`EPSILON`] of `point`. The search
    /// visits each distinct `x` among them once, jumping to the
    /// tolerance band in `y`.
    pub fn find_crossing(&self, point: &SweepPoint) -> Option<SweepPoint> {
        let (x, y) = (point.x(), point.y());
        let mut from = Included(SweepPoint::new(x - EPSILON, y - EPSILON));
        loop {
            let key = *self.crossings.range((from, Unbounded)).next()?.0;
            if key.x() >= x + EPSILON {
                return None;
            }
            if key.approx_eq(point) {
                return Some(key);
            }
            from = if key.y() < y - EPSILON {
                Included(SweepPoint::new(key.x(), y - EPSILON))
            } else {
                Excluded(SweepPoint::new(key.x(), f64::MAX))
            };
        }
    }

    /// Schedule the crossing of `pair` at `point`.
    ///
    /// At most one intersection event exists near a point: if one is
    /// already pending, the pair joins it. Returns `false` if the pair
    /// was already scheduled there.
    pub fn insert_crossing(&mut self, point: SweepPoint, pair: (usize, usize)) -> bool {
        let pair = ordered_pair(pair);
        let key = self.find_crossing(&point).unwrap_or(point);
        let pairs = self.crossings.entry(key).or_default();
        if pairs.contains(&pair) {
            return false;
        }
        pairs.push(pair);
        true
    }

    /// Whether an intersection event is pending near `point`.
    pub fn has_crossing(&self, point: &SweepPoint) -> bool {
        self.find_crossing(point).is_some()
    }

    /// Remove the intersection event near `point`, if any.
    pub fn cancel(&mut self, point: &SweepPoint) -> Option<Pairs> {
        let key = self.find_crossing(point)?;
        self.crossings.remove(&key)
    }

    /// Retract a single pair from the intersection event near `point`,
    /// cancelling the event once no pair is left.
    pub fn withdraw(&mut self, point: &SweepPoint, pair: (usize, usize)) -> bool {
        let pair = ordered_pair(pair);
        let key = match self.find_crossing(point) {
            Some(key) => key,
            None => return false,
        };
        let (found, empty) = match self.crossings.get_mut(&key) {
            Some(pairs) => {
                let before = pairs.len();
                pairs.retain(|p| *p != pair);
                (pairs.len() != before, pairs.is_empty())
            }
            None => return false,
        };
        if empty {
            self.crossings.remove(&key);
        }
        found
    }

    /// Peek the smallest pending point.
    pub fn peek_point(&self) -> Option<SweepPoint> {
        let endpoint = self.endpoints.peek().map(|e| e.point);
        let crossing = self.crossings.keys().next().copied();
        match (endpoint, crossing) {
            (Some(e), Some(c)) => Some(if c < e { c } else { e }),
            (e, c) => e.or(c),
        }
    }

    /// Extract the event with the smallest point.
    ///
    /// Returns `None` only when the schedule is empty.
    pub fn pop(&mut self) -> Option<(SweepPoint, SweepEvent)> {
        let take_crossing = match (self.endpoints.peek(), self.crossings.keys().next()) {
            (None, None) => return None,
            (Some(_), None) => false,
            (None, Some(_)) => true,
            (Some(e), Some(c)) => *c < e.point,
        };
        if take_crossing {
            self.crossings
                .pop_first()
                .map(|(point, pairs)| (point, SweepEvent::Intersection(pairs)))
        } else {
            self.endpoints.pop().map(|event| (event.point, event.into()))
        }
    }

    /// Extract every event within tolerance of the smallest pending
    /// point.
    ///
    /// The returned point is the smallest one. Events near it may be
    /// separated from it in the exact order by events that are not;
    /// those stay scheduled.
    pub fn pop_batch(&mut self) -> Option<(SweepPoint, SmallVec<[SweepEvent; 4]>)> {
        let (point, first) = self.pop()?;
        let mut batch = SmallVec::new();
        batch.push(first);

        let mut deferred = vec![];
        while self
            .endpoints
            .peek()
            .map_or(false, |e| e.point.x() < point.x() + EPSILON)
        {
            let event = match self.endpoints.pop() {
                Some(event) => event,
                None => break,
            };
            if event.point.approx_eq(&point) {
                batch.push(event.into());
            } else {
                deferred.push(event);
            }
        }
        self.endpoints.extend(deferred);

        let near: SmallVec<[SweepPoint; 2]> = self
            .crossings
            .range(point..)
            .map(|(key, _)| *key)
            .take_while(|key| key.x() < point.x() + EPSILON)
            .filter(|key| key.approx_eq(&point))
            .collect();
        for key in near {
            if let Some(pairs) = self.crossings.remove(&key) {
                batch.push(SweepEvent::Intersection(pairs));
            }
        }

        trace!("extracted {} event(s) at {:?}", batch.len(), point);
        Some((point, batch))
    }
}

#[inline]
pub(crate) fn ordered_pair((a, b): (usize, usize)) -> (usize, usize) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
