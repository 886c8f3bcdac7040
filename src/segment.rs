use std::{cmp::Ordering, fmt};

use geo::{kernels::Orientation, Coordinate, Line};

use crate::events::{SweepPoint, EPSILON};

/// Largest coordinate magnitude accepted for a segment end point.
///
/// Keeps products of coordinate differences finite.
pub const MAX_COORDINATE: f64 = 1e150;

/// Twice the signed area of the triangle `a`, `b`, `c`.
///
/// Positive when `c` lies to the left of the directed line `a -> b`.
#[inline]
pub fn signed_area(a: SweepPoint, b: SweepPoint, c: SweepPoint) -> f64 {
    (b.x() - a.x()) * (c.y() - a.y()) - (b.y() - a.y()) * (c.x() - a.x())
}

/// Turn direction of `a -> b -> c`. Areas smaller than [`EPSILON`]
/// count as collinear.
#[inline]
pub fn orient(a: SweepPoint, b: SweepPoint, c: SweepPoint) -> Orientation {
    let area = signed_area(a, b, c);
    if area.abs() < EPSILON {
        Orientation::Collinear
    } else if area > 0. {
        Orientation::CounterClockwise
    } else {
        Orientation::Clockwise
    }
}

/// Helper to convert orientation-2d into an ordering
#[inline]
pub(crate) fn orientation_as_ordering(orientation: Orientation) -> Ordering {
    match orientation {
        Orientation::CounterClockwise => Ordering::Less,
        Orientation::Clockwise => Ordering::Greater,
        Orientation::Collinear => Ordering::Equal,
    }
}

/// Why a line cannot be used as a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentError {
    /// Both end points coincide (within tolerance).
    Degenerate,
    /// A coordinate is NaN or infinite.
    NonFinite,
    /// A coordinate exceeds [`MAX_COORDINATE`] in magnitude.
    TooLarge,
}

impl fmt::Display for SegmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegmentError::Degenerate => write!(f, "segment end points coincide"),
            SegmentError::NonFinite => write!(f, "segment has a non-finite coordinate"),
            SegmentError::TooLarge => write!(
                f,
                "segment has a coordinate larger than {:e} in magnitude",
                MAX_COORDINATE
            ),
        }
    }
}

/// A line segment with two distinct end points.
///
/// The end points are stored ordered: `left` is the smaller one as per
/// [`SweepPoint`] ordering, i.e. by `x`, or by `y` when the segment is
/// vertical.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    left: SweepPoint,
    right: SweepPoint,
}

/// Result of intersecting two segments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Intersection {
    /// The segments cross at a single point interior to both.
    Point(SweepPoint),
    /// The segments are collinear and share the given interval.
    Overlap(SweepPoint, SweepPoint),
}

impl TryFrom<Line<f64>> for Segment {
    type Error = SegmentError;

    fn try_from(line: Line<f64>) -> Result<Self, Self::Error> {
        Segment::new(line.start, line.end)
    }
}

impl Segment {
    /// Create a segment from two end points given in any order.
    pub fn new(p: Coordinate<f64>, q: Coordinate<f64>) -> Result<Self, SegmentError> {
        if !(p.x.is_finite() && p.y.is_finite() && q.x.is_finite() && q.y.is_finite()) {
            return Err(SegmentError::NonFinite);
        }
        if [p.x, p.y, q.x, q.y].iter().any(|c| c.abs() > MAX_COORDINATE) {
            return Err(SegmentError::TooLarge);
        }
        let p = SweepPoint::from(p);
        let q = SweepPoint::from(q);
        if p.approx_eq(&q) {
            return Err(SegmentError::Degenerate);
        }
        Ok(if p < q {
            Segment { left: p, right: q }
        } else {
            Segment { left: q, right: p }
        })
    }

    #[inline]
    pub fn left(&self) -> SweepPoint {
        self.left
    }

    #[inline]
    pub fn right(&self) -> SweepPoint {
        self.right
    }

    /// Get the segment as a [`Line`] from left to right.
    pub fn line(&self) -> Line<f64> {
        Line::new(self.left.coord(), self.right.coord())
    }

    /// Whether both end points have the same `x`.
    ///
    /// This is exact: a steep segment is swept like any other.
    #[inline]
    pub fn is_vertical(&self) -> bool {
        self.right.x() == self.left.x()
    }

    #[inline]
    pub fn is_horizontal(&self) -> bool {
        self.right.y() == self.left.y()
    }

    pub fn length(&self) -> f64 {
        let (dx, dy) = self.delta();
        dx.hypot(dy)
    }

    #[inline]
    fn delta(&self) -> (f64, f64) {
        (self.right.x() - self.left.x(), self.right.y() - self.left.y())
    }

    /// The `y` value of the segment at `x`.
    ///
    /// Returns `None` if `x` is outside the `x`-range of the segment
    /// (with tolerance) or if the segment is vertical. Within the
    /// tolerance band, `x` is clamped to the segment.
    pub fn y_at(&self, x: f64) -> Option<f64> {
        if self.is_vertical() || x < self.left.x() - EPSILON || x > self.right.x() + EPSILON {
            return None;
        }
        let x = x.max(self.left.x()).min(self.right.x());
        let (dx, dy) = self.delta();
        let t = (x - self.left.x()) / dx;
        Some(self.left.y() + dy * t)
    }

    pub fn shares_endpoint(&self, other: &Segment) -> bool {
        self.left.approx_eq(&other.left)
            || self.left.approx_eq(&other.right)
            || self.right.approx_eq(&other.left)
            || self.right.approx_eq(&other.right)
    }

    /// Whether both end points of `other` lie on the supporting line of
    /// `self`.
    pub fn is_collinear_to(&self, other: &Segment) -> bool {
        orient(self.left, self.right, other.left) == Orientation::Collinear
            && orient(self.left, self.right, other.right) == Orientation::Collinear
    }

    /// Whether `pt` lies on the segment (end points included).
    pub fn contains(&self, pt: SweepPoint) -> bool {
        let length = self.length();
        if (signed_area(self.left, self.right, pt) / length).abs() >= EPSILON {
            return false;
        }
        let (lo_y, hi_y) = if self.left.y() <= self.right.y() {
            (self.left.y(), self.right.y())
        } else {
            (self.right.y(), self.left.y())
        };
        pt.x() > self.left.x() - EPSILON
            && pt.x() < self.right.x() + EPSILON
            && pt.y() > lo_y - EPSILON
            && pt.y() < hi_y + EPSILON
    }

    /// Whether `pt` lies on the segment but is not one of its end
    /// points.
    pub fn interior_contains(&self, pt: SweepPoint) -> bool {
        !pt.approx_eq(&self.left) && !pt.approx_eq(&self.right) && self.contains(pt)
    }

    /// Whether the end points of `other` are strictly on opposite sides
    /// of the supporting line of `self`.
    fn straddles(&self, other: &Segment) -> bool {
        use Orientation::*;
        matches!(
            (
                orient(self.left, self.right, other.left),
                orient(self.left, self.right, other.right),
            ),
            (Clockwise, CounterClockwise) | (CounterClockwise, Clockwise)
        )
    }

    /// Whether two collinear segments overlap at more than a single
    /// point.
    ///
    /// Compares the intervals along the dominant axis of `self`: `x`,
    /// or `y` when the segment is steeper than diagonal.
    pub fn collinear_overlap(&self, other: &Segment) -> bool {
        if !self.is_collinear_to(other) {
            return false;
        }
        let (dx, dy) = self.delta();
        let steep = dy.abs() > dx;
        let interval = |s: &Segment| {
            if steep {
                (s.left.y().min(s.right.y()), s.left.y().max(s.right.y()))
            } else {
                (s.left.x(), s.right.x())
            }
        };
        let (lo1, hi1) = interval(self);
        let (lo2, hi2) = interval(other);
        lo1 < hi2 - EPSILON && lo2 < hi1 - EPSILON
    }

    /// Whether the segments intersect.
    ///
    /// Segments that only share an end point, or where an end point of
    /// one only touches the other, are adjacent and do not intersect.
    /// Collinear segments intersect iff they overlap.
    pub fn intersects(&self, other: &Segment) -> bool {
        if self.is_collinear_to(other) {
            return self.collinear_overlap(other);
        }
        if self.shares_endpoint(other) {
            return false;
        }
        self.straddles(other) && other.straddles(self)
    }

    /// The crossing point of two intersecting, non-collinear segments.
    ///
    /// Returns `None` if the segments don't intersect or are collinear.
    pub fn intersection_point(&self, other: &Segment) -> Option<SweepPoint> {
        if self.is_collinear_to(other) || !self.intersects(other) {
            return None;
        }

        // Solve `left + t * d1 = other.left + u * d2` for `t`.
        let (dx1, dy1) = self.delta();
        let (dx2, dy2) = other.delta();
        let denom = dx1 * dy2 - dy1 * dx2;
        if denom == 0. {
            return None;
        }
        let ox = other.left.x() - self.left.x();
        let oy = other.left.y() - self.left.y();
        let t = (ox * dy2 - oy * dx2) / denom;

        let (x, y) = if self.is_vertical() {
            let x = self.left.x();
            (x, other.y_at(x).unwrap_or(self.left.y() + t * dy1))
        } else if other.is_vertical() {
            let x = other.left.x();
            (x, self.y_at(x).unwrap_or(self.left.y() + t * dy1))
        } else {
            let x = self.left.x() + t * dx1;
            let y = if self.is_horizontal() {
                self.left.y()
            } else if other.is_horizontal() {
                other.left.y()
            } else {
                self.left.y() + t * dy1
            };
            (x, y)
        };
        if !(x.is_finite() && y.is_finite()) {
            return None;
        }
        Some(SweepPoint::new(x, y))
    }

    /// The shared interval of two overlapping collinear segments.
    pub fn overlap_interval(&self, other: &Segment) -> Option<(SweepPoint, SweepPoint)> {
        if !self.collinear_overlap(other) {
            return None;
        }
        let start = if self.left < other.left { other.left } else { self.left };
        let end = if self.right < other.right { self.right } else { other.right };
        Some((start, end))
    }

    /// Intersect two segments, returning a crossing point, an overlap
    /// or `None`.
    pub fn intersect(&self, other: &Segment) -> Option<Intersection> {
        if let Some((start, end)) = self.overlap_interval(other) {
            return Some(Intersection::Overlap(start, end));
        }
        self.intersection_point(other).map(Intersection::Point)
    }
}
