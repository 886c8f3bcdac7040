//! Finds all crossings of a collection of line segments with a
//! plane sweep.
//!
//! This is an implementation of the [Bentley-Ottman] algorithm. A
//! vertical line sweeps the plane from left to right, stopping at
//! segment end points and at crossings found ahead of it. Only
//! segments adjacent on the sweep line are ever tested against each
//! other, so all `k` crossings of `n` segments are found in
//! `O((n + k) log n)` time.
//!
//! ## Usage
//!
//! Call [`find_intersections`] with any collection of values
//! convertible to a geo-type [`Line`]. The result lists each crossing
//! point once, together with every pair of input segments crossing
//! there, and any collinear overlaps separately.
//!
//! ```rust
//! use geo::Line;
//! use sweep_crossings::find_intersections;
//! let input = vec![
//!     Line::from([(1., 0.), (0., 1.)]),
//!     Line::from([(0., 0.5), (1., 0.5)]),
//!     Line::from([(0., 0.), (1., 1.)]),
//! ];
//! let result = find_intersections(input).unwrap();
//! // All pairs cross at the same point
//! assert_eq!(result.len(), 1);
//! assert_eq!(result.pair_count(), 3);
//! ```
//!
//! ## Tolerance
//!
//! Coordinates are compared with an absolute tolerance of [`EPSILON`].
//! Points closer than that are the same event, and segments sharing
//! an end point (or touching another segment with an end point) are
//! adjacent, not crossing.
//!
//! Event points are ordered exactly, by `x` and then `y`, so a steep
//! segment is never reordered by the tolerance. Coordinates larger than
//! [`MAX_COORDINATE`] in magnitude are rejected, so that the
//! predicates cannot overflow.
//!
//! [Bentley-Ottman]: //en.wikipedia.org/wiki/Bentley%E2%80%93Ottmann_algorithm
//! [`Line`]: geo::Line
mod events;
pub use events::{SweepPoint, EPSILON};

mod segment;
pub use segment::{orient, signed_area, Intersection, Segment, SegmentError, MAX_COORDINATE};

mod active;

mod error;
pub use error::Error;

pub mod crossings;
pub use crossings::{brute_force, find_intersections, Crossing, Intersections, Overlap};

pub mod input;

#[cfg(test)]
#[path = "../benches/utils/random.rs"]
pub mod random;
