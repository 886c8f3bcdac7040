use std::fmt;

use crate::segment::SegmentError;

/// Errors reported by [`find_intersections`](crate::find_intersections).
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The input segment at `index` cannot be processed.
    InvalidSegment { index: usize, kind: SegmentError },
    /// The status structure compared a segment at an `x` outside its
    /// range. The sweep order can no longer be trusted.
    OutOfRange { segment: usize, x: f64 },
    /// An event referred to a segment missing from the status
    /// structure.
    StatusCorrupted { segment: usize },
    /// A pair of segments was found crossing at two event points.
    RepeatedCrossing { pair: (usize, usize) },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidSegment { index, kind } => {
                write!(f, "invalid segment at index {}: {}", index, kind)
            }
            Error::OutOfRange { segment, x } => write!(
                f,
                "segment {} was ordered at x = {} outside its range",
                segment, x
            ),
            Error::StatusCorrupted { segment } => {
                write!(f, "segment {} is missing from the sweep status", segment)
            }
            Error::RepeatedCrossing { pair: (a, b) } => {
                write!(f, "segments {} and {} were reported crossing twice", a, b)
            }
        }
    }
}

impl std::error::Error for Error {}
