//! Plain-text segment input and intersection reports.
//!
//! The input format is a segment count followed by four numbers per
//! segment, `x1 y1 x2 y2`, separated by any whitespace.

use std::{fmt, io};

use geo::Line;

use crate::Intersections;

/// Why a segment file could not be read.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// The input has no leading segment count.
    MissingCount,
    /// A token is not a number.
    InvalidNumber { token: String },
    /// The input ended before `expected` coordinates were read.
    Truncated { expected: usize, found: usize },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::MissingCount => write!(f, "missing segment count"),
            ParseError::InvalidNumber { token } => write!(f, "invalid number: {:?}", token),
            ParseError::Truncated { expected, found } => write!(
                f,
                "expected {} coordinates, found {}",
                expected, found
            ),
        }
    }
}

impl std::error::Error for ParseError {}

/// Parse a segment count followed by the segments' coordinates.
///
/// Tokens past the announced count are ignored.
pub fn parse_segments(text: &str) -> Result<Vec<Line<f64>>, ParseError> {
    let mut tokens = text.split_whitespace();
    let count = match tokens.next() {
        Some(token) => token.parse::<usize>().map_err(|_| ParseError::InvalidNumber {
            token: token.to_string(),
        })?,
        None => return Err(ParseError::MissingCount),
    };

    let expected = 4 * count;
    let coords = tokens
        .take(expected)
        .map(|token| {
            token.parse::<f64>().map_err(|_| ParseError::InvalidNumber {
                token: token.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    if coords.len() < expected {
        return Err(ParseError::Truncated {
            expected,
            found: coords.len(),
        });
    }

    Ok(coords
        .chunks_exact(4)
        .map(|c| Line::from([(c[0], c[1]), (c[2], c[3])]))
        .collect())
}

/// Write the number of crossing points and one `(x, y)` line per point.
///
/// With `pairs`, each point is followed by the crossing segment pairs,
/// and collinear overlaps are listed after the points.
pub fn write_report<W: io::Write>(
    mut writer: W,
    result: &Intersections,
    pairs: bool,
) -> io::Result<()> {
    writeln!(writer, "Total intersections: {}", result.len())?;
    for crossing in &result.crossings {
        write!(writer, "({}, {})", crossing.point.x, crossing.point.y)?;
        if pairs {
            for (i, &(a, b)) in crossing.pairs.iter().enumerate() {
                let sep = if i == 0 { ": " } else { ", " };
                write!(writer, "{}{}-{}", sep, a, b)?;
            }
        }
        writeln!(writer)?;
    }
    if pairs {
        for overlap in &result.overlaps {
            writeln!(
                writer,
                "Overlap {}-{}: ({}, {}) to ({}, {})",
                overlap.segments.0,
                overlap.segments.1,
                overlap.start.x,
                overlap.start.y,
                overlap.end.x,
                overlap.end.y
            )?;
        }
    }
    Ok(())
}
