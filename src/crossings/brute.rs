use geo::Line;
use smallvec::smallvec;

use super::{collect_segments, Crossing, Intersections, Overlap};
use crate::{
    events::SweepPoint,
    segment::{Intersection, Segment},
    Error,
};

/// Find all intersections by testing every pair of segments.
///
/// Runs in `O(n^2)` time and reports in the same shape as
/// [`find_intersections`](super::find_intersections): crossings sharing
/// a point (within tolerance) are grouped, and crossings are in sweep
/// order. Meant as a reference for testing and benchmarks.
pub fn brute_force<I, L>(lines: I) -> Result<Intersections, Error>
where
    I: IntoIterator<Item = L>,
    L: Into<Line<f64>>,
{
    let segments = collect_segments(lines)?;
    Ok(pairwise(&segments))
}

fn pairwise(segments: &[Segment]) -> Intersections {
    let mut points: Vec<(SweepPoint, Crossing)> = vec![];
    let mut overlaps = vec![];

    for (i, first) in segments.iter().enumerate() {
        for (j, second) in segments.iter().enumerate().skip(i + 1) {
            match first.intersect(second) {
                Some(Intersection::Point(pt)) => {
                    match points.iter_mut().find(|(p, _)| p.approx_eq(&pt)) {
                        Some((_, crossing)) => crossing.pairs.push((i, j)),
                        None => points.push((
                            pt,
                            Crossing {
                                point: pt.coord(),
                                pairs: smallvec![(i, j)],
                            },
                        )),
                    }
                }
                Some(Intersection::Overlap(start, end)) => overlaps.push(Overlap {
                    segments: (i, j),
                    start: start.coord(),
                    end: end.coord(),
                }),
                None => {}
            }
        }
    }

    points.sort_by(|a, b| a.0.cmp(&b.0));
    let crossings = points
        .into_iter()
        .map(|(_, mut crossing)| {
            crossing.pairs.sort_unstable();
            crossing
        })
        .collect();
    Intersections {
        crossings,
        overlaps,
    }
}
