use geo::{Coordinate, Line};
use itertools::Itertools;
use smallvec::SmallVec;

use crate::{segment::Segment, Error};

mod brute;
pub use brute::brute_force;

mod sweep;
use sweep::Sweep;

/// A point where two or more input segments cross.
///
/// Segments crossing at the same point (within tolerance) are reported
/// together: one `Crossing` per point, listing every crossing pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Crossing {
    /// The crossing point.
    pub point: Coordinate<f64>,

    /// Pairs of input indices that cross at `point`, each ordered as
    /// `(lower index, higher index)`, and sorted.
    pub pairs: SmallVec<[(usize, usize); 2]>,
}

impl Crossing {
    /// The distinct input indices crossing at this point, sorted.
    pub fn segments(&self) -> Vec<usize> {
        self.pairs
            .iter()
            .flat_map(|&(a, b)| [a, b])
            .sorted_unstable()
            .dedup()
            .collect()
    }
}

/// Two collinear input segments sharing more than a point.
///
/// Overlaps have no single crossing point, so they are reported with
/// the shared interval instead.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlap {
    /// The overlapping input indices, lower index first.
    pub segments: (usize, usize),
    /// The lexicographically smaller end of the shared interval.
    pub start: Coordinate<f64>,
    /// The lexicographically larger end of the shared interval.
    pub end: Coordinate<f64>,
}

/// All intersections of a collection of segments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Intersections {
    /// Crossing points, in sweep order (by `x`, then by `y`).
    pub crossings: Vec<Crossing>,
    /// Collinear overlaps, in the order they were found.
    pub overlaps: Vec<Overlap>,
}

impl Intersections {
    /// Iterate over the crossing points.
    pub fn points(&self) -> impl Iterator<Item = Coordinate<f64>> + '_ {
        self.crossings.iter().map(|c| c.point)
    }

    /// Number of distinct crossing points.
    pub fn len(&self) -> usize {
        self.crossings.len()
    }

    /// `true` if there are neither crossings nor overlaps.
    pub fn is_empty(&self) -> bool {
        self.crossings.is_empty() && self.overlaps.is_empty()
    }

    /// Number of crossing pairs. This is the count a pairwise test over
    /// all segments finds.
    pub fn pair_count(&self) -> usize {
        self.crossings.iter().map(|c| c.pairs.len()).sum()
    }

    /// All crossing pairs, sorted.
    pub fn pairs(&self) -> Vec<(usize, usize)> {
        self.crossings
            .iter()
            .flat_map(|c| c.pairs.iter().copied())
            .sorted_unstable()
            .collect()
    }
}

/// Validate the input lines and convert them to segments.
pub(crate) fn collect_segments<I, L>(lines: I) -> Result<Vec<Segment>, Error>
where
    I: IntoIterator<Item = L>,
    L: Into<Line<f64>>,
{
    lines
        .into_iter()
        .enumerate()
        .map(|(index, line)| {
            let line: Line<f64> = line.into();
            Segment::try_from(line).map_err(|kind| Error::InvalidSegment { index, kind })
        })
        .collect()
}

/// Find all intersections of a collection of line segments.
///
/// Uses the [Bentley-Ottman] sweep and runs in `O((n + k) log n)` time
/// for `n` segments and `k` crossings. Indices in the result refer to
/// positions in `lines`.
///
/// Segments that only share an end point, or where an end point only
/// touches another segment, are adjacent and are not reported.
/// Collinear segments sharing more than a point are reported as
/// [`Overlap`]s.
///
/// Fails if a line has coincident end points, or a coordinate that is
/// not finite or exceeds [`MAX_COORDINATE`](crate::MAX_COORDINATE).
///
/// [Bentley-Ottman]: //en.wikipedia.org/wiki/Bentley%E2%80%93Ottmann_algorithm
pub fn find_intersections<I, L>(lines: I) -> Result<Intersections, Error>
where
    I: IntoIterator<Item = L>,
    L: Into<Line<f64>>,
{
    let segments = collect_segments(lines)?;
    Sweep::new(&segments).run()
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use geo::Rect;
    use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

    use super::*;
    use crate::{
        events::SweepPoint,
        random::{uniform_line, uniform_line_with_length},
        segment::{SegmentError, MAX_COORDINATE},
    };

    fn init_log() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn lines(coords: &[[f64; 4]]) -> Vec<Line<f64>> {
        coords
            .iter()
            .map(|&[x1, y1, x2, y2]| Line::from([(x1, y1), (x2, y2)]))
            .collect()
    }

    /// Whether both results cross at the same points, within tolerance.
    fn same_points(result: &Intersections, expected: &Intersections) -> bool {
        let mut pending: Vec<SweepPoint> = expected.points().map(SweepPoint::from).collect();
        result.len() == pending.len()
            && result.points().map(SweepPoint::from).all(|p| {
                match pending.iter().position(|q| q.approx_eq(&p)) {
                    Some(i) => {
                        pending.swap_remove(i);
                        true
                    }
                    None => false,
                }
            })
    }

    #[test]
    fn simple_crossing() {
        init_log();
        let result = find_intersections(lines(&[[0., 0., 4., 4.], [0., 4., 4., 0.]])).unwrap();
        assert_eq!(result.len(), 1);
        let crossing = &result.crossings[0];
        assert_abs_diff_eq!(crossing.point.x, 2.);
        assert_abs_diff_eq!(crossing.point.y, 2.);
        assert_eq!(crossing.pairs.as_slice(), &[(0, 1)]);
        assert!(result.overlaps.is_empty());
    }

    #[test]
    fn no_crossing() {
        let result = find_intersections(lines(&[[0., 0., 4., 0.], [0., 1., 4., 1.]])).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.pair_count(), 0);
    }

    #[test]
    fn triple_concurrency() {
        init_log();
        let result = find_intersections(lines(&[
            [0., 0., 4., 4.],
            [0., 4., 4., 0.],
            [0., 2., 4., 2.],
        ]))
        .unwrap();
        assert_eq!(result.len(), 1);
        let crossing = &result.crossings[0];
        assert_abs_diff_eq!(crossing.point.x, 2., epsilon = 1e-9);
        assert_abs_diff_eq!(crossing.point.y, 2., epsilon = 1e-9);
        assert_eq!(crossing.pairs.as_slice(), &[(0, 1), (0, 2), (1, 2)]);
        assert_eq!(crossing.segments(), vec![0, 1, 2]);
    }

    #[test]
    fn shared_endpoints_are_adjacent() {
        // A closed triangle and a fan from one point.
        let result = find_intersections(lines(&[
            [0., 0., 4., 0.],
            [4., 0., 2., 3.],
            [2., 3., 0., 0.],
            [0., 0., -1., 5.],
            [0., 0., 1., 0.2],
        ]))
        .unwrap();
        assert!(result.is_empty(), "{:?}", result);
    }

    #[test]
    fn touching_is_not_crossing() {
        // End points resting on the interior of other segments.
        let result = find_intersections(lines(&[
            [0., 0., 4., 0.],
            [2., 0., 2., 3.],
            [1., 3., 3., 3.],
            [3., -2., 3., 0.],
        ]))
        .unwrap();
        assert!(result.is_empty(), "{:?}", result);
    }

    #[test]
    fn collinear_overlap() {
        init_log();
        let result = find_intersections(lines(&[[0., 0., 4., 0.], [2., 0., 6., 0.]])).unwrap();
        assert_eq!(result.len(), 0);
        assert_eq!(
            result.overlaps,
            vec![Overlap {
                segments: (0, 1),
                start: (2., 0.).into(),
                end: (4., 0.).into(),
            }]
        );
    }

    #[test]
    fn vertical_overlap_and_crossing() {
        let result = find_intersections(lines(&[
            [1., 0., 1., 4.],
            [1., 6., 1., 2.],
            [0., 3., 2., 3.],
        ]))
        .unwrap();
        assert_eq!(result.overlaps.len(), 1);
        assert_eq!(result.overlaps[0].segments, (0, 1));
        assert_eq!(result.overlaps[0].start, (1., 2.).into());
        assert_eq!(result.overlaps[0].end, (1., 4.).into());

        assert_eq!(result.len(), 1);
        assert_eq!(result.crossings[0].point, (1., 3.).into());
        assert_eq!(result.crossings[0].pairs.as_slice(), &[(0, 2), (1, 2)]);
    }

    #[test]
    fn crossing_with_overlap() {
        let result = find_intersections(lines(&[
            [0., 0., 4., 4.],
            [1., 1., 5., 5.],
            [0., 3., 3., 0.],
        ]))
        .unwrap();
        assert_eq!(result.overlaps.len(), 1);
        assert_eq!(result.len(), 1);
        assert_eq!(result.crossings[0].pairs.as_slice(), &[(0, 2), (1, 2)]);
    }

    #[test]
    fn grid() {
        init_log();
        let mut input = vec![];
        for i in 0..6 {
            let c = i as f64;
            input.push([c, -1., c, 6.]);
            input.push([-1., c, 6., c]);
        }
        let result = find_intersections(lines(&input)).unwrap();
        assert_eq!(result.len(), 36);
        assert_eq!(result.pair_count(), 36);
        assert!(result.overlaps.is_empty());
    }

    #[test]
    fn star_through_one_point() {
        let n = 7;
        let input: Vec<_> = (0..n)
            .map(|i| {
                let angle = std::f64::consts::PI * i as f64 / n as f64;
                let (s, c) = angle.sin_cos();
                [-c * 3., -s * 3., c * 3., s * 3.]
            })
            .collect();
        let result = find_intersections(lines(&input)).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.pair_count(), n * (n - 1) / 2);
        assert_abs_diff_eq!(result.crossings[0].point.x, 0., epsilon = 1e-9);
        assert_abs_diff_eq!(result.crossings[0].point.y, 0., epsilon = 1e-9);
    }

    #[test]
    fn invalid_input() {
        let err = find_intersections(lines(&[[0., 0., 1., 1.], [2., 2., 2., 2.]])).unwrap_err();
        assert_eq!(
            err,
            Error::InvalidSegment {
                index: 1,
                kind: SegmentError::Degenerate
            }
        );
        let err = find_intersections(lines(&[[0., f64::NAN, 1., 1.]])).unwrap_err();
        assert_eq!(
            err,
            Error::InvalidSegment {
                index: 0,
                kind: SegmentError::NonFinite
            }
        );
        assert!(find_intersections(Vec::<Line<f64>>::new()).unwrap().is_empty());
    }

    #[test]
    fn huge_coordinates() {
        let err = find_intersections(lines(&[[1e300, 0., 0., 1.], [0., 0., 1., 1.]])).unwrap_err();
        assert_eq!(
            err,
            Error::InvalidSegment {
                index: 0,
                kind: SegmentError::TooLarge
            }
        );

        let m = MAX_COORDINATE;
        let result = find_intersections(lines(&[[-m, -m, m, m], [-m, m, m, -m]])).unwrap();
        assert_eq!(result.pairs(), vec![(0, 1)]);
        assert!(result.points().all(|p| p.x.is_finite() && p.y.is_finite()));
    }

    #[test]
    fn steep_segment_crossings_are_all_found() {
        init_log();
        let input = lines(&[
            [0., 5., 1e-7, 1.],
            [-0.5, 3., 1.5, 5.],
            [-0.5, 4., 2.5, 1.],
        ]);
        let result = find_intersections(input.iter().copied()).unwrap();
        assert_eq!(result.pairs(), vec![(0, 1), (0, 2), (1, 2)]);
        let expected = brute_force(input).unwrap();
        assert!(same_points(&result, &expected), "{:?}", result);
    }

    #[test]
    fn steep_segment_pair_is_reported_once() {
        init_log();
        let input = lines(&[
            [1., 1., 1.0000001, 4.],
            [1., 2., 1.0000001, 3.],
            [0.5, 1., 1.5, 4.],
        ]);
        let result = find_intersections(input.iter().copied()).unwrap();
        assert_eq!(result.pairs(), vec![(0, 1), (0, 2), (1, 2)]);
        let expected = brute_force(input).unwrap();
        assert!(same_points(&result, &expected), "{:?}", result);
    }

    #[test]
    fn matches_brute_force() {
        init_log();
        let mut rng = StdRng::seed_from_u64(42);
        let bbox: Rect<f64> = Rect::new([0., 0.], [1024., 1024.]);
        for round in 0..8 {
            let input: Vec<_> = (0..150)
                .map(|i| {
                    if (i + round) % 2 == 0 {
                        uniform_line(&mut rng, bbox)
                    } else {
                        uniform_line_with_length(&mut rng, bbox, 100.)
                    }
                })
                .collect();
            let result = find_intersections(input.iter().copied()).unwrap();
            let expected = brute_force(input.iter().copied()).unwrap();
            assert_eq!(result.pairs(), expected.pairs(), "round {}", round);
            assert!(same_points(&result, &expected), "round {}", round);
        }
    }

    #[test]
    fn matches_brute_force_on_lattice() {
        // Small integer coordinates produce shared end points, touching,
        // collinear overlaps, verticals and concurrent crossings.
        let mut rng = StdRng::seed_from_u64(5);
        let bbox: Rect<f64> = Rect::new([0., 0.], [8., 8.]);
        for round in 0..20 {
            let input: Vec<_> = (0..24)
                .map(|_| {
                    let l = uniform_line(&mut rng, bbox);
                    Line::from([
                        (l.start.x.round(), l.start.y.round()),
                        (l.end.x.round(), l.end.y.round()),
                    ])
                })
                .filter(|l| l.start != l.end)
                .collect();
            let result = find_intersections(input.iter().copied()).unwrap();
            let expected = brute_force(input.iter().copied()).unwrap();
            assert_eq!(result.pairs(), expected.pairs(), "round {}: {:?}", round, input);
            assert!(same_points(&result, &expected), "round {}", round);

            let overlaps = |r: &Intersections| r.overlaps.iter().map(|o| o.segments).sorted().collect_vec();
            assert_eq!(overlaps(&result), overlaps(&expected), "round {}", round);
        }
    }

    #[test]
    fn matches_brute_force_with_steep_segments() {
        init_log();
        let mut rng = StdRng::seed_from_u64(17);
        for round in 0..25 {
            let mut input: Vec<_> = (0..10)
                .map(|_| {
                    let x = rng.gen_range(0.0..1e-6);
                    let dx = rng.gen_range(-1e-7..1e-7);
                    Line::from([(x, rng.gen_range(0.0..10.)), (x + dx, rng.gen_range(0.0..10.))])
                })
                .collect();
            input.extend((0..6).map(|_| {
                Line::from([
                    (rng.gen_range(-2.0..-1.), rng.gen_range(0.0..10.)),
                    (rng.gen_range(1.0..2.), rng.gen_range(0.0..10.)),
                ])
            }));
            input.shuffle(&mut rng);

            let result = find_intersections(input.iter().copied()).unwrap();
            let expected = brute_force(input.iter().copied()).unwrap();
            assert_eq!(result.pairs(), expected.pairs(), "round {}: {:?}", round, input);
            assert!(same_points(&result, &expected), "round {}", round);
        }
    }

    #[test]
    fn order_invariance_and_idempotence() {
        let mut rng = StdRng::seed_from_u64(9);
        let bbox: Rect<f64> = Rect::new([0., 0.], [100., 100.]);
        let input: Vec<_> = (0..80).map(|_| uniform_line(&mut rng, bbox)).collect();

        let first = find_intersections(input.iter().copied()).unwrap();
        let second = find_intersections(input.iter().copied()).unwrap();
        assert_eq!(first, second);

        let mut perm: Vec<usize> = (0..input.len()).collect();
        perm.shuffle(&mut rng);
        let shuffled: Vec<_> = perm.iter().map(|&i| input[i]).collect();
        let result = find_intersections(shuffled).unwrap();
        assert!(same_points(&result, &first));

        let mapped: Vec<_> = result
            .pairs()
            .into_iter()
            .map(|(a, b)| {
                let (a, b) = (perm[a], perm[b]);
                if a < b {
                    (a, b)
                } else {
                    (b, a)
                }
            })
            .sorted()
            .collect();
        assert_eq!(mapped, first.pairs());
    }
}
