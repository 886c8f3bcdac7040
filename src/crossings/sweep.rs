use std::{cmp::Ordering, collections::HashSet, iter::successors};

use itertools::Itertools;
use log::{debug, error, log_enabled, trace, warn, Level};
use smallvec::SmallVec;

use super::{Crossing, Intersections, Overlap};
use crate::{
    active::{ActiveSegments, SweepOrder},
    events::{ordered_pair, Event, EventQueue, EventType, Pairs, SweepEvent, SweepPoint},
    segment::Segment,
    Error,
};

type Keys = SmallVec<[usize; 4]>;
type Adjacent = SmallVec<[(usize, usize); 4]>;

/// Consecutive pairs of a bottom to top run of segments.
fn adjacent_pairs<I: Iterator<Item = usize>>(run: I) -> Adjacent {
    run.tuple_windows().collect()
}

/// The run of status segments passing through an event point, with its
/// neighbours just outside.
struct Block {
    below: Option<usize>,
    members: Keys,
    above: Option<usize>,
    contiguous: bool,
}

/// State of one sweep over a fixed set of segments.
///
/// Segments are referred to by their index in the input, which is also
/// their key in the status structure and in scheduled events.
pub(crate) struct Sweep<'a> {
    segments: &'a [Segment],
    events: EventQueue,
    active: ActiveSegments,
    output: Intersections,
    reported: HashSet<(usize, usize)>,
}

impl<'a> Sweep<'a> {
    pub fn new(segments: &'a [Segment]) -> Self {
        let mut events = EventQueue::with_capacity(2 * segments.len());
        for (key, segment) in segments.iter().enumerate() {
            events.push(Event {
                point: segment.left(),
                ty: EventType::LineLeft,
                segment_key: key,
            });
            events.push(Event {
                point: segment.right(),
                ty: EventType::LineRight,
                segment_key: key,
            });
        }
        Sweep {
            segments,
            events,
            active: ActiveSegments::with_capacity(segments.len()),
            output: Intersections::default(),
            reported: HashSet::new(),
        }
    }

    /// Process events until the schedule is empty.
    pub fn run(mut self) -> Result<Intersections, Error> {
        debug!("sweeping {} segments", self.segments.len());
        while let Some((point, batch)) = self.events.pop_batch() {
            self.handle_point(point, batch)?;
            if log_enabled!(Level::Trace) {
                trace!(
                    "status after {:?}: {:?} ({} events pending)",
                    point,
                    self.active.iter().collect_vec(),
                    self.events.len()
                );
            }
        }
        debug_assert!(self.active.is_empty(), "{} segments left active", self.active.len());
        debug!(
            "found {} crossing points and {} overlaps",
            self.output.crossings.len(),
            self.output.overlaps.len()
        );
        Ok(self.output)
    }

    fn handle_point(
        &mut self,
        point: SweepPoint,
        batch: SmallVec<[SweepEvent; 4]>,
    ) -> Result<(), Error> {
        let mut starting = Keys::new();
        let mut ending = Keys::new();
        let mut seeds = Pairs::new();
        for event in batch {
            match event {
                SweepEvent::Left(key) => starting.push(key),
                SweepEvent::Right(key) => ending.push(key),
                SweepEvent::Intersection(pairs) => seeds.extend(pairs),
            }
        }
        trace!(
            "at {:?}: starting {:?}, ending {:?}, crossing {:?}",
            point,
            starting,
            ending,
            seeds
        );

        if let Some(&segment) = ending.iter().find(|&&key| !self.active.contains(key)) {
            error!("segment {} ends at {:?} but is not active", segment, point);
            return Err(Error::StatusCorrupted { segment });
        }

        let block = self.block_at(point, &seeds, &ending);
        let passing: Keys = block
            .members
            .iter()
            .copied()
            .filter(|key| !ending.contains(key))
            .collect();

        self.report_crossing(point, &passing, &seeds)?;

        // Pairs adjacent in and around the block before the update.
        let old_pairs = adjacent_pairs(
            block
                .below
                .into_iter()
                .chain(block.members.iter().copied())
                .chain(block.above),
        );

        self.handle_right(&ending);
        self.handle_intersection(point, &passing, block.contiguous)?;
        self.handle_left(point, &starting)?;

        // Segments in the block need not all cross at the point; test
        // every adjacent pair of the new run, not only its boundary.
        let entering: Keys = passing.iter().chain(starting.iter()).copied().collect();
        let new_pairs: Adjacent = if entering.is_empty() {
            block.below.zip(block.above).into_iter().collect()
        } else {
            let (lowest, highest) = self.extremes(&entering);
            let (below, _) = self.active.neighbors(lowest);
            let (_, above) = self.active.neighbors(highest);
            let run = successors(Some(lowest), |&key| {
                if key == highest {
                    None
                } else {
                    self.active.next(key)
                }
            });
            adjacent_pairs(below.into_iter().chain(run).chain(above))
        };

        for &pair in &old_pairs {
            if !new_pairs.contains(&pair) {
                self.withdraw(point, pair);
            }
        }
        for &pair in &new_pairs {
            self.schedule(point, pair);
        }
        Ok(())
    }

    /// Find the run of active segments passing through `point`.
    ///
    /// Segments named by the events at `point` always belong to the
    /// run; other active segments join it if they contain the point.
    fn block_at(&self, point: SweepPoint, seeds: &Pairs, ending: &Keys) -> Block {
        let order = SweepOrder::new(self.segments, point);
        let required: Keys = seeds
            .iter()
            .flat_map(|&(a, b)| [a, b])
            .chain(ending.iter().copied())
            .filter(|&key| self.active.contains(key))
            .sorted_unstable()
            .dedup()
            .collect();
        let is_member =
            |key: usize| required.contains(&key) || self.segments[key].contains(point);

        let start = match required.first() {
            Some(&key) => Some(key),
            None => self.active.locate(|key| order.is_below(key)),
        };
        let start = match start {
            Some(key) if is_member(key) => key,
            other => {
                // Nothing active passes through the point.
                let below = match other {
                    Some(key) => self.active.prev(key),
                    None => self.active.last(),
                };
                return Block {
                    below,
                    members: Keys::new(),
                    above: other,
                    contiguous: true,
                };
            }
        };

        let mut lowest = start;
        while let Some(prev) = self.active.prev(lowest).filter(|&key| is_member(key)) {
            lowest = prev;
        }
        let mut below = self.active.prev(lowest);
        let mut members = Keys::new();
        members.push(lowest);
        let mut above = self.active.next(lowest);
        while let Some(next) = above.filter(|&key| is_member(key)) {
            members.push(next);
            above = self.active.next(next);
        }

        let mut contiguous = true;
        for &key in &required {
            if !members.contains(&key) {
                warn!(
                    "segment {} is separated from the segments at {:?}",
                    key, point
                );
                members.push(key);
                contiguous = false;
            }
        }
        if !contiguous {
            below = below.filter(|key| !members.contains(key));
            above = above.filter(|key| !members.contains(key));
        }
        Block {
            below,
            members,
            above,
            contiguous,
        }
    }

    /// Record the crossing at `point` of the segments passing through
    /// it.
    ///
    /// Besides the scheduled pairs, any two passing segments whose
    /// crossing is within tolerance of `point` are reported, unless an
    /// earlier point close by already took them. Passing segments that
    /// only come close at `point` (nearly parallel steep segments) are
    /// not. A scheduled pair that was already reported is an error.
    fn report_crossing(
        &mut self,
        point: SweepPoint,
        passing: &Keys,
        seeds: &Pairs,
    ) -> Result<(), Error> {
        let segments = self.segments;
        let reported = &self.reported;
        let pairs: Pairs = passing
            .iter()
            .copied()
            .tuple_combinations()
            .map(ordered_pair)
            .filter(|&(a, b)| {
                seeds.contains(&(a, b))
                    || (!reported.contains(&(a, b))
                        && segments[a]
                            .intersection_point(&segments[b])
                            .map_or(false, |q| q.approx_eq(&point)))
            })
            .sorted_unstable()
            .collect();
        if pairs.is_empty() {
            return Ok(());
        }

        for &pair in &pairs {
            if !self.reported.insert(pair) {
                error!("segments {:?} cross again at {:?}", pair, point);
                return Err(Error::RepeatedCrossing { pair });
            }
            // Drop a pending event for the pair keyed at a nearby point
            // outside this batch.
            if let Some(q) = segments[pair.0].intersection_point(&segments[pair.1]) {
                self.events.withdraw(&q, pair);
            }
        }
        debug!("crossing at {:?}: {:?}", point, pairs);
        self.output.crossings.push(Crossing {
            point: point.coord(),
            pairs,
        });
        Ok(())
    }

    fn handle_right(&mut self, ending: &Keys) {
        for &key in ending {
            let removed = self.active.remove(key);
            debug_assert!(removed);
        }
    }

    /// Reverse the order of the segments passing through `point`.
    ///
    /// `passing` is bottom to top. The reversal is done in place by
    /// swapping; if that does not give the order just after `point`,
    /// the segments are re-inserted instead.
    fn handle_intersection(
        &mut self,
        point: SweepPoint,
        passing: &Keys,
        contiguous: bool,
    ) -> Result<(), Error> {
        let n = passing.len();
        if n < 2 {
            return Ok(());
        }
        let order = SweepOrder::new(self.segments, point);
        let collinear = passing
            .iter()
            .tuple_combinations()
            .any(|(&a, &b)| self.segments[a].is_collinear_to(&self.segments[b]));

        if contiguous && !collinear {
            for i in 0..n / 2 {
                self.active.swap(passing[i], passing[n - 1 - i]);
            }
            let sorted = passing
                .iter()
                .rev()
                .tuple_windows()
                .all(|(&a, &b)| order.cmp(a, b) == Ordering::Less);
            if sorted && order.fault().is_none() {
                return Ok(());
            }
            warn!("reversal at {:?} is out of order; re-inserting", point);
        }

        for &key in passing {
            self.active.remove(key);
        }
        for &key in passing {
            self.active.insert(key, &order);
        }
        Self::check_order(&order)
    }

    fn handle_left(&mut self, point: SweepPoint, starting: &Keys) -> Result<(), Error> {
        let order = SweepOrder::new(self.segments, point);
        for &key in starting {
            self.active.insert(key, &order);
            Self::check_order(&order)?;
            self.record_overlaps(key);
        }
        Ok(())
    }

    /// Report overlaps of a newly inserted segment with the collinear
    /// run around it.
    fn record_overlaps(&mut self, key: usize) {
        let segment = &self.segments[key];
        let steps: [fn(&ActiveSegments, usize) -> Option<usize>; 2] =
            [ActiveSegments::prev, ActiveSegments::next];
        for step in steps {
            let mut current = step(&self.active, key);
            while let Some(other) = current {
                let neighbor = &self.segments[other];
                if !segment.is_collinear_to(neighbor) {
                    break;
                }
                if let Some((start, end)) = segment.overlap_interval(neighbor) {
                    debug!("segments {} and {} overlap", key, other);
                    self.output.overlaps.push(Overlap {
                        segments: ordered_pair((key, other)),
                        start: start.coord(),
                        end: end.coord(),
                    });
                }
                current = step(&self.active, other);
            }
        }
    }

    /// The lowest and highest of a contiguous run of status segments.
    fn extremes(&self, run: &Keys) -> (usize, usize) {
        let mut lowest = run[0];
        while let Some(prev) = self.active.prev(lowest).filter(|key| run.contains(key)) {
            lowest = prev;
        }
        let mut highest = run[0];
        while let Some(next) = self.active.next(highest).filter(|key| run.contains(key)) {
            highest = next;
        }
        (lowest, highest)
    }

    /// The crossing of two segments, if it lies ahead of `point`.
    ///
    /// A crossing within tolerance of `point` belongs to the current
    /// batch and is not ahead.
    fn crossing_after(&self, point: SweepPoint, pair: (usize, usize)) -> Option<SweepPoint> {
        let (a, b) = ordered_pair(pair);
        self.segments[a]
            .intersection_point(&self.segments[b])
            .filter(|q| *q > point && !q.approx_eq(&point))
    }

    fn schedule(&mut self, point: SweepPoint, pair: (usize, usize)) {
        // Segments cross at most once.
        if self.reported.contains(&ordered_pair(pair)) {
            return;
        }
        if let Some(q) = self.crossing_after(point, pair) {
            let joined = self.events.has_crossing(&q);
            if self.events.insert_crossing(q, pair) {
                debug!(
                    "scheduled crossing of {:?} at {:?}{}",
                    pair,
                    q,
                    if joined { " (concurrent)" } else { "" }
                );
            }
        }
    }

    fn withdraw(&mut self, point: SweepPoint, pair: (usize, usize)) {
        if let Some(q) = self.crossing_after(point, pair) {
            if self.events.withdraw(&q, pair) {
                trace!("withdrew crossing of {:?} at {:?}", pair, q);
            }
        }
    }

    fn check_order(order: &SweepOrder<'_>) -> Result<(), Error> {
        match order.fault() {
            Some(segment) => {
                error!(
                    "status order at {:?} is inconsistent around segment {}",
                    order.at(),
                    segment
                );
                Err(Error::OutOfRange {
                    segment,
                    x: order.at().x(),
                })
            }
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segments(coords: &[[f64; 4]]) -> Vec<Segment> {
        coords
            .iter()
            .map(|&[x1, y1, x2, y2]| Segment::new((x1, y1).into(), (x2, y2).into()).unwrap())
            .collect()
    }

    #[test]
    fn test_status_after_each_point() {
        let _ = env_logger::builder().is_test(true).try_init();
        let segments = segments(&[[0., 0., 4., 4.], [0., 4., 4., 0.], [1., 3., 5., 3.]]);
        let mut sweep = Sweep::new(&segments);

        let mut snapshots = vec![];
        while let Some((point, batch)) = sweep.events.pop_batch() {
            sweep.handle_point(point, batch).unwrap();
            sweep.active.check_invariants();
            snapshots.push((point, sweep.active.iter().collect::<Vec<_>>()));
        }
        let at = |x: f64, y: f64| {
            snapshots
                .iter()
                .find(|(p, _)| p.approx_eq(&SweepPoint::new(x, y)))
                .map(|(_, s)| s.clone())
                .unwrap()
        };
        assert_eq!(at(0., 4.), vec![0, 1]);
        assert_eq!(at(1., 3.), vec![0, 1, 2]);
        assert_eq!(at(2., 2.), vec![1, 0, 2]);
        assert_eq!(at(3., 3.), vec![1, 2, 0]);
        assert!(sweep.events.is_empty());
        assert!(sweep.active.is_empty());
        assert_eq!(sweep.output.pair_count(), 2);
    }

    #[test]
    fn test_withdrawn_crossing_is_not_reported_twice() {
        // Segment 2 separates 0 and 1 before they cross.
        let segments = segments(&[[0., 0., 10., 2.], [0., 2., 10., 0.], [2., 1., 8., 1.]]);
        let result = Sweep::new(&segments).run().unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(
            result.crossings[0].pairs.as_slice(),
            &[(0, 1), (0, 2), (1, 2)]
        );
    }

    #[test]
    fn test_missed_right_end_is_out_of_range() {
        let segments = segments(&[[0., 0., 1., 0.], [2., 1., 3., 1.]]);
        let mut sweep = Sweep::new(&segments);
        let (point, batch) = sweep.events.pop_batch().unwrap();
        sweep.handle_point(point, batch).unwrap();
        // Lose the right end of segment 0.
        sweep.events.pop_batch().unwrap();

        let (point, batch) = sweep.events.pop_batch().unwrap();
        assert_eq!(
            sweep.handle_point(point, batch),
            Err(Error::OutOfRange { segment: 0, x: 2. })
        );
    }

    #[test]
    fn test_missed_left_end_is_corruption() {
        let segments = segments(&[[0., 0., 2., 0.]]);
        let mut sweep = Sweep::new(&segments);
        sweep.events.pop_batch().unwrap();
        let (point, batch) = sweep.events.pop_batch().unwrap();
        assert_eq!(
            sweep.handle_point(point, batch),
            Err(Error::StatusCorrupted { segment: 0 })
        );
    }

    #[test]
    fn test_repeated_pair_is_an_error() {
        let segments = segments(&[[0., 0., 4., 4.], [0., 4., 4., 0.]]);
        let mut sweep = Sweep::new(&segments);
        for _ in 0..2 {
            let (point, batch) = sweep.events.pop_batch().unwrap();
            sweep.handle_point(point, batch).unwrap();
        }
        assert!(sweep.events.has_crossing(&SweepPoint::new(2., 2.)));

        // Pretend the pair was already reported elsewhere.
        sweep.reported.insert((0, 1));
        let (point, batch) = sweep.events.pop_batch().unwrap();
        assert_eq!(
            sweep.handle_point(point, batch),
            Err(Error::RepeatedCrossing { pair: (0, 1) })
        );
    }
}
