use geo::Line;
use sweep_crossings::{brute_force, find_intersections};

pub fn count_bo(lines: &[Line<f64>]) -> usize {
    find_intersections(lines.iter().copied())
        .map(|result| result.pair_count())
        .unwrap_or_default()
}

pub fn count_brute(lines: &[Line<f64>]) -> usize {
    brute_force(lines.iter().copied())
        .map(|result| result.pair_count())
        .unwrap_or_default()
}
