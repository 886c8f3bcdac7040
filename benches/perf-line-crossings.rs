#[path = "utils/random.rs"]
mod random;

#[path = "utils/crossings.rs"]
mod crossings;

use crossings::*;
use geo::Coordinate;
use random::*;

const BBOX: Coordinate<f64> = Coordinate { x: 1024., y: 1024. };

fn uniform_perf() {
    const SAMPLE_SIZE: usize = 128;
    const SCALE: usize = 3;

    let line_gen = scaled_generator(BBOX, SCALE);

    (9..12).step_by(2).for_each(|log_num_lines| {
        let num_lines = 1 << log_num_lines;
        let lines: Vec<_> = (0..num_lines).map(|_| line_gen()).collect();
        eprintln!("Profiling with {} lines (scale = {})", num_lines, SCALE);

        let expected = count_brute(&lines);
        (0..SAMPLE_SIZE).for_each(|_| {
            assert_eq!(count_bo(&lines), expected);
        });
    });
}

fn seeded_perf() {
    const SAMPLE_SIZE: usize = 16;

    let lines = seeded_lines(0, 1 << 10, BBOX);
    eprintln!("Profiling with {} seeded uniform lines", lines.len());
    (0..SAMPLE_SIZE).for_each(|_| {
        count_bo(&lines);
    });
}

fn main() {
    uniform_perf();
    seeded_perf();
}
