use criterion::*;
use geo::Rect;

const BBOX: [f64; 2] = [1024., 1024.];

#[path = "utils/random.rs"]
mod random;
#[path = "utils/crossings.rs"]
mod crossings;

use crossings::*;
use rand::thread_rng;
use random::*;

fn length_lc(c: &mut Criterion) {
    const NUM_LINES: usize = 1024;

    let bbox: Rect<f64> = Rect::new([0., 0.], BBOX);
    let line_len = BBOX[0] / 5.;

    let lines: Vec<_> = (0..NUM_LINES)
        .map(|_| uniform_line_with_length(&mut thread_rng(), bbox, line_len))
        .collect();
    c.bench_function("Bentley-Ottman - short random lines", |b| {
        b.iter(|| black_box(count_bo(&lines)))
    });
    c.bench_function("Brute-Force - short random lines", |b| {
        b.iter(|| black_box(count_brute(&lines)))
    });
}

fn uniform_lc(c: &mut Criterion) {
    const NUM_LINES: usize = 1024;
    let bbox: Rect<f64> = Rect::new([0., 0.], BBOX);

    let lines: Vec<_> = (0..NUM_LINES)
        .map(|_| uniform_line(&mut thread_rng(), bbox))
        .collect();
    c.bench_function("Bentley-Ottman - uniform random lines", |b| {
        b.iter(|| black_box(count_bo(&lines)))
    });
    c.bench_function("Brute-Force - uniform random lines", |b| {
        b.iter(|| black_box(count_brute(&lines)))
    });
}

fn sparse_lc(c: &mut Criterion) {
    let mut group = c.benchmark_group("Bentley-Ottman - sparse lines");
    for log_num_lines in [8, 10, 12] {
        let num_lines = 1usize << log_num_lines;
        let line_gen = scaled_generator(BBOX.into(), 64);
        let lines: Vec<_> = (0..num_lines).map(|_| line_gen()).collect();
        group.bench_with_input(BenchmarkId::from_parameter(num_lines), &lines, |b, lines| {
            b.iter(|| black_box(count_bo(lines)))
        });
    }
    group.finish();
}

criterion_group!(random, uniform_lc, length_lc, sparse_lc);
criterion_main!(random);
