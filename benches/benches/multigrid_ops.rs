// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use understory_multigrid::{Aabb2D, MultiGrid, Object, Subdivision};

const WORLD: f64 = 4096.0;

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_f64(&mut self) -> f64 {
        let v = self.next_u64() >> 11;
        (v as f64) / ((1u64 << 53) as f64)
    }
}

fn world() -> Aabb2D<f64> {
    Aabb2D::new(0.0, 0.0, WORLD, WORLD)
}

/// A flat 64×64 grid.
fn flat_layout() -> Subdivision {
    Subdivision::new(64, 64)
}

/// 8×8 coarse cells with the lower-left quarter refined 16×16.
fn clustered_layout() -> Subdivision {
    let mut subdivision = Subdivision::new(8, 8);
    for row in 0..4 {
        for col in 0..4 {
            subdivision.subdivide(row, col, 16, 16);
        }
    }
    subdivision
}

fn gen_random_rects(count: usize, span: f64, size: f64, seed: u64) -> Vec<Aabb2D<f64>> {
    let mut rng = Rng::new(seed);
    (0..count)
        .map(|_| {
            let x0 = rng.next_f64() * (span - size);
            let y0 = rng.next_f64() * (span - size);
            Aabb2D::from_xywh(x0, y0, size, size)
        })
        .collect()
}

fn layouts() -> [(&'static str, Subdivision); 2] {
    [("flat", flat_layout()), ("clustered", clustered_layout())]
}

fn populated(
    subdivision: &Subdivision,
    rects: &[Aabb2D<f64>],
) -> (MultiGrid<f64, u32>, Vec<Object<f64, u32>>) {
    let mut grid = MultiGrid::with_layout(world(), subdivision).unwrap();
    let mut objects: Vec<_> = rects
        .iter()
        .enumerate()
        .map(|(i, r)| Object::new(*r, i as u32))
        .collect();
    objects.iter_mut().for_each(|o| grid.insert(o));
    (grid, objects)
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("multigrid_insert");
    for &count in &[1_000usize, 10_000] {
        let rects = gen_random_rects(count, WORLD, 24.0, 0xCAFE_F00D_DEAD_BEEF);
        group.throughput(Throughput::Elements(count as u64));
        for (name, subdivision) in layouts() {
            group.bench_function(format!("{name}_n{count}"), |b| {
                b.iter_batched(
                    || {
                        let grid =
                            MultiGrid::<f64, u32>::with_layout(world(), &subdivision).unwrap();
                        let objects: Vec<_> = rects
                            .iter()
                            .enumerate()
                            .map(|(i, r)| Object::new(*r, i as u32))
                            .collect();
                        (grid, objects)
                    },
                    |(mut grid, mut objects)| {
                        objects.iter_mut().for_each(|o| grid.insert(o));
                        black_box(grid.len());
                    },
                    BatchSize::SmallInput,
                );
            });
        }
    }
    group.finish();
}

fn bench_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("multigrid_update");
    let count = 10_000;
    let rects = gen_random_rects(count, WORLD, 24.0, 0x1234_5678_9ABC_DEF0);
    group.throughput(Throughput::Elements(count as u64));
    for (name, subdivision) in layouts() {
        let (mut grid, mut objects) = populated(&subdivision, &rects);
        let mut step = 0.0;
        // Small jitter: most moves stay inside the same leaves.
        group.bench_function(format!("{name}_jitter"), |b| {
            b.iter(|| {
                step = if step > 0.0 { -1.5 } else { 1.5 };
                for o in objects.iter_mut() {
                    let moved = o.aabb().translate(step, step);
                    grid.update(o, moved);
                }
            });
        });
    }
    group.finish();
}

fn bench_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("multigrid_query");
    let count = 10_000;
    let rects = gen_random_rects(count, WORLD, 24.0, 0xDEAD_BEEF_CAFE_F00D);
    let query_rects = gen_random_rects(256, WORLD, 200.0, 0x0BAD_C0DE_0BAD_C0DE);
    group.throughput(Throughput::Elements(query_rects.len() as u64));
    for (name, subdivision) in layouts() {
        let (mut grid, _objects) = populated(&subdivision, &rects);
        let mut out = Vec::new();
        group.bench_function(format!("{name}_rect"), |b| {
            b.iter(|| {
                let mut hits = 0;
                for p in &query_rects {
                    out.clear();
                    grid.query_rect_into(*p, &mut out);
                    hits += out.len();
                }
                black_box(hits);
            });
        });
        group.bench_function(format!("{name}_point"), |b| {
            b.iter(|| {
                let hits: usize = query_rects
                    .iter()
                    .map(|p| grid.query_point(p.min_x, p.min_y).count())
                    .sum();
                black_box(hits);
            });
        });
    }
    // Baseline: a linear scan over the same boxes.
    group.bench_function("linear_scan_rect", |b| {
        b.iter(|| {
            let hits: usize = query_rects
                .iter()
                .map(|p| rects.iter().filter(|r| r.overlaps(p)).count())
                .sum();
            black_box(hits);
        });
    });
    group.finish();
}

criterion_group!(benches, bench_insert, bench_update, bench_queries);
criterion_main!(benches);
