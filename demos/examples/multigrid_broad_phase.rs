// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Multigrid broad phase.
//!
//! Simulate particles drifting through a world with a busy region, and collect
//! candidate pairs each frame using region queries.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p understory_examples --example multigrid_broad_phase`

use kurbo::{Rect, Vec2};
use understory_multigrid::{Aabb2D, MultiGrid, Object, Subdivision};

const WORLD: f64 = 1024.0;
const SIZE: f64 = 6.0;

struct Particle {
    object: Object<f64, usize>,
    velocity: Vec2,
}

fn main() {
    env_logger::init();

    // Coarse 8×8 everywhere, refined 8×8 again in the central 2×2 where particles start.
    let mut subdivision = Subdivision::new(8, 8);
    for row in 3..5 {
        for col in 3..5 {
            subdivision.subdivide(row, col, 8, 8);
        }
    }
    let mut grid = MultiGrid::with_layout(Aabb2D::new(0.0, 0.0, WORLD, WORLD), &subdivision)
        .expect("valid subdivision");

    let mut seed = 0x2545_F491_4F6C_DD1D_u64;
    let mut next = move || {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        (seed >> 11) as f64 / (1_u64 << 53) as f64
    };

    let mut particles: Vec<Particle> = (0..500)
        .map(|i| {
            let x = 384.0 + next() * 256.0;
            let y = 384.0 + next() * 256.0;
            Particle {
                object: Object::new(Aabb2D::from_xywh(x, y, SIZE, SIZE), i),
                velocity: Vec2::new(next() * 8.0 - 4.0, next() * 8.0 - 4.0),
            }
        })
        .collect();
    for p in &mut particles {
        grid.insert(&mut p.object);
    }

    let mut candidates = Vec::new();
    for frame in 0..10 {
        for p in &mut particles {
            let mut rect: Rect = p.object.aabb().into();
            rect = rect + p.velocity;
            // Bounce off the world edge.
            if rect.x0 < 0.0 || rect.x1 > WORLD {
                p.velocity.x = -p.velocity.x;
            }
            if rect.y0 < 0.0 || rect.y1 > WORLD {
                p.velocity.y = -p.velocity.y;
            }
            grid.update(&mut p.object, rect.into());
        }

        let mut pairs = 0;
        for p in &particles {
            candidates.clear();
            grid.query_rect_into(p.object.aabb(), &mut candidates);
            // Count each unordered pair once.
            pairs += candidates
                .iter()
                .filter(|(_, other)| *other > p.object.payload())
                .count();
        }
        println!("frame {frame}: {pairs} overlapping pairs");
    }
    log::info!("final footprint: {:?}", grid.footprint());
}
