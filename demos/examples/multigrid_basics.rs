// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Multigrid basics.
//!
//! Describe a two-level subdivision, insert a few objects, move one, and query.
//!
//! Run:
//! - `RUST_LOG=trace cargo run -p understory_examples --example multigrid_basics`

use kurbo::{Point, Rect};
use understory_multigrid::{Aabb2D, MultiGrid, Object, Subdivision};

fn main() {
    env_logger::init();

    // 4×4 over the world; the top-right cell is refined into 4×4 again.
    let mut subdivision = Subdivision::new(4, 4);
    subdivision.subdivide(3, 3, 4, 4);
    let world = Rect::new(0.0, 0.0, 400.0, 400.0);
    let mut grid: MultiGrid<f64, &str> =
        MultiGrid::with_layout(world.into(), &subdivision).expect("valid subdivision");
    if let Some(layout) = grid.layout() {
        println!("layout: {:?}", layout.counts());
    }

    let mut ship = Object::new(Rect::new(20.0, 20.0, 60.0, 50.0).into(), "ship");
    let mut rock = Object::new(Rect::new(320.0, 320.0, 330.0, 335.0).into(), "rock");
    let mut wall = Object::new(Rect::new(0.0, 190.0, 400.0, 210.0).into(), "wall");
    grid.insert(&mut ship);
    grid.insert(&mut rock);
    grid.insert(&mut wall);
    println!("tracked: {}", grid.len());

    // Point hit-test.
    let hits: Vec<_> = grid
        .hit_test_point(Point::new(25.0, 30.0))
        .map(|(_, name)| name)
        .collect();
    println!("at (25, 30): {hits:?}");

    // Move the ship into the refined corner and look around it.
    grid.update(&mut ship, Aabb2D::new(310.0, 310.0, 350.0, 340.0));
    let near: Vec<_> = grid
        .intersect_rect(Rect::new(300.0, 300.0, 360.0, 360.0))
        .into_iter()
        .map(|(_, name)| name)
        .collect();
    println!("near the rock: {near:?}");

    grid.remove(&mut rock);
    println!("rock tracked after removal: {}", grid.contains(&rock));
    println!("{:?}", grid.footprint());
}
