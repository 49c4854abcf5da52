#![allow(dead_code)]

use nblast::{Point3, ScoreTable};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::f32::consts::TAU;

/// Evenly spaced points along the z axis starting at the origin.
pub fn z_line_points(n: usize, spacing: f32) -> Vec<Point3> {
    (0..n)
        .map(|i| Point3::new(0.0, 0.0, i as f32 * spacing))
        .collect()
}

/// A copy of `points` rigidly translated by `(dx, dy, dz)`.
pub fn offset_points(points: &[Point3], dx: f32, dy: f32, dz: f32) -> Vec<Point3> {
    points
        .iter()
        .map(|p| Point3::new(p.x + dx, p.y + dy, p.z + dz))
        .collect()
}

/// A smooth helix; every neighborhood has one clear principal direction.
pub fn helix_points(n: usize, radius: f32, pitch: f32) -> Vec<Point3> {
    (0..n)
        .map(|i| {
            let t = i as f32 * 0.2;
            Point3::new(radius * t.cos(), radius * t.sin(), pitch * t)
        })
        .collect()
}

/// A seeded meandering curve, shaped like a traced neurite: fixed-length
/// steps in a direction that drifts randomly.
pub fn wandering_curve_points(n: usize, step: f32, seed: u64) -> Vec<Point3> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut pos = [0.0f32; 3];
    let mut dir = random_unit(&mut rng);

    (0..n)
        .map(|_| {
            let kink = random_unit(&mut rng);
            let mut d = [
                dir[0] + 0.3 * kink[0],
                dir[1] + 0.3 * kink[1],
                dir[2] + 0.3 * kink[2],
            ];
            let len = (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt();
            d = [d[0] / len, d[1] / len, d[2] / len];
            dir = d;
            pos = [
                pos[0] + step * d[0],
                pos[1] + step * d[1],
                pos[2] + step * d[2],
            ];
            Point3::new(pos[0], pos[1], pos[2])
        })
        .collect()
}

fn random_unit<R: Rng>(rng: &mut R) -> [f32; 3] {
    let z: f32 = rng.gen_range(-1.0..1.0);
    let theta: f32 = rng.gen_range(0.0..TAU);
    let r = (1.0 - z * z).sqrt();
    [r * theta.cos(), r * theta.sin(), z]
}

/// A small hand-checkable table.
///
/// Distance rows at 0/10/20/40, alignment columns at 0/0.5/1:
///
/// ```text
///          a=0   a=0.5  a=1
/// d=0      1.0    2.0   4.0
/// d=10     0.5    1.0   2.0
/// d=20    -1.0   -0.5   0.0
/// d=40    -4.0   -3.0  -2.0
/// ```
pub fn grid_table() -> ScoreTable {
    ScoreTable::new(
        vec![0.0, 10.0, 20.0, 40.0],
        vec![0.0, 0.5, 1.0],
        vec![
            1.0, 2.0, 4.0, //
            0.5, 1.0, 2.0, //
            -1.0, -0.5, 0.0, //
            -4.0, -3.0, -2.0,
        ],
    )
    .expect("grid table is well-formed")
}
