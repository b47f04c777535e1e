//! Lifting 2-D distribution points to world-space instance placements.

use std::f32::consts::TAU;

use glam::{Vec3, Vec4};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::distribution::{Point2D, Rect};

/// Terrain height query, `(x, z) -> y` in world units.
///
/// Must be pure from the engine's point of view: it is called once per
/// instance at placement time and may be called again for the viewer.
pub trait HeightField {
  fn height(&self, x: f32, z: f32) -> f32;
}

impl<F> HeightField for F
where
  F: Fn(f32, f32) -> f32,
{
  #[inline]
  fn height(&self, x: f32, z: f32) -> f32 {
    self(x, z)
  }
}

/// Flat terrain at a fixed elevation.
#[derive(Clone, Copy, Debug, Default)]
pub struct FlatTerrain(pub f32);

impl HeightField for FlatTerrain {
  #[inline]
  fn height(&self, _x: f32, _z: f32) -> f32 {
    self.0
  }
}

/// One scattered instance: world position plus rotation about the up axis.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InstancePlacement {
  /// World-space position, `y` is the terrain elevation.
  pub position: Vec3,
  /// Rotation about +Y in radians, `[0, 2π)`.
  pub yaw: f32,
}

impl InstancePlacement {
  #[inline]
  pub fn new(x: f32, y: f32, z: f32, yaw: f32) -> Self {
    Self {
      position: Vec3::new(x, y, z),
      yaw,
    }
  }

  /// Packed `(x, y, z, yaw)`.
  #[inline]
  pub fn to_vec4(&self) -> Vec4 {
    self.position.extend(self.yaw)
  }
}

/// Place one instance per point.
///
/// Points are re-centred so the area's centre maps to the world origin; the
/// area `y` axis becomes world `z`. Yaw `i` is the `i`-th draw of a generator
/// seeded with `seed`, so it depends only on the seed and the instance index.
#[cfg_attr(feature = "spans", tracing::instrument(skip_all, name = "placement::place"))]
pub fn place<H: HeightField + ?Sized>(
  points: &[Point2D],
  area: &Rect,
  height: &H,
  seed: u64,
) -> Vec<InstancePlacement> {
  let center = area.center();
  let mut rng = ChaCha8Rng::seed_from_u64(seed);

  let placements: Vec<InstancePlacement> = points
    .iter()
    .map(|p| {
      let x = p.x - center.x;
      let z = p.y - center.y;
      let y = height.height(x, z);
      let yaw = rng.random_range(0.0..TAU);
      InstancePlacement::new(x, y, z, yaw)
    })
    .collect();

  debug_assert_eq!(placements.len(), points.len());
  placements
}

#[cfg(test)]
mod tests {
  use glam::Vec2;

  use super::*;

  fn grid_points(n: usize) -> Vec<Point2D> {
    (0..n).map(|i| Vec2::new((i % 10) as f32 * 10.0, (i / 10) as f32 * 10.0)).collect()
  }

  #[test]
  fn output_length_matches_input() {
    let points = grid_points(37);
    let area = Rect::new(0.0, 0.0, 100.0, 100.0);
    let placed = place(&points, &area, &FlatTerrain(0.0), 1);
    assert_eq!(placed.len(), points.len());
  }

  #[test]
  fn points_are_centred_on_origin() {
    let area = Rect::new(0.0, 0.0, 100.0, 100.0);
    let points = vec![Vec2::new(50.0, 50.0), Vec2::new(0.0, 100.0)];
    let placed = place(&points, &area, &FlatTerrain(0.0), 1);

    assert_eq!(placed[0].position, Vec3::ZERO);
    assert_eq!(placed[1].position, Vec3::new(-50.0, 0.0, 50.0));
  }

  #[test]
  fn elevation_comes_from_height_field() {
    let area = Rect::new(0.0, 0.0, 100.0, 100.0);
    let points = vec![Vec2::new(60.0, 80.0)];
    let placed = place(&points, &area, &|x: f32, z: f32| x + 2.0 * z, 1);

    // centred (10, 30) -> 10 + 60
    assert_eq!(placed[0].position.y, 70.0);
  }

  #[test]
  fn yaw_in_full_circle_range() {
    let area = Rect::new(0.0, 0.0, 100.0, 100.0);
    let placed = place(&grid_points(100), &area, &FlatTerrain(0.0), 5);
    assert!(placed.iter().all(|p| p.yaw >= 0.0 && p.yaw < TAU));
  }

  #[test]
  fn same_seed_same_rotations() {
    let area = Rect::new(0.0, 0.0, 100.0, 100.0);
    let a = place(&grid_points(50), &area, &FlatTerrain(0.0), 1234);
    let b = place(&grid_points(50), &area, &FlatTerrain(0.0), 1234);
    for (p, q) in a.iter().zip(&b) {
      assert_eq!(p.yaw.to_bits(), q.yaw.to_bits());
    }
  }

  /// Rotations depend on the index, not on where the point is.
  #[test]
  fn rotations_independent_of_point_coordinates() {
    let area = Rect::new(0.0, 0.0, 100.0, 100.0);
    let mut shuffled = grid_points(20);
    shuffled.reverse();

    let a = place(&grid_points(20), &area, &FlatTerrain(0.0), 9);
    let b = place(&shuffled, &area, &FlatTerrain(0.0), 9);
    let yaws_a: Vec<u32> = a.iter().map(|p| p.yaw.to_bits()).collect();
    let yaws_b: Vec<u32> = b.iter().map(|p| p.yaw.to_bits()).collect();
    assert_eq!(yaws_a, yaws_b);
  }

  #[test]
  fn to_vec4_packs_yaw_last() {
    let p = InstancePlacement::new(1.0, 2.0, 3.0, 0.5);
    assert_eq!(p.to_vec4(), Vec4::new(1.0, 2.0, 3.0, 0.5));
  }
}
