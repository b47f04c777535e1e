//! Poisson-disc (blue noise) point distribution.
//!
//! Bridson-style dart throwing: an active list of accepted points, candidate
//! darts thrown into the annulus `[s, 2s]` around a random active point, and
//! a background grid so each rejection test only inspects a 5×5 cell window.
//!
//! Output is reproducible: the same separation, area and seed always yield
//! the same points in the same order. The instance count derived from it is
//! what sizes every transform buffer downstream.

pub mod grid;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::{ImpostorError, ImpostorResult};
pub use grid::BackgroundGrid;

/// 2-D point in area-local coordinates.
pub type Point2D = Vec2;

/// Candidate darts per active point before it is retired.
pub const MAX_CANDIDATES: usize = 30;

/// Axis-aligned rectangle, `(x, y)` is the minimum corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
  pub x: f32,
  pub y: f32,
  pub width: f32,
  pub height: f32,
}

impl Rect {
  pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
    Self { x, y, width, height }
  }

  /// Half-open containment test `[min, max)`.
  #[inline]
  pub fn contains(&self, p: Vec2) -> bool {
    p.x >= self.x && p.x < self.x + self.width && p.y >= self.y && p.y < self.y + self.height
  }

  #[inline]
  pub fn center(&self) -> Vec2 {
    Vec2::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
  }

  #[inline]
  pub fn has_positive_extent(&self) -> bool {
    self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
  }
}

/// Generate a Poisson-disc distribution over `area`.
///
/// No two returned points are closer than `min_separation`. Density is not
/// maximal, only the exclusion property is guaranteed.
///
/// Candidate directions avoid `sin`/`cos`, so the output is bit-identical
/// across platforms as well as across runs.
#[cfg_attr(feature = "spans", tracing::instrument(skip_all, name = "distribution::generate"))]
pub fn generate(min_separation: f32, area: &Rect, seed: u64) -> ImpostorResult<Vec<Point2D>> {
  if !(min_separation > 0.0) || !min_separation.is_finite() {
    return Err(ImpostorError::invalid(format!(
      "min_separation must be positive, got {min_separation}"
    )));
  }
  if !area.has_positive_extent() {
    return Err(ImpostorError::invalid(format!(
      "area must have positive extent, got {}x{}",
      area.width, area.height
    )));
  }

  let mut rng = ChaCha8Rng::seed_from_u64(seed);
  let mut grid = BackgroundGrid::new(area, min_separation);
  let mut points: Vec<Point2D> = Vec::new();
  let mut active: Vec<u32> = Vec::new();

  let first = Vec2::new(
    area.x + rng.random::<f32>() * area.width,
    area.y + rng.random::<f32>() * area.height,
  );
  accept(first, &mut points, &mut active, &mut grid);

  while !active.is_empty() {
    let slot = rng.random_range(0..active.len());
    let parent = points[active[slot] as usize];

    let mut found = false;
    for _ in 0..MAX_CANDIDATES {
      let direction = random_direction(&mut rng);
      let radius = min_separation * (1.0 + rng.random::<f32>());
      let candidate = parent + direction * radius;

      if !area.contains(candidate) {
        continue;
      }
      if grid.has_neighbor_within(candidate, min_separation, &points) {
        continue;
      }
      accept(candidate, &mut points, &mut active, &mut grid);
      found = true;
      break;
    }

    if !found {
      active.swap_remove(slot);
    }
  }

  tracing::info!(
    points = points.len(),
    separation = min_separation,
    seed,
    "generated poisson distribution"
  );
  Ok(points)
}

/// Uniform unit vector by rejection from the unit disc.
///
/// Only arithmetic and `sqrt`, both correctly rounded under IEEE 754.
fn random_direction(rng: &mut ChaCha8Rng) -> Vec2 {
  loop {
    let v = Vec2::new(
      rng.random::<f32>() * 2.0 - 1.0,
      rng.random::<f32>() * 2.0 - 1.0,
    );
    let length_squared = v.x * v.x + v.y * v.y;
    if length_squared > 1e-6 && length_squared <= 1.0 {
      return v / length_squared.sqrt();
    }
  }
}

fn accept(p: Vec2, points: &mut Vec<Point2D>, active: &mut Vec<u32>, grid: &mut BackgroundGrid) {
  let index = points.len() as u32;
  points.push(p);
  active.push(index);
  grid.insert(p, index);
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod mod_test;
