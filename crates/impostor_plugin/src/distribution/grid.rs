//! Background acceleration grid for Poisson-disc rejection tests.

use glam::Vec2;

use super::Rect;

/// Uniform grid with cell side `separation / sqrt(2)`.
///
/// A cell this small can hold at most one accepted point, so each cell stores
/// a single optional index into the caller's point list.
pub struct BackgroundGrid {
  origin: Vec2,
  cell_size: f32,
  cols: usize,
  rows: usize,
  cells: Vec<Option<u32>>,
}

/// Cells to scan on each side of the candidate's cell.
/// `separation / cell_size = sqrt(2)`, so neighbours up to two cells away can
/// lie within `separation`.
const SEARCH_RADIUS: isize = 2;

impl BackgroundGrid {
  pub fn new(area: &Rect, separation: f32) -> Self {
    let cell_size = separation / std::f32::consts::SQRT_2;
    let cols = ((area.width / cell_size).ceil() as usize).max(1);
    let rows = ((area.height / cell_size).ceil() as usize).max(1);
    Self {
      origin: Vec2::new(area.x, area.y),
      cell_size,
      cols,
      rows,
      cells: vec![None; cols * rows],
    }
  }

  #[inline]
  pub fn cell_size(&self) -> f32 {
    self.cell_size
  }

  #[inline]
  pub fn dimensions(&self) -> (usize, usize) {
    (self.cols, self.rows)
  }

  /// Grid coordinates of a point, clamped into the grid.
  #[inline]
  fn cell_of(&self, p: Vec2) -> (usize, usize) {
    let local = (p - self.origin) / self.cell_size;
    let cx = (local.x.max(0.0) as usize).min(self.cols - 1);
    let cy = (local.y.max(0.0) as usize).min(self.rows - 1);
    (cx, cy)
  }

  /// Record an accepted point.
  pub fn insert(&mut self, p: Vec2, index: u32) {
    let (cx, cy) = self.cell_of(p);
    self.cells[cy * self.cols + cx] = Some(index);
  }

  /// True when any stored point lies closer than `separation` to `p`.
  pub fn has_neighbor_within(&self, p: Vec2, separation: f32, points: &[Vec2]) -> bool {
    let (cx, cy) = self.cell_of(p);
    let (cx, cy) = (cx as isize, cy as isize);

    for dy in -SEARCH_RADIUS..=SEARCH_RADIUS {
      let y = cy + dy;
      if y < 0 || y >= self.rows as isize {
        continue;
      }
      for dx in -SEARCH_RADIUS..=SEARCH_RADIUS {
        let x = cx + dx;
        if x < 0 || x >= self.cols as isize {
          continue;
        }
        if let Some(index) = self.cells[y as usize * self.cols + x as usize] {
          if points[index as usize].distance(p) < separation {
            return true;
          }
        }
      }
    }
    false
  }
}
