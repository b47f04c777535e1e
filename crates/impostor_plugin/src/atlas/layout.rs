//! Atlas cell geometry and view-direction lookup.
//!
//! ```text
//!        h = 0     1     2   ...  N-1
//! v = 0  +-----+-----+-----+     +-----+   elevation band [0, step)
//! v = 1  +-----+-----+-----+     +-----+   elevation band [step, 2*step)
//!  ...
//! v = E-1                                  elevation band up to max
//! ```
//!
//! Column `h` holds the view from azimuth `h * 360/N + 90` degrees, so
//! column 0 is the view from +Z. Directions passed to [`AtlasLayout::cell_for`]
//! point from the instance towards the viewer.

use glam::{Quat, Vec2, Vec3};

use crate::atlas::mesh::MeshBounds;
use crate::error::{ImpostorError, ImpostorResult};
use crate::placement::InstancePlacement;

/// Azimuth offset between a direction's `atan2(z, x)` and its column.
const AZIMUTH_OFFSET_DEGREES: f32 = 90.0;

/// One cell of the atlas grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct AtlasCell {
  /// Horizontal angle index in `[0, num_angles)`.
  pub horizontal: u32,
  /// Elevation band index in `[0, elevation_steps)`.
  pub vertical: u32,
}

impl AtlasCell {
  #[inline]
  pub const fn new(horizontal: u32, vertical: u32) -> Self {
    Self {
      horizontal,
      vertical,
    }
  }
}

/// Pixel rectangle inside the atlas, origin top-left.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellRegion {
  pub x: u32,
  pub y: u32,
  pub width: u32,
  pub height: u32,
}

/// Fixed grid of `num_angles × elevation_steps` cells in a square atlas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AtlasLayout {
  atlas_size: u32,
  num_angles: u32,
  cell_width: u32,
  cell_height: u32,
  elevation_steps: u32,
  max_elevation_degrees: f32,
}

impl AtlasLayout {
  /// Layout with an explicit cell height.
  pub fn new(
    atlas_size: u32,
    num_angles: u32,
    cell_height: u32,
    max_elevation_degrees: f32,
  ) -> ImpostorResult<Self> {
    if num_angles == 0 || atlas_size < num_angles {
      return Err(ImpostorError::invalid(format!(
        "atlas of {atlas_size} px cannot hold {num_angles} angles"
      )));
    }
    if cell_height == 0 || cell_height > atlas_size {
      return Err(ImpostorError::invalid(format!(
        "cell height {cell_height} outside 1..={atlas_size}"
      )));
    }
    if !(max_elevation_degrees > 0.0 && max_elevation_degrees <= 90.0) {
      return Err(ImpostorError::invalid(format!(
        "max elevation must be in (0, 90] degrees, got {max_elevation_degrees}"
      )));
    }

    Ok(Self {
      atlas_size,
      num_angles,
      cell_width: atlas_size / num_angles,
      cell_height,
      elevation_steps: atlas_size / cell_height,
      max_elevation_degrees,
    })
  }

  /// Layout whose cell aspect matches the projected bounds of a model, so
  /// the model fills each cell without distortion at every captured
  /// elevation.
  pub fn for_bounds(
    atlas_size: u32,
    num_angles: u32,
    max_elevation_degrees: f32,
    bounds: &MeshBounds,
  ) -> ImpostorResult<Self> {
    let radius = bounds.horizontal_radius();
    if !(radius > 0.0) || !radius.is_finite() {
      return Err(ImpostorError::invalid("reference model has no horizontal extent"));
    }
    let vertical = projected_height(radius, bounds.extent().y, max_elevation_degrees.to_radians());

    let cell_width = atlas_size / num_angles.max(1);
    let cell_height = (cell_width as f32 * vertical / (2.0 * radius)).round() as u32;
    Self::new(
      atlas_size,
      num_angles,
      cell_height.clamp(1, atlas_size.max(1)),
      max_elevation_degrees,
    )
  }

  #[inline]
  pub fn atlas_size(&self) -> u32 {
    self.atlas_size
  }

  #[inline]
  pub fn num_angles(&self) -> u32 {
    self.num_angles
  }

  #[inline]
  pub fn cell_width(&self) -> u32 {
    self.cell_width
  }

  #[inline]
  pub fn cell_height(&self) -> u32 {
    self.cell_height
  }

  #[inline]
  pub fn elevation_steps(&self) -> u32 {
    self.elevation_steps
  }

  #[inline]
  pub fn max_elevation_degrees(&self) -> f32 {
    self.max_elevation_degrees
  }

  /// Degrees covered by one elevation band.
  #[inline]
  pub fn elevation_step_degrees(&self) -> f32 {
    self.max_elevation_degrees / self.elevation_steps as f32
  }

  /// Degrees between neighbouring columns.
  #[inline]
  pub fn angle_step_degrees(&self) -> f32 {
    360.0 / self.num_angles as f32
  }

  #[inline]
  pub fn cell_count(&self) -> u32 {
    self.num_angles * self.elevation_steps
  }

  /// Row-major index of `cell`, the order of [`cells`](Self::cells).
  #[inline]
  pub fn cell_index(&self, cell: AtlasCell) -> u32 {
    cell.vertical * self.num_angles + cell.horizontal
  }

  /// Inverse of [`cell_index`](Self::cell_index).
  #[inline]
  pub fn cell_at(&self, index: u32) -> AtlasCell {
    AtlasCell::new(index % self.num_angles, index / self.num_angles)
  }

  /// Every cell, row by row.
  pub fn cells(&self) -> impl Iterator<Item = AtlasCell> + '_ {
    (0..self.elevation_steps)
      .flat_map(move |v| (0..self.num_angles).map(move |h| AtlasCell::new(h, v)))
  }

  /// Cell showing the model from `view_direction` (instance towards viewer).
  ///
  /// Always in range, also for vertical, zero and non-finite directions.
  pub fn cell_for(&self, view_direction: Vec3) -> AtlasCell {
    let d = view_direction;
    let horizontal_length = (d.x * d.x + d.z * d.z).sqrt();

    let azimuth = d.z.atan2(d.x).to_degrees();
    let normalized = (azimuth - AZIMUTH_OFFSET_DEGREES).rem_euclid(360.0);
    let horizontal = if normalized.is_finite() {
      ((self.num_angles as f32 * normalized / 360.0).floor() as u32).min(self.num_angles - 1)
    } else {
      0
    };

    let elevation = d.y.atan2(horizontal_length).to_degrees();
    let vertical = if elevation.is_finite() && elevation > 0.0 {
      ((elevation / self.elevation_step_degrees()).floor() as u32).min(self.elevation_steps - 1)
    } else {
      0
    };

    AtlasCell::new(horizontal, vertical)
  }

  /// Cell for one instance, accounting for its yaw.
  pub fn cell_for_instance(&self, instance: &InstancePlacement, viewer: Vec3) -> AtlasCell {
    let to_viewer = viewer - instance.position;
    self.cell_for(Quat::from_rotation_y(-instance.yaw) * to_viewer)
  }

  /// Unit direction (model towards camera) the builder captures `cell` from.
  pub fn capture_direction(&self, cell: AtlasCell) -> Vec3 {
    let azimuth =
      (cell.horizontal as f32 * self.angle_step_degrees() + AZIMUTH_OFFSET_DEGREES).to_radians();
    let elevation = (cell.vertical as f32 * self.elevation_step_degrees()).to_radians();
    Vec3::new(
      elevation.cos() * azimuth.cos(),
      elevation.sin(),
      elevation.cos() * azimuth.sin(),
    )
  }

  /// Pixel rectangle of `cell`.
  #[inline]
  pub fn region(&self, cell: AtlasCell) -> CellRegion {
    CellRegion {
      x: cell.horizontal * self.cell_width,
      y: cell.vertical * self.cell_height,
      width: self.cell_width,
      height: self.cell_height,
    }
  }

  /// Region size in texture coordinates.
  #[inline]
  pub fn uv_size(&self) -> Vec2 {
    Vec2::new(self.cell_width as f32, self.cell_height as f32) / self.atlas_size as f32
  }

  /// Top-left corner of `cell` in texture coordinates.
  #[inline]
  pub fn uv_offset(&self, cell: AtlasCell) -> Vec2 {
    let r = self.region(cell);
    Vec2::new(r.x as f32, r.y as f32) / self.atlas_size as f32
  }
}

/// Largest orthographic height of a `radius × height` cylinder viewed from
/// any elevation in `[0, max_elevation]`.
fn projected_height(radius: f32, height: f32, max_elevation: f32) -> f32 {
  // h*cos(e) + 2r*sin(e) peaks at e = atan(2r / h)
  let peak = (2.0 * radius).atan2(height.max(0.0)).min(max_elevation);
  height * peak.cos() + 2.0 * radius * peak.sin()
}

#[cfg(test)]
#[path = "layout_test.rs"]
mod layout_test;
