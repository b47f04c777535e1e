//! CPU rasteriser implementing [`AtlasRenderTarget`].
//!
//! Flat-shaded, depth-tested, two-sided triangles into an `RgbaImage`.
//! Uncovered pixels stay fully transparent so the impostor shader can
//! discard them.

use glam::{Vec2, Vec3};
use image::{Rgba, RgbaImage};

use crate::atlas::builder::{AtlasRenderTarget, CellCamera};
use crate::atlas::layout::CellRegion;
use crate::atlas::mesh::ReferenceMesh;
use crate::error::{ImpostorError, ImpostorResult};

/// Largest attachment the CPU target accepts by default.
pub const DEFAULT_MAX_TARGET_SIZE: u32 = 8192;

const AMBIENT: f32 = 0.35;

pub struct SoftwareRenderer {
  max_target_size: u32,
  light_direction: Vec3,
  image: Option<RgbaImage>,
  depth: Vec<f32>,
}

impl Default for SoftwareRenderer {
  fn default() -> Self {
    Self::new(DEFAULT_MAX_TARGET_SIZE)
  }
}

impl SoftwareRenderer {
  pub fn new(max_target_size: u32) -> Self {
    Self {
      max_target_size,
      light_direction: Vec3::new(0.4, 1.0, 0.6).normalize(),
      image: None,
      depth: Vec::new(),
    }
  }

  /// Direction towards the light, world space.
  pub fn with_light_direction(mut self, direction: Vec3) -> Self {
    self.light_direction = direction.normalize_or_zero();
    self
  }

  fn shade(&self, mesh: &ReferenceMesh, tri: [usize; 3], world: [Vec3; 3]) -> Rgba<u8> {
    let normal = (world[1] - world[0]).cross(world[2] - world[0]).normalize_or_zero();
    let intensity = AMBIENT + (1.0 - AMBIENT) * normal.dot(self.light_direction).abs();

    let base = if mesh.colors().is_empty() {
      [255.0; 3]
    } else {
      let mut sum = [0.0f32; 3];
      for &v in &tri {
        let c = mesh.colors()[v];
        for (s, &channel) in sum.iter_mut().zip(&c[..3]) {
          *s += channel as f32;
        }
      }
      sum.map(|s| s / 3.0)
    };

    let [r, g, b] = base.map(|c| (c * intensity).round().clamp(0.0, 255.0) as u8);
    Rgba([r, g, b, 255])
  }
}

impl AtlasRenderTarget for SoftwareRenderer {
  type Texture = RgbaImage;

  fn max_target_size(&self) -> u32 {
    self.max_target_size
  }

  fn begin(&mut self, size: u32) -> ImpostorResult<()> {
    if size == 0 || size > self.max_target_size {
      return Err(ImpostorError::UnsupportedProfile {
        requested: size,
        max: self.max_target_size,
      });
    }
    self.image = Some(RgbaImage::new(size, size));
    self.depth.clear();
    self.depth.resize(size as usize * size as usize, f32::INFINITY);
    Ok(())
  }

  fn draw_cell(
    &mut self,
    mesh: &ReferenceMesh,
    camera: &CellCamera,
    region: CellRegion,
  ) -> ImpostorResult<()> {
    let Some(mut image) = self.image.take() else {
      return Err(ImpostorError::invalid("draw_cell called before begin"));
    };
    let atlas_width = image.width();
    let view_projection = camera.view_projection();
    let positions = mesh.positions();

    // NDC -> pixel coordinates inside the region, y down.
    let to_screen = |ndc: Vec3| -> Vec3 {
      Vec3::new(
        region.x as f32 + (ndc.x * 0.5 + 0.5) * region.width as f32,
        region.y as f32 + (0.5 - ndc.y * 0.5) * region.height as f32,
        ndc.z,
      )
    };

    for tri in mesh.triangles() {
      let world = tri.map(|i| positions[i]);
      let screen = world.map(|p| to_screen(view_projection.project_point3(p)));

      let area = edge(screen[0].truncate(), screen[1].truncate(), screen[2].truncate());
      if area.abs() <= f32::EPSILON {
        continue;
      }

      let color = self.shade(mesh, tri, world);

      let min = screen[0].min(screen[1]).min(screen[2]);
      let max = screen[0].max(screen[1]).max(screen[2]);
      let x0 = (min.x.floor().max(region.x as f32)) as u32;
      let y0 = (min.y.floor().max(region.y as f32)) as u32;
      let x1 = (max.x.ceil().min((region.x + region.width) as f32)) as u32;
      let y1 = (max.y.ceil().min((region.y + region.height) as f32)) as u32;

      for py in y0..y1 {
        for px in x0..x1 {
          let p = Vec2::new(px as f32 + 0.5, py as f32 + 0.5);
          let w0 = edge(screen[1].truncate(), screen[2].truncate(), p) / area;
          let w1 = edge(screen[2].truncate(), screen[0].truncate(), p) / area;
          let w2 = 1.0 - w0 - w1;
          if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
            continue;
          }

          let z = w0 * screen[0].z + w1 * screen[1].z + w2 * screen[2].z;
          if !(0.0..=1.0).contains(&z) {
            continue;
          }
          let slot = &mut self.depth[py as usize * atlas_width as usize + px as usize];
          if z < *slot {
            *slot = z;
            image.put_pixel(px, py, color);
          }
        }
      }
    }

    self.image = Some(image);
    Ok(())
  }

  fn finish(&mut self) -> ImpostorResult<RgbaImage> {
    self.depth.clear();
    self
      .image
      .take()
      .ok_or_else(|| ImpostorError::invalid("finish called before begin"))
  }
}

/// Twice the signed area of `(a, b, p)`.
#[inline]
fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
  (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

#[cfg(test)]
#[path = "software_test.rs"]
mod software_test;
