//! One-off bake of a reference model into an impostor atlas.

use std::path::Path;

use glam::{Mat4, Vec2, Vec3};
use image::RgbaImage;

use crate::atlas::layout::{AtlasCell, AtlasLayout, CellRegion};
use crate::atlas::mesh::ReferenceMesh;
use crate::config::EngineConfig;
use crate::error::{ImpostorError, ImpostorResult};

// =============================================================================
// Render target seam
// =============================================================================

/// Orthographic camera for one atlas cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellCamera {
  pub eye: Vec3,
  pub target: Vec3,
  /// Half of the visible width in world units.
  pub half_width: f32,
  /// Half of the visible height in world units.
  pub half_height: f32,
  pub near: f32,
  pub far: f32,
}

impl CellCamera {
  #[inline]
  pub fn view(&self) -> Mat4 {
    Mat4::look_at_rh(self.eye, self.target, Vec3::Y)
  }

  #[inline]
  pub fn projection(&self) -> Mat4 {
    Mat4::orthographic_rh(
      -self.half_width,
      self.half_width,
      -self.half_height,
      self.half_height,
      self.near,
      self.far,
    )
  }

  #[inline]
  pub fn view_projection(&self) -> Mat4 {
    self.projection() * self.view()
  }
}

/// Off-screen target that can draw a mesh into a sub-rectangle.
///
/// The host GPU renderer implements this for real frame buffers;
/// [`SoftwareRenderer`](super::SoftwareRenderer) implements it on the CPU.
pub trait AtlasRenderTarget {
  type Texture;

  /// Largest square attachment the target can allocate, in pixels.
  fn max_target_size(&self) -> u32;

  /// Allocate and clear a square attachment of `size` pixels.
  fn begin(&mut self, size: u32) -> ImpostorResult<()>;

  /// Draw `mesh` seen through `camera` into `region`.
  fn draw_cell(
    &mut self,
    mesh: &ReferenceMesh,
    camera: &CellCamera,
    region: CellRegion,
  ) -> ImpostorResult<()>;

  /// Hand over the finished attachment.
  fn finish(&mut self) -> ImpostorResult<Self::Texture>;
}

// =============================================================================
// ImpostorAtlas
// =============================================================================

/// Baked atlas texture and the layout needed to sample it.
#[derive(Clone, Debug)]
pub struct ImpostorAtlas<T> {
  texture: T,
  layout: AtlasLayout,
}

impl<T> ImpostorAtlas<T> {
  pub fn new(texture: T, layout: AtlasLayout) -> Self {
    Self { texture, layout }
  }

  #[inline]
  pub fn texture(&self) -> &T {
    &self.texture
  }

  #[inline]
  pub fn layout(&self) -> &AtlasLayout {
    &self.layout
  }

  /// Cell size in pixels.
  #[inline]
  pub fn region_size(&self) -> (u32, u32) {
    (self.layout.cell_width(), self.layout.cell_height())
  }

  /// Cell size in texture coordinates.
  #[inline]
  pub fn uv_size(&self) -> Vec2 {
    self.layout.uv_size()
  }

  /// Swap the texture representation, e.g. after uploading to the GPU.
  pub fn map_texture<U>(self, f: impl FnOnce(T) -> U) -> ImpostorAtlas<U> {
    ImpostorAtlas {
      texture: f(self.texture),
      layout: self.layout,
    }
  }

  pub fn into_parts(self) -> (T, AtlasLayout) {
    (self.texture, self.layout)
  }
}

impl ImpostorAtlas<RgbaImage> {
  /// Wrap a pre-baked image; it must match the layout's atlas size.
  pub fn from_image(image: RgbaImage, layout: AtlasLayout) -> ImpostorResult<Self> {
    let size = layout.atlas_size();
    if image.width() != size || image.height() != size {
      return Err(ImpostorError::invalid(format!(
        "atlas image is {}x{}, layout expects {size}x{size}",
        image.width(),
        image.height()
      )));
    }
    Ok(Self::new(image, layout))
  }

  /// Load a PNG written by [`save_png`](Self::save_png).
  pub fn load_png(path: &Path, layout: AtlasLayout) -> ImpostorResult<Self> {
    let image = image::open(path)?.to_rgba8();
    Self::from_image(image, layout)
  }

  pub fn save_png(&self, path: &Path) -> ImpostorResult<()> {
    self.texture.save_with_format(path, image::ImageFormat::Png)?;
    tracing::info!(path = %path.display(), "impostor atlas saved");
    Ok(())
  }
}

// =============================================================================
// AtlasBuilder
// =============================================================================

/// Renders a model from every (angle, elevation) cell of a layout.
#[derive(Clone, Copy, Debug)]
pub struct AtlasBuilder {
  num_angles: u32,
  max_elevation_degrees: f32,
}

impl Default for AtlasBuilder {
  fn default() -> Self {
    Self {
      num_angles: 16,
      max_elevation_degrees: 60.0,
    }
  }
}

impl AtlasBuilder {
  pub fn new(num_angles: u32, max_elevation_degrees: f32) -> Self {
    Self {
      num_angles,
      max_elevation_degrees,
    }
  }

  pub fn from_config(config: &EngineConfig) -> Self {
    Self::new(config.num_angles, config.max_elevation_degrees)
  }

  /// Layout the builder would use for `mesh` without rendering anything.
  pub fn layout_for(&self, mesh: &ReferenceMesh, atlas_size: u32) -> ImpostorResult<AtlasLayout> {
    let bounds = mesh
      .bounds()
      .ok_or_else(|| ImpostorError::invalid("reference model has no vertices"))?;
    AtlasLayout::for_bounds(atlas_size, self.num_angles, self.max_elevation_degrees, &bounds)
  }

  /// Camera that frames `mesh` for `cell`.
  pub fn camera_for(&self, layout: &AtlasLayout, mesh: &ReferenceMesh, cell: AtlasCell) -> CellCamera {
    let (center, horizontal_radius, radius) = match mesh.bounds() {
      Some(b) => (b.center(), b.horizontal_radius(), b.radius()),
      None => (Vec3::ZERO, 1.0, 1.0),
    };
    let distance = 2.0 * radius + 1.0;
    let half_width = horizontal_radius;
    let half_height = half_width * layout.cell_height() as f32 / layout.cell_width() as f32;

    CellCamera {
      eye: center + layout.capture_direction(cell) * distance,
      target: center,
      half_width,
      half_height,
      near: 0.5,
      far: distance + 2.0 * radius + 1.0,
    }
  }

  /// Bake every cell into a fresh `atlas_size` square attachment.
  ///
  /// Fails with `UnsupportedProfile` when the target cannot allocate the
  /// attachment; callers may retry with a smaller size.
  #[cfg_attr(feature = "spans", tracing::instrument(skip_all, name = "atlas::build"))]
  pub fn build<R: AtlasRenderTarget + ?Sized>(
    &self,
    target: &mut R,
    mesh: &ReferenceMesh,
    atlas_size: u32,
  ) -> ImpostorResult<ImpostorAtlas<R::Texture>> {
    let max = target.max_target_size();
    if atlas_size > max {
      return Err(ImpostorError::UnsupportedProfile {
        requested: atlas_size,
        max,
      });
    }

    let layout = self.layout_for(mesh, atlas_size)?;
    target.begin(atlas_size)?;
    for cell in layout.cells() {
      let camera = self.camera_for(&layout, mesh, cell);
      target.draw_cell(mesh, &camera, layout.region(cell))?;
    }
    let texture = target.finish()?;

    tracing::info!(
      atlas_size,
      cell_width = layout.cell_width(),
      cell_height = layout.cell_height(),
      angles = layout.num_angles(),
      elevation_steps = layout.elevation_steps(),
      "impostor atlas built"
    );
    Ok(ImpostorAtlas::new(texture, layout))
  }
}

#[cfg(test)]
#[path = "builder_test.rs"]
mod builder_test;
