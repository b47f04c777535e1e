//! Triangle mesh handed to the atlas builder.

use glam::Vec3;

use crate::error::{ImpostorError, ImpostorResult};

/// Axis-aligned bounds of a mesh.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshBounds {
  pub min: Vec3,
  pub max: Vec3,
}

impl MeshBounds {
  #[inline]
  pub fn center(&self) -> Vec3 {
    (self.min + self.max) * 0.5
  }

  #[inline]
  pub fn extent(&self) -> Vec3 {
    self.max - self.min
  }

  /// Radius of the vertical cylinder around the centre that contains the
  /// mesh under any rotation about +Y.
  #[inline]
  pub fn horizontal_radius(&self) -> f32 {
    let e = self.extent();
    0.5 * (e.x * e.x + e.z * e.z).sqrt()
  }

  /// Radius of the bounding sphere around the centre.
  #[inline]
  pub fn radius(&self) -> f32 {
    0.5 * self.extent().length()
  }
}

/// Indexed triangle list with optional per-vertex colours.
#[derive(Clone, Debug, Default)]
pub struct ReferenceMesh {
  positions: Vec<Vec3>,
  indices: Vec<u32>,
  colors: Vec<[u8; 4]>,
}

impl ReferenceMesh {
  /// Validates that `indices` is a whole number of triangles and in range.
  pub fn new(positions: Vec<Vec3>, indices: Vec<u32>) -> ImpostorResult<Self> {
    if indices.len() % 3 != 0 {
      return Err(ImpostorError::invalid(format!(
        "index count {} is not a multiple of 3",
        indices.len()
      )));
    }
    if let Some(&bad) = indices.iter().find(|&&i| i as usize >= positions.len()) {
      return Err(ImpostorError::invalid(format!(
        "index {bad} out of range for {} vertices",
        positions.len()
      )));
    }
    Ok(Self {
      positions,
      indices,
      colors: Vec::new(),
    })
  }

  /// Attach one colour per vertex.
  pub fn with_colors(mut self, colors: Vec<[u8; 4]>) -> ImpostorResult<Self> {
    if colors.len() != self.positions.len() {
      return Err(ImpostorError::invalid(format!(
        "{} colours for {} vertices",
        colors.len(),
        self.positions.len()
      )));
    }
    self.colors = colors;
    Ok(self)
  }

  /// Axis-aligned box centred on `center`, twelve triangles.
  pub fn cuboid(center: Vec3, half_extents: Vec3, color: [u8; 4]) -> Self {
    let h = half_extents;
    let positions: Vec<Vec3> = (0..8)
      .map(|i| {
        let sx = if i & 1 == 0 { -1.0 } else { 1.0 };
        let sy = if i & 2 == 0 { -1.0 } else { 1.0 };
        let sz = if i & 4 == 0 { -1.0 } else { 1.0 };
        center + Vec3::new(sx * h.x, sy * h.y, sz * h.z)
      })
      .collect();
    #[rustfmt::skip]
    let indices = vec![
      0, 2, 1, 1, 2, 3, // -z
      4, 5, 6, 5, 7, 6, // +z
      0, 1, 4, 1, 5, 4, // -y
      2, 6, 3, 3, 6, 7, // +y
      0, 4, 2, 2, 4, 6, // -x
      1, 3, 5, 3, 7, 5, // +x
    ];
    Self {
      colors: vec![color; positions.len()],
      positions,
      indices,
    }
  }

  #[inline]
  pub fn positions(&self) -> &[Vec3] {
    &self.positions
  }

  #[inline]
  pub fn indices(&self) -> &[u32] {
    &self.indices
  }

  /// Per-vertex colours, empty when the mesh is uncoloured.
  #[inline]
  pub fn colors(&self) -> &[[u8; 4]] {
    &self.colors
  }

  #[inline]
  pub fn vertex_count(&self) -> u32 {
    self.positions.len() as u32
  }

  #[inline]
  pub fn triangle_count(&self) -> usize {
    self.indices.len() / 3
  }

  /// Iterate triangles as vertex index triples.
  pub fn triangles(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
    self
      .indices
      .chunks_exact(3)
      .map(|t| [t[0] as usize, t[1] as usize, t[2] as usize])
  }

  /// `None` for a mesh without vertices.
  pub fn bounds(&self) -> Option<MeshBounds> {
    let first = *self.positions.first()?;
    let (min, max) = self
      .positions
      .iter()
      .fold((first, first), |(min, max), &p| (min.min(p), max.max(p)));
    Some(MeshBounds { min, max })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rejects_partial_triangle() {
    let positions = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
    assert!(ReferenceMesh::new(positions, vec![0, 1]).is_err());
  }

  #[test]
  fn rejects_out_of_range_index() {
    let positions = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
    assert!(ReferenceMesh::new(positions, vec![0, 1, 3]).is_err());
  }

  #[test]
  fn color_count_must_match() {
    let mesh = ReferenceMesh::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![0, 1, 2]).unwrap();
    assert!(mesh.clone().with_colors(vec![[255; 4]; 2]).is_err());
    assert_eq!(mesh.with_colors(vec![[255; 4]; 3]).unwrap().colors().len(), 3);
  }

  #[test]
  fn cuboid_bounds() {
    let mesh = ReferenceMesh::cuboid(Vec3::new(0.0, 2.0, 0.0), Vec3::new(3.0, 2.0, 4.0), [255; 4]);
    assert_eq!(mesh.vertex_count(), 8);
    assert_eq!(mesh.triangle_count(), 12);

    let bounds = mesh.bounds().unwrap();
    assert_eq!(bounds.min, Vec3::new(-3.0, 0.0, -4.0));
    assert_eq!(bounds.max, Vec3::new(3.0, 4.0, 4.0));
    assert_eq!(bounds.center(), Vec3::new(0.0, 2.0, 0.0));
    // half of hypot(6, 8)
    assert_eq!(bounds.horizontal_radius(), 5.0);
  }

  #[test]
  fn empty_mesh_has_no_bounds() {
    assert!(ReferenceMesh::default().bounds().is_none());
  }
}
