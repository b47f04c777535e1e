//! Conversions between Bevy assets and impostor_plugin types.

use bevy::asset::RenderAssetUsages;
use bevy::mesh::VertexAttributeValues;
use bevy::prelude::*;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use image::RgbaImage;
use impostor_plugin::{ImpostorError, ImpostorResult, ReferenceMesh};

/// Copy positions, indices and vertex colours out of a Bevy mesh.
///
/// Non-indexed meshes are read as a plain triangle list.
pub fn reference_mesh_from_bevy(mesh: &Mesh) -> ImpostorResult<ReferenceMesh> {
  let positions: Vec<Vec3> = match mesh.attribute(Mesh::ATTRIBUTE_POSITION) {
    Some(VertexAttributeValues::Float32x3(values)) => values.iter().map(|&p| Vec3::from(p)).collect(),
    Some(_) => return Err(ImpostorError::invalid("mesh positions are not Float32x3")),
    None => return Err(ImpostorError::invalid("mesh has no positions")),
  };

  let indices: Vec<u32> = match mesh.indices() {
    Some(indices) => indices.iter().map(|i| i as u32).collect(),
    None => (0..positions.len() as u32).collect(),
  };

  let colors: Option<Vec<[u8; 4]>> = match mesh.attribute(Mesh::ATTRIBUTE_COLOR) {
    Some(VertexAttributeValues::Float32x4(values)) => {
      Some(values.iter().map(|c| c.map(unit_to_byte)).collect())
    }
    Some(VertexAttributeValues::Unorm8x4(values)) => Some(values.clone()),
    _ => None,
  };

  let reference = ReferenceMesh::new(positions, indices)?;
  match colors {
    Some(colors) => reference.with_colors(colors),
    None => Ok(reference),
  }
}

#[inline]
fn unit_to_byte(v: f32) -> u8 {
  (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Wrap a baked atlas as a Bevy sRGB texture.
pub fn atlas_image_to_bevy(atlas: RgbaImage) -> Image {
  let (width, height) = atlas.dimensions();
  Image::new(
    Extent3d {
      width,
      height,
      depth_or_array_layers: 1,
    },
    TextureDimension::D2,
    atlas.into_raw(),
    TextureFormat::Rgba8UnormSrgb,
    RenderAssetUsages::default(),
  )
}

#[cfg(test)]
mod tests {
  use bevy::mesh::{Indices, PrimitiveTopology};

  use super::*;

  fn triangle_mesh() -> Mesh {
    let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default());
    mesh.insert_attribute(
      Mesh::ATTRIBUTE_POSITION,
      vec![[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 2.0, 0.0]],
    );
    mesh
  }

  #[test]
  fn test_indexed_mesh() {
    let mut mesh = triangle_mesh();
    mesh.insert_indices(Indices::U16(vec![0, 2, 1]));

    let reference = reference_mesh_from_bevy(&mesh).unwrap();
    assert_eq!(reference.vertex_count(), 3);
    assert_eq!(reference.indices(), &[0, 2, 1]);
    assert_eq!(reference.positions()[2], Vec3::new(0.0, 2.0, 0.0));
    assert!(reference.colors().is_empty());
  }

  #[test]
  fn test_non_indexed_mesh() {
    let reference = reference_mesh_from_bevy(&triangle_mesh()).unwrap();
    assert_eq!(reference.indices(), &[0, 1, 2]);
  }

  #[test]
  fn test_vertex_colors() {
    let mut mesh = triangle_mesh();
    mesh.insert_attribute(
      Mesh::ATTRIBUTE_COLOR,
      vec![[1.0f32, 0.0, 0.0, 1.0], [0.0, 1.0, 0.0, 1.0], [0.0, 0.0, 2.0, 1.0]],
    );

    let reference = reference_mesh_from_bevy(&mesh).unwrap();
    assert_eq!(reference.colors()[0], [255, 0, 0, 255]);
    assert_eq!(reference.colors()[2], [0, 0, 255, 255]);
  }

  #[test]
  fn test_missing_positions() {
    let mesh = Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default());
    assert!(reference_mesh_from_bevy(&mesh).is_err());
  }

  #[test]
  fn test_atlas_upload() {
    let image = atlas_image_to_bevy(RgbaImage::new(4, 2));
    assert_eq!(image.width(), 4);
    assert_eq!(image.height(), 2);
    assert_eq!(image.texture_descriptor.format, TextureFormat::Rgba8UnormSrgb);
    assert_eq!(image.data.as_ref().map(|d| d.len()), Some(32));
  }
}
