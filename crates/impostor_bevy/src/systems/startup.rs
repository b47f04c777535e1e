//! Startup system: scatter instances, bake or load the atlas, build the engine.

use bevy::prelude::*;
use impostor_plugin::{
  scatter_instances, AtlasBuilder, ImpostorAtlas, ImpostorEngine, ImpostorError, ImpostorResult,
  SoftwareRenderer, TierMesh,
};

use crate::conversion::{atlas_image_to_bevy, reference_mesh_from_bevy};
use crate::resources::{ImpostorSource, ImpostorState};

/// Startup system: build [`ImpostorState`] from [`ImpostorSource`].
pub fn setup_impostor_engine(
  mut commands: Commands,
  source: Option<Res<ImpostorSource>>,
  meshes: Res<Assets<Mesh>>,
  mut images: ResMut<Assets<Image>>,
) {
  let Some(source) = source else {
    warn!("No ImpostorSource inserted, impostor engine disabled");
    return;
  };

  info!("Setting up impostor engine...");
  match build_engine(&source, &meshes, &mut images) {
    Ok(state) => {
      info!(
        "Impostor engine ready: {} instances over {} tiers",
        state.engine.instance_count(),
        state.engine.tier_count()
      );
      commands.insert_resource(state);
    }
    Err(err) => error!("Impostor engine setup failed: {err}"),
  }
}

fn mesh<'a>(meshes: &'a Assets<Mesh>, handle: &Handle<Mesh>) -> ImpostorResult<&'a Mesh> {
  meshes
    .get(handle)
    .ok_or_else(|| ImpostorError::invalid(format!("mesh {handle:?} is not loaded")))
}

/// Assemble the engine from loaded assets.
pub fn build_engine(
  source: &ImpostorSource,
  meshes: &Assets<Mesh>,
  images: &mut Assets<Image>,
) -> ImpostorResult<ImpostorState> {
  let config = source.config.clone();
  config.validate()?;

  let mut tier_meshes = Vec::with_capacity(source.lod_meshes.len());
  for handle in &source.lod_meshes {
    let vertex_count = mesh(meshes, handle)?.count_vertices() as u32;
    tier_meshes.push(TierMesh::new(handle.clone(), vertex_count));
  }

  let reference = reference_mesh_from_bevy(mesh(meshes, &source.reference_mesh)?)?;
  let builder = AtlasBuilder::from_config(&config);

  let atlas = match &source.atlas_path {
    Some(path) if path.exists() => {
      let layout = builder.layout_for(&reference, config.atlas_size)?;
      info!("Loading impostor atlas from {}", path.display());
      ImpostorAtlas::load_png(path, layout)?
    }
    path => {
      let atlas = builder.build(&mut SoftwareRenderer::default(), &reference, config.atlas_size)?;
      if let Some(path) = path {
        atlas.save_png(path)?;
      }
      atlas
    }
  };
  let atlas = atlas.map_texture(|image| images.add(atlas_image_to_bevy(image)));

  let instances = scatter_instances(&config, source.height.as_ref())?;
  let engine = ImpostorEngine::new(config, instances, tier_meshes, atlas)?;
  Ok(ImpostorState { engine })
}
