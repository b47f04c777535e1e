//! Bevy resources for impostor LOD management.

use std::path::PathBuf;
use std::sync::Arc;

use bevy::prelude::*;
use impostor_plugin::{EngineConfig, FlatTerrain, HeightField, ImpostorEngine};

/// Everything the startup system needs to build the engine.
///
/// Insert before `Startup`; the LOD meshes and the reference mesh must
/// already be present in `Assets<Mesh>`.
#[derive(Resource, Clone)]
pub struct ImpostorSource {
  pub config: EngineConfig,
  /// One mesh per full-geometry LOD level, finest first.
  pub lod_meshes: Vec<Handle<Mesh>>,
  /// Model baked into the impostor atlas.
  pub reference_mesh: Handle<Mesh>,
  /// Terrain height used to lift the scattered points.
  pub height: Arc<dyn HeightField + Send + Sync>,
  /// Cached atlas. Loaded when the file exists, written after a bake
  /// otherwise.
  pub atlas_path: Option<PathBuf>,
}

impl ImpostorSource {
  pub fn new(config: EngineConfig, lod_meshes: Vec<Handle<Mesh>>, reference_mesh: Handle<Mesh>) -> Self {
    Self {
      config,
      lod_meshes,
      reference_mesh,
      height: Arc::new(FlatTerrain(0.0)),
      atlas_path: None,
    }
  }

  pub fn with_height(mut self, height: impl HeightField + Send + Sync + 'static) -> Self {
    self.height = Arc::new(height);
    self
  }

  pub fn with_atlas_path(mut self, path: impl Into<PathBuf>) -> Self {
    self.atlas_path = Some(path.into());
    self
  }
}

/// Running engine, keyed by Bevy asset handles.
#[derive(Resource)]
pub struct ImpostorState {
  pub engine: ImpostorEngine<Handle<Mesh>, Handle<Image>>,
}
