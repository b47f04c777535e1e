//! impostor_plugin - Engine independent LOD bucketing and impostor atlases
//!
//! Scatters a large number of copies of one model over terrain and keeps
//! them cheap to draw: nearby instances use full geometry at a few detail
//! levels, distant ones a camera-facing quad textured from a baked atlas.
//!
//! # Features
//!
//! - **Poisson-disc distribution**: Bridson sampling with a background grid,
//!   deterministic for a given seed
//! - **Distance bucketing**: one linear pass per reallocation, skipped while
//!   the viewer is still
//! - **Impostor atlas**: views from a grid of angles and elevations, with an
//!   O(1) view-direction lookup
//! - **Adaptive detail**: frame-rate controller that shrinks LOD distances
//!   to hold a target frame rate
//!
//! # Example
//!
//! ```ignore
//! use impostor_plugin::{
//!   scatter_instances, AtlasBuilder, EngineConfig, FlatTerrain, ImpostorEngine,
//!   SoftwareRenderer, TierMesh,
//! };
//!
//! let config = EngineConfig::default();
//! let instances = scatter_instances(&config, &FlatTerrain(0.0))?;
//! let atlas = AtlasBuilder::from_config(&config)
//!   .build(&mut SoftwareRenderer::default(), &reference_mesh, config.atlas_size)?;
//!
//! let mut engine = ImpostorEngine::new(config, instances, lod_meshes, atlas)?;
//! // every frame
//! engine.update(camera_position, camera_forward, dt)?;
//! engine.submit(&mut renderer);
//! ```

pub mod error;
pub use error::{ImpostorError, ImpostorResult};

pub mod config;
pub use config::{ControllerConfig, EngineConfig, ImpostorSelection};

// Point generation and placement
pub mod distribution;
pub use distribution::{Point2D, Rect};

pub mod placement;
pub use placement::{FlatTerrain, HeightField, InstancePlacement};

// Detail tiers
pub mod lod;
pub use lod::{DetailSettings, DetailTier, DistanceThresholds, LodAllocator, Reallocation, TierStats};

pub mod instancing;
pub use instancing::{PayloadKind, TransformBuffer};

pub mod controller;
pub use controller::{AdaptiveDetailController, Evaluation};

// Impostor atlas baking and lookup
pub mod atlas;
pub use atlas::{
  AtlasBuilder, AtlasCell, AtlasLayout, AtlasRenderTarget, ImpostorAtlas, ReferenceMesh,
  SoftwareRenderer,
};

pub mod metrics;

// Per-frame orchestration
pub mod engine;
pub use engine::{
  scatter_instances, DisplayMode, FrameReport, ImpostorBatch, ImpostorEngine, InstanceRenderer,
  TierMesh,
};
