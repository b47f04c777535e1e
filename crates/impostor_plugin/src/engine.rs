//! ImpostorEngine - per-frame orchestration of allocator, buffers and
//! controller, plus submission to a host renderer.
//!
//! # Frame
//!
//! ```text
//! update(viewer, forward, dt)
//!   controller.tick        -> may shrink thresholds (revision += 1)
//!   cadence / revision     -> reallocate(viewer, force)
//!   Reallocated            -> rebuild every tier's TransformBuffer
//!                             and the per-instance impostor cells
//! submit(renderer)
//!   LOD tiers              -> add_instanced_geometry
//!   impostor tier          -> add_impostor_batch
//! ```

use glam::{Vec2, Vec3};
use web_time::Instant;

use crate::atlas::{AtlasCell, AtlasLayout, ImpostorAtlas};
use crate::config::{EngineConfig, ImpostorSelection};
use crate::controller::{AdaptiveDetailController, Evaluation};
use crate::distribution;
use crate::error::{ImpostorError, ImpostorResult};
use crate::instancing::{PayloadKind, TransformBuffer};
use crate::lod::{DetailSettings, DetailTier, DistanceThresholds, LodAllocator, Reallocation, TierStats};
use crate::metrics::EngineMetrics;
use crate::placement::{place, HeightField, InstancePlacement};

/// Vertices of the impostor quad, reported in the impostor tier's stats.
pub const IMPOSTOR_VERTEX_COUNT: u32 = 4;

// =============================================================================
// Renderer seam
// =============================================================================

/// Impostor tier submission.
pub struct ImpostorBatch<'a, T> {
  pub atlas: &'a ImpostorAtlas<T>,
  /// Batch-wide cell, from the camera direction (or the first cell in
  /// fixed mode).
  pub cell: AtlasCell,
  /// `(x, y, z, yaw)` per instance.
  pub buffer: &'a TransformBuffer,
  /// Row-major cell index per instance, in `buffer` order. `None` unless
  /// selection is per instance.
  pub cells: Option<&'a [u32]>,
}

impl<T> ImpostorBatch<'_, T> {
  #[inline]
  pub fn layout(&self) -> &AtlasLayout {
    self.atlas.layout()
  }

  /// Cell the `index`-th impostor is drawn with.
  pub fn instance_cell(&self, index: usize) -> AtlasCell {
    match self.cells.and_then(|cells| cells.get(index)) {
      Some(&packed) => self.layout().cell_at(packed),
      None => self.cell,
    }
  }

  #[inline]
  pub fn num_angles(&self) -> u32 {
    self.layout().num_angles()
  }

  #[inline]
  pub fn elevation_steps(&self) -> u32 {
    self.layout().elevation_steps()
  }

  #[inline]
  pub fn elevation_step_degrees(&self) -> f32 {
    self.layout().elevation_step_degrees()
  }

  #[inline]
  pub fn uv_offset(&self) -> Vec2 {
    self.layout().uv_offset(self.cell)
  }

  #[inline]
  pub fn uv_size(&self) -> Vec2 {
    self.atlas.uv_size()
  }
}

/// Host renderer receiving per-frame submissions.
///
/// Buffers passed in always hold exactly the tier's current bucket.
pub trait InstanceRenderer {
  type Mesh;
  type Texture;

  fn add_instanced_geometry(&mut self, tier: DetailTier, mesh: &Self::Mesh, buffer: &TransformBuffer);

  fn add_impostor_batch(&mut self, batch: ImpostorBatch<'_, Self::Texture>);
}

/// Representative mesh of a full-geometry tier.
#[derive(Clone, Debug)]
pub struct TierMesh<M> {
  pub handle: M,
  pub vertex_count: u32,
}

impl<M> TierMesh<M> {
  pub fn new(handle: M, vertex_count: u32) -> Self {
    Self {
      handle,
      vertex_count,
    }
  }
}

// =============================================================================
// DisplayMode
// =============================================================================

/// Which tiers are submitted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DisplayMode {
  /// Every tier.
  #[default]
  Mixed,
  /// A single tier, for inspecting one LOD.
  Only(DetailTier),
}

impl DisplayMode {
  /// Mixed -> Only(0) -> ... -> Only(tier_count - 1) -> Mixed.
  pub fn next(self, tier_count: usize) -> Self {
    match self {
      DisplayMode::Mixed if tier_count > 0 => DisplayMode::Only(0),
      DisplayMode::Only(tier) if tier + 1 < tier_count => DisplayMode::Only(tier + 1),
      _ => DisplayMode::Mixed,
    }
  }

  #[inline]
  pub fn includes(self, tier: DetailTier) -> bool {
    match self {
      DisplayMode::Mixed => true,
      DisplayMode::Only(only) => only == tier,
    }
  }
}

// =============================================================================
// Engine
// =============================================================================

/// What happened during one `update`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameReport {
  pub evaluation: Option<Evaluation>,
  /// `None` when the cadence did not run the allocator this frame.
  pub reallocation: Option<Reallocation>,
}

/// Distribute and place instances as described by `config`.
pub fn scatter_instances<H: HeightField + ?Sized>(
  config: &EngineConfig,
  height: &H,
) -> ImpostorResult<Vec<InstancePlacement>> {
  let area = config.area();
  let points = distribution::generate(config.min_separation, &area, config.random_seed)?;
  Ok(place(&points, &area, height, config.random_seed))
}

/// Owns the instance set and every per-frame component.
///
/// `M` is the host's mesh handle, `T` its texture type.
pub struct ImpostorEngine<M, T> {
  config: EngineConfig,
  settings: DetailSettings,
  allocator: LodAllocator,
  buffers: Vec<TransformBuffer>,
  controller: AdaptiveDetailController,
  atlas: ImpostorAtlas<T>,
  meshes: Vec<TierMesh<M>>,
  display: DisplayMode,
  view_cell: AtlasCell,
  instance_cells: Vec<u32>,
  since_reallocation: f32,
  seen_revision: u64,
  force_pending: bool,
  metrics: EngineMetrics,
}

impl<M, T> ImpostorEngine<M, T> {
  /// `meshes` holds one entry per full-geometry LOD level, finest first.
  pub fn new(
    config: EngineConfig,
    instances: Vec<InstancePlacement>,
    meshes: Vec<TierMesh<M>>,
    atlas: ImpostorAtlas<T>,
  ) -> ImpostorResult<Self> {
    config.validate()?;
    if meshes.len() != config.lod_levels {
      return Err(ImpostorError::invalid(format!(
        "{} LOD meshes for {} LOD levels",
        meshes.len(),
        config.lod_levels
      )));
    }

    let vertex_counts: Vec<u32> = meshes
      .iter()
      .map(|m| m.vertex_count)
      .chain(std::iter::once(IMPOSTOR_VERTEX_COUNT))
      .collect();
    let capacity = instances.len();
    let mut allocator = LodAllocator::new(instances, &vertex_counts)?;
    allocator.set_skip_when_still(config.skip_when_still);

    let impostor_tier = allocator.impostor_tier();
    let buffers = (0..allocator.tier_count())
      .map(|tier| {
        let kind = if tier == impostor_tier {
          PayloadKind::PositionYaw
        } else {
          PayloadKind::Transform
        };
        TransformBuffer::new(tier, kind, capacity)
      })
      .collect();

    let settings = DetailSettings::new(config.thresholds()?, config.dynamic_lod_adjustment);
    let controller = AdaptiveDetailController::new(config.controller.clone());

    tracing::info!(
      instances = capacity,
      tiers = allocator.tier_count(),
      "impostor engine ready"
    );

    Ok(Self {
      seen_revision: settings.revision(),
      config,
      settings,
      allocator,
      buffers,
      controller,
      atlas,
      meshes,
      display: DisplayMode::Mixed,
      view_cell: AtlasCell::default(),
      instance_cells: Vec::with_capacity(capacity),
      since_reallocation: 0.0,
      force_pending: true,
      metrics: EngineMetrics::new(),
    })
  }

  // ---------------------------------------------------------------------------
  // Accessors
  // ---------------------------------------------------------------------------

  #[inline]
  pub fn config(&self) -> &EngineConfig {
    &self.config
  }

  #[inline]
  pub fn settings(&self) -> &DetailSettings {
    &self.settings
  }

  #[inline]
  pub fn allocator(&self) -> &LodAllocator {
    &self.allocator
  }

  #[inline]
  pub fn controller(&self) -> &AdaptiveDetailController {
    &self.controller
  }

  #[inline]
  pub fn atlas(&self) -> &ImpostorAtlas<T> {
    &self.atlas
  }

  #[inline]
  pub fn buffer(&self, tier: DetailTier) -> &TransformBuffer {
    &self.buffers[tier]
  }

  #[inline]
  pub fn tier_count(&self) -> usize {
    self.allocator.tier_count()
  }

  #[inline]
  pub fn instance_count(&self) -> usize {
    self.allocator.instance_count()
  }

  /// Per-tier `(instance_count, vertex_count)` from the last pass.
  #[inline]
  pub fn stats(&self) -> &[TierStats] {
    self.allocator.stats()
  }

  #[inline]
  pub fn display_mode(&self) -> DisplayMode {
    self.display
  }

  /// Batch-wide atlas cell from the last update.
  #[inline]
  pub fn impostor_cell(&self) -> AtlasCell {
    self.view_cell
  }

  /// Packed per-instance cells of the impostor bucket; empty unless
  /// selection is per instance.
  #[inline]
  pub fn instance_cells(&self) -> &[u32] {
    &self.instance_cells
  }

  #[inline]
  pub fn metrics(&self) -> &EngineMetrics {
    &self.metrics
  }

  // ---------------------------------------------------------------------------
  // Operator controls
  // ---------------------------------------------------------------------------

  /// Scale every LOD distance; stops the controller.
  pub fn scale_lod_distances(&mut self, factor: f32) -> ImpostorResult<()> {
    self.settings.scale_manual(factor)
  }

  /// Replace the LOD distances; stops the controller.
  pub fn override_lod_distances(&mut self, thresholds: DistanceThresholds) -> ImpostorResult<()> {
    if thresholds.len() != self.config.lod_levels {
      return Err(ImpostorError::invalid(format!(
        "{} distances for {} LOD levels",
        thresholds.len(),
        self.config.lod_levels
      )));
    }
    self.settings.override_thresholds(thresholds);
    Ok(())
  }

  /// Enable or disable the frame-rate controller. Enabling starts a fresh
  /// sample window.
  pub fn set_dynamic_adjustment(&mut self, enabled: bool) {
    if enabled && !self.settings.dynamic_adjustment() {
      self.controller.reset();
    }
    self.settings.set_dynamic_adjustment(enabled);
  }

  pub fn set_display_mode(&mut self, mode: DisplayMode) {
    self.display = mode;
  }

  pub fn cycle_display_mode(&mut self) -> DisplayMode {
    self.display = self.display.next(self.tier_count());
    tracing::info!(mode = ?self.display, "display mode");
    self.display
  }

  /// Recompute on the next update even if the viewer is still.
  pub fn request_reallocation(&mut self) {
    self.force_pending = true;
  }

  // ---------------------------------------------------------------------------
  // Frame
  // ---------------------------------------------------------------------------

  /// Advance one frame.
  ///
  /// `viewer` is the reference point for tier distances, `view_forward` the
  /// camera's look direction used for per-view impostor cell selection.
  /// A negative or non-finite `delta_time` is ignored for the controller and
  /// the cadence.
  #[cfg_attr(feature = "spans", tracing::instrument(skip_all, name = "engine::update"))]
  pub fn update(&mut self, viewer: Vec3, view_forward: Vec3, delta_time: f32) -> ImpostorResult<FrameReport> {
    let mut report = FrameReport::default();
    let delta_time = if delta_time.is_finite() && delta_time >= 0.0 {
      Some(delta_time)
    } else {
      tracing::debug!(delta_time, "ignoring invalid frame time");
      None
    };

    report.evaluation = delta_time.and_then(|dt| {
      self
        .controller
        .tick(dt, self.config.target_frame_rate, &mut self.settings)
    });
    if let Some(evaluation) = &report.evaluation {
      self.metrics.record_evaluation(evaluation);
    }

    if self.settings.revision() != self.seen_revision {
      self.seen_revision = self.settings.revision();
      self.force_pending = true;
    }

    self.since_reallocation += delta_time.unwrap_or(0.0);
    if self.force_pending || self.since_reallocation >= self.config.reallocation_interval {
      let force = std::mem::take(&mut self.force_pending);
      self.since_reallocation = 0.0;
      report.reallocation = Some(self.reallocate(viewer, force)?);
    }

    self.view_cell = match self.config.impostor_selection {
      ImpostorSelection::Fixed => AtlasCell::default(),
      // Instances in view face the camera along -forward.
      ImpostorSelection::PerView | ImpostorSelection::PerInstance => {
        self.atlas.layout().cell_for(-view_forward)
      }
    };

    Ok(report)
  }

  fn reallocate(&mut self, viewer: Vec3, force: bool) -> ImpostorResult<Reallocation> {
    let start = Instant::now();
    let result = self
      .allocator
      .reallocate(viewer, force, self.settings.thresholds())?;
    if !result.changed() {
      self.metrics.record_skip();
      return Ok(result);
    }
    let allocation_us = start.elapsed().as_micros() as u64;

    let start = Instant::now();
    for (tier, buffer) in self.buffers.iter_mut().enumerate() {
      buffer.rebuild(self.allocator.bucket(tier))?;
    }
    if self.config.impostor_selection == ImpostorSelection::PerInstance {
      let layout = self.atlas.layout();
      let bucket = self.allocator.bucket(self.allocator.impostor_tier());
      self.instance_cells.clear();
      self.instance_cells.extend(
        bucket
          .iter()
          .map(|instance| layout.cell_index(layout.cell_for_instance(instance, viewer))),
      );
    }
    self.metrics.record_rebuild(start.elapsed().as_micros() as u64);
    self.metrics.record_reallocation(allocation_us, self.allocator.stats());

    Ok(result)
  }

  /// Forward the current buffers of every displayed, non-empty tier.
  pub fn submit<R>(&self, renderer: &mut R)
  where
    R: InstanceRenderer<Mesh = M, Texture = T> + ?Sized,
  {
    let impostor_tier = self.allocator.impostor_tier();
    for (tier, mesh) in self.meshes.iter().enumerate() {
      let buffer = &self.buffers[tier];
      if self.display.includes(tier) && !buffer.is_empty() {
        renderer.add_instanced_geometry(tier, &mesh.handle, buffer);
      }
    }

    let buffer = &self.buffers[impostor_tier];
    if self.display.includes(impostor_tier) && !buffer.is_empty() {
      renderer.add_impostor_batch(ImpostorBatch {
        atlas: &self.atlas,
        cell: self.view_cell,
        buffer,
        cells: (self.config.impostor_selection == ImpostorSelection::PerInstance)
          .then_some(self.instance_cells.as_slice()),
      });
    }
  }
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;
