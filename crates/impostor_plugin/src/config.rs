//! EngineConfig - flat key/value configuration for the scatter and LOD engine.
//!
//! Loaded from TOML. Every key is optional and falls back to the defaults
//! below, so an empty file yields the stock "Duck Land" scene:
//!
//! ```toml
//! lod_levels = 3
//! lod_distances = [60.0, 120.0, 240.0]
//! dynamic_lod_adjustment = true
//! min_separation = 20.0
//! area_extent = 9000.0
//! random_seed = 1234
//!
//! [controller]
//! degrade_factor = 0.7
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::distribution::Rect;
use crate::error::{ImpostorError, ImpostorResult};
use crate::lod::DistanceThresholds;

/// How impostors pick their atlas cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpostorSelection {
  /// Every impostor gets its own cell from its yaw and its direction to the
  /// viewer, refreshed on each reallocation.
  #[default]
  PerInstance,
  /// One cell for the whole batch, chosen from the camera direction.
  PerView,
  /// Always the first cell (front view, lowest elevation band).
  Fixed,
}

/// Frame-rate controller tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
  /// Sample window in seconds while the target has not been met.
  pub initial_window: f32,
  /// Sample window in seconds once the target frame rate is achieved.
  pub max_window: f32,
  /// Factor applied to every threshold when the frame rate is too low.
  pub degrade_factor: f32,
}

impl Default for ControllerConfig {
  fn default() -> Self {
    Self {
      initial_window: 1.0,
      max_window: 10.0,
      degrade_factor: 0.7,
    }
  }
}

/// Engine configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
  /// Number of full-geometry LOD levels. Tier count is `lod_levels + 1`.
  pub lod_levels: usize,
  /// Distance thresholds, one per LOD level, ascending.
  pub lod_distances: Vec<f32>,
  /// Let the frame-rate controller shrink the thresholds.
  pub dynamic_lod_adjustment: bool,
  /// Frame rate the controller tries to keep.
  pub target_frame_rate: f32,
  /// Minimum distance between any two instances.
  pub min_separation: f32,
  /// Side length of the square scatter area, centred on the world origin.
  pub area_extent: f32,
  /// Seed for both the distribution and the instance rotations.
  pub random_seed: u64,
  /// Side length in pixels of the square impostor atlas.
  pub atlas_size: u32,
  /// Number of horizontal viewing angles baked into the atlas.
  pub num_angles: u32,
  /// Highest elevation angle covered by the atlas bands, in degrees.
  pub max_elevation_degrees: f32,
  /// Seconds between allocator evaluations.
  pub reallocation_interval: f32,
  /// Skip reallocation while the viewer has not moved.
  /// Disable when profiling so every evaluation does the full pass.
  pub skip_when_still: bool,
  /// Impostor cell selection mode.
  pub impostor_selection: ImpostorSelection,
  /// Frame-rate controller tuning.
  pub controller: ControllerConfig,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      lod_levels: 3,
      lod_distances: vec![60.0, 120.0, 240.0],
      dynamic_lod_adjustment: false,
      target_frame_rate: 60.0,
      min_separation: 20.0,
      area_extent: 9000.0,
      random_seed: 1234,
      atlas_size: 2048,
      num_angles: 16,
      max_elevation_degrees: 60.0,
      reallocation_interval: 0.1,
      skip_when_still: true,
      impostor_selection: ImpostorSelection::PerInstance,
      controller: ControllerConfig::default(),
    }
  }
}

impl EngineConfig {
  /// Load and validate a configuration from a TOML file.
  pub fn load(path: &Path) -> ImpostorResult<Self> {
    let content = std::fs::read_to_string(path)?;
    Self::from_toml_str(&content)
  }

  /// Parse and validate a configuration from TOML text.
  pub fn from_toml_str(content: &str) -> ImpostorResult<Self> {
    let config: EngineConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
  }

  /// Total number of detail tiers, impostor tier included.
  #[inline]
  pub fn tier_count(&self) -> usize {
    self.lod_levels + 1
  }

  /// Scatter area in area-local coordinates.
  #[inline]
  pub fn area(&self) -> Rect {
    Rect::new(0.0, 0.0, self.area_extent, self.area_extent)
  }

  /// Initial thresholds built from `lod_distances`.
  pub fn thresholds(&self) -> ImpostorResult<DistanceThresholds> {
    DistanceThresholds::new(self.lod_distances.clone())
  }

  /// Check every value for consistency.
  pub fn validate(&self) -> ImpostorResult<()> {
    if self.lod_levels == 0 {
      return Err(ImpostorError::invalid("lod_levels must be at least 1"));
    }
    if self.lod_distances.len() != self.lod_levels {
      return Err(ImpostorError::invalid(format!(
        "lod_distances has {} entries, lod_levels is {}",
        self.lod_distances.len(),
        self.lod_levels
      )));
    }
    self.thresholds()?;

    if !(self.min_separation > 0.0) {
      return Err(ImpostorError::invalid(format!(
        "min_separation must be positive, got {}",
        self.min_separation
      )));
    }
    if !(self.area_extent > 0.0) {
      return Err(ImpostorError::invalid(format!(
        "area_extent must be positive, got {}",
        self.area_extent
      )));
    }
    if self.num_angles == 0 || self.atlas_size < self.num_angles {
      return Err(ImpostorError::invalid(format!(
        "atlas_size {} cannot hold {} angles",
        self.atlas_size, self.num_angles
      )));
    }
    if !(self.max_elevation_degrees > 0.0 && self.max_elevation_degrees <= 90.0) {
      return Err(ImpostorError::invalid(format!(
        "max_elevation_degrees must be in (0, 90], got {}",
        self.max_elevation_degrees
      )));
    }
    if !(self.target_frame_rate > 0.0) {
      return Err(ImpostorError::invalid("target_frame_rate must be positive"));
    }
    if !(self.reallocation_interval >= 0.0) {
      return Err(ImpostorError::invalid("reallocation_interval must not be negative"));
    }

    let c = &self.controller;
    if !(c.degrade_factor > 0.0 && c.degrade_factor < 1.0) {
      return Err(ImpostorError::invalid(format!(
        "controller.degrade_factor must be in (0, 1), got {}",
        c.degrade_factor
      )));
    }
    if !(c.initial_window > 0.0) || c.max_window < c.initial_window {
      return Err(ImpostorError::invalid(format!(
        "controller windows must satisfy 0 < initial ({}) <= max ({})",
        c.initial_window, c.max_window
      )));
    }

    Ok(())
  }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
