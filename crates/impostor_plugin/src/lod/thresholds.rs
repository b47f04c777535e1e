//! Distance thresholds and the runtime detail settings that own them.

use smallvec::SmallVec;

use crate::error::{ImpostorError, ImpostorResult};

/// Ascending bucket boundaries `t[0] <= t[1] <= ... <= t[LOD_LEVELS-1]`.
///
/// An instance at distance `d` belongs to the lowest tier `i` with
/// `d < t[i]`, or to the impostor tier when no threshold is larger than `d`.
/// Equal neighbouring values are allowed and simply leave a tier empty.
#[derive(Clone, Debug, PartialEq)]
pub struct DistanceThresholds {
  values: SmallVec<[f32; 4]>,
}

impl DistanceThresholds {
  pub fn new(values: impl Into<Vec<f32>>) -> ImpostorResult<Self> {
    let values: Vec<f32> = values.into();
    if values.is_empty() {
      return Err(ImpostorError::invalid("at least one distance threshold is required"));
    }
    if let Some(bad) = values.iter().find(|v| !v.is_finite() || **v < 0.0) {
      return Err(ImpostorError::invalid(format!(
        "distance thresholds must be finite and non-negative, got {bad}"
      )));
    }
    if values.windows(2).any(|w| w[1] < w[0]) {
      return Err(ImpostorError::invalid(format!(
        "distance thresholds must be ascending, got {values:?}"
      )));
    }
    Ok(Self {
      values: SmallVec::from_vec(values),
    })
  }

  /// `count` thresholds starting at `first`, each `ratio` times the previous.
  pub fn geometric(first: f32, ratio: f32, count: usize) -> ImpostorResult<Self> {
    if !(ratio >= 1.0) {
      return Err(ImpostorError::invalid(format!("ratio must be >= 1, got {ratio}")));
    }
    let values: Vec<f32> = (0..count).map(|i| first * ratio.powi(i as i32)).collect();
    Self::new(values)
  }

  #[inline]
  pub fn as_slice(&self) -> &[f32] {
    &self.values
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.values.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  /// Tier index for a distance; `len()` is the impostor tier.
  #[inline]
  pub fn tier_for(&self, distance: f32) -> usize {
    self
      .values
      .iter()
      .position(|&t| distance < t)
      .unwrap_or(self.values.len())
  }

  /// Multiply every threshold by `factor`. Order is preserved for `factor > 0`.
  pub fn scale(&mut self, factor: f32) {
    debug_assert!(factor > 0.0);
    for v in &mut self.values {
      *v *= factor;
    }
  }
}

/// Live detail configuration shared by the allocator and the controller.
///
/// The controller mutates it through `degrade`; operators through the
/// manual methods, which also switch dynamic adjustment off so the two never
/// fight over the same values. `revision` changes on every write so the
/// engine knows to force a reallocation.
#[derive(Clone, Debug)]
pub struct DetailSettings {
  thresholds: DistanceThresholds,
  dynamic_adjustment: bool,
  revision: u64,
}

impl DetailSettings {
  pub fn new(thresholds: DistanceThresholds, dynamic_adjustment: bool) -> Self {
    Self {
      thresholds,
      dynamic_adjustment,
      revision: 0,
    }
  }

  #[inline]
  pub fn thresholds(&self) -> &DistanceThresholds {
    &self.thresholds
  }

  #[inline]
  pub fn dynamic_adjustment(&self) -> bool {
    self.dynamic_adjustment
  }

  #[inline]
  pub fn revision(&self) -> u64 {
    self.revision
  }

  /// Re-enable (or disable) the frame-rate controller.
  pub fn set_dynamic_adjustment(&mut self, enabled: bool) {
    if self.dynamic_adjustment != enabled {
      tracing::info!(enabled, "dynamic LOD adjustment toggled");
    }
    self.dynamic_adjustment = enabled;
  }

  /// Controller write path: shrink every threshold.
  pub fn degrade(&mut self, factor: f32) {
    self.thresholds.scale(factor);
    self.revision += 1;
  }

  /// Operator write path: replace the thresholds outright.
  pub fn override_thresholds(&mut self, thresholds: DistanceThresholds) {
    self.stop_controller();
    self.thresholds = thresholds;
    self.revision += 1;
  }

  /// Operator write path: scale every threshold (x1.1 / x0.9 shortcuts).
  pub fn scale_manual(&mut self, factor: f32) -> ImpostorResult<()> {
    if !(factor > 0.0) || !factor.is_finite() {
      return Err(ImpostorError::invalid(format!("scale factor must be positive, got {factor}")));
    }
    self.stop_controller();
    self.thresholds.scale(factor);
    self.revision += 1;
    tracing::info!(first = self.thresholds.as_slice()[0], "LOD distances updated manually");
    Ok(())
  }

  fn stop_controller(&mut self) {
    if self.dynamic_adjustment {
      tracing::warn!("manual LOD override, dynamic adjustment disabled");
    }
    self.dynamic_adjustment = false;
  }
}
