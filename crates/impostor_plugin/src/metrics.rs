//! Engine-agnostic metrics for the LOD and impostor pipeline.
//!
//! Feature-gated and runtime-toggled; without the `metrics` feature every
//! `record_*` call is a no-op.
//!
//! # Usage
//!
//! ```ignore
//! use impostor_plugin::metrics::{EngineMetrics, COLLECT_METRICS};
//!
//! // Compile with --features metrics
//! // Runtime toggle:
//! COLLECT_METRICS.store(false, Ordering::Relaxed);
//!
//! metrics.record_reallocation(timing_us, allocator.stats());
//! ```

use std::collections::VecDeque;
use std::sync::atomic::AtomicBool;
#[cfg(feature = "metrics")]
use std::sync::atomic::Ordering;

use smallvec::SmallVec;

use crate::controller::Evaluation;
use crate::lod::TierStats;

/// Runtime toggle for metrics collection.
pub static COLLECT_METRICS: AtomicBool = AtomicBool::new(true);

/// Check if metrics collection is enabled (both compile-time and runtime).
#[inline]
pub fn is_enabled() -> bool {
  #[cfg(feature = "metrics")]
  {
    COLLECT_METRICS.load(Ordering::Relaxed)
  }
  #[cfg(not(feature = "metrics"))]
  {
    false
  }
}

/// Fixed-capacity history, oldest value evicted first.
#[derive(Debug, Clone)]
pub struct RollingWindow<T> {
  buffer: VecDeque<T>,
  capacity: usize,
}

impl<T> RollingWindow<T> {
  pub fn new(capacity: usize) -> Self {
    Self {
      buffer: VecDeque::with_capacity(capacity),
      capacity,
    }
  }

  pub fn push(&mut self, value: T) {
    if self.buffer.len() >= self.capacity {
      self.buffer.pop_front();
    }
    self.buffer.push_back(value);
  }

  pub fn len(&self) -> usize {
    self.buffer.len()
  }

  pub fn is_empty(&self) -> bool {
    self.buffer.is_empty()
  }

  pub fn clear(&mut self) {
    self.buffer.clear();
  }

  /// Oldest to newest.
  pub fn iter(&self) -> impl Iterator<Item = &T> {
    self.buffer.iter()
  }

  pub fn last(&self) -> Option<&T> {
    self.buffer.back()
  }
}

impl RollingWindow<u64> {
  pub fn average(&self) -> f64 {
    if self.buffer.is_empty() {
      0.0
    } else {
      self.buffer.iter().sum::<u64>() as f64 / self.buffer.len() as f64
    }
  }

  pub fn min_max(&self) -> Option<(u64, u64)> {
    let min = *self.buffer.iter().min()?;
    let max = *self.buffer.iter().max()?;
    Some((min, max))
  }
}

impl Default for RollingWindow<u64> {
  fn default() -> Self {
    Self::new(128) // ~12 s of reallocation passes at the 0.1 s cadence
  }
}

/// Pipeline statistics for overlays and profiling.
#[derive(Debug, Clone, Default)]
pub struct EngineMetrics {
  // Tier distribution
  /// Instance count per tier after the last pass.
  pub instances_per_tier: SmallVec<[usize; 8]>,
  /// Submitted vertices per tier after the last pass.
  pub vertices_per_tier: SmallVec<[u64; 8]>,

  // Timing
  /// Reallocation pass times in microseconds.
  pub reallocation_timings: RollingWindow<u64>,
  /// Transform buffer rebuild times (all tiers) in microseconds.
  pub rebuild_timings: RollingWindow<u64>,

  // Counters
  pub reallocations: u64,
  /// Cadence ticks answered by the stationary-reference early-out.
  pub skipped_passes: u64,
  /// Controller evaluations that shrank the thresholds.
  pub degrade_events: u64,
  /// Frame rate seen by the controller's last evaluation.
  pub last_observed_fps: Option<f32>,
}

impl EngineMetrics {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn reset(&mut self) {
    self.instances_per_tier.clear();
    self.vertices_per_tier.clear();
    self.reallocation_timings.clear();
    self.rebuild_timings.clear();
    self.last_observed_fps = None;
    // Counters are cumulative
  }

  pub fn record_reallocation(&mut self, timing_us: u64, stats: &[TierStats]) {
    if !is_enabled() {
      return;
    }
    self.reallocation_timings.push(timing_us);
    self.reallocations += 1;
    self.instances_per_tier.clear();
    self.vertices_per_tier.clear();
    for s in stats {
      self.instances_per_tier.push(s.instance_count);
      self.vertices_per_tier.push(s.total_vertices());
    }
  }

  pub fn record_skip(&mut self) {
    if is_enabled() {
      self.skipped_passes += 1;
    }
  }

  pub fn record_rebuild(&mut self, timing_us: u64) {
    if is_enabled() {
      self.rebuild_timings.push(timing_us);
    }
  }

  pub fn record_evaluation(&mut self, evaluation: &Evaluation) {
    if !is_enabled() {
      return;
    }
    self.last_observed_fps = Some(evaluation.observed_rate());
    if matches!(evaluation, Evaluation::Degraded { .. }) {
      self.degrade_events += 1;
    }
  }

  pub fn total_instances(&self) -> usize {
    self.instances_per_tier.iter().sum()
  }

  pub fn total_vertices(&self) -> u64 {
    self.vertices_per_tier.iter().sum()
  }

  pub fn avg_reallocation_us(&self) -> f64 {
    self.reallocation_timings.average()
  }

  pub fn avg_rebuild_us(&self) -> f64 {
    self.rebuild_timings.average()
  }
}

#[cfg(all(test, feature = "metrics"))]
mod tests {
  use super::*;

  #[test]
  fn test_rolling_window() {
    let mut window = RollingWindow::new(3);
    assert!(window.is_empty());
    assert_eq!(window.min_max(), None);

    window.push(10u64);
    window.push(20);
    window.push(30);
    assert_eq!(window.average(), 20.0);

    // Oldest evicted
    window.push(40);
    assert_eq!(window.len(), 3);
    assert_eq!(window.average(), 30.0);
    assert_eq!(window.min_max(), Some((20, 40)));
    assert_eq!(window.last(), Some(&40));
  }

  #[test]
  fn test_reallocation_snapshot() {
    let mut metrics = EngineMetrics::new();
    let stats = [
      TierStats {
        instance_count: 3,
        vertex_count: 100,
      },
      TierStats {
        instance_count: 5,
        vertex_count: 4,
      },
    ];
    metrics.record_reallocation(250, &stats);
    metrics.record_reallocation(350, &stats);

    assert_eq!(metrics.reallocations, 2);
    assert_eq!(metrics.total_instances(), 8);
    assert_eq!(metrics.total_vertices(), 320);
    assert_eq!(metrics.avg_reallocation_us(), 300.0);
  }

  #[test]
  fn test_rebuild_average() {
    let mut metrics = EngineMetrics::new();
    assert_eq!(metrics.avg_rebuild_us(), 0.0);
    metrics.record_rebuild(40);
    metrics.record_rebuild(80);
    assert_eq!(metrics.avg_rebuild_us(), 60.0);
  }

  #[test]
  fn test_evaluation_counters() {
    let mut metrics = EngineMetrics::new();
    metrics.record_evaluation(&Evaluation::Satisfied { observed_rate: 75.0 });
    metrics.record_evaluation(&Evaluation::Degraded { observed_rate: 31.0 });
    assert_eq!(metrics.degrade_events, 1);
    assert_eq!(metrics.last_observed_fps, Some(31.0));

    metrics.record_skip();
    metrics.reset();
    assert_eq!(metrics.skipped_passes, 1);
    assert_eq!(metrics.last_observed_fps, None);
  }
}
