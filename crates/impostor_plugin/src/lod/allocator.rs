//! LodAllocator - distance bucketing of the full instance set into tiers.
//!
//! # Pass
//!
//! One linear pass over every instance: distance to the reference point,
//! lowest tier whose threshold is strictly greater, otherwise the impostor
//! tier. Buckets are cleared and refilled in place so their allocations are
//! reused across passes.
//!
//! # Early-out
//!
//! A non-forced pass with a reference bit-identical to the previous one
//! does nothing, so a stationary camera costs no O(N) work.

use glam::Vec3;
use smallvec::SmallVec;

use super::DistanceThresholds;
use crate::error::{ImpostorError, ImpostorResult};
use crate::placement::InstancePlacement;

/// Per-tier display statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TierStats {
  /// Instances currently in the tier's bucket.
  pub instance_count: usize,
  /// Vertex count of the tier's representative mesh.
  pub vertex_count: u32,
}

impl TierStats {
  /// Vertices submitted for the whole tier.
  #[inline]
  pub fn total_vertices(&self) -> u64 {
    self.instance_count as u64 * self.vertex_count as u64
  }
}

/// Outcome of a `reallocate` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reallocation {
  /// Reference unchanged and not forced; buckets untouched.
  Skipped,
  /// Buckets were rebuilt.
  Reallocated,
}

impl Reallocation {
  #[inline]
  pub fn changed(self) -> bool {
    self == Reallocation::Reallocated
  }
}

/// Buckets the authoritative instance set into `tier_count` detail tiers.
pub struct LodAllocator {
  instances: Vec<InstancePlacement>,
  buckets: Vec<Vec<InstancePlacement>>,
  stats: SmallVec<[TierStats; 8]>,
  last_reference: Option<Vec3>,
  generation: u64,
  skip_when_still: bool,
}

impl LodAllocator {
  /// Create an allocator with one tier per entry of `vertex_counts`.
  ///
  /// The last entry is the impostor tier, so at least two are required.
  pub fn new(instances: Vec<InstancePlacement>, vertex_counts: &[u32]) -> ImpostorResult<Self> {
    if vertex_counts.len() < 2 {
      return Err(ImpostorError::invalid(format!(
        "need at least one LOD tier plus the impostor tier, got {} tiers",
        vertex_counts.len()
      )));
    }

    let stats = vertex_counts
      .iter()
      .map(|&vertex_count| TierStats {
        instance_count: 0,
        vertex_count,
      })
      .collect();

    Ok(Self {
      instances,
      buckets: vec![Vec::new(); vertex_counts.len()],
      stats,
      last_reference: None,
      generation: 0,
      skip_when_still: true,
    })
  }

  #[inline]
  pub fn tier_count(&self) -> usize {
    self.buckets.len()
  }

  /// Index of the impostor tier (the last one).
  #[inline]
  pub fn impostor_tier(&self) -> usize {
    self.buckets.len() - 1
  }

  #[inline]
  pub fn instance_count(&self) -> usize {
    self.instances.len()
  }

  #[inline]
  pub fn instances(&self) -> &[InstancePlacement] {
    &self.instances
  }

  /// Current contents of a tier's bucket, in no particular order.
  #[inline]
  pub fn bucket(&self, tier: usize) -> &[InstancePlacement] {
    &self.buckets[tier]
  }

  #[inline]
  pub fn stats(&self) -> &[TierStats] {
    &self.stats
  }

  /// Number of completed reallocation passes.
  #[inline]
  pub fn generation(&self) -> u64 {
    self.generation
  }

  #[inline]
  pub fn last_reference(&self) -> Option<Vec3> {
    self.last_reference
  }

  /// Disable the stationary-reference early-out (profiling aid).
  pub fn set_skip_when_still(&mut self, skip: bool) {
    self.skip_when_still = skip;
  }

  fn is_same_reference(&self, reference: Vec3) -> bool {
    self.last_reference.is_some_and(|last| {
      last.x.to_bits() == reference.x.to_bits()
        && last.y.to_bits() == reference.y.to_bits()
        && last.z.to_bits() == reference.z.to_bits()
    })
  }

  /// Re-bucket every instance by distance to `reference`.
  ///
  /// Fails with `InvalidParameter` when the threshold count does not match
  /// the tier count and with `LostInstances` if the buckets do not account
  /// for every instance afterwards.
  #[cfg_attr(feature = "spans", tracing::instrument(skip_all, name = "lod::reallocate"))]
  pub fn reallocate(
    &mut self,
    reference: Vec3,
    force: bool,
    thresholds: &DistanceThresholds,
  ) -> ImpostorResult<Reallocation> {
    if !force && self.skip_when_still && self.is_same_reference(reference) {
      return Ok(Reallocation::Skipped);
    }
    if thresholds.len() != self.impostor_tier() {
      return Err(ImpostorError::invalid(format!(
        "{} thresholds for {} LOD tiers",
        thresholds.len(),
        self.impostor_tier()
      )));
    }
    self.last_reference = Some(reference);

    for bucket in &mut self.buckets {
      bucket.clear();
    }

    for instance in &self.instances {
      let distance = instance.position.distance(reference);
      let tier = thresholds.tier_for(distance);
      self.buckets[tier].push(*instance);
    }

    let mut allocated = 0;
    for (stats, bucket) in self.stats.iter_mut().zip(&self.buckets) {
      stats.instance_count = bucket.len();
      allocated += bucket.len();
    }
    if allocated != self.instances.len() {
      return Err(ImpostorError::LostInstances {
        expected: self.instances.len(),
        allocated,
      });
    }

    self.generation += 1;
    tracing::debug!(
      generation = self.generation,
      distribution = ?self.stats.iter().map(|s| s.instance_count).collect::<SmallVec<[usize; 8]>>(),
      "reallocated LOD buckets"
    );
    Ok(Reallocation::Reallocated)
  }
}

#[cfg(test)]
#[path = "allocator_test.rs"]
mod allocator_test;
