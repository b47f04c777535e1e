use super::*;
use crate::distribution::{self, Rect};
use crate::placement::{place, FlatTerrain};

const VERTS: [u32; 4] = [1200, 400, 100, 4];

fn thresholds(values: &[f32]) -> DistanceThresholds {
  DistanceThresholds::new(values.to_vec()).unwrap()
}

/// Instances on a line along +X at the given distances from the origin.
fn line_instances(distances: &[f32]) -> Vec<InstancePlacement> {
  distances
    .iter()
    .map(|&d| InstancePlacement::new(d, 0.0, 0.0, 0.0))
    .collect()
}

fn scattered_instances(seed: u64) -> Vec<InstancePlacement> {
  let area = Rect::new(0.0, 0.0, 1000.0, 1000.0);
  let points = distribution::generate(20.0, &area, seed).unwrap();
  place(&points, &area, &FlatTerrain(0.0), seed)
}

fn bucket_sum(allocator: &LodAllocator) -> usize {
  (0..allocator.tier_count()).map(|t| allocator.bucket(t).len()).sum()
}

// =========================================================================
// Classification
// =========================================================================

/// Each distance band lands in its own tier.
#[test]
fn test_instances_sorted_into_bands() {
  let instances = line_instances(&[10.0, 70.0, 130.0, 500.0]);
  let mut allocator = LodAllocator::new(instances, &VERTS).unwrap();

  allocator
    .reallocate(Vec3::ZERO, true, &thresholds(&[60.0, 120.0, 240.0]))
    .unwrap();

  for tier in 0..4 {
    assert_eq!(allocator.bucket(tier).len(), 1, "tier {} should hold one", tier);
  }
  assert_eq!(allocator.bucket(3)[0].position.x, 500.0);
}

/// Exactly on a threshold goes to the coarser tier.
#[test]
fn test_threshold_tie_goes_to_coarser_tier() {
  let instances = line_instances(&[60.0, 120.0, 240.0]);
  let mut allocator = LodAllocator::new(instances, &VERTS).unwrap();

  allocator
    .reallocate(Vec3::ZERO, true, &thresholds(&[60.0, 120.0, 240.0]))
    .unwrap();

  assert!(allocator.bucket(0).is_empty());
  assert_eq!(allocator.bucket(1)[0].position.x, 60.0);
  assert_eq!(allocator.bucket(2)[0].position.x, 120.0);
  assert_eq!(allocator.bucket(3)[0].position.x, 240.0);
}

/// Distance is measured in 3-D, elevation included.
#[test]
fn test_distance_includes_elevation() {
  let instances = vec![InstancePlacement::new(30.0, 40.0, 0.0, 0.0)];
  let mut allocator = LodAllocator::new(instances, &VERTS).unwrap();

  // |(30, 40, 0)| = 50
  allocator
    .reallocate(Vec3::ZERO, true, &thresholds(&[50.0, 100.0, 200.0]))
    .unwrap();
  assert_eq!(allocator.bucket(1).len(), 1);
}

// =========================================================================
// Conservation
// =========================================================================

#[test]
fn test_bucket_sum_equals_instance_count() {
  let instances = scattered_instances(7);
  let total = instances.len();
  let mut allocator = LodAllocator::new(instances, &VERTS).unwrap();

  let references = [
    Vec3::ZERO,
    Vec3::new(123.0, 10.0, -77.0),
    Vec3::new(-480.0, 0.0, 480.0),
    Vec3::new(5000.0, 0.0, 5000.0),
  ];
  let sets = [
    [60.0, 120.0, 240.0],
    [1.0, 2.0, 3.0],
    [100.0, 100.0, 100.0],
    [0.0, 500.0, 501.0],
  ];

  for reference in references {
    for set in &sets {
      allocator.reallocate(reference, true, &thresholds(set)).unwrap();
      assert_eq!(bucket_sum(&allocator), total);
      let stats_sum: usize = allocator.stats().iter().map(|s| s.instance_count).sum();
      assert_eq!(stats_sum, total);
    }
  }
}

#[test]
fn test_all_zero_thresholds_everything_impostor() {
  let instances = scattered_instances(3);
  let total = instances.len();
  let mut allocator = LodAllocator::new(instances, &VERTS).unwrap();

  allocator
    .reallocate(Vec3::ZERO, true, &thresholds(&[0.0, 0.0, 0.0]))
    .unwrap();
  assert_eq!(allocator.bucket(allocator.impostor_tier()).len(), total);
}

#[test]
fn test_huge_thresholds_everything_finest() {
  let instances = scattered_instances(3);
  let total = instances.len();
  let mut allocator = LodAllocator::new(instances, &VERTS).unwrap();

  allocator
    .reallocate(Vec3::ZERO, true, &thresholds(&[1e9, 2e9, 4e9]))
    .unwrap();
  assert_eq!(allocator.bucket(0).len(), total);
}

/// An empty instance set is a normal state.
#[test]
fn test_empty_instance_set() {
  let mut allocator = LodAllocator::new(Vec::new(), &VERTS).unwrap();
  let result = allocator
    .reallocate(Vec3::ZERO, true, &thresholds(&[60.0, 120.0, 240.0]))
    .unwrap();
  assert_eq!(result, Reallocation::Reallocated);
  assert_eq!(bucket_sum(&allocator), 0);
}

// =========================================================================
// Early-out
// =========================================================================

/// Same reference, not forced: no work, buckets untouched.
#[test]
fn test_unchanged_reference_skips() {
  let mut allocator = LodAllocator::new(scattered_instances(11), &VERTS).unwrap();
  let t = thresholds(&[60.0, 120.0, 240.0]);
  let reference = Vec3::new(10.0, 2.0, 10.0);

  assert_eq!(allocator.reallocate(reference, false, &t).unwrap(), Reallocation::Reallocated);
  let generation = allocator.generation();
  let before: Vec<Vec<InstancePlacement>> =
    (0..4).map(|tier| allocator.bucket(tier).to_vec()).collect();
  let ptrs: Vec<*const InstancePlacement> =
    (0..4).map(|tier| allocator.bucket(tier).as_ptr()).collect();

  assert_eq!(allocator.reallocate(reference, false, &t).unwrap(), Reallocation::Skipped);
  assert_eq!(allocator.generation(), generation);
  for tier in 0..4 {
    assert_eq!(allocator.bucket(tier), before[tier].as_slice());
    assert_eq!(allocator.bucket(tier).as_ptr(), ptrs[tier]);
  }
}

/// Skipping ignores threshold changes; the caller must force.
#[test]
fn test_skip_ignores_new_thresholds_until_forced() {
  let mut allocator = LodAllocator::new(line_instances(&[50.0]), &VERTS).unwrap();
  allocator
    .reallocate(Vec3::ZERO, false, &thresholds(&[60.0, 120.0, 240.0]))
    .unwrap();
  assert_eq!(allocator.bucket(0).len(), 1);

  let shrunk = thresholds(&[30.0, 60.0, 120.0]);
  assert_eq!(allocator.reallocate(Vec3::ZERO, false, &shrunk).unwrap(), Reallocation::Skipped);
  assert_eq!(allocator.bucket(0).len(), 1);

  assert_eq!(allocator.reallocate(Vec3::ZERO, true, &shrunk).unwrap(), Reallocation::Reallocated);
  assert_eq!(allocator.bucket(1).len(), 1);
}

/// Forced passes always recompute.
#[test]
fn test_force_recomputes_unchanged_reference() {
  let mut allocator = LodAllocator::new(scattered_instances(11), &VERTS).unwrap();
  let t = thresholds(&[60.0, 120.0, 240.0]);

  allocator.reallocate(Vec3::ZERO, true, &t).unwrap();
  allocator.reallocate(Vec3::ZERO, true, &t).unwrap();
  assert_eq!(allocator.generation(), 2);
}

/// The tiniest move defeats the early-out.
#[test]
fn test_moved_reference_recomputes() {
  let mut allocator = LodAllocator::new(line_instances(&[1.0]), &VERTS).unwrap();
  let t = thresholds(&[60.0, 120.0, 240.0]);

  allocator.reallocate(Vec3::ZERO, false, &t).unwrap();
  let nudged = Vec3::new(f32::from_bits(1), 0.0, 0.0);
  assert_eq!(allocator.reallocate(nudged, false, &t).unwrap(), Reallocation::Reallocated);
  assert_eq!(allocator.last_reference(), Some(nudged));
}

#[test]
fn test_skip_when_still_disabled_always_recomputes() {
  let mut allocator = LodAllocator::new(line_instances(&[1.0]), &VERTS).unwrap();
  allocator.set_skip_when_still(false);
  let t = thresholds(&[60.0, 120.0, 240.0]);

  allocator.reallocate(Vec3::ZERO, false, &t).unwrap();
  assert_eq!(allocator.reallocate(Vec3::ZERO, false, &t).unwrap(), Reallocation::Reallocated);
}

/// Refilling in place keeps the bucket allocation.
#[test]
fn test_buckets_reuse_allocation() {
  let mut allocator = LodAllocator::new(line_instances(&[1.0, 2.0, 3.0]), &VERTS).unwrap();
  let t = thresholds(&[60.0, 120.0, 240.0]);

  allocator.reallocate(Vec3::ZERO, true, &t).unwrap();
  let ptr = allocator.bucket(0).as_ptr();
  allocator.reallocate(Vec3::ZERO, true, &t).unwrap();
  assert_eq!(allocator.bucket(0).as_ptr(), ptr);
}

// =========================================================================
// Statistics and validation
// =========================================================================

#[test]
fn test_stats_report_counts_and_vertices() {
  let mut allocator = LodAllocator::new(line_instances(&[1.0, 2.0, 500.0]), &VERTS).unwrap();
  allocator
    .reallocate(Vec3::ZERO, true, &thresholds(&[60.0, 120.0, 240.0]))
    .unwrap();

  let stats = allocator.stats();
  assert_eq!(stats[0], TierStats { instance_count: 2, vertex_count: 1200 });
  assert_eq!(stats[0].total_vertices(), 2400);
  assert_eq!(stats[1].instance_count, 0);
  assert_eq!(stats[3], TierStats { instance_count: 1, vertex_count: 4 });
}

#[test]
fn test_threshold_count_mismatch_rejected() {
  let mut allocator = LodAllocator::new(line_instances(&[1.0]), &VERTS).unwrap();
  let err = allocator
    .reallocate(Vec3::ZERO, true, &thresholds(&[60.0, 120.0]))
    .unwrap_err();
  assert!(matches!(err, ImpostorError::InvalidParameter(_)));
  assert_eq!(allocator.generation(), 0);
  assert_eq!(allocator.last_reference(), None);
}

#[test]
fn test_requires_impostor_tier() {
  assert!(LodAllocator::new(Vec::new(), &[100]).is_err());
}

// =========================================================================
// Reference scenario
// =========================================================================

/// 9000×9000 at separation 20, seed 1234: stable N, four buckets summing
/// to N, repeat without movement leaves buckets unchanged.
#[test]
fn test_reference_scenario() {
  let area = Rect::new(0.0, 0.0, 9000.0, 9000.0);
  let points = distribution::generate(20.0, &area, 1234).unwrap();
  let n = points.len();
  assert_eq!(distribution::generate(20.0, &area, 1234).unwrap().len(), n);

  let instances = place(&points, &area, &FlatTerrain(0.0), 1234);
  assert_eq!(instances.len(), n);

  let mut allocator = LodAllocator::new(instances, &VERTS).unwrap();
  let t = thresholds(&[60.0, 120.0, 240.0]);
  allocator.reallocate(Vec3::ZERO, true, &t).unwrap();
  assert_eq!(allocator.tier_count(), 4);
  assert_eq!(bucket_sum(&allocator), n);

  let before: Vec<usize> = (0..4).map(|tier| allocator.bucket(tier).len()).collect();
  let generation = allocator.generation();
  assert_eq!(allocator.reallocate(Vec3::ZERO, false, &t).unwrap(), Reallocation::Skipped);
  let after: Vec<usize> = (0..4).map(|tier| allocator.bucket(tier).len()).collect();
  assert_eq!(before, after);
  assert_eq!(allocator.generation(), generation);
}
