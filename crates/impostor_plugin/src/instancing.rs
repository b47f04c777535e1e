//! Per-tier GPU instance payload buffers.
//!
//! Each tier owns one buffer sized for the worst case (every instance in
//! that tier). A rebuild overwrites it from the tier's bucket and sets the
//! logical length to `bucket_len * stride`; nothing is appended
//! incrementally.
//!
//! ```text
//! Transform  : 16 floats, rows of M = T(x,y,z) * R_y(yaw)   (i_worldTrans 0..3)
//! PositionYaw:  4 floats, (x, y, z, yaw)                     (i_offset)
//! ```

use glam::{Mat4, Quat};

use crate::error::{ImpostorError, ImpostorResult};
use crate::placement::InstancePlacement;

/// Layout of one instance's payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayloadKind {
  /// Full 4×4 world transform for full-geometry tiers.
  Transform,
  /// Position plus yaw for the impostor tier.
  PositionYaw,
}

impl PayloadKind {
  /// Floats per instance.
  #[inline]
  pub const fn stride(self) -> usize {
    match self {
      PayloadKind::Transform => 16,
      PayloadKind::PositionYaw => 4,
    }
  }
}

/// World transform of an instance: rotation about +Y, then translation.
#[inline]
pub fn instance_transform(instance: &InstancePlacement) -> Mat4 {
  Mat4::from_rotation_translation(Quat::from_rotation_y(instance.yaw), instance.position)
}

/// Capacity-bounded float buffer for one tier.
#[derive(Clone, Debug)]
pub struct TransformBuffer {
  tier: usize,
  kind: PayloadKind,
  capacity: usize,
  data: Vec<f32>,
  instance_count: usize,
  revision: u64,
}

impl TransformBuffer {
  /// Allocate a buffer holding up to `capacity` instances.
  pub fn new(tier: usize, kind: PayloadKind, capacity: usize) -> Self {
    Self {
      tier,
      kind,
      capacity,
      data: Vec::with_capacity(capacity * kind.stride()),
      instance_count: 0,
      revision: 0,
    }
  }

  #[inline]
  pub fn tier(&self) -> usize {
    self.tier
  }

  #[inline]
  pub fn kind(&self) -> PayloadKind {
    self.kind
  }

  /// Maximum instance count.
  #[inline]
  pub fn capacity(&self) -> usize {
    self.capacity
  }

  /// Instances written by the last rebuild.
  #[inline]
  pub fn instance_count(&self) -> usize {
    self.instance_count
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.instance_count == 0
  }

  /// Logical contents, `instance_count * stride` floats.
  #[inline]
  pub fn as_slice(&self) -> &[f32] {
    &self.data
  }

  /// Bumped on every rebuild so consumers can skip redundant uploads.
  #[inline]
  pub fn revision(&self) -> u64 {
    self.revision
  }

  /// Overwrite the buffer with the payload for every instance in `bucket`.
  #[cfg_attr(feature = "spans", tracing::instrument(skip_all, name = "instancing::rebuild"))]
  pub fn rebuild(&mut self, bucket: &[InstancePlacement]) -> ImpostorResult<()> {
    if bucket.len() > self.capacity {
      return Err(ImpostorError::CapacityExceeded {
        tier: self.tier,
        requested: bucket.len(),
        capacity: self.capacity,
      });
    }

    self.data.clear();
    match self.kind {
      PayloadKind::Transform => {
        for instance in bucket {
          // Transposed so each consecutive 4 floats is one row of M.
          let m = instance_transform(instance).transpose();
          self.data.extend_from_slice(&m.to_cols_array());
        }
      }
      PayloadKind::PositionYaw => {
        for instance in bucket {
          self.data.extend_from_slice(&instance.to_vec4().to_array());
        }
      }
    }

    self.instance_count = bucket.len();
    self.revision += 1;
    debug_assert_eq!(self.data.len(), self.instance_count * self.kind.stride());
    Ok(())
  }
}
