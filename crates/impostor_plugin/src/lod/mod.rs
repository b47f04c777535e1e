//! Level-of-detail bucketing.
//!
//! # Tier Convention
//!
//! Tier 0 = finest full-geometry LOD, `LOD_LEVELS - 1` = coarsest geometry,
//! `LOD_LEVELS` = impostor tier.
//!
//! ```text
//! tier(d) = min { i : d < t[i] }   or   LOD_LEVELS when d >= t[LOD_LEVELS-1]
//! ```
//!
//! # Module Structure
//!
//! - [`thresholds`]: `DistanceThresholds` and the `DetailSettings` that own
//!   them at runtime
//! - [`allocator`]: `LodAllocator` - per-tier buckets and statistics

pub mod allocator;
pub mod thresholds;

pub use allocator::{LodAllocator, Reallocation, TierStats};
pub use thresholds::{DetailSettings, DistanceThresholds};

/// Index of a detail tier.
pub type DetailTier = usize;
