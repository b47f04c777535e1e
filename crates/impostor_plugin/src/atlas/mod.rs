//! Impostor atlas: one texture holding pre-rendered views of the reference
//! model from a grid of horizontal angles and elevation bands.
//!
//! # Module Structure
//!
//! - [`layout`]: `AtlasLayout`, cell geometry and `cell_for` lookup
//! - [`mesh`]: `ReferenceMesh` handed to the builder
//! - [`builder`]: `AtlasBuilder`, the `AtlasRenderTarget` seam and the baked
//!   `ImpostorAtlas`
//! - [`software`]: CPU render target producing an `RgbaImage`

pub mod builder;
pub mod layout;
pub mod mesh;
pub mod software;

pub use builder::{AtlasBuilder, AtlasRenderTarget, CellCamera, ImpostorAtlas};
pub use layout::{AtlasCell, AtlasLayout, CellRegion};
pub use mesh::{MeshBounds, ReferenceMesh};
pub use software::SoftwareRenderer;
