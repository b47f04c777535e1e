//! Bevy systems for impostor LOD management.

pub mod startup;
pub mod update;
