//! Bevy components for impostor rendering.

use bevy::prelude::*;

/// Marker component for the entity whose position drives LOD bucketing.
///
/// Attach to any entity with a `GlobalTransform` (typically a camera).
/// Its translation is the reference point and its forward vector selects
/// the impostor atlas cell.
///
/// # Example
/// ```ignore
/// commands.spawn((
///     Camera3d::default(),
///     Transform::from_xyz(0.0, 20.0, 50.0).looking_at(Vec3::ZERO, Vec3::Y),
///     ImpostorViewer,
/// ));
/// ```
#[derive(Component, Default)]
pub struct ImpostorViewer;
