//! Bevy presentation layer for impostor_plugin.
//!
//! This crate bridges the engine-independent impostor_plugin with Bevy:
//! asset conversion, the per-frame update driven by [`ImpostorViewer`],
//! keyboard shortcuts and a submission queue for the host render plugin.

pub mod components;
pub mod conversion;
pub mod input;
pub mod resources;
pub mod submission_queue;
pub mod systems;


use bevy::prelude::*;
pub use components::*;
pub use input::{ImpostorShortcuts, ShortcutAction};
pub use resources::*;
pub use submission_queue::{GeometrySubmission, ImpostorSubmission, ImpostorSubmissions, SubmissionStats};

/// Bevy plugin for impostor LOD rendering.
///
/// Insert an [`ImpostorSource`] before adding the plugin.
pub struct ImpostorBevyPlugin;

impl Plugin for ImpostorBevyPlugin {
	fn build(&self, app: &mut App) {
		app.init_resource::<ImpostorSubmissions>()
			.init_resource::<ImpostorShortcuts>()
			.add_systems(Startup, systems::startup::setup_impostor_engine)
			.add_systems(
				Update,
				(
					input::handle_impostor_shortcuts,
					systems::update::update_impostor_engine,
					systems::update::submit_impostor_batches,
				)
					.chain(),
			);
	}
}
