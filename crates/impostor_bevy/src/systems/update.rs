//! Per-frame engine update and submission, driven by ImpostorViewer.

use bevy::prelude::*;

use crate::components::ImpostorViewer;
use crate::resources::ImpostorState;
use crate::submission_queue::ImpostorSubmissions;

/// System that advances the engine from the first viewer's transform.
///
/// An engine error is a pipeline bug; the engine is removed so the frame
/// loop stops submitting stale buffers.
pub fn update_impostor_engine(
  mut commands: Commands,
  time: Res<Time>,
  viewers: Query<&GlobalTransform, With<ImpostorViewer>>,
  state: Option<ResMut<ImpostorState>>,
) {
  let Some(mut state) = state else {
    return;
  };
  let Some(viewer) = viewers.iter().next() else {
    return;
  };

  let position = viewer.translation();
  let forward = viewer.forward().as_vec3();

  match state.engine.update(position, forward, time.delta_secs()) {
    Ok(report) => {
      if let Some(evaluation) = report.evaluation {
        debug!("Frame-rate evaluation: {evaluation:?}");
      }
    }
    Err(err) => {
      error!("Impostor engine stopped: {err}");
      commands.remove_resource::<ImpostorState>();
    }
  }
}

/// System that forwards the current tier buffers to the submission queue.
pub fn submit_impostor_batches(state: Option<Res<ImpostorState>>, mut queue: ResMut<ImpostorSubmissions>) {
  queue.begin_frame();
  if let Some(state) = state {
    state.engine.submit(&mut *queue);
  }
}
