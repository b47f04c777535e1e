//! Keyboard shortcuts for the operator controls.
//!
//! | Key | Action |
//! |-----|--------|
//! | Z   | Increase LOD distances (×1.1) |
//! | X   | Decrease LOD distances (×0.9) |
//! | Tab | Cycle display mode |
//! | L   | Toggle dynamic LOD adjustment |

use bevy::prelude::*;
use smallvec::SmallVec;

use crate::resources::ImpostorState;

/// Factor applied by the increase shortcut.
pub const INCREASE_FACTOR: f32 = 1.1;
/// Factor applied by the decrease shortcut.
pub const DECREASE_FACTOR: f32 = 0.9;

/// Operator action bound to a key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShortcutAction {
  ScaleDistances(f32),
  CycleDisplay,
  ToggleDynamicAdjustment,
}

/// Key bindings; override the resource to rebind.
#[derive(Resource, Debug, Clone)]
pub struct ImpostorShortcuts {
  pub increase: KeyCode,
  pub decrease: KeyCode,
  pub cycle_display: KeyCode,
  pub toggle_dynamic: KeyCode,
}

impl Default for ImpostorShortcuts {
  fn default() -> Self {
    Self {
      increase: KeyCode::KeyZ,
      decrease: KeyCode::KeyX,
      cycle_display: KeyCode::Tab,
      toggle_dynamic: KeyCode::KeyL,
    }
  }
}

impl ImpostorShortcuts {
  /// Actions whose key was pressed this frame, in binding order.
  pub fn actions(&self, keys: &ButtonInput<KeyCode>) -> SmallVec<[ShortcutAction; 4]> {
    let mut actions = SmallVec::new();
    if keys.just_pressed(self.increase) {
      actions.push(ShortcutAction::ScaleDistances(INCREASE_FACTOR));
    }
    if keys.just_pressed(self.decrease) {
      actions.push(ShortcutAction::ScaleDistances(DECREASE_FACTOR));
    }
    if keys.just_pressed(self.cycle_display) {
      actions.push(ShortcutAction::CycleDisplay);
    }
    if keys.just_pressed(self.toggle_dynamic) {
      actions.push(ShortcutAction::ToggleDynamicAdjustment);
    }
    actions
  }
}

/// Apply one action to the engine.
pub fn apply_shortcut(state: &mut ImpostorState, action: ShortcutAction) {
  let engine = &mut state.engine;
  match action {
    ShortcutAction::ScaleDistances(factor) => {
      if let Err(err) = engine.scale_lod_distances(factor) {
        warn!("Could not scale LOD distances: {err}");
        return;
      }
      info!("LOD distances: {:?}", engine.settings().thresholds().as_slice());
    }
    ShortcutAction::CycleDisplay => {
      engine.cycle_display_mode();
    }
    ShortcutAction::ToggleDynamicAdjustment => {
      let enabled = !engine.settings().dynamic_adjustment();
      engine.set_dynamic_adjustment(enabled);
      info!("Dynamic LOD adjustment: {}", if enabled { "on" } else { "off" });
    }
  }
}

/// System: translate key presses into operator controls.
pub fn handle_impostor_shortcuts(
  keys: Res<ButtonInput<KeyCode>>,
  shortcuts: Res<ImpostorShortcuts>,
  state: Option<ResMut<ImpostorState>>,
) {
  let Some(mut state) = state else {
    return;
  };
  for action in shortcuts.actions(&keys) {
    apply_shortcut(&mut state, action);
  }
}
