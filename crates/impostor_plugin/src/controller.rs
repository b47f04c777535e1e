//! Frame-rate driven detail controller.
//!
//! Samples frame times over a window. While the target frame rate is not
//! met it shrinks every LOD distance and re-checks after a short window;
//! once the target is met it only re-checks every `max_window` seconds.
//! It never widens distances again, so it cannot oscillate.

use crate::config::ControllerConfig;
use crate::lod::DetailSettings;

/// Result of one completed sample window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Evaluation {
  /// Frame rate below target; thresholds were scaled down.
  Degraded { observed_rate: f32 },
  /// Frame rate at or above target; thresholds unchanged.
  Satisfied { observed_rate: f32 },
}

impl Evaluation {
  #[inline]
  pub fn observed_rate(&self) -> f32 {
    match *self {
      Evaluation::Degraded { observed_rate } | Evaluation::Satisfied { observed_rate } => {
        observed_rate
      }
    }
  }
}

/// Rolling frame-rate sampler writing into `DetailSettings`.
#[derive(Clone, Debug)]
pub struct AdaptiveDetailController {
  config: ControllerConfig,
  samples: u32,
  accumulated: f32,
  window: f32,
}

impl AdaptiveDetailController {
  pub fn new(config: ControllerConfig) -> Self {
    let window = config.initial_window;
    Self {
      config,
      samples: 0,
      accumulated: 0.0,
      window,
    }
  }

  /// Current sample window in seconds.
  #[inline]
  pub fn window(&self) -> f32 {
    self.window
  }

  #[inline]
  pub fn samples(&self) -> u32 {
    self.samples
  }

  #[inline]
  pub fn accumulated_time(&self) -> f32 {
    self.accumulated
  }

  /// Drop any partially collected window, e.g. after re-enabling.
  pub fn reset(&mut self) {
    self.samples = 0;
    self.accumulated = 0.0;
    self.window = self.config.initial_window;
  }

  /// Record one rendered frame.
  ///
  /// Does nothing while `settings` has dynamic adjustment disabled, so a
  /// manual override is never undone by the controller.
  pub fn tick(
    &mut self,
    delta_time: f32,
    target_frame_rate: f32,
    settings: &mut DetailSettings,
  ) -> Option<Evaluation> {
    if !settings.dynamic_adjustment() {
      return None;
    }

    self.accumulated += delta_time;
    self.samples += 1;
    if self.accumulated <= self.window {
      return None;
    }

    let observed_rate = self.samples as f32 / self.accumulated;
    let evaluation = if observed_rate < target_frame_rate {
      settings.degrade(self.config.degrade_factor);
      self.window = self.config.initial_window;
      tracing::info!(
        observed_rate,
        target_frame_rate,
        first_distance = settings.thresholds().as_slice()[0],
        "frame rate too low, shrinking LOD distances"
      );
      Evaluation::Degraded { observed_rate }
    } else {
      if self.window < self.config.max_window {
        tracing::info!(observed_rate, target_frame_rate, "target frame rate achieved");
      }
      self.window = self.config.max_window;
      Evaluation::Satisfied { observed_rate }
    };

    self.samples = 0;
    self.accumulated = 0.0;
    Some(evaluation)
  }
}

#[cfg(test)]
#[path = "controller_test.rs"]
mod controller_test;
