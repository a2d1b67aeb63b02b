//! Per-frame animation playback

use tracing::{debug, warn};

use crate::model::Model;

/// Playback state of one animation
///
/// Playback loops once started; there is no finished state.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing { time: f32 },
}

/// Drives the animations of one [`Model`] from frame deltas
#[derive(Debug, Clone)]
pub struct Animator {
    states: Vec<PlaybackState>,
    speed: f32,
}

impl Animator {
    /// An animator with every animation of `model` stopped
    pub fn new(model: &Model) -> Self {
        Self {
            states: vec![PlaybackState::Stopped; model.animations().len()],
            speed: 1.0,
        }
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Playback speed multiplier; negative values are treated as zero
    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed.max(0.0);
    }

    /// Start animation `index` from time zero
    ///
    /// Restarts it if already playing. Returns `false` for an unknown index.
    pub fn play(&mut self, index: usize) -> bool {
        let Some(state) = self.states.get_mut(index) else {
            warn!("No animation with index {}", index);
            return false;
        };
        *state = PlaybackState::Playing { time: 0.0 };
        debug!("Playing animation {}", index);
        true
    }

    pub fn stop(&mut self, index: usize) {
        if let Some(state) = self.states.get_mut(index) {
            *state = PlaybackState::Stopped;
        }
    }

    pub fn stop_all(&mut self) {
        self.states.fill(PlaybackState::Stopped);
    }

    pub fn state(&self, index: usize) -> PlaybackState {
        self.states.get(index).copied().unwrap_or_default()
    }

    pub fn is_playing(&self, index: usize) -> bool {
        matches!(self.state(index), PlaybackState::Playing { .. })
    }

    /// Current playback time, `None` when stopped
    pub fn time(&self, index: usize) -> Option<f32> {
        match self.state(index) {
            PlaybackState::Playing { time } => Some(time),
            PlaybackState::Stopped => None,
        }
    }

    /// Advance every playing animation by `dt` seconds and refresh the pose
    ///
    /// Channels of all playing animations are applied before world and joint
    /// matrices are recomputed once. Returns the number of animations applied.
    pub fn advance(&mut self, model: &mut Model, dt: f32) -> usize {
        let step = (dt * self.speed).max(0.0);
        let mut applied = 0;

        for (index, state) in self.states.iter_mut().enumerate() {
            let PlaybackState::Playing { time } = state else {
                continue;
            };
            let Some(animation) = model.animations().get(index) else {
                continue;
            };
            *time = animation.wrap_time(*time + step);
            if model.apply_animation(index, *time) {
                applied += 1;
            }
        }

        if applied > 0 {
            model.update_pose();
        }
        applied
    }
}
