//! Transform and skinning evaluation
//!
//! Sampling writes translation/rotation/scale into the target nodes; world and
//! joint matrices are only refreshed by [`Model::update_pose`].

use glam::Quat;
use tracing::warn;

use crate::animation::Path;
use crate::model::Model;

impl Model {
    /// Write the pose of animation `index` at `time` into its target nodes
    ///
    /// `time` is used as given (no wrapping). World and joint matrices are left
    /// stale until [`Model::update_pose`]. Returns `false` for an unknown index.
    pub fn apply_animation(&mut self, index: usize, time: f32) -> bool {
        let Some(animation) = self.animations.get(index) else {
            warn!("No animation with index {}", index);
            return false;
        };

        for channel in &animation.channels {
            let Some(sampler) = animation.samplers.get(channel.sampler) else {
                continue;
            };
            let Some(value) = sampler.sample(time, channel.path, self.cubic_spline) else {
                continue;
            };

            let node = self.graph.node_mut(channel.node);
            match channel.path {
                Path::Translation => node.translation = value.truncate(),
                Path::Rotation => node.rotation = Quat::from_vec4(value),
                Path::Scale => node.scale = value.truncate(),
            }
        }
        true
    }

    /// Evaluate animation `index` at `time` and refresh the whole pose
    ///
    /// `time` wraps into the animation's range (`t -= end` while `t > end`), so
    /// evaluating past the end continues from the start of the loop.
    pub fn evaluate_animation(&mut self, index: usize, time: f32) -> bool {
        let Some(time) = self.animations.get(index).map(|a| a.wrap_time(time)) else {
            warn!("No animation with index {}", index);
            return false;
        };
        self.apply_animation(index, time);
        self.update_pose();
        true
    }
}
