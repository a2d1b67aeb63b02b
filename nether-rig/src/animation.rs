//! Animation track store and keyframe sampling

use glam::{Quat, Vec4};
use gltf::json;
use gltf::json::validation::Checked;
use tracing::debug;

use crate::accessor::ElementType;
use crate::container::Container;
use crate::error::{Diagnostics, LoadError, ReferenceKind, Result};
use crate::options::CubicSplineMode;
use crate::scene::{NodeId, SceneGraph};

/// Keyframe interpolation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    Linear,
    Step,
    CubicSpline,
}

/// Node property driven by a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Path {
    Translation,
    Rotation,
    Scale,
}

/// A keyframe track
///
/// Outputs are vec4-packed; 3-component values carry a zero `w`. For
/// CUBICSPLINE each keyframe owns three outputs: in-tangent, value, out-tangent.
#[derive(Debug, Clone, PartialEq)]
pub struct Sampler {
    pub interpolation: Interpolation,
    pub inputs: Vec<f32>,
    pub outputs: Vec<Vec4>,
}

/// Binds one sampler to one node property
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Channel {
    pub path: Path,
    pub node: NodeId,
    pub sampler: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Animation {
    pub name: String,
    pub samplers: Vec<Sampler>,
    pub channels: Vec<Channel>,
    /// Earliest keyframe time over all samplers
    pub start: f32,
    /// Latest keyframe time over all samplers
    pub end: f32,
}

impl Animation {
    /// Fold `time` into the playback range: `t -= end` while `t > end`
    pub fn wrap_time(&self, time: f32) -> f32 {
        if self.end <= 0.0 || time <= self.end {
            return time;
        }
        let wrapped = time % self.end;
        if wrapped == 0.0 { self.end } else { wrapped }
    }

    pub fn duration(&self) -> f32 {
        self.end - self.start
    }
}

impl Sampler {
    fn keyframe_count(&self) -> usize {
        self.inputs.len()
    }

    /// Whether outputs match the inputs for this interpolation mode
    pub fn is_well_formed(&self) -> bool {
        let n = self.keyframe_count();
        let expected = match self.interpolation {
            Interpolation::CubicSpline => n * 3,
            Interpolation::Linear | Interpolation::Step => n,
        };
        n > 0 && self.outputs.len() == expected
    }

    fn value(&self, keyframe: usize) -> Vec4 {
        match self.interpolation {
            Interpolation::CubicSpline => self.outputs[keyframe * 3 + 1],
            Interpolation::Linear | Interpolation::Step => self.outputs[keyframe],
        }
    }

    /// Sample the track at `time`
    ///
    /// Times before the first or after the last keyframe clamp to that keyframe.
    /// Returns `None` for malformed tracks.
    pub fn sample(&self, time: f32, path: Path, cubic: CubicSplineMode) -> Option<Vec4> {
        if !self.is_well_formed() {
            return None;
        }
        let last = self.keyframe_count() - 1;
        if last == 0 || time <= self.inputs[0] {
            return Some(self.value(0));
        }
        if time >= self.inputs[last] {
            return Some(self.value(last));
        }

        let i = self
            .inputs
            .windows(2)
            .position(|w| time >= w[0] && time <= w[1])?;
        let (t0, t1) = (self.inputs[i], self.inputs[i + 1]);
        let dt = t1 - t0;
        let u = if dt > 0.0 {
            ((time - t0) / dt).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let mode = match (self.interpolation, cubic) {
            (Interpolation::CubicSpline, CubicSplineMode::Hermite) => Interpolation::CubicSpline,
            (Interpolation::CubicSpline, CubicSplineMode::Linear) => Interpolation::Linear,
            (Interpolation::CubicSpline, CubicSplineMode::Step) => Interpolation::Step,
            (other, _) => other,
        };

        let (a, b) = (self.value(i), self.value(i + 1));
        let value = match mode {
            Interpolation::Step => {
                if u >= 1.0 {
                    b
                } else {
                    a
                }
            }
            Interpolation::Linear => match path {
                Path::Rotation => Vec4::from(
                    Quat::from_vec4(a)
                        .normalize()
                        .slerp(Quat::from_vec4(b).normalize(), u)
                        .normalize(),
                ),
                Path::Translation | Path::Scale => a.lerp(b, u),
            },
            Interpolation::CubicSpline => {
                let out_tangent = self.outputs[i * 3 + 2] * dt;
                let in_tangent = self.outputs[(i + 1) * 3] * dt;
                let (u2, u3) = (u * u, u * u * u);
                let v = a * (2.0 * u3 - 3.0 * u2 + 1.0)
                    + out_tangent * (u3 - 2.0 * u2 + u)
                    + b * (-2.0 * u3 + 3.0 * u2)
                    + in_tangent * (u3 - u2);
                match path {
                    Path::Rotation => Vec4::from(Quat::from_vec4(v).normalize()),
                    Path::Translation | Path::Scale => v,
                }
            }
        };
        Some(value)
    }
}

fn load_sampler(
    container: &Container<'_>,
    animation: usize,
    index: usize,
    source: &json::animation::Sampler,
    diagnostics: &mut Diagnostics,
) -> Result<Sampler> {
    let inputs = container
        .accessor(source.input.value())?
        .read_scalars("animation input")?;
    if inputs.windows(2).any(|w| w[1] < w[0]) {
        diagnostics.warn(LoadError::UnsortedKeyframes {
            animation,
            sampler: index,
        });
    }

    let output = container.accessor(source.output.value())?;
    let outputs = match output.element_type() {
        ElementType::Vec3 | ElementType::Vec4 => output
            .read_vec3_or_vec4("animation output", true, 0.0)?
            .into_iter()
            .map(Vec4::from_array)
            .collect(),
        // Morph target weights and the like: the channel using it is skipped
        other => {
            debug!(
                "Animation {} sampler {}: ignoring {} outputs",
                animation, index, other
            );
            Vec::new()
        }
    };

    let interpolation = match source.interpolation {
        Checked::Valid(json::animation::Interpolation::Step) => Interpolation::Step,
        Checked::Valid(json::animation::Interpolation::CubicSpline) => Interpolation::CubicSpline,
        _ => Interpolation::Linear,
    };

    Ok(Sampler {
        interpolation,
        inputs,
        outputs,
    })
}

/// Parse every container animation, dropping channels that cannot be applied
pub(crate) fn load_animations(
    container: &Container<'_>,
    graph: &SceneGraph,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<Animation>> {
    let mut animations = Vec::with_capacity(container.root().animations.len());

    for (index, source) in container.root().animations.iter().enumerate() {
        let samplers = source
            .samplers
            .iter()
            .enumerate()
            .map(|(s, sampler)| load_sampler(container, index, s, sampler, diagnostics))
            .collect::<Result<Vec<_>>>()?;

        let mut channels = Vec::with_capacity(source.channels.len());
        for (c, channel) in source.channels.iter().enumerate() {
            let path = match channel.target.path {
                Checked::Valid(json::animation::Property::Translation) => Path::Translation,
                Checked::Valid(json::animation::Property::Rotation) => Path::Rotation,
                Checked::Valid(json::animation::Property::Scale) => Path::Scale,
                Checked::Valid(json::animation::Property::MorphTargetWeights) => {
                    diagnostics.warn(LoadError::UnsupportedChannelPath {
                        animation: index,
                        channel: c,
                        path: "weights".to_string(),
                    });
                    continue;
                }
                Checked::Invalid => {
                    diagnostics.warn(LoadError::UnsupportedChannelPath {
                        animation: index,
                        channel: c,
                        path: "unknown".to_string(),
                    });
                    continue;
                }
            };

            let sampler = channel.sampler.value();
            if sampler >= samplers.len() {
                diagnostics.unresolved(
                    ReferenceKind::ChannelSampler,
                    sampler,
                    format!("animation {index} channel {c}"),
                )?;
                continue;
            }

            let target = channel.target.node.value();
            let Some(node) = graph.lookup(target) else {
                diagnostics.unresolved(
                    ReferenceKind::ChannelTarget,
                    target,
                    format!("animation {index} channel {c}"),
                )?;
                continue;
            };

            channels.push(Channel {
                path,
                node,
                sampler,
            });
        }

        let (start, end) = samplers
            .iter()
            .flat_map(|s| s.inputs.iter().copied())
            .fold(None, |range: Option<(f32, f32)>, t| match range {
                Some((lo, hi)) => Some((lo.min(t), hi.max(t))),
                None => Some((t, t)),
            })
            .unwrap_or((0.0, 0.0));

        let name = match &source.name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => index.to_string(),
        };

        debug!(
            "Loaded animation {} '{}': {} channels, {:.3}..{:.3}s",
            index,
            name,
            channels.len(),
            start,
            end
        );

        animations.push(Animation {
            name,
            samplers,
            channels,
            start,
            end,
        });
    }

    Ok(animations)
}
