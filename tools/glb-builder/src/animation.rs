//! Animation track construction

use crate::buffer::{AccessorIndex, BufferBuilder};
use gltf_json::animation::{Interpolation, Property};

/// One sampler/channel pair targeting a single node property
#[derive(Debug, Clone)]
pub struct Track {
    pub node: u32,
    pub path: Property,
    pub interpolation: Interpolation,
    pub times: AccessorIndex,
    pub values: AccessorIndex,
}

impl Track {
    /// Linear track from already packed keyframe times and values
    pub fn linear(node: u32, path: Property, times: AccessorIndex, values: AccessorIndex) -> Self {
        Self {
            node,
            path,
            interpolation: Interpolation::Linear,
            times,
            values,
        }
    }

    /// Change the interpolation mode
    pub fn interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }
}

/// Accessor indices for per-bone animation data; bones without a track are `None`
#[derive(Debug, Clone)]
pub struct AnimationAccessors {
    pub times: AccessorIndex,
    pub translations: Vec<Option<AccessorIndex>>,
    pub rotations: Vec<Option<AccessorIndex>>,
    pub scales: Vec<Option<AccessorIndex>>,
}

impl AnimationAccessors {
    /// Linear tracks for every packed bone property, bone `i` animating `bone_nodes[i]`
    pub fn tracks(&self, bone_nodes: &[u32]) -> Vec<Track> {
        let mut tracks = Vec::new();
        for (bone, &node) in bone_nodes.iter().enumerate() {
            let properties = [
                (Property::Translation, self.translations.get(bone)),
                (Property::Rotation, self.rotations.get(bone)),
                (Property::Scale, self.scales.get(bone)),
            ];
            for (path, values) in properties {
                if let Some(Some(values)) = values {
                    tracks.push(Track::linear(node, path, self.times, *values));
                }
            }
        }
        tracks
    }
}

/// Builder for per-bone keyframe tracks sharing one time base
pub struct AnimationBuilder {
    times: Vec<f32>,
    translations: Vec<Vec<[f32; 3]>>,
    rotations: Vec<Vec<[f32; 4]>>,
    scales: Vec<Vec<[f32; 3]>>,
}

impl AnimationBuilder {
    /// Create new animation builder with specified bone count
    pub fn new(bone_count: usize) -> Self {
        Self {
            times: Vec::new(),
            translations: vec![Vec::new(); bone_count],
            rotations: vec![Vec::new(); bone_count],
            scales: vec![Vec::new(); bone_count],
        }
    }

    /// Set animation times (keyframes)
    pub fn times(mut self, times: &[f32]) -> Self {
        self.times = times.to_vec();
        self
    }

    /// Set translation track for a specific bone
    pub fn bone_translations(mut self, bone_idx: usize, translations: &[[f32; 3]]) -> Self {
        self.translations[bone_idx] = translations.to_vec();
        self
    }

    /// Set rotation track for a specific bone (x, y, z, w)
    pub fn bone_rotations(mut self, bone_idx: usize, rotations: &[[f32; 4]]) -> Self {
        self.rotations[bone_idx] = rotations.to_vec();
        self
    }

    /// Set scale track for a specific bone
    pub fn bone_scales(mut self, bone_idx: usize, scales: &[[f32; 3]]) -> Self {
        self.scales[bone_idx] = scales.to_vec();
        self
    }

    /// Get bone count
    pub fn bone_count(&self) -> usize {
        self.translations.len()
    }

    /// Build and pack into buffer; empty tracks are left out
    pub fn build(self, buffer: &mut BufferBuilder) -> AnimationAccessors {
        let times = buffer.pack_scalars_with_bounds(&self.times);

        AnimationAccessors {
            times,
            translations: self
                .translations
                .iter()
                .map(|t| (!t.is_empty()).then(|| buffer.pack_vec3(t)))
                .collect(),
            rotations: self
                .rotations
                .iter()
                .map(|r| (!r.is_empty()).then(|| buffer.pack_vec4(r)))
                .collect(),
            scales: self
                .scales
                .iter()
                .map(|s| (!s.is_empty()).then(|| buffer.pack_vec3(s)))
                .collect(),
        }
    }
}
