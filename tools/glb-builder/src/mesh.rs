//! High-level mesh construction

use crate::buffer::{AccessorIndex, BufferBuilder};

/// Accessor indices for one mesh primitive
#[derive(Debug, Clone)]
pub struct MeshAccessors {
    pub positions: AccessorIndex,
    pub normals: Option<AccessorIndex>,
    pub uvs: Option<AccessorIndex>,
    pub colors: Option<AccessorIndex>,
    pub joints: Option<AccessorIndex>,
    pub weights: Option<AccessorIndex>,
    pub tangents: Option<AccessorIndex>,
    pub indices: Option<AccessorIndex>,
    pub material: Option<u32>,
}

#[derive(Debug, Clone)]
enum Colors {
    Rgb(Vec<[f32; 3]>),
    Rgba(Vec<[f32; 4]>),
    Unorm8(Vec<[u8; 4]>),
}

#[derive(Debug, Clone)]
enum Joints {
    U8(Vec<[u8; 4]>),
    U16(Vec<[u16; 4]>),
}

#[derive(Debug, Clone)]
enum Indices {
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
}

/// Builder for mesh data
pub struct MeshBuilder {
    positions: Vec<[f32; 3]>,
    normals: Option<Vec<[f32; 3]>>,
    uvs: Option<Vec<[f32; 2]>>,
    uv_stride: Option<usize>,
    colors: Option<Colors>,
    joints: Option<Joints>,
    weights: Option<Vec<[f32; 4]>>,
    tangents: Option<Vec<[f32; 4]>>,
    indices: Option<Indices>,
    material: Option<u32>,
}

impl MeshBuilder {
    pub fn new() -> Self {
        Self {
            positions: Vec::new(),
            normals: None,
            uvs: None,
            uv_stride: None,
            colors: None,
            joints: None,
            weights: None,
            tangents: None,
            indices: None,
            material: None,
        }
    }

    /// Set positions (required)
    pub fn positions(mut self, positions: &[[f32; 3]]) -> Self {
        self.positions = positions.to_vec();
        self
    }

    /// Set normals (optional)
    pub fn normals(mut self, normals: &[[f32; 3]]) -> Self {
        self.normals = Some(normals.to_vec());
        self
    }

    /// Set UVs (optional)
    pub fn uvs(mut self, uvs: &[[f32; 2]]) -> Self {
        self.uvs = Some(uvs.to_vec());
        self
    }

    /// Store UVs in an interleaved-style view with `stride` bytes per element
    pub fn uv_stride(mut self, stride: usize) -> Self {
        self.uv_stride = Some(stride);
        self
    }

    /// Set RGBA vertex colors (optional)
    pub fn colors(mut self, colors: &[[f32; 4]]) -> Self {
        self.colors = Some(Colors::Rgba(colors.to_vec()));
        self
    }

    /// Set RGB vertex colors (optional)
    pub fn colors_rgb(mut self, colors: &[[f32; 3]]) -> Self {
        self.colors = Some(Colors::Rgb(colors.to_vec()));
        self
    }

    /// Set normalized 8-bit RGBA vertex colors (optional)
    pub fn colors_unorm8(mut self, colors: &[[u8; 4]]) -> Self {
        self.colors = Some(Colors::Unorm8(colors.to_vec()));
        self
    }

    /// Set joint indices (optional, for skinned meshes)
    pub fn joints(mut self, joints: &[[u8; 4]]) -> Self {
        self.joints = Some(Joints::U8(joints.to_vec()));
        self
    }

    /// Set 16-bit joint indices (optional, for skinned meshes)
    pub fn joints_u16(mut self, joints: &[[u16; 4]]) -> Self {
        self.joints = Some(Joints::U16(joints.to_vec()));
        self
    }

    /// Set joint weights (optional, for skinned meshes)
    pub fn weights(mut self, weights: &[[f32; 4]]) -> Self {
        self.weights = Some(weights.to_vec());
        self
    }

    /// Set tangents with handedness in w (optional)
    pub fn tangents(mut self, tangents: &[[f32; 4]]) -> Self {
        self.tangents = Some(tangents.to_vec());
        self
    }

    /// Set u16 indices (optional)
    pub fn indices(mut self, indices: &[u16]) -> Self {
        self.indices = Some(Indices::U16(indices.to_vec()));
        self
    }

    /// Set u8 indices (optional)
    pub fn indices_u8(mut self, indices: &[u8]) -> Self {
        self.indices = Some(Indices::U8(indices.to_vec()));
        self
    }

    /// Set u32 indices (optional)
    pub fn indices_u32(mut self, indices: &[u32]) -> Self {
        self.indices = Some(Indices::U32(indices.to_vec()));
        self
    }

    /// Reference a material by document index (optional)
    pub fn material(mut self, index: u32) -> Self {
        self.material = Some(index);
        self
    }

    /// Build and pack into buffer
    pub fn build(self, buffer: &mut BufferBuilder) -> MeshAccessors {
        let positions = buffer.pack_positions(&self.positions);
        let normals = self.normals.as_ref().map(|n| buffer.pack_vec3(n));
        let uvs = self.uvs.as_ref().map(|uv| match self.uv_stride {
            Some(stride) => buffer.pack_vec2_strided(uv, stride),
            None => buffer.pack_vec2(uv),
        });
        let colors = self.colors.as_ref().map(|c| match c {
            Colors::Rgb(c) => buffer.pack_vec3(c),
            Colors::Rgba(c) => buffer.pack_vec4(c),
            Colors::Unorm8(c) => buffer.pack_vec4_unorm8(c),
        });
        let joints = self.joints.as_ref().map(|j| match j {
            Joints::U8(j) => buffer.pack_joints(j),
            Joints::U16(j) => buffer.pack_joints_u16(j),
        });
        let weights = self.weights.as_ref().map(|w| buffer.pack_vec4(w));
        let tangents = self.tangents.as_ref().map(|t| buffer.pack_vec4(t));
        let indices = self.indices.as_ref().map(|i| match i {
            Indices::U8(i) => buffer.pack_indices_u8(i),
            Indices::U16(i) => buffer.pack_indices_u16(i),
            Indices::U32(i) => buffer.pack_indices_u32(i),
        });

        MeshAccessors {
            positions,
            normals,
            uvs,
            colors,
            joints,
            weights,
            tangents,
            indices,
            material: self.material,
        }
    }
}

impl Default for MeshBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mesh_builder_basic() {
        let mut buffer = BufferBuilder::new();
        let mesh = MeshBuilder::new()
            .positions(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.5, 1.0, 0.0]])
            .normals(&[[0.0, 0.0, 1.0]; 3])
            .indices(&[0, 1, 2])
            .build(&mut buffer);

        assert_eq!(mesh.positions, AccessorIndex(0));
        assert_eq!(mesh.normals, Some(AccessorIndex(1)));
        assert_eq!(mesh.indices, Some(AccessorIndex(2)));
        assert!(mesh.uvs.is_none());
        assert!(mesh.colors.is_none());
        assert!(mesh.material.is_none());
    }

    #[test]
    fn test_mesh_builder_skinned() {
        let mut buffer = BufferBuilder::new();
        let mesh = MeshBuilder::new()
            .positions(&[[0.0, 0.0, 0.0]])
            .joints_u16(&[[0, 300, 0, 0]])
            .weights(&[[1.0, 0.0, 0.0, 0.0]])
            .build(&mut buffer);

        assert!(mesh.joints.is_some());
        assert!(mesh.weights.is_some());
    }

    #[test]
    fn test_index_width_follows_setter() {
        let mut buffer = BufferBuilder::new();
        let mesh = MeshBuilder::new()
            .positions(&[[0.0; 3]; 3])
            .indices_u32(&[0, 1, 2])
            .material(2)
            .build(&mut buffer);

        let indices = mesh.indices.unwrap();
        let accessor = &buffer.accessors()[indices.0 as usize];
        assert_eq!(accessor.count.0, 3);
        assert_eq!(mesh.material, Some(2));
    }
}
