//! Low-level buffer packing with automatic alignment and accessor creation

use crate::utils::{align_buffer, compute_bounds};
use gltf_json as json;
use gltf_json::accessor::{ComponentType, Type};
use gltf_json::validation::Checked::Valid;

/// Accessor index returned by buffer operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessorIndex(pub u32);

impl AccessorIndex {
    pub fn as_json_index(&self) -> json::Index<json::Accessor> {
        json::Index::new(self.0)
    }
}

/// Layout of one packed accessor
struct Packed {
    count: usize,
    component_type: ComponentType,
    type_: Type,
    target: Option<json::buffer::Target>,
    byte_stride: Option<usize>,
    normalized: bool,
    min: Option<json::Value>,
    max: Option<json::Value>,
}

impl Packed {
    fn new(count: usize, component_type: ComponentType, type_: Type) -> Self {
        Self {
            count,
            component_type,
            type_,
            target: None,
            byte_stride: None,
            normalized: false,
            min: None,
            max: None,
        }
    }

    fn target(mut self, target: json::buffer::Target) -> Self {
        self.target = Some(target);
        self
    }
}

/// Builder for binary buffer with automatic alignment
pub struct BufferBuilder {
    buffer: Vec<u8>,
    views: Vec<json::buffer::View>,
    accessors: Vec<json::Accessor>,
}

impl BufferBuilder {
    /// Create a new empty buffer builder
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            views: Vec::new(),
            accessors: Vec::new(),
        }
    }

    /// Get the current accessor count
    pub fn accessor_count(&self) -> u32 {
        self.accessors.len() as u32
    }

    /// Get next accessor index (without creating it)
    pub fn next_accessor_index(&self) -> AccessorIndex {
        AccessorIndex(self.accessor_count())
    }

    /// Get the binary buffer data
    pub fn data(&self) -> &[u8] {
        &self.buffer
    }

    /// Get the buffer views
    pub fn views(&self) -> &[json::buffer::View] {
        &self.views
    }

    /// Get the accessors
    pub fn accessors(&self) -> &[json::Accessor] {
        &self.accessors
    }

    /// Mutable access to an accessor, for fixtures that need malformed data
    pub fn accessor_mut(&mut self, index: AccessorIndex) -> &mut json::Accessor {
        &mut self.accessors[index.0 as usize]
    }

    /// Mutable access to a buffer view, for fixtures that need malformed data
    pub fn view_mut(&mut self, index: u32) -> &mut json::buffer::View {
        &mut self.views[index as usize]
    }

    /// Append `bytes` as one buffer view with one accessor over it
    fn push(&mut self, bytes: &[u8], packed: Packed) -> AccessorIndex {
        let offset = self.buffer.len();
        self.buffer.extend_from_slice(bytes);

        self.views.push(json::buffer::View {
            buffer: json::Index::new(0),
            byte_length: bytes.len().into(),
            byte_offset: Some((offset as u64).into()),
            byte_stride: packed.byte_stride.map(json::buffer::Stride),
            extensions: Default::default(),
            extras: Default::default(),
            name: None,
            target: packed.target.map(Valid),
        });

        let accessor_idx = self.accessors.len() as u32;
        self.accessors.push(json::Accessor {
            buffer_view: Some(json::Index::new(self.views.len() as u32 - 1)),
            byte_offset: Some(0u64.into()),
            count: packed.count.into(),
            component_type: Valid(json::accessor::GenericComponentType(packed.component_type)),
            extensions: Default::default(),
            extras: Default::default(),
            type_: Valid(packed.type_),
            min: packed.min,
            max: packed.max,
            name: None,
            normalized: packed.normalized,
            sparse: None,
        });

        align_buffer(&mut self.buffer);
        AccessorIndex(accessor_idx)
    }

    fn floats<const N: usize>(data: &[[f32; N]]) -> Vec<u8> {
        data.iter()
            .flat_map(|item| item.iter().flat_map(|f| f.to_le_bytes()))
            .collect()
    }

    /// Pack Vec3 positions with bounds calculation
    pub fn pack_positions(&mut self, positions: &[[f32; 3]]) -> AccessorIndex {
        let (min, max) = compute_bounds(positions);
        let mut packed = Packed::new(positions.len(), ComponentType::F32, Type::Vec3)
            .target(json::buffer::Target::ArrayBuffer);
        packed.min = Some(json::Value::Array(
            min.into_iter().map(json::Value::from).collect(),
        ));
        packed.max = Some(json::Value::Array(
            max.into_iter().map(json::Value::from).collect(),
        ));
        self.push(&Self::floats(positions), packed)
    }

    /// Pack Vec3 data (normals, RGB colors, translations, scales, etc.)
    pub fn pack_vec3(&mut self, data: &[[f32; 3]]) -> AccessorIndex {
        let packed = Packed::new(data.len(), ComponentType::F32, Type::Vec3)
            .target(json::buffer::Target::ArrayBuffer);
        self.push(&Self::floats(data), packed)
    }

    /// Pack Vec2 data (UVs, etc.)
    pub fn pack_vec2(&mut self, data: &[[f32; 2]]) -> AccessorIndex {
        let packed = Packed::new(data.len(), ComponentType::F32, Type::Vec2)
            .target(json::buffer::Target::ArrayBuffer);
        self.push(&Self::floats(data), packed)
    }

    /// Pack Vec2 data with `stride` bytes between elements (padding zero-filled)
    pub fn pack_vec2_strided(&mut self, data: &[[f32; 2]], stride: usize) -> AccessorIndex {
        assert!(stride >= 8 && stride % 4 == 0, "stride must fit a vec2 and be 4-aligned");
        let mut bytes = Vec::with_capacity(data.len() * stride);
        for item in data {
            bytes.extend(item.iter().flat_map(|f| f.to_le_bytes()));
            bytes.resize(bytes.len() + stride - 8, 0);
        }
        let mut packed = Packed::new(data.len(), ComponentType::F32, Type::Vec2)
            .target(json::buffer::Target::ArrayBuffer);
        packed.byte_stride = Some(stride);
        self.push(&bytes, packed)
    }

    /// Pack Vec4 data (colors, rotations, weights, etc.)
    pub fn pack_vec4(&mut self, data: &[[f32; 4]]) -> AccessorIndex {
        let packed = Packed::new(data.len(), ComponentType::F32, Type::Vec4)
            .target(json::buffer::Target::ArrayBuffer);
        self.push(&Self::floats(data), packed)
    }

    /// Pack normalized Vec4<u8> data (8-bit colors or weights)
    pub fn pack_vec4_unorm8(&mut self, data: &[[u8; 4]]) -> AccessorIndex {
        let mut packed = Packed::new(data.len(), ComponentType::U8, Type::Vec4)
            .target(json::buffer::Target::ArrayBuffer);
        packed.normalized = true;
        self.push(&data.concat(), packed)
    }

    /// Pack joint indices (Vec4<u8>)
    pub fn pack_joints(&mut self, joints: &[[u8; 4]]) -> AccessorIndex {
        let packed = Packed::new(joints.len(), ComponentType::U8, Type::Vec4)
            .target(json::buffer::Target::ArrayBuffer);
        self.push(&joints.concat(), packed)
    }

    /// Pack joint indices (Vec4<u16>)
    pub fn pack_joints_u16(&mut self, joints: &[[u16; 4]]) -> AccessorIndex {
        let bytes: Vec<u8> = joints
            .iter()
            .flat_map(|j| j.iter().flat_map(|i| i.to_le_bytes()))
            .collect();
        let packed = Packed::new(joints.len(), ComponentType::U16, Type::Vec4)
            .target(json::buffer::Target::ArrayBuffer);
        self.push(&bytes, packed)
    }

    /// Pack u8 indices
    pub fn pack_indices_u8(&mut self, indices: &[u8]) -> AccessorIndex {
        let packed = Packed::new(indices.len(), ComponentType::U8, Type::Scalar)
            .target(json::buffer::Target::ElementArrayBuffer);
        self.push(indices, packed)
    }

    /// Pack u16 indices
    pub fn pack_indices_u16(&mut self, indices: &[u16]) -> AccessorIndex {
        let bytes: Vec<u8> = indices.iter().flat_map(|i| i.to_le_bytes()).collect();
        let packed = Packed::new(indices.len(), ComponentType::U16, Type::Scalar)
            .target(json::buffer::Target::ElementArrayBuffer);
        self.push(&bytes, packed)
    }

    /// Pack u32 indices
    pub fn pack_indices_u32(&mut self, indices: &[u32]) -> AccessorIndex {
        let bytes: Vec<u8> = indices.iter().flat_map(|i| i.to_le_bytes()).collect();
        let packed = Packed::new(indices.len(), ComponentType::U32, Type::Scalar)
            .target(json::buffer::Target::ElementArrayBuffer);
        self.push(&bytes, packed)
    }

    /// Pack f32 scalars declared as an index buffer (invalid on purpose)
    pub fn pack_indices_f32(&mut self, indices: &[f32]) -> AccessorIndex {
        let bytes: Vec<u8> = indices.iter().flat_map(|i| i.to_le_bytes()).collect();
        let packed = Packed::new(indices.len(), ComponentType::F32, Type::Scalar)
            .target(json::buffer::Target::ElementArrayBuffer);
        self.push(&bytes, packed)
    }

    /// Pack Mat4 data (inverse bind matrices, etc.)
    pub fn pack_mat4(&mut self, matrices: &[[f32; 16]]) -> AccessorIndex {
        let packed = Packed::new(matrices.len(), ComponentType::F32, Type::Mat4);
        self.push(&Self::floats(matrices), packed)
    }

    /// Pack scalar f32 data with min/max (animation times, etc.)
    pub fn pack_scalars_with_bounds(&mut self, scalars: &[f32]) -> AccessorIndex {
        let min_val = scalars.iter().copied().fold(f32::INFINITY, f32::min) as f64;
        let max_val = scalars.iter().copied().fold(f32::NEG_INFINITY, f32::max) as f64;

        let bytes: Vec<u8> = scalars.iter().flat_map(|s| s.to_le_bytes()).collect();
        let mut packed = Packed::new(scalars.len(), ComponentType::F32, Type::Scalar);
        packed.min = Some(json::Value::Array(vec![json::Value::from(min_val)]));
        packed.max = Some(json::Value::Array(vec![json::Value::from(max_val)]));
        self.push(&bytes, packed)
    }
}

impl Default for BufferBuilder {
    fn default() -> Self {
        Self::new()
    }
}
