//! Byte accessor resolver
//!
//! Turns a typed accessor descriptor (component type, element type, count,
//! byte offset, optional stride) plus the raw bytes of its buffer into a
//! bounds-checked, borrowed read view. Elements are decoded straight out of the
//! borrowed slice into the caller's output, so the source buffer is never copied.
//!
//! All multi-byte components are decoded as little-endian regardless of the host.

use core::fmt;

use glam::Mat4;
use gltf::json;

use crate::error::{LoadError, Result};

/// Scalar storage type of an accessor component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentType {
    I8,
    U8,
    I16,
    U16,
    U32,
    F32,
}

impl ComponentType {
    /// Size of one component in bytes
    pub const fn size(self) -> usize {
        match self {
            Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::U32 | Self::F32 => 4,
        }
    }
}

impl From<json::accessor::ComponentType> for ComponentType {
    fn from(value: json::accessor::ComponentType) -> Self {
        use json::accessor::ComponentType as C;
        match value {
            C::I8 => Self::I8,
            C::U8 => Self::U8,
            C::I16 => Self::I16,
            C::U16 => Self::U16,
            C::U32 => Self::U32,
            C::F32 => Self::F32,
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::I8 => "int8",
            Self::U8 => "uint8",
            Self::I16 => "int16",
            Self::U16 => "uint16",
            Self::U32 => "uint32",
            Self::F32 => "float32",
        };
        f.write_str(name)
    }
}

/// Arity of an accessor element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
}

impl ElementType {
    /// Number of components per element
    pub const fn components(self) -> usize {
        match self {
            Self::Scalar => 1,
            Self::Vec2 => 2,
            Self::Vec3 => 3,
            Self::Vec4 | Self::Mat2 => 4,
            Self::Mat3 => 9,
            Self::Mat4 => 16,
        }
    }
}

impl From<json::accessor::Type> for ElementType {
    fn from(value: json::accessor::Type) -> Self {
        use json::accessor::Type as T;
        match value {
            T::Scalar => Self::Scalar,
            T::Vec2 => Self::Vec2,
            T::Vec3 => Self::Vec3,
            T::Vec4 => Self::Vec4,
            T::Mat2 => Self::Mat2,
            T::Mat3 => Self::Mat3,
            T::Mat4 => Self::Mat4,
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Scalar => "SCALAR",
            Self::Vec2 => "VEC2",
            Self::Vec3 => "VEC3",
            Self::Vec4 => "VEC4",
            Self::Mat2 => "MAT2",
            Self::Mat3 => "MAT3",
            Self::Mat4 => "MAT4",
        };
        f.write_str(name)
    }
}

/// Layout of an accessor inside its buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessorLayout {
    /// Accessor index in the container (for error reporting)
    pub index: usize,
    /// Offset of the first element from the start of `bytes`
    pub byte_offset: usize,
    /// Distance between consecutive elements; `None` = tightly packed
    pub byte_stride: Option<usize>,
    pub component_type: ComponentType,
    pub element_type: ElementType,
    pub count: usize,
    /// Integer components map to [0, 1] / [-1, 1]
    pub normalized: bool,
}

impl AccessorLayout {
    /// Size of one element in bytes
    pub const fn element_size(&self) -> usize {
        self.component_type.size() * self.element_type.components()
    }

    /// Stride actually used between elements
    pub fn stride(&self) -> usize {
        self.byte_stride.unwrap_or_else(|| self.element_size())
    }

    /// Bytes needed past `byte_offset` to hold every element
    ///
    /// Returns `None` on arithmetic overflow.
    pub fn required_len(&self) -> Option<usize> {
        if self.count == 0 {
            return Some(0);
        }
        self.stride()
            .checked_mul(self.count - 1)?
            .checked_add(self.element_size())
    }
}

/// Bounds-checked read view over accessor data
#[derive(Debug, Clone, Copy)]
pub struct AccessorView<'a> {
    layout: AccessorLayout,
    /// Starts at the first element; at least `layout.required_len()` long
    bytes: &'a [u8],
}

impl<'a> AccessorView<'a> {
    /// Resolve `layout` against `bytes`
    ///
    /// Fails with `TruncatedBuffer` if the last element would end past `bytes`.
    pub fn new(bytes: &'a [u8], layout: AccessorLayout) -> Result<Self> {
        let required = layout
            .required_len()
            .and_then(|len| len.checked_add(layout.byte_offset))
            .unwrap_or(usize::MAX);
        if required > bytes.len() {
            return Err(LoadError::TruncatedBuffer {
                accessor: layout.index,
                required,
                available: bytes.len(),
            });
        }
        Ok(Self {
            layout,
            bytes: &bytes[layout.byte_offset..required],
        })
    }

    pub fn layout(&self) -> &AccessorLayout {
        &self.layout
    }

    pub fn index(&self) -> usize {
        self.layout.index
    }

    pub fn count(&self) -> usize {
        self.layout.count
    }

    pub fn component_type(&self) -> ComponentType {
        self.layout.component_type
    }

    pub fn element_type(&self) -> ElementType {
        self.layout.element_type
    }

    /// Byte offset of component `component` of element `element` within `bytes`
    fn offset_of(&self, element: usize, component: usize) -> usize {
        element * self.layout.stride() + component * self.layout.component_type.size()
    }

    /// Decode one component as f32, applying normalization if the accessor asks for it
    fn component_f32(&self, element: usize, component: usize) -> f32 {
        let o = self.offset_of(element, component);
        let b = self.bytes;
        let normalized = self.layout.normalized;
        match self.layout.component_type {
            ComponentType::F32 => f32::from_le_bytes([b[o], b[o + 1], b[o + 2], b[o + 3]]),
            ComponentType::U8 => {
                let v = b[o] as f32;
                if normalized { v / 255.0 } else { v }
            }
            ComponentType::I8 => {
                let v = b[o] as i8 as f32;
                if normalized { (v / 127.0).max(-1.0) } else { v }
            }
            ComponentType::U16 => {
                let v = u16::from_le_bytes([b[o], b[o + 1]]) as f32;
                if normalized { v / 65535.0 } else { v }
            }
            ComponentType::I16 => {
                let v = i16::from_le_bytes([b[o], b[o + 1]]) as f32;
                if normalized { (v / 32767.0).max(-1.0) } else { v }
            }
            ComponentType::U32 => {
                let v = u32::from_le_bytes([b[o], b[o + 1], b[o + 2], b[o + 3]]) as f32;
                if normalized { v / u32::MAX as f32 } else { v }
            }
        }
    }

    /// Decode one integer component (u8/u16/u32 only)
    fn component_u32(&self, element: usize, component: usize) -> u32 {
        let o = self.offset_of(element, component);
        let b = self.bytes;
        match self.layout.component_type {
            ComponentType::U8 => b[o] as u32,
            ComponentType::U16 => u16::from_le_bytes([b[o], b[o + 1]]) as u32,
            ComponentType::U32 => u32::from_le_bytes([b[o], b[o + 1], b[o + 2], b[o + 3]]),
            // Callers check the component type before decoding
            ComponentType::I8 | ComponentType::I16 | ComponentType::F32 => 0,
        }
    }

    fn unsupported_component(&self, usage: &'static str) -> LoadError {
        LoadError::UnsupportedComponentType {
            accessor: self.layout.index,
            component_type: self.layout.component_type.to_string(),
            usage,
        }
    }

    fn unsupported_element(&self, usage: &'static str) -> LoadError {
        LoadError::UnsupportedElementType {
            accessor: self.layout.index,
            element_type: self.layout.element_type.to_string(),
            usage,
        }
    }

    /// Require float storage, or normalized u8/u16 when `allow_normalized` is set
    fn expect_float(&self, usage: &'static str, allow_normalized: bool) -> Result<()> {
        match self.layout.component_type {
            ComponentType::F32 => Ok(()),
            ComponentType::U8 | ComponentType::U16
                if allow_normalized && self.layout.normalized =>
            {
                Ok(())
            }
            _ => Err(self.unsupported_component(usage)),
        }
    }

    /// Read `N`-component float elements
    ///
    /// The element type must have exactly `N` components, so a VEC3 accessor can
    /// never be read with a VEC4 stride.
    pub fn read_floats<const N: usize>(
        &self,
        usage: &'static str,
        allow_normalized: bool,
    ) -> Result<Vec<[f32; N]>> {
        self.expect_float(usage, allow_normalized)?;
        if self.layout.element_type.components() != N
            || matches!(self.layout.element_type, ElementType::Mat2)
        {
            return Err(self.unsupported_element(usage));
        }
        Ok((0..self.layout.count)
            .map(|e| core::array::from_fn(|c| self.component_f32(e, c)))
            .collect())
    }

    /// Read VEC3 or VEC4 elements into vec4, filling a missing 4th component with `pad`
    pub fn read_vec3_or_vec4(
        &self,
        usage: &'static str,
        allow_normalized: bool,
        pad: f32,
    ) -> Result<Vec<[f32; 4]>> {
        match self.layout.element_type {
            ElementType::Vec4 => self.read_floats::<4>(usage, allow_normalized),
            ElementType::Vec3 => Ok(self
                .read_floats::<3>(usage, allow_normalized)?
                .into_iter()
                .map(|[x, y, z]| [x, y, z, pad])
                .collect()),
            _ => Err(self.unsupported_element(usage)),
        }
    }

    /// Read float scalars (keyframe times)
    pub fn read_scalars(&self, usage: &'static str) -> Result<Vec<f32>> {
        Ok(self
            .read_floats::<1>(usage, false)?
            .into_iter()
            .map(|[v]| v)
            .collect())
    }

    /// Read an index buffer; only u8/u16/u32 scalars are accepted
    pub fn read_indices(&self) -> Result<Vec<u32>> {
        const USAGE: &str = "indices";
        if !matches!(
            self.layout.component_type,
            ComponentType::U8 | ComponentType::U16 | ComponentType::U32
        ) {
            return Err(self.unsupported_component(USAGE));
        }
        if self.layout.element_type != ElementType::Scalar {
            return Err(self.unsupported_element(USAGE));
        }
        Ok((0..self.layout.count)
            .map(|e| self.component_u32(e, 0))
            .collect())
    }

    /// Read JOINTS_n data (u8 or u16 VEC4)
    pub fn read_joints(&self) -> Result<Vec<[u16; 4]>> {
        const USAGE: &str = "JOINTS_0";
        if !matches!(
            self.layout.component_type,
            ComponentType::U8 | ComponentType::U16
        ) {
            return Err(self.unsupported_component(USAGE));
        }
        if self.layout.element_type != ElementType::Vec4 {
            return Err(self.unsupported_element(USAGE));
        }
        Ok((0..self.layout.count)
            .map(|e| core::array::from_fn(|c| self.component_u32(e, c) as u16))
            .collect())
    }

    /// Read column-major float MAT4 elements
    pub fn read_mat4(&self, usage: &'static str) -> Result<Vec<Mat4>> {
        if self.layout.element_type != ElementType::Mat4 {
            return Err(self.unsupported_element(usage));
        }
        Ok(self
            .read_floats::<16>(usage, false)?
            .iter()
            .map(Mat4::from_cols_array)
            .collect())
    }
}
