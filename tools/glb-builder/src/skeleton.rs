//! Skeleton construction utilities

use crate::buffer::{AccessorIndex, BufferBuilder};

/// Column-major 4x4 identity
pub const IDENTITY_MAT4: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0,
];

/// Column-major inverse of a pure translation to `position`
pub fn inverse_translation(position: [f32; 3]) -> [f32; 16] {
    let mut matrix = IDENTITY_MAT4;
    matrix[12] = -position[0];
    matrix[13] = -position[1];
    matrix[14] = -position[2];
    matrix
}

/// Accessor indices for skeleton data
#[derive(Debug, Clone)]
pub struct SkeletonAccessors {
    pub inverse_bind_matrices: AccessorIndex,
    pub joint_count: usize,
}

/// Builder for inverse bind matrices, one per joint slot
pub struct SkeletonBuilder {
    inverse_bind_matrices: Vec<[f32; 16]>,
}

impl SkeletonBuilder {
    pub fn new() -> Self {
        Self {
            inverse_bind_matrices: Vec::new(),
        }
    }

    /// Add a bone with its inverse bind matrix
    pub fn add_bone(mut self, inverse_bind_matrix: [f32; 16]) -> Self {
        self.inverse_bind_matrices.push(inverse_bind_matrix);
        self
    }

    /// Add an unrotated bone whose bind-pose origin sits at `position`
    pub fn add_bone_at(self, position: [f32; 3]) -> Self {
        self.add_bone(inverse_translation(position))
    }

    /// Set all inverse bind matrices at once
    pub fn inverse_bind_matrices(mut self, matrices: &[[f32; 16]]) -> Self {
        self.inverse_bind_matrices = matrices.to_vec();
        self
    }

    /// Get bone count
    pub fn bone_count(&self) -> usize {
        self.inverse_bind_matrices.len()
    }

    /// Build and pack into buffer
    pub fn build(self, buffer: &mut BufferBuilder) -> SkeletonAccessors {
        SkeletonAccessors {
            inverse_bind_matrices: buffer.pack_mat4(&self.inverse_bind_matrices),
            joint_count: self.inverse_bind_matrices.len(),
        }
    }
}

impl Default for SkeletonBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skeleton_builder() {
        let mut buffer = BufferBuilder::new();
        let skeleton = SkeletonBuilder::new()
            .add_bone(IDENTITY_MAT4)
            .add_bone_at([0.0, 2.0, 0.0])
            .build(&mut buffer);

        assert_eq!(skeleton.inverse_bind_matrices, AccessorIndex(0));
        assert_eq!(skeleton.joint_count, 2);
        // 2 matrices * 64 bytes = 128 bytes
        assert_eq!(buffer.data().len(), 128);
        // Translation column of the second matrix holds -2 in y
        assert_eq!(&buffer.data()[64 + 13 * 4..64 + 14 * 4], &(-2.0f32).to_le_bytes());
    }

    #[test]
    fn test_inverse_translation() {
        let m = inverse_translation([1.0, 2.0, 3.0]);
        assert_eq!(&m[12..], &[-1.0, -2.0, -3.0, 1.0]);
        assert_eq!(m[0], 1.0);
        assert_eq!(SkeletonBuilder::new().inverse_bind_matrices(&[m; 3]).bone_count(), 3);
    }
}
