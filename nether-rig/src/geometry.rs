//! Geometry assembler
//!
//! Reads the vertex attributes and index data of each primitive and appends them
//! to one vertex array and one index array shared by the whole model. Indices are
//! rebased onto the shared vertex array as they are appended.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use gltf::json;
use gltf::json::mesh::Semantic;
use gltf::json::validation::Checked;
use tracing::debug;

use crate::container::Container;
use crate::error::{Diagnostics, LoadError, Result};

/// Interleaved vertex, ready for device upload
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub color: [f32; 4],
    pub joint0: [f32; 4],
    pub weight0: [f32; 4],
    pub tangent: [f32; 4],
}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            pos: [0.0; 3],
            normal: [0.0; 3],
            uv: [0.0; 2],
            color: [1.0; 4],
            joint0: [0.0; 4],
            weight0: [0.0; 4],
            tangent: [0.0; 4],
        }
    }
}

/// Axis-aligned bounds with derived size, center and radius
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dimensions {
    pub min: Vec3,
    pub max: Vec3,
    pub size: Vec3,
    pub center: Vec3,
    pub radius: f32,
}

impl Dimensions {
    pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
        Self {
            min,
            max,
            size: max - min,
            center: (min + max) * 0.5,
            radius: min.distance(max) * 0.5,
        }
    }

    /// Bounds of a point set, `None` if it is empty
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self::from_min_max(min, max))
    }

    /// Bounds of all eight corners after transforming by `matrix`
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        let (lo, hi) = (self.min, self.max);
        let corners = (0..8).map(|i| {
            let corner = Vec3::new(
                if i & 1 == 0 { lo.x } else { hi.x },
                if i & 2 == 0 { lo.y } else { hi.y },
                if i & 4 == 0 { lo.z } else { hi.z },
            );
            matrix.transform_point3(corner)
        });
        // Eight corners are always present
        Self::from_points(corners).unwrap_or(*self)
    }

    pub fn union(&self, other: &Self) -> Self {
        Self::from_min_max(self.min.min(other.min), self.max.max(other.max))
    }
}

/// A contiguous range of the shared vertex and index arrays drawn with one material
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    pub first_index: u32,
    pub index_count: u32,
    pub first_vertex: u32,
    pub vertex_count: u32,
    /// Index into the model's materials (the trailing default material if unset)
    pub material: usize,
    /// Bounds in mesh space
    pub dimensions: Dimensions,
}

/// A mesh owned by exactly one node
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    /// Mesh index in the container
    pub index: usize,
    pub name: String,
    pub primitives: Vec<Primitive>,
}

impl Mesh {
    /// Union of all primitive bounds, in mesh space
    pub fn dimensions(&self) -> Option<Dimensions> {
        self.primitives
            .iter()
            .map(|p| p.dimensions)
            .reduce(|a, b| a.union(&b))
    }
}

/// Shared, append-only geometry storage
#[derive(Debug, Default, Clone)]
pub struct GeometryBuffers {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

/// Assembles container meshes into [`GeometryBuffers`]
pub struct GeometryAssembler<'c, 'a> {
    container: &'c Container<'a>,
    /// Index of the default material appended after the container's materials
    default_material: usize,
}

impl<'c, 'a> GeometryAssembler<'c, 'a> {
    pub fn new(container: &'c Container<'a>) -> Self {
        Self {
            container,
            default_material: container.root().materials.len(),
        }
    }

    /// Assemble container mesh `mesh_index`, appending to `buffers`
    ///
    /// Recoverable problems (non-indexed primitives, partial skinning data) are
    /// recorded in `diagnostics`.
    pub(crate) fn assemble(
        &self,
        mesh_index: usize,
        buffers: &mut GeometryBuffers,
        diagnostics: &mut Diagnostics,
    ) -> Result<Mesh> {
        let mesh = self
            .container
            .root()
            .meshes
            .get(mesh_index)
            .ok_or(LoadError::DanglingIndex {
                kind: "mesh",
                index: mesh_index,
            })?;

        let mut primitives = Vec::with_capacity(mesh.primitives.len());
        for (primitive_index, primitive) in mesh.primitives.iter().enumerate() {
            if let Some(p) =
                self.assemble_primitive(mesh_index, primitive_index, primitive, buffers, diagnostics)?
            {
                primitives.push(p);
            }
        }

        let name = mesh.name.clone().unwrap_or_default();
        debug!(
            "Assembled mesh {} '{}': {} primitives",
            mesh_index,
            name,
            primitives.len()
        );

        Ok(Mesh {
            index: mesh_index,
            name,
            primitives,
        })
    }

    fn assemble_primitive(
        &self,
        mesh: usize,
        primitive: usize,
        source: &json::mesh::Primitive,
        buffers: &mut GeometryBuffers,
        diagnostics: &mut Diagnostics,
    ) -> Result<Option<Primitive>> {
        let Some(indices_accessor) = source.indices else {
            diagnostics.warn(LoadError::NonIndexedPrimitive { mesh, primitive });
            return Ok(None);
        };

        let attribute =
            |semantic: Semantic| source.attributes.get(&Checked::Valid(semantic)).map(|a| a.value());

        let positions = match attribute(Semantic::Positions) {
            Some(accessor) => self
                .container
                .accessor(accessor)?
                .read_floats::<3>("POSITION", false)?,
            None => {
                return Err(LoadError::MissingRequiredAttribute {
                    mesh,
                    primitive,
                    attribute: "POSITION",
                });
            }
        };

        let normals = attribute(Semantic::Normals)
            .map(|a| self.container.accessor(a)?.read_floats::<3>("NORMAL", false))
            .transpose()?;
        let uvs = attribute(Semantic::TexCoords(0))
            .map(|a| self.container.accessor(a)?.read_floats::<2>("TEXCOORD_0", true))
            .transpose()?;
        let colors = attribute(Semantic::Colors(0))
            .map(|a| {
                self.container
                    .accessor(a)?
                    .read_vec3_or_vec4("COLOR_0", true, 1.0)
            })
            .transpose()?;
        let tangents = attribute(Semantic::Tangents)
            .map(|a| self.container.accessor(a)?.read_floats::<4>("TANGENT", false))
            .transpose()?;

        // Skinning is all-or-nothing per primitive
        let skinning = match (attribute(Semantic::Joints(0)), attribute(Semantic::Weights(0))) {
            (Some(joints), Some(weights)) => Some((
                self.container.accessor(joints)?.read_joints()?,
                self.container
                    .accessor(weights)?
                    .read_floats::<4>("WEIGHTS_0", true)?,
            )),
            (None, None) => None,
            _ => {
                diagnostics.warn(LoadError::PartialSkinning { mesh, primitive });
                None
            }
        };

        let indices = self.container.accessor(indices_accessor.value())?.read_indices()?;
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= positions.len()) {
            return Err(LoadError::IndexOutOfRange {
                mesh,
                primitive,
                index,
                vertex_count: positions.len(),
            });
        }

        let material = match source.material {
            Some(m) if m.value() < self.default_material => m.value(),
            Some(m) => {
                return Err(LoadError::DanglingIndex {
                    kind: "material",
                    index: m.value(),
                });
            }
            None => self.default_material,
        };

        let vertex_start = buffers.vertices.len() as u32;
        let index_start = buffers.indices.len() as u32;

        buffers
            .vertices
            .extend(positions.iter().enumerate().map(|(v, &pos)| {
                let mut vertex = Vertex {
                    pos,
                    ..Default::default()
                };
                if let Some(n) = normals.as_ref().and_then(|n| n.get(v)) {
                    vertex.normal = Vec3::from_array(*n).normalize_or_zero().to_array();
                }
                if let Some(uv) = uvs.as_ref().and_then(|uv| uv.get(v)) {
                    vertex.uv = *uv;
                }
                if let Some(color) = colors.as_ref().and_then(|c| c.get(v)) {
                    vertex.color = *color;
                }
                if let Some(tangent) = tangents.as_ref().and_then(|t| t.get(v)) {
                    vertex.tangent = *tangent;
                }
                if let Some((joints, weights)) = &skinning {
                    if let (Some(j), Some(w)) = (joints.get(v), weights.get(v)) {
                        vertex.joint0 = j.map(f32::from);
                        vertex.weight0 = *w;
                    }
                }
                vertex
            }));

        buffers
            .indices
            .extend(indices.iter().map(|&i| i + vertex_start));

        let dimensions = Dimensions::from_points(positions.iter().map(|&p| Vec3::from_array(p)))
            .unwrap_or_else(|| Dimensions::from_min_max(Vec3::ZERO, Vec3::ZERO));

        Ok(Some(Primitive {
            first_index: index_start,
            index_count: indices.len() as u32,
            first_vertex: vertex_start,
            vertex_count: positions.len() as u32,
            material,
            dimensions,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glb_builder::{BufferBuilder, GltfBuilder, MeshBuilder};

    fn container(builder: MeshBuilder) -> Container<'static> {
        let mut buffer = BufferBuilder::new();
        let mesh = builder.build(&mut buffer);
        let root = GltfBuilder::new()
            .buffer_byte_length(buffer.data().len() as u64)
            .add_mesh_from_accessors("Mesh", &mesh)
            .build(buffer.views(), buffer.accessors(), "test");
        Container::from_parts(root, vec![buffer.data().to_vec()])
    }

    const QUAD: [[f32; 3]; 4] = [
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
    ];

    #[test]
    fn test_vertex_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<Vertex>(), 24 * 4);
    }

    #[test]
    fn test_position_only_defaults() {
        let container = container(MeshBuilder::new().positions(&QUAD).indices(&[0, 1, 2, 2, 3, 0]));
        let mut buffers = GeometryBuffers::default();
        let mut diagnostics = Diagnostics::default();
        let mesh = GeometryAssembler::new(&container)
            .assemble(0, &mut buffers, &mut diagnostics)
            .expect("valid mesh");

        assert_eq!(buffers.vertices.len(), 4);
        for (vertex, pos) in buffers.vertices.iter().zip(QUAD) {
            assert_eq!(vertex.pos, pos);
            assert_eq!(vertex.normal, [0.0; 3]);
            assert_eq!(vertex.uv, [0.0; 2]);
            assert_eq!(vertex.color, [1.0; 4]);
            assert_eq!(vertex.joint0, [0.0; 4]);
            assert_eq!(vertex.weight0, [0.0; 4]);
        }
        assert_eq!(buffers.indices, vec![0, 1, 2, 2, 3, 0]);
        assert!(diagnostics.warnings().is_empty());

        let primitive = &mesh.primitives[0];
        assert_eq!(primitive.index_count, 6);
        assert_eq!(primitive.vertex_count, 4);
        // No materials in the container: the default material sits at index 0
        assert_eq!(primitive.material, 0);
        assert_eq!(primitive.dimensions.max, Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(primitive.dimensions.center, Vec3::new(0.5, 0.5, 0.0));
    }

    #[test]
    fn test_indices_offset_by_vertex_start() {
        let container = container(MeshBuilder::new().positions(&QUAD).indices(&[0, 1, 2]));
        let assembler = GeometryAssembler::new(&container);
        let mut buffers = GeometryBuffers::default();
        let mut diagnostics = Diagnostics::default();

        assembler.assemble(0, &mut buffers, &mut diagnostics).unwrap();
        let second = assembler.assemble(0, &mut buffers, &mut diagnostics).unwrap();

        assert_eq!(buffers.vertices.len(), 8);
        assert_eq!(buffers.indices, vec![0, 1, 2, 4, 5, 6]);
        assert_eq!(second.primitives[0].first_vertex, 4);
        assert_eq!(second.primitives[0].first_index, 3);
    }

    #[test]
    fn test_normals_are_normalized() {
        let container = container(
            MeshBuilder::new()
                .positions(&QUAD[..3])
                .normals(&[[0.0, 0.0, 2.0], [0.0, 3.0, 0.0], [0.0, 0.0, 0.0]])
                .indices(&[0, 1, 2]),
        );
        let mut buffers = GeometryBuffers::default();
        GeometryAssembler::new(&container)
            .assemble(0, &mut buffers, &mut Diagnostics::default())
            .unwrap();

        assert_eq!(buffers.vertices[0].normal, [0.0, 0.0, 1.0]);
        assert_eq!(buffers.vertices[1].normal, [0.0, 1.0, 0.0]);
        // Zero-length normals stay zero
        assert_eq!(buffers.vertices[2].normal, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_skinning_attributes() {
        let container = container(
            MeshBuilder::new()
                .positions(&QUAD[..1])
                .joints(&[[1, 0, 0, 0]])
                .weights(&[[0.75, 0.25, 0.0, 0.0]])
                .indices(&[0]),
        );
        let mut buffers = GeometryBuffers::default();
        GeometryAssembler::new(&container)
            .assemble(0, &mut buffers, &mut Diagnostics::default())
            .unwrap();
        assert_eq!(buffers.vertices[0].joint0, [1.0, 0.0, 0.0, 0.0]);
        assert_eq!(buffers.vertices[0].weight0, [0.75, 0.25, 0.0, 0.0]);
    }

    #[test]
    fn test_partial_skinning_is_ignored() {
        let container = container(
            MeshBuilder::new()
                .positions(&QUAD[..1])
                .joints(&[[1, 0, 0, 0]])
                .indices(&[0]),
        );
        let mut buffers = GeometryBuffers::default();
        let mut diagnostics = Diagnostics::default();
        GeometryAssembler::new(&container)
            .assemble(0, &mut buffers, &mut diagnostics)
            .unwrap();
        assert_eq!(buffers.vertices[0].joint0, [0.0; 4]);
        assert!(matches!(diagnostics.warnings(), [LoadError::PartialSkinning { .. }]));
    }

    #[test]
    fn test_non_indexed_primitive_skipped() {
        let container = container(MeshBuilder::new().positions(&QUAD));
        let mut buffers = GeometryBuffers::default();
        let mut diagnostics = Diagnostics::default();
        let mesh = GeometryAssembler::new(&container)
            .assemble(0, &mut buffers, &mut diagnostics)
            .unwrap();
        assert!(mesh.primitives.is_empty());
        assert!(buffers.vertices.is_empty());
        assert!(matches!(
            diagnostics.warnings(),
            [LoadError::NonIndexedPrimitive {
                mesh: 0,
                primitive: 0
            }]
        ));
    }

    #[test]
    fn test_index_past_vertex_count_rejected() {
        let container = container(MeshBuilder::new().positions(&QUAD).indices(&[0, 1, 4]));
        let mut buffers = GeometryBuffers::default();
        let result =
            GeometryAssembler::new(&container).assemble(0, &mut buffers, &mut Diagnostics::default());
        assert!(matches!(
            result,
            Err(LoadError::IndexOutOfRange {
                mesh: 0,
                primitive: 0,
                index: 4,
                vertex_count: 4
            })
        ));
        // Nothing from the rejected primitive reaches the shared buffers
        assert!(buffers.vertices.is_empty());
        assert!(buffers.indices.is_empty());
    }

    #[test]
    fn test_dimensions_transformed() {
        let dims = Dimensions::from_min_max(Vec3::splat(-1.0), Vec3::splat(1.0));
        let moved = dims.transformed(&Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0)));
        assert_eq!(moved.min, Vec3::new(9.0, -1.0, -1.0));
        assert_eq!(moved.max, Vec3::new(11.0, 1.0, 1.0));
        assert_eq!(moved.size, Vec3::splat(2.0));
        assert!((moved.radius - 3.0f32.sqrt()).abs() < 1e-6);
    }
}
