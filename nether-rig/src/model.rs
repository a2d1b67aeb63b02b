//! Loaded model: scene forest, geometry, materials, skins and animations

use glam::{Mat3, Mat4, Vec3, Vec4};
use gltf::json;
use tracing::info;

use crate::animation::{self, Animation};
use crate::container::Container;
use crate::error::{Diagnostics, LoadError, Result};
use crate::geometry::{Dimensions, GeometryBuffers, Vertex};
use crate::material::Material;
use crate::options::{CubicSplineMode, LoadOptions};
use crate::scene::{self, Node, NodeId, SceneGraph};
use crate::skin::{self, Skin};

/// Extension that switches materials to the specular-glossiness workflow
pub const SPECULAR_GLOSSINESS_EXTENSION: &str = "KHR_materials_pbrSpecularGlossiness";

/// A fully loaded model
///
/// All state lives here: two models never share anything, so independent
/// models may be loaded and evaluated on different threads.
#[derive(Debug)]
pub struct Model {
    pub(crate) graph: SceneGraph,
    pub(crate) skins: Vec<Skin>,
    pub(crate) animations: Vec<Animation>,
    materials: Vec<Material>,
    geometry: GeometryBuffers,
    warnings: Vec<LoadError>,
    metallic_roughness_workflow: bool,
    pre_transformed: bool,
    pub(crate) cubic_spline: CubicSplineMode,
}

impl Model {
    /// Load a binary (GLB) container
    pub fn from_glb(bytes: &[u8], options: &LoadOptions) -> Result<Self> {
        let container = Container::from_glb(bytes)?;
        Self::load(&container, options)
    }

    /// Load a parsed JSON document; `buffers[i]` backs the document's buffer `i`
    pub fn from_json(root: json::Root, buffers: Vec<Vec<u8>>, options: &LoadOptions) -> Result<Self> {
        let container = Container::from_parts(root, buffers);
        Self::load(&container, options)
    }

    /// Load from a container
    ///
    /// Either the whole model loads or an error is returned; nothing partial
    /// escapes.
    pub fn load(container: &Container<'_>, options: &LoadOptions) -> Result<Self> {
        let mut diagnostics = Diagnostics::new(options.reference_policy);
        let mut geometry = GeometryBuffers::default();

        let (roots, exhaustive) = scene::scene_roots(container, options.scene)?;
        let mut graph = scene::build(container, &roots, exhaustive, &mut geometry, &mut diagnostics)?;

        let skins = skin::bind_skins(container, &graph, options.max_joints, &mut diagnostics)?;
        skin::resolve_node_skins(&mut graph, skins.len(), &mut diagnostics)?;

        let mut materials: Vec<Material> = container
            .root()
            .materials
            .iter()
            .map(Material::from_json)
            .collect();
        materials.push(Material::default());

        let animations = animation::load_animations(container, &graph, &mut diagnostics)?;

        let mut model = Self {
            graph,
            skins,
            animations,
            materials,
            geometry,
            warnings: diagnostics.into_warnings(),
            metallic_roughness_workflow: !container.uses_extension(SPECULAR_GLOSSINESS_EXTENSION),
            pre_transformed: options.pre_transform_vertices,
            cubic_spline: options.cubic_spline,
        };

        model.graph.update_world_transforms();
        model.post_process(options);
        model.update_joint_matrices();

        info!(
            "Loaded model: {} nodes, {} skins, {} animations, {} materials, {} vertices, {} indices, {} warnings",
            model.graph.nodes().len(),
            model.skins.len(),
            model.animations.len(),
            model.materials.len(),
            model.geometry.vertices.len(),
            model.geometry.indices.len(),
            model.warnings.len()
        );

        Ok(model)
    }

    /// Bake load-time vertex transforms selected in `options`
    fn post_process(&mut self, options: &LoadOptions) {
        if !(options.pre_transform_vertices || options.flip_y || options.pre_multiply_vertex_colors) {
            return;
        }

        for node in self.graph.nodes_mut() {
            let world = node.world;
            let normal_matrix = Mat3::from_mat4(world).inverse().transpose();
            let Some(mesh) = node.mesh.as_mut() else {
                continue;
            };

            for primitive in &mut mesh.primitives {
                let start = primitive.first_vertex as usize;
                let end = start + primitive.vertex_count as usize;
                let base_color = self
                    .materials
                    .get(primitive.material)
                    .map_or(Vec4::ONE, |m| m.base_color_factor);

                let vertices = &mut self.geometry.vertices[start..end];
                for vertex in vertices.iter_mut() {
                    let mut pos = Vec3::from_array(vertex.pos);
                    let mut normal = Vec3::from_array(vertex.normal);
                    if options.pre_transform_vertices {
                        pos = world.transform_point3(pos);
                        normal = (normal_matrix * normal).normalize_or_zero();
                    }
                    if options.flip_y {
                        pos.y = -pos.y;
                        normal.y = -normal.y;
                    }
                    if options.pre_multiply_vertex_colors {
                        vertex.color = (base_color * Vec4::from_array(vertex.color)).to_array();
                    }
                    vertex.pos = pos.to_array();
                    vertex.normal = normal.to_array();
                }

                if options.pre_transform_vertices || options.flip_y {
                    if let Some(dimensions) =
                        Dimensions::from_points(vertices.iter().map(|v| Vec3::from_array(v.pos)))
                    {
                        primitive.dimensions = dimensions;
                    }
                }
            }
        }
    }

    /// Recompute the joint matrices of every skinned node from current world matrices
    ///
    /// `joint[i] = inverse(world(node)) * world(joint_i) * inverse_bind[i]`
    pub fn update_joint_matrices(&mut self) {
        for i in 0..self.graph.nodes().len() {
            let id = NodeId(i);
            let Some(skin) = self.graph.node(id).skin.and_then(|s| self.skins.get(s)) else {
                continue;
            };
            let inverse = self.graph.node(id).world.inverse();
            let matrices: Vec<Mat4> = skin
                .joints
                .iter()
                .zip(&skin.inverse_bind_matrices)
                .map(|(&joint, ibm)| inverse * self.graph.node(joint).world * *ibm)
                .collect();

            let out = &mut self.graph.node_mut(id).joint_matrices;
            out.clear();
            out.extend_from_slice(&matrices);
        }
    }

    /// Recompute world matrices, then joint matrices
    pub fn update_pose(&mut self) {
        self.graph.update_world_transforms();
        self.update_joint_matrices();
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn nodes(&self) -> &[Node] {
        self.graph.nodes()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        self.graph.node(id)
    }

    /// Mutable access for hosts that pose nodes directly; call [`Model::update_pose`] afterwards
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.graph.node_mut(id)
    }

    pub fn roots(&self) -> &[NodeId] {
        self.graph.roots()
    }

    /// Arena slot of the node with container index `index`
    pub fn node_by_index(&self, index: usize) -> Option<NodeId> {
        self.graph.lookup(index)
    }

    pub fn node_by_name(&self, name: &str) -> Option<NodeId> {
        self.graph
            .nodes()
            .iter()
            .position(|n| n.name.as_deref() == Some(name))
            .map(NodeId)
    }

    pub fn skins(&self) -> &[Skin] {
        &self.skins
    }

    /// Materials, with the default material last
    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn animations(&self) -> &[Animation] {
        &self.animations
    }

    pub fn animation_by_name(&self, name: &str) -> Option<usize> {
        self.animations.iter().position(|a| a.name == name)
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.geometry.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.geometry.indices
    }

    /// Vertex data as bytes, for upload
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.geometry.vertices)
    }

    /// Index data as bytes, for upload
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.geometry.indices)
    }

    /// Recoverable problems encountered while loading
    pub fn warnings(&self) -> &[LoadError] {
        &self.warnings
    }

    /// False when materials use the specular-glossiness workflow
    pub fn metallic_roughness_workflow(&self) -> bool {
        self.metallic_roughness_workflow
    }

    /// World matrix to draw a static mesh node with
    ///
    /// Identity when vertices were pre-transformed at load.
    pub fn mesh_transform(&self, id: NodeId) -> Mat4 {
        if self.pre_transformed {
            Mat4::IDENTITY
        } else {
            self.graph.node(id).world
        }
    }

    /// Joint matrices of a skinned node (empty for unskinned nodes)
    pub fn joint_matrices(&self, id: NodeId) -> &[Mat4] {
        &self.graph.node(id).joint_matrices
    }

    /// Joint matrices as bytes, for upload
    pub fn joint_matrix_bytes(&self, id: NodeId) -> &[u8] {
        bytemuck::cast_slice(&self.graph.node(id).joint_matrices)
    }

    /// Bounds of every primitive in world space, or `None` for a model without geometry
    pub fn dimensions(&self) -> Option<Dimensions> {
        self.graph
            .nodes()
            .iter()
            .filter_map(|node| {
                let mesh = node.mesh.as_ref()?;
                let local = mesh.dimensions()?;
                Some(if self.pre_transformed {
                    local
                } else {
                    local.transformed(&node.world)
                })
            })
            .reduce(|a, b| a.union(&b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glb_builder::{BufferBuilder, GltfBuilder, MeshBuilder, assemble_glb};

    fn node(mesh: Option<u32>, translation: Option<[f32; 3]>) -> json::Node {
        json::Node {
            camera: None,
            children: None,
            extensions: Default::default(),
            extras: Default::default(),
            matrix: None,
            mesh: mesh.map(json::Index::new),
            name: Some("Mesh".to_string()),
            rotation: None,
            scale: None,
            skin: None,
            translation,
            weights: None,
        }
    }

    fn unit_square_glb(translation: [f32; 3]) -> Vec<u8> {
        let mut buffer = BufferBuilder::new();
        let mesh = MeshBuilder::new()
            .positions(&[
                [-1.0, -1.0, 0.0],
                [1.0, -1.0, 0.0],
                [1.0, 1.0, 0.0],
                [-1.0, 1.0, 0.0],
            ])
            .normals(&[[0.0, 1.0, 0.0]; 4])
            .colors(&[[0.5, 0.5, 0.5, 1.0]; 4])
            .indices(&[0, 1, 2, 2, 3, 0])
            .build(&mut buffer);
        let root = GltfBuilder::new()
            .buffer_byte_length(buffer.data().len() as u64)
            .add_mesh_from_accessors("Square", &mesh)
            .add_node(node(Some(0), Some(translation)))
            .add_scene("Scene", &[0])
            .build(buffer.views(), buffer.accessors(), "test");
        assemble_glb(&root, buffer.data())
    }

    #[test]
    fn test_dimensions_follow_world_matrix() {
        let model = Model::from_glb(&unit_square_glb([10.0, 0.0, 0.0]), &LoadOptions::default())
            .expect("valid model");
        let dims = model.dimensions().expect("has geometry");
        assert_eq!(dims.min, Vec3::new(9.0, -1.0, 0.0));
        assert_eq!(dims.max, Vec3::new(11.0, 1.0, 0.0));
        assert_eq!(dims.center, Vec3::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn test_default_material_appended() {
        let model = Model::from_glb(&unit_square_glb([0.0; 3]), &LoadOptions::default()).unwrap();
        assert_eq!(model.materials().len(), 1);
        assert_eq!(model.materials()[0], Material::default());
        assert!(model.metallic_roughness_workflow());
    }

    #[test]
    fn test_pre_transform_and_flip_y() {
        let options = LoadOptions {
            pre_transform_vertices: true,
            flip_y: true,
            ..LoadOptions::default()
        };
        let model = Model::from_glb(&unit_square_glb([0.0, 5.0, 0.0]), &options).unwrap();
        // (-1, -1, 0) moved up by 5, then mirrored
        assert_eq!(model.vertices()[0].pos, [-1.0, -4.0, 0.0]);
        assert_eq!(model.vertices()[0].normal, [0.0, -1.0, 0.0]);

        let id = model.node_by_index(0).unwrap();
        assert_eq!(model.mesh_transform(id), Mat4::IDENTITY);
        let dims = model.dimensions().unwrap();
        assert_eq!(dims.min, Vec3::new(-1.0, -6.0, 0.0));
        assert_eq!(dims.max, Vec3::new(1.0, -4.0, 0.0));
    }

    #[test]
    fn test_byte_views() {
        let model = Model::from_glb(&unit_square_glb([0.0; 3]), &LoadOptions::default()).unwrap();
        assert_eq!(model.vertex_bytes().len(), 4 * std::mem::size_of::<Vertex>());
        assert_eq!(model.index_bytes().len(), 6 * 4);
        let id = model.node_by_name("Mesh").unwrap();
        assert!(model.joint_matrix_bytes(id).is_empty());
        assert_eq!(
            model.mesh_transform(id),
            model.node(id).world_matrix()
        );
    }

    #[test]
    fn test_model_without_nodes() {
        let root = GltfBuilder::new().build(&[], &[], "test");
        let model = Model::from_json(root, Vec::new(), &LoadOptions::default()).unwrap();
        assert!(model.nodes().is_empty());
        assert!(model.dimensions().is_none());
    }
}
