//! GLTF document construction

use crate::{AccessorIndex, AnimationAccessors, MeshAccessors, SkeletonAccessors, Track};
use gltf_json as json;
use gltf_json::validation::Checked::Valid;
use std::collections::BTreeMap;

/// Builder for complete GLTF documents
pub struct GltfBuilder {
    nodes: Vec<json::Node>,
    meshes: Vec<json::Mesh>,
    skins: Vec<json::Skin>,
    animations: Vec<json::Animation>,
    materials: Vec<json::Material>,
    scenes: Vec<json::Scene>,
    extensions_used: Vec<String>,
    buffer_byte_length: u64,
}

impl GltfBuilder {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            meshes: Vec::new(),
            skins: Vec::new(),
            animations: Vec::new(),
            materials: Vec::new(),
            scenes: Vec::new(),
            extensions_used: Vec::new(),
            buffer_byte_length: 0,
        }
    }

    /// Set buffer byte length (required before building)
    pub fn buffer_byte_length(mut self, length: u64) -> Self {
        self.buffer_byte_length = length;
        self
    }

    /// Add a node
    pub fn add_node(mut self, node: json::Node) -> Self {
        self.nodes.push(node);
        self
    }

    /// Add multiple nodes
    pub fn add_nodes(mut self, nodes: Vec<json::Node>) -> Self {
        self.nodes.extend(nodes);
        self
    }

    /// Get the current node count
    pub fn node_count(&self) -> u32 {
        self.nodes.len() as u32
    }

    /// Add a mesh with a single primitive
    pub fn add_mesh_from_accessors(self, name: &str, accessors: &MeshAccessors) -> Self {
        self.add_mesh(name, std::slice::from_ref(accessors))
    }

    /// Add a mesh with one primitive per accessor set
    pub fn add_mesh(mut self, name: &str, primitives: &[MeshAccessors]) -> Self {
        self.meshes.push(json::Mesh {
            extensions: Default::default(),
            extras: Default::default(),
            name: Some(name.to_string()),
            primitives: primitives.iter().map(primitive).collect(),
            weights: None,
        });
        self
    }

    /// Get the index of the last added mesh
    pub fn last_mesh_index(&self) -> Option<json::Index<json::Mesh>> {
        if self.meshes.is_empty() {
            None
        } else {
            Some(json::Index::new(self.meshes.len() as u32 - 1))
        }
    }

    /// Add a skin
    pub fn add_skin(
        self,
        name: &str,
        skeleton_root: u32,
        joints: &[u32],
        accessors: &SkeletonAccessors,
    ) -> Self {
        self.add_skin_with(
            name,
            Some(skeleton_root),
            joints,
            Some(accessors.inverse_bind_matrices),
        )
    }

    /// Add a skin whose skeleton root and inverse bind matrices may be absent
    pub fn add_skin_with(
        mut self,
        name: &str,
        skeleton_root: Option<u32>,
        joints: &[u32],
        inverse_bind_matrices: Option<AccessorIndex>,
    ) -> Self {
        self.skins.push(json::Skin {
            extensions: Default::default(),
            extras: Default::default(),
            inverse_bind_matrices: inverse_bind_matrices.map(|i| i.as_json_index()),
            joints: joints.iter().map(|j| json::Index::new(*j)).collect(),
            name: Some(name.to_string()),
            skeleton: skeleton_root.map(json::Index::new),
        });
        self
    }

    /// Get the index of the last added skin
    pub fn last_skin_index(&self) -> Option<json::Index<json::Skin>> {
        if self.skins.is_empty() {
            None
        } else {
            Some(json::Index::new(self.skins.len() as u32 - 1))
        }
    }

    /// Add an animation with linear T/R/S tracks for each bone node
    pub fn add_animation(
        self,
        name: &str,
        bone_node_indices: &[u32],
        accessors: &AnimationAccessors,
    ) -> Self {
        self.add_tracks(name, &accessors.tracks(bone_node_indices))
    }

    /// Add an animation with one sampler and one channel per track
    pub fn add_tracks(mut self, name: &str, tracks: &[Track]) -> Self {
        let mut samplers = Vec::new();
        let mut channels = Vec::new();

        for track in tracks {
            samplers.push(json::animation::Sampler {
                input: track.times.as_json_index(),
                interpolation: Valid(track.interpolation.clone()),
                output: track.values.as_json_index(),
                extensions: Default::default(),
                extras: Default::default(),
            });
            channels.push(json::animation::Channel {
                sampler: json::Index::new(samplers.len() as u32 - 1),
                target: json::animation::Target {
                    node: json::Index::new(track.node),
                    path: Valid(track.path.clone()),
                    extensions: Default::default(),
                    extras: Default::default(),
                },
                extensions: Default::default(),
                extras: Default::default(),
            });
        }

        self.animations.push(json::Animation {
            channels,
            extensions: Default::default(),
            extras: Default::default(),
            name: Some(name.to_string()),
            samplers,
        });
        self
    }

    /// Add a material
    pub fn add_material(mut self, material: json::Material) -> Self {
        self.materials.push(material);
        self
    }

    /// Declare an extension in `extensionsUsed`
    pub fn extension_used(mut self, name: &str) -> Self {
        self.extensions_used.push(name.to_string());
        self
    }

    /// Add a scene
    pub fn add_scene(mut self, name: &str, root_nodes: &[u32]) -> Self {
        self.scenes.push(json::Scene {
            extensions: Default::default(),
            extras: Default::default(),
            name: Some(name.to_string()),
            nodes: root_nodes.iter().map(|n| json::Index::new(*n)).collect(),
        });
        self
    }

    /// Build final GLTF Root (requires buffer views and accessors from BufferBuilder)
    pub fn build(
        self,
        buffer_views: &[json::buffer::View],
        accessors: &[json::Accessor],
        generator: &str,
    ) -> json::Root {
        let buffers = vec![json::Buffer {
            byte_length: self.buffer_byte_length.into(),
            extensions: Default::default(),
            extras: Default::default(),
            name: None,
            uri: None,
        }];

        json::Root {
            accessors: accessors.to_vec(),
            animations: self.animations,
            asset: json::Asset {
                copyright: None,
                extensions: Default::default(),
                extras: Default::default(),
                generator: Some(generator.to_string()),
                min_version: None,
                version: "2.0".to_string(),
            },
            buffers,
            buffer_views: buffer_views.to_vec(),
            cameras: Vec::new(),
            extensions: Default::default(),
            extensions_required: Vec::new(),
            extensions_used: self.extensions_used,
            extras: Default::default(),
            images: Vec::new(),
            materials: self.materials,
            meshes: self.meshes,
            nodes: self.nodes,
            samplers: Vec::new(),
            scene: if self.scenes.is_empty() {
                None
            } else {
                Some(json::Index::new(0))
            },
            scenes: self.scenes,
            skins: self.skins,
            textures: Vec::new(),
        }
    }
}

fn primitive(accessors: &MeshAccessors) -> json::mesh::Primitive {
    use json::mesh::Semantic;

    let mut attributes = BTreeMap::new();
    attributes.insert(Valid(Semantic::Positions), accessors.positions.as_json_index());

    let optional = [
        (Semantic::Normals, accessors.normals),
        (Semantic::TexCoords(0), accessors.uvs),
        (Semantic::Colors(0), accessors.colors),
        (Semantic::Joints(0), accessors.joints),
        (Semantic::Weights(0), accessors.weights),
        (Semantic::Tangents, accessors.tangents),
    ];
    for (semantic, accessor) in optional {
        if let Some(accessor) = accessor {
            attributes.insert(Valid(semantic), accessor.as_json_index());
        }
    }

    json::mesh::Primitive {
        attributes,
        extensions: Default::default(),
        extras: Default::default(),
        indices: accessors.indices.map(|i| i.as_json_index()),
        material: accessors.material.map(json::Index::new),
        mode: Valid(json::mesh::Mode::Triangles),
        targets: None,
    }
}

impl Default for GltfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BufferBuilder, MeshBuilder};

    #[test]
    fn test_gltf_builder_basic() {
        let mut buffer = BufferBuilder::new();
        let mesh = MeshBuilder::new()
            .positions(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.5, 1.0, 0.0]])
            .indices(&[0, 1, 2])
            .build(&mut buffer);

        let gltf = GltfBuilder::new()
            .buffer_byte_length(buffer.data().len() as u64)
            .add_mesh_from_accessors("Triangle", &mesh)
            .add_scene("Scene", &[0]);

        let root = gltf.build(buffer.views(), buffer.accessors(), "test");

        assert_eq!(root.meshes.len(), 1);
        assert_eq!(root.scenes.len(), 1);
        assert_eq!(root.asset.version, "2.0");
    }

    #[test]
    fn test_materials_and_extensions() {
        let mut buffer = BufferBuilder::new();
        let first = MeshBuilder::new()
            .positions(&[[0.0; 3]; 3])
            .indices(&[0, 1, 2])
            .material(0)
            .build(&mut buffer);
        let second = MeshBuilder::new()
            .positions(&[[1.0; 3]; 3])
            .indices(&[0, 1, 2])
            .build(&mut buffer);

        let root = GltfBuilder::new()
            .buffer_byte_length(buffer.data().len() as u64)
            .add_mesh("Pair", &[first, second])
            .add_material(json::Material::default())
            .extension_used("KHR_materials_pbrSpecularGlossiness")
            .build(buffer.views(), buffer.accessors(), "test");

        assert_eq!(root.meshes[0].primitives.len(), 2);
        assert_eq!(root.meshes[0].primitives[0].material, Some(json::Index::new(0)));
        assert!(root.meshes[0].primitives[1].material.is_none());
        assert_eq!(root.materials.len(), 1);
        assert_eq!(root.extensions_used, vec!["KHR_materials_pbrSpecularGlossiness"]);
    }

    #[test]
    fn test_skin_without_matrices() {
        let root = GltfBuilder::new()
            .add_skin_with("Bare", None, &[0, 1], None)
            .build(&[], &[], "test");
        assert!(root.skins[0].inverse_bind_matrices.is_none());
        assert!(root.skins[0].skeleton.is_none());
        assert_eq!(root.skins[0].joints.len(), 2);
    }
}
