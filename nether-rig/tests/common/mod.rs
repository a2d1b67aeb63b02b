//! Shared fixtures: small rigs built in memory with glb-builder

#![allow(dead_code)]

use glb_builder::json;
use glb_builder::{
    AccessorIndex, BufferBuilder, GltfBuilder, MeshAccessors, MeshBuilder, Track, assemble_glb,
};
use nether_rig::{LoadOptions, Model, Result};

pub const QUAD: [[f32; 3]; 4] = [
    [0.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [1.0, 1.0, 0.0],
    [0.0, 1.0, 0.0],
];

pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 2, 3, 0];

/// Quaternion for 90 degrees about +Y, as stored in a container
pub const QUARTER_TURN_Y: [f32; 4] = [0.0, std::f32::consts::FRAC_1_SQRT_2, 0.0, std::f32::consts::FRAC_1_SQRT_2];

pub const IDENTITY_QUAT: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

pub fn node(name: &str) -> json::Node {
    json::Node {
        camera: None,
        children: None,
        extensions: Default::default(),
        extras: Default::default(),
        matrix: None,
        mesh: None,
        name: Some(name.to_string()),
        rotation: None,
        scale: None,
        skin: None,
        translation: None,
        weights: None,
    }
}

pub fn with_children(mut node: json::Node, children: &[u32]) -> json::Node {
    node.children = Some(children.iter().map(|c| json::Index::new(*c)).collect());
    node
}

pub fn with_mesh(mut node: json::Node, mesh: u32) -> json::Node {
    node.mesh = Some(json::Index::new(mesh));
    node
}

pub fn with_skin(mut node: json::Node, skin: u32) -> json::Node {
    node.skin = Some(json::Index::new(skin));
    node
}

pub fn with_translation(mut node: json::Node, translation: [f32; 3]) -> json::Node {
    node.translation = Some(translation);
    node
}

/// A finished document and its binary buffer
pub struct Fixture {
    pub root: json::Root,
    pub data: Vec<u8>,
}

impl Fixture {
    pub fn new(builder: GltfBuilder, buffer: &BufferBuilder) -> Self {
        let root = builder
            .buffer_byte_length(buffer.data().len() as u64)
            .build(buffer.views(), buffer.accessors(), "nether-rig tests");
        Self {
            root,
            data: buffer.data().to_vec(),
        }
    }

    pub fn glb(&self) -> Vec<u8> {
        assemble_glb(&self.root, self.data())
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Load through the binary container path
    pub fn load(&self, options: &LoadOptions) -> Result<Model> {
        Model::from_glb(&self.glb(), options)
    }

    /// Load through the parsed-document path
    pub fn load_json(self, options: &LoadOptions) -> Result<Model> {
        Model::from_json(self.root, vec![self.data], options)
    }
}

pub fn quad(buffer: &mut BufferBuilder) -> MeshAccessors {
    MeshBuilder::new()
        .positions(&QUAD)
        .indices(&QUAD_INDICES)
        .build(buffer)
}

/// Skinned quad on node 0 whose skin lists nodes 0 and 1; node 1 is a child
/// joint rotating from identity to 90 degrees about Y over one second.
pub fn two_node_rig() -> Fixture {
    two_node_rig_with(json::animation::Interpolation::Linear)
}

pub fn two_node_rig_with(interpolation: json::animation::Interpolation) -> Fixture {
    let mut buffer = BufferBuilder::new();
    let mesh = MeshBuilder::new()
        .positions(&QUAD)
        .joints(&[[0, 0, 0, 0], [1, 0, 0, 0], [1, 0, 0, 0], [0, 0, 0, 0]])
        .weights(&[[1.0, 0.0, 0.0, 0.0]; 4])
        .indices(&QUAD_INDICES)
        .build(&mut buffer);

    let identity = glam::Mat4::IDENTITY.to_cols_array();
    let ibms = buffer.pack_mat4(&[identity, identity]);

    let times = buffer.pack_scalars_with_bounds(&[0.0, 1.0]);
    let rotations = match interpolation {
        json::animation::Interpolation::CubicSpline => {
            let zero = [0.0; 4];
            buffer.pack_vec4(&[zero, IDENTITY_QUAT, zero, zero, QUARTER_TURN_Y, zero])
        }
        _ => buffer.pack_vec4(&[IDENTITY_QUAT, QUARTER_TURN_Y]),
    };

    let builder = GltfBuilder::new()
        .add_mesh_from_accessors("Quad", &mesh)
        .add_node(with_skin(with_mesh(with_children(node("Root"), &[1]), 0), 0))
        .add_node(node("Joint"))
        .add_skin_with("Rig", Some(0), &[0, 1], Some(ibms))
        .add_tracks(
            "Turn",
            &[Track::linear(1, json::animation::Property::Rotation, times, rotations)
                .interpolation(interpolation)],
        )
        .add_scene("Scene", &[0]);

    Fixture::new(builder, &buffer)
}

/// Single-channel translation track on node 0
pub fn translation_track(
    buffer: &mut BufferBuilder,
    times: &[f32],
    values: &[[f32; 3]],
) -> (AccessorIndex, AccessorIndex) {
    (buffer.pack_scalars_with_bounds(times), buffer.pack_vec3(values))
}

pub fn assert_mat4_near(actual: glam::Mat4, expected: glam::Mat4) {
    assert!(
        actual.abs_diff_eq(expected, 1e-5),
        "expected {:?}, got {:?}",
        expected,
        actual
    );
}
