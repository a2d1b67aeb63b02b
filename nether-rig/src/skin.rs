//! Skin binder

use glam::Mat4;
use tracing::debug;

use crate::container::Container;
use crate::error::{Diagnostics, LoadError, ReferenceKind, Result};
use crate::scene::{NodeId, SceneGraph};

/// Joints of a skin with their inverse bind matrices
///
/// `joints` and `inverse_bind_matrices` always have the same length.
#[derive(Debug, Clone, PartialEq)]
pub struct Skin {
    /// Skin index in the container
    pub index: usize,
    pub name: String,
    pub skeleton: Option<NodeId>,
    pub joints: Vec<NodeId>,
    pub inverse_bind_matrices: Vec<Mat4>,
}

/// Resolve every container skin against the instantiated scene graph
pub(crate) fn bind_skins(
    container: &Container<'_>,
    graph: &SceneGraph,
    max_joints: usize,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<Skin>> {
    let mut skins = Vec::with_capacity(container.root().skins.len());

    for (index, source) in container.root().skins.iter().enumerate() {
        let skeleton = match source.skeleton.map(|s| s.value()) {
            Some(node) => {
                let resolved = graph.lookup(node);
                if resolved.is_none() {
                    diagnostics.unresolved(
                        ReferenceKind::SkeletonRoot,
                        node,
                        format!("skin {index}"),
                    )?;
                }
                resolved
            }
            None => None,
        };

        let matrices = source
            .inverse_bind_matrices
            .map(|a| {
                container
                    .accessor(a.value())?
                    .read_mat4("inverseBindMatrices")
            })
            .transpose()?
            .unwrap_or_default();

        let mut joints = Vec::with_capacity(source.joints.len());
        let mut inverse_bind_matrices = Vec::with_capacity(source.joints.len());
        for (slot, joint) in source.joints.iter().enumerate() {
            match graph.lookup(joint.value()) {
                Some(id) => {
                    joints.push(id);
                    inverse_bind_matrices.push(matrices.get(slot).copied().unwrap_or(Mat4::IDENTITY));
                }
                None => diagnostics.unresolved(
                    ReferenceKind::SkinJoint,
                    joint.value(),
                    format!("skin {index} joint slot {slot}"),
                )?,
            }
        }

        if joints.len() > max_joints {
            return Err(LoadError::TooManyJoints {
                skin: index,
                count: joints.len(),
                max: max_joints,
            });
        }

        let name = source.name.clone().unwrap_or_default();
        debug!("Bound skin {} '{}': {} joints", index, name, joints.len());

        skins.push(Skin {
            index,
            name,
            skeleton,
            joints,
            inverse_bind_matrices,
        });
    }

    Ok(skins)
}

/// Clear node skin references that do not name a loaded skin
pub(crate) fn resolve_node_skins(
    graph: &mut SceneGraph,
    skin_count: usize,
    diagnostics: &mut Diagnostics,
) -> Result<()> {
    for node in graph.nodes_mut() {
        if let Some(skin) = node.skin {
            if skin >= skin_count {
                diagnostics.unresolved(
                    ReferenceKind::NodeSkin,
                    skin,
                    format!("node {}", node.index),
                )?;
                node.skin = None;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::GeometryBuffers;
    use crate::options::ReferencePolicy;
    use crate::scene;
    use glb_builder::{BufferBuilder, GltfBuilder, SkeletonBuilder, json};

    fn joint(name: &str, children: &[u32]) -> json::Node {
        json::Node {
            camera: None,
            children: (!children.is_empty())
                .then(|| children.iter().map(|c| json::Index::new(*c)).collect()),
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

    fn translation(x: f32) -> [f32; 16] {
        Mat4::from_translation(glam::Vec3::new(x, 0.0, 0.0)).to_cols_array()
    }

    /// Two-joint chain (nodes 0 -> 1) and a skin listing `joints`
    fn bind(joints: &[u32], policy: ReferencePolicy, max_joints: usize) -> Result<(Vec<Skin>, usize)> {
        let mut buffer = BufferBuilder::new();
        let ibms: Vec<[f32; 16]> = (0..joints.len()).map(|i| translation(i as f32)).collect();
        let skeleton = SkeletonBuilder::new()
            .inverse_bind_matrices(&ibms)
            .build(&mut buffer);

        let root = GltfBuilder::new()
            .buffer_byte_length(buffer.data().len() as u64)
            .add_nodes(vec![joint("hip", &[1]), joint("knee", &[])])
            .add_skin("Legs", 0, joints, &skeleton)
            .add_scene("Scene", &[0])
            .build(buffer.views(), buffer.accessors(), "test");
        let container = Container::from_parts(root, vec![buffer.data().to_vec()]);

        let mut diagnostics = Diagnostics::new(policy);
        let (roots, exhaustive) = scene::scene_roots(&container, None)?;
        let graph = scene::build(
            &container,
            &roots,
            exhaustive,
            &mut GeometryBuffers::default(),
            &mut diagnostics,
        )?;
        let skins = bind_skins(&container, &graph, max_joints, &mut diagnostics)?;
        Ok((skins, diagnostics.warnings().len()))
    }

    #[test]
    fn test_bind_resolves_joints() {
        let (skins, warnings) = bind(&[0, 1], ReferencePolicy::Permissive, 64).unwrap();
        let skin = &skins[0];
        assert_eq!(skin.name, "Legs");
        assert_eq!(skin.skeleton, Some(NodeId(0)));
        assert_eq!(skin.joints, vec![NodeId(0), NodeId(1)]);
        assert_eq!(skin.inverse_bind_matrices.len(), 2);
        assert_eq!(
            skin.inverse_bind_matrices[1],
            Mat4::from_cols_array(&translation(1.0))
        );
        assert_eq!(warnings, 0);
    }

    #[test]
    fn test_unresolved_joint_dropped_with_its_matrix() {
        let (skins, warnings) = bind(&[0, 9, 1], ReferencePolicy::Permissive, 64).unwrap();
        let skin = &skins[0];
        assert_eq!(skin.joints, vec![NodeId(0), NodeId(1)]);
        // Slot 2's matrix follows node 1, slot 1's matrix went with the dropped joint
        assert_eq!(
            skin.inverse_bind_matrices,
            vec![
                Mat4::from_cols_array(&translation(0.0)),
                Mat4::from_cols_array(&translation(2.0)),
            ]
        );
        assert_eq!(warnings, 1);
    }

    #[test]
    fn test_unresolved_joint_strict() {
        let err = bind(&[0, 9], ReferencePolicy::Strict, 64).unwrap_err();
        assert!(matches!(
            err,
            LoadError::UnresolvedReference {
                kind: ReferenceKind::SkinJoint,
                index: 9,
                ..
            }
        ));
    }

    #[test]
    fn test_too_many_joints() {
        let err = bind(&[0, 1], ReferencePolicy::Permissive, 1).unwrap_err();
        assert!(matches!(
            err,
            LoadError::TooManyJoints {
                skin: 0,
                count: 2,
                max: 1
            }
        ));
    }
}
