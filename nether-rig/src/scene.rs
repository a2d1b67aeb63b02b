//! Scene graph builder
//!
//! Nodes live in a single arena in pre-order: every parent precedes its
//! children, so world matrices can be recomputed with one linear pass. Weak
//! references (skin joints, skeleton roots, channel targets) are [`NodeId`]s into
//! that arena, resolved from container node indices through a lookup table.

use glam::{Mat4, Quat, Vec3};
use gltf::json;
use tracing::debug;

use crate::container::Container;
use crate::error::{Diagnostics, LoadError, ReferenceKind, Result};
use crate::geometry::{GeometryAssembler, GeometryBuffers, Mesh};

/// Position of a node in the model's node arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One node of the scene forest
#[derive(Debug, Clone)]
pub struct Node {
    /// Node index in the container
    pub index: usize,
    pub name: Option<String>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,

    /// Canonical, animatable local transform
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    /// Baseline matrix from the container (identity when TRS is used)
    pub matrix: Mat4,

    pub mesh: Option<Mesh>,
    /// Index into the model's skins
    pub skin: Option<usize>,

    pub(crate) world: Mat4,
    pub(crate) joint_matrices: Vec<Mat4>,
}

impl Node {
    fn from_json(index: usize, source: &json::Node, parent: Option<NodeId>, mesh: Option<Mesh>) -> Self {
        Self {
            index,
            name: source.name.clone(),
            parent,
            children: Vec::new(),
            translation: source.translation.map_or(Vec3::ZERO, Vec3::from_array),
            rotation: source
                .rotation
                .map_or(Quat::IDENTITY, |r| Quat::from_array(r.0)),
            scale: source.scale.map_or(Vec3::ONE, Vec3::from_array),
            matrix: source
                .matrix
                .map_or(Mat4::IDENTITY, |m| Mat4::from_cols_array(&m)),
            mesh,
            skin: source.skin.map(|s| s.value()),
            world: Mat4::IDENTITY,
            joint_matrices: Vec::new(),
        }
    }

    /// `T * R * S * matrix`
    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
            * self.matrix
    }

    /// World matrix as of the last pose update
    pub fn world_matrix(&self) -> Mat4 {
        self.world
    }
}

/// Arena of nodes with a container-index lookup
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
    /// Container node index -> arena slot (None if not instantiated)
    lookup: Vec<Option<NodeId>>,
}

impl SceneGraph {
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Arena slot of container node `index`
    pub fn lookup(&self, index: usize) -> Option<NodeId> {
        self.lookup.get(index).copied().flatten()
    }

    /// Depth-first walk from the roots through the child lists
    pub fn walk(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
        }
        order
    }

    /// Recompute every world matrix top-down
    pub fn update_world_transforms(&mut self) {
        for i in 0..self.nodes.len() {
            let local = self.nodes[i].local_matrix();
            let world = match self.nodes[i].parent {
                Some(parent) => self.nodes[parent.0].world * local,
                None => local,
            };
            self.nodes[i].world = world;
        }
    }
}

/// Container node indices to instantiate as roots
///
/// Returns the roots and whether every container node is expected to be reached
/// from them (true when no scene is available and parentless nodes are used).
pub(crate) fn scene_roots(container: &Container<'_>, scene: Option<usize>) -> Result<(Vec<usize>, bool)> {
    let root = container.root();
    let scene = scene.or_else(|| root.scene.map(|s| s.value())).or_else(|| {
        if root.scenes.is_empty() {
            None
        } else {
            Some(0)
        }
    });

    if let Some(index) = scene {
        let scene = root.scenes.get(index).ok_or(LoadError::DanglingIndex {
            kind: "scene",
            index,
        })?;
        return Ok((scene.nodes.iter().map(|n| n.value()).collect(), false));
    }

    let mut has_parent = vec![false; root.nodes.len()];
    for node in &root.nodes {
        for child in node.children.iter().flatten() {
            if let Some(flag) = has_parent.get_mut(child.value()) {
                *flag = true;
            }
        }
    }
    let roots = has_parent
        .iter()
        .enumerate()
        .filter(|(_, has_parent)| !**has_parent)
        .map(|(i, _)| i)
        .collect();
    Ok((roots, true))
}

/// Instantiate the forest below `roots`, assembling meshes on the way
///
/// With `exhaustive` set, a container node left unreached afterwards can only be
/// part of a cycle and is reported as such.
pub(crate) fn build(
    container: &Container<'_>,
    roots: &[usize],
    exhaustive: bool,
    buffers: &mut GeometryBuffers,
    diagnostics: &mut Diagnostics,
) -> Result<SceneGraph> {
    let source_nodes = &container.root().nodes;
    let geometry = GeometryAssembler::new(container);

    let mut graph = SceneGraph {
        nodes: Vec::with_capacity(source_nodes.len()),
        roots: Vec::with_capacity(roots.len()),
        lookup: vec![None; source_nodes.len()],
    };

    let mut stack: Vec<(usize, Option<NodeId>)> = roots.iter().rev().map(|&r| (r, None)).collect();
    while let Some((index, parent)) = stack.pop() {
        let Some(source) = source_nodes.get(index) else {
            let context = match parent {
                Some(p) => format!("child of node {}", graph.nodes[p.0].index),
                None => "scene root".to_string(),
            };
            diagnostics.unresolved(ReferenceKind::SceneNode, index, context)?;
            continue;
        };

        if graph.lookup[index].is_some() {
            return Err(LoadError::CyclicNodeGraph { node: index });
        }

        let id = NodeId(graph.nodes.len());
        graph.lookup[index] = Some(id);

        let mesh = source
            .mesh
            .map(|m| geometry.assemble(m.value(), buffers, diagnostics))
            .transpose()?;

        graph.nodes.push(Node::from_json(index, source, parent, mesh));
        match parent {
            Some(p) => graph.nodes[p.0].children.push(id),
            None => graph.roots.push(id),
        }

        if let Some(children) = &source.children {
            stack.extend(children.iter().rev().map(|c| (c.value(), Some(id))));
        }
    }

    if exhaustive {
        if let Some(node) = graph.lookup.iter().position(Option::is_none) {
            return Err(LoadError::CyclicNodeGraph { node });
        }
    }

    debug!(
        "Built scene graph: {} nodes, {} roots",
        graph.nodes.len(),
        graph.roots.len()
    );
    Ok(graph)
}
