//! Load error types
//!
//! A single error enum covers both fatal conditions (which abort the load) and
//! recoverable ones (which the permissive reference policy records as warnings
//! on the loaded [`Model`](crate::Model)).

use core::fmt;

use tracing::warn;

use crate::options::ReferencePolicy;

/// Result alias used throughout the loader
pub type Result<T> = std::result::Result<T, LoadError>;

/// What kind of object a weak node reference belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// Entry of a skin's `joints` array
    SkinJoint,
    /// A skin's `skeleton` root
    SkeletonRoot,
    /// A node's `skin` index
    NodeSkin,
    /// An animation channel's target node
    ChannelTarget,
    /// An animation channel's sampler index
    ChannelSampler,
    /// A child index listed by a node or a scene root
    SceneNode,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SkinJoint => "skin joint",
            Self::SkeletonRoot => "skeleton root",
            Self::NodeSkin => "node skin",
            Self::ChannelTarget => "channel target",
            Self::ChannelSampler => "channel sampler",
            Self::SceneNode => "scene node",
        };
        f.write_str(name)
    }
}

/// Errors (and recoverable warnings) produced while loading a model
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// A primitive lacks a required vertex attribute (POSITION)
    #[error("mesh {mesh} primitive {primitive} is missing required attribute {attribute}")]
    MissingRequiredAttribute {
        mesh: usize,
        primitive: usize,
        attribute: &'static str,
    },

    /// Accessor component type is not allowed for how the accessor is used
    #[error("accessor {accessor}: component type {component_type} not supported for {usage}")]
    UnsupportedComponentType {
        accessor: usize,
        component_type: String,
        usage: &'static str,
    },

    /// Accessor element type (SCALAR, VEC3, ...) is not allowed for how it is used
    #[error("accessor {accessor}: element type {element_type} not supported for {usage}")]
    UnsupportedElementType {
        accessor: usize,
        element_type: String,
        usage: &'static str,
    },

    /// Declared byte range runs past the end of the backing buffer or view
    #[error("accessor {accessor}: needs {required} bytes but only {available} are available")]
    TruncatedBuffer {
        accessor: usize,
        required: usize,
        available: usize,
    },

    /// The node hierarchy is not a forest (cycle or node with two parents)
    #[error("node {node} is reachable more than once; the node graph is not a forest")]
    CyclicNodeGraph { node: usize },

    /// A weak node reference points at a node that was not instantiated
    #[error("unresolved {kind} reference to index {index} ({context})")]
    UnresolvedReference {
        kind: ReferenceKind,
        index: usize,
        context: String,
    },

    /// A skin has more joints than the configured ceiling
    #[error("skin {skin} has {count} joints (max {max})")]
    TooManyJoints {
        skin: usize,
        count: usize,
        max: usize,
    },

    /// A structural index (accessor, buffer view, buffer, mesh, material) is out of range
    #[error("{kind} index {index} is out of range")]
    DanglingIndex { kind: &'static str, index: usize },

    /// A primitive's index addresses a vertex past the end of its own vertex range
    #[error("mesh {mesh} primitive {primitive}: index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        mesh: usize,
        primitive: usize,
        index: u32,
        vertex_count: usize,
    },

    /// A buffer has no bytes supplied (external URI not resolved by the host)
    #[error("buffer {buffer} has no data")]
    MissingBufferData { buffer: usize },

    /// Sparse accessors are not supported
    #[error("accessor {accessor} is sparse; sparse accessors are not supported")]
    SparseAccessor { accessor: usize },

    /// Accessor has no buffer view (and is not sparse)
    #[error("accessor {accessor} has no buffer view")]
    MissingBufferView { accessor: usize },

    /// Sampler input times are not ascending (recoverable)
    #[error("animation {animation} sampler {sampler}: keyframe times are not ascending")]
    UnsortedKeyframes { animation: usize, sampler: usize },

    /// Channel targets a property this loader does not animate (recoverable)
    #[error("animation {animation} channel {channel}: unsupported target path {path}")]
    UnsupportedChannelPath {
        animation: usize,
        channel: usize,
        path: String,
    },

    /// Only one of JOINTS_0 / WEIGHTS_0 is present (recoverable)
    #[error("mesh {mesh} primitive {primitive} has partial skinning data, ignoring skinning")]
    PartialSkinning { mesh: usize, primitive: usize },

    /// Primitive has no index accessor and was skipped (recoverable)
    #[error("mesh {mesh} primitive {primitive} has no indices and was skipped")]
    NonIndexedPrimitive { mesh: usize, primitive: usize },

    /// GLB framing error
    #[error("invalid GLB container: {0}")]
    InvalidContainer(#[from] gltf::Error),

    /// JSON chunk does not match the container schema
    #[error("invalid container JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl LoadError {
    /// Whether this condition may be recovered from by skipping the offending element
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::UnresolvedReference { .. }
                | Self::UnsortedKeyframes { .. }
                | Self::UnsupportedChannelPath { .. }
                | Self::PartialSkinning { .. }
                | Self::NonIndexedPrimitive { .. }
        )
    }
}

/// Collects recoverable conditions while a model is loading
#[derive(Debug, Default)]
pub(crate) struct Diagnostics {
    policy: ReferencePolicy,
    warnings: Vec<LoadError>,
}

impl Diagnostics {
    pub fn new(policy: ReferencePolicy) -> Self {
        Self {
            policy,
            warnings: Vec::new(),
        }
    }

    /// Record a recoverable condition
    pub fn warn(&mut self, warning: LoadError) {
        warn!("{}", warning);
        self.warnings.push(warning);
    }

    /// Handle a weak reference that did not resolve
    ///
    /// Permissive: recorded as a warning and the caller drops the element.
    /// Strict: returned as an error, aborting the load.
    pub fn unresolved(
        &mut self,
        kind: ReferenceKind,
        index: usize,
        context: impl Into<String>,
    ) -> Result<()> {
        let error = LoadError::UnresolvedReference {
            kind,
            index,
            context: context.into(),
        };
        match self.policy {
            ReferencePolicy::Strict => Err(error),
            ReferencePolicy::Permissive => {
                self.warn(error);
                Ok(())
            }
        }
    }

    #[cfg(test)]
    pub fn warnings(&self) -> &[LoadError] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<LoadError> {
        self.warnings
    }
}
