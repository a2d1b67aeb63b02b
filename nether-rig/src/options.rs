//! Load-time configuration

use serde::{Deserialize, Serialize};

/// Default ceiling for the number of joints in one skin
pub const DEFAULT_MAX_JOINTS: usize = 64;

/// What to do with skin joints, skeleton roots and channel targets that do not
/// resolve to an instantiated node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferencePolicy {
    /// Drop the offending element, record a warning and keep loading
    #[default]
    Permissive,
    /// Abort the load with `UnresolvedReference`
    Strict,
}

/// How CUBICSPLINE samplers are evaluated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CubicSplineMode {
    /// Cubic Hermite over (in-tangent, value, out-tangent) keyframe triples
    #[default]
    Hermite,
    /// Linear interpolation between the value elements, tangents ignored
    Linear,
    /// Hold the value element of the previous keyframe
    Step,
}

/// Options controlling how a container is turned into a [`Model`](crate::Model)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Policy for unresolved weak references
    pub reference_policy: ReferencePolicy,

    /// Skins with more joints than this fail with `TooManyJoints`
    pub max_joints: usize,

    /// Evaluation mode for CUBICSPLINE samplers
    pub cubic_spline: CubicSplineMode,

    /// Bake the bind-pose world transform of each mesh node into its vertices
    pub pre_transform_vertices: bool,

    /// Negate the Y component of positions and normals
    pub flip_y: bool,

    /// Multiply vertex colors by the primitive's material base color factor
    pub pre_multiply_vertex_colors: bool,

    /// Scene to instantiate (None = the container's default scene)
    pub scene: Option<usize>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            reference_policy: ReferencePolicy::Permissive,
            max_joints: DEFAULT_MAX_JOINTS,
            cubic_spline: CubicSplineMode::Hermite,
            pre_transform_vertices: false,
            flip_y: false,
            pre_multiply_vertex_colors: false,
            scene: None,
        }
    }
}

impl LoadOptions {
    /// Parse options from a TOML document; missing keys keep their defaults
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Shorthand for the strict reference policy
    pub fn strict() -> Self {
        Self {
            reference_policy: ReferencePolicy::Strict,
            ..Self::default()
        }
    }
}
