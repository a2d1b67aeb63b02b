//! Scene-graph asset loading and skeletal animation for glTF containers
//!
//! This library turns a glTF/GLB container into in-memory structures a renderer
//! can upload and pose:
//! - Byte accessor resolver: bounds-checked, little-endian typed reads
//! - Geometry assembler: one shared vertex/index array plus per-primitive ranges
//! - Scene graph builder: node arena with stable lookup by container index
//! - Skin binder: joints and inverse bind matrices
//! - Animation track store: samplers and channels per animation
//! - Transform/skinning evaluator: sampled TRS, world and joint matrices
//!
//! No file I/O happens here; the host supplies container bytes.
//!
//! # Example
//!
//! ```no_run
//! use nether_rig::{Animator, LoadOptions, Model};
//!
//! # fn main() -> nether_rig::Result<()> {
//! let bytes: Vec<u8> = Vec::new(); // read from disk by the host
//! let mut model = Model::from_glb(&bytes, &LoadOptions::default())?;
//!
//! let mut animator = Animator::new(&model);
//! animator.play(0);
//! animator.advance(&mut model, 1.0 / 60.0);
//!
//! for node in model.nodes() {
//!     if let (Some(_), Some(id)) = (node.skin, model.node_by_index(node.index)) {
//!         let _upload: &[u8] = model.joint_matrix_bytes(id);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod accessor;
pub mod animation;
pub mod animator;
pub mod container;
pub mod error;
mod evaluator;
pub mod geometry;
pub mod material;
pub mod model;
pub mod options;
pub mod scene;
pub mod skin;

pub use accessor::{AccessorView, ComponentType, ElementType};
pub use animation::{Animation, Channel, Interpolation, Path, Sampler};
pub use animator::{Animator, PlaybackState};
pub use container::Container;
pub use error::{LoadError, ReferenceKind, Result};
pub use geometry::{Dimensions, Mesh, Primitive, Vertex};
pub use material::{AlphaMode, Material};
pub use model::Model;
pub use options::{CubicSplineMode, LoadOptions, ReferencePolicy};
pub use scene::{Node, NodeId, SceneGraph};
pub use skin::Skin;

// Re-export the container schema so callers can build documents for `Model::from_json`
pub use gltf::json;
