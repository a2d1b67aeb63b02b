//! rig-inspect - file loading and report formatting for glTF/GLB rigs
//!
//! The loader library never touches the filesystem; this crate is the host side:
//! it reads `.glb` files, or `.gltf` documents with their external buffers, and
//! turns a loaded [`Model`] into human-readable reports.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use glam::Mat4;
use nether_rig::{LoadOptions, Model, NodeId, json};

/// Read load options from a TOML file, or use defaults
pub fn load_options(config: Option<&Path>) -> Result<LoadOptions> {
    let Some(path) = config else {
        return Ok(LoadOptions::default());
    };
    let text =
        fs::read_to_string(path).with_context(|| format!("Failed to read config: {:?}", path))?;
    LoadOptions::from_toml_str(&text).with_context(|| format!("Failed to parse config: {:?}", path))
}

/// Load a `.glb` or `.gltf` file
///
/// External `.gltf` buffers are read relative to the document. Embedded `data:`
/// URIs are not supported.
pub fn load_model(input: &Path, options: &LoadOptions) -> Result<Model> {
    let ext = input
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    let bytes = fs::read(input).with_context(|| format!("Failed to read {:?}", input))?;

    let model = match ext.as_str() {
        "glb" => Model::from_glb(&bytes, options)
            .with_context(|| format!("Failed to load GLB: {:?}", input))?,
        "gltf" => {
            let root: json::Root = serde_json::from_slice(&bytes)
                .with_context(|| format!("Failed to parse glTF JSON: {:?}", input))?;
            let base = input.parent().unwrap_or_else(|| Path::new("."));
            let buffers = read_external_buffers(&root, base)?;
            Model::from_json(root, buffers, options)
                .with_context(|| format!("Failed to load glTF: {:?}", input))?
        }
        _ => bail!("Unsupported file type: {:?} (use .gltf or .glb)", input),
    };

    if !model.warnings().is_empty() {
        tracing::warn!(
            "{:?} loaded with {} warning(s)",
            input,
            model.warnings().len()
        );
    }
    Ok(model)
}

fn read_external_buffers(root: &json::Root, base: &Path) -> Result<Vec<Vec<u8>>> {
    root.buffers
        .iter()
        .enumerate()
        .map(|(i, buffer)| match buffer.uri.as_deref() {
            Some(uri) if uri.starts_with("data:") => {
                bail!("Buffer {} uses an embedded data URI, which is not supported", i)
            }
            Some(uri) => {
                let path = base.join(uri);
                fs::read(&path).with_context(|| format!("Failed to read buffer {}: {:?}", i, path))
            }
            None => bail!("Buffer {} has no uri", i),
        })
        .collect()
}

fn node_label(model: &Model, id: NodeId) -> String {
    let node = model.node(id);
    match &node.name {
        Some(name) => format!("[{}] '{}'", node.index, name),
        None => format!("[{}]", node.index),
    }
}

/// One line per node, indented by depth
pub fn describe_tree(model: &Model) -> Vec<String> {
    let mut lines = Vec::with_capacity(model.nodes().len());
    let mut stack: Vec<(NodeId, usize)> = model.roots().iter().rev().map(|&r| (r, 0)).collect();

    while let Some((id, depth)) = stack.pop() {
        let node = model.node(id);
        let mut line = format!("{}{}", "  ".repeat(depth), node_label(model, id));
        if let Some(mesh) = &node.mesh {
            line.push_str(&format!(
                " mesh '{}' ({} primitives)",
                mesh.name,
                mesh.primitives.len()
            ));
        }
        if let Some(skin) = node.skin {
            line.push_str(&format!(" skin {}", skin));
        }
        lines.push(line);
        stack.extend(node.children.iter().rev().map(|&c| (c, depth + 1)));
    }
    lines
}

pub fn describe_skins(model: &Model) -> Vec<String> {
    model
        .skins()
        .iter()
        .map(|skin| {
            let skeleton = skin
                .skeleton
                .map(|s| node_label(model, s))
                .unwrap_or_else(|| "none".to_string());
            format!(
                "[{}] '{}': {} joints, skeleton {}",
                skin.index,
                skin.name,
                skin.joints.len(),
                skeleton
            )
        })
        .collect()
}

pub fn describe_animations(model: &Model) -> Vec<String> {
    model
        .animations()
        .iter()
        .enumerate()
        .map(|(i, animation)| {
            format!(
                "[{}] '{}': {} channels, {:.2}s..{:.2}s",
                i,
                animation.name,
                animation.channels.len(),
                animation.start,
                animation.end
            )
        })
        .collect()
}

pub fn describe_bounds(model: &Model) -> String {
    match model.dimensions() {
        Some(d) => format!(
            "min {:?} max {:?} center {:?} radius {:.3}",
            d.min.to_array(),
            d.max.to_array(),
            d.center.to_array(),
            d.radius
        ),
        None => "no geometry".to_string(),
    }
}

/// Joint matrices of one skinned node at one time
#[derive(Debug, Clone)]
pub struct JointSample {
    pub time: f32,
    pub node: String,
    pub matrices: Vec<Mat4>,
}

/// Evaluate `animation` at each of `times`, collecting joint matrices of every skinned node
pub fn sample_joints(model: &mut Model, animation: usize, times: &[f32]) -> Result<Vec<JointSample>> {
    if animation >= model.animations().len() {
        bail!(
            "Animation {} out of range ({} animations)",
            animation,
            model.animations().len()
        );
    }

    let skinned: Vec<NodeId> = model
        .nodes()
        .iter()
        .filter(|node| node.skin.is_some())
        .filter_map(|node| model.node_by_index(node.index))
        .collect();

    let mut samples = Vec::with_capacity(times.len() * skinned.len());
    for &time in times {
        model.evaluate_animation(animation, time);
        for &id in &skinned {
            samples.push(JointSample {
                time,
                node: node_label(model, id),
                matrices: model.joint_matrices(id).to_vec(),
            });
        }
    }
    Ok(samples)
}

/// Row-major rendering of a matrix, one bracketed row per line
pub fn format_matrix(matrix: &Mat4) -> Vec<String> {
    let rows = matrix.transpose().to_cols_array_2d();
    rows.iter()
        .map(|r| format!("[{:8.3} {:8.3} {:8.3} {:8.3}]", r[0], r[1], r[2], r[3]))
        .collect()
}
