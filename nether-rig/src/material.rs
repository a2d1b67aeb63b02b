//! Material parameters

use glam::{Vec3, Vec4};
use gltf::json;
use gltf::json::validation::Checked;

/// Alpha blending mode of a material
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AlphaMode {
    #[default]
    Opaque,
    Mask,
    Blend,
}

/// Alpha cutoff used when a material does not specify one
pub const DEFAULT_ALPHA_CUTOFF: f32 = 0.5;

/// Scalar factors and texture slots of one material
///
/// Texture slots hold texture indices; mapping them to uploaded images is up to
/// the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: Option<String>,
    pub base_color_factor: Vec4,
    pub metallic_factor: f32,
    pub roughness_factor: f32,
    pub emissive_factor: Vec3,
    pub alpha_mode: AlphaMode,
    pub alpha_cutoff: f32,
    pub double_sided: bool,
    pub base_color_texture: Option<usize>,
    pub metallic_roughness_texture: Option<usize>,
    pub normal_texture: Option<usize>,
    pub occlusion_texture: Option<usize>,
    pub emissive_texture: Option<usize>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: None,
            base_color_factor: Vec4::ONE,
            metallic_factor: 1.0,
            roughness_factor: 1.0,
            emissive_factor: Vec3::ZERO,
            alpha_mode: AlphaMode::Opaque,
            alpha_cutoff: DEFAULT_ALPHA_CUTOFF,
            double_sided: false,
            base_color_texture: None,
            metallic_roughness_texture: None,
            normal_texture: None,
            occlusion_texture: None,
            emissive_texture: None,
        }
    }
}

impl Material {
    pub fn from_json(material: &json::Material) -> Self {
        let pbr = &material.pbr_metallic_roughness;
        let alpha_mode = match material.alpha_mode {
            Checked::Valid(json::material::AlphaMode::Mask) => AlphaMode::Mask,
            Checked::Valid(json::material::AlphaMode::Blend) => AlphaMode::Blend,
            _ => AlphaMode::Opaque,
        };

        Self {
            name: material.name.clone(),
            base_color_factor: Vec4::from_array(pbr.base_color_factor.0),
            metallic_factor: pbr.metallic_factor.0,
            roughness_factor: pbr.roughness_factor.0,
            emissive_factor: Vec3::from_array(material.emissive_factor.0),
            alpha_mode,
            alpha_cutoff: material
                .alpha_cutoff
                .map_or(DEFAULT_ALPHA_CUTOFF, |cutoff| cutoff.0),
            double_sided: material.double_sided,
            base_color_texture: pbr.base_color_texture.as_ref().map(|t| t.index.value()),
            metallic_roughness_texture: pbr
                .metallic_roughness_texture
                .as_ref()
                .map(|t| t.index.value()),
            normal_texture: material.normal_texture.as_ref().map(|t| t.index.value()),
            occlusion_texture: material.occlusion_texture.as_ref().map(|t| t.index.value()),
            emissive_texture: material.emissive_texture.as_ref().map(|t| t.index.value()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(value: serde_json::Value) -> Material {
        let material: json::Material = serde_json::from_value(value).expect("valid material");
        Material::from_json(&material)
    }

    #[test]
    fn test_material_defaults() {
        let material = parse(serde_json::json!({}));
        assert_eq!(material, Material::default());
    }

    #[test]
    fn test_material_factors_and_slots() {
        let material = parse(serde_json::json!({
            "name": "Skin",
            "pbrMetallicRoughness": {
                "baseColorFactor": [0.5, 0.25, 1.0, 0.75],
                "metallicFactor": 0.1,
                "roughnessFactor": 0.9,
                "baseColorTexture": { "index": 2 },
                "metallicRoughnessTexture": { "index": 3 }
            },
            "normalTexture": { "index": 4 },
            "occlusionTexture": { "index": 5 },
            "emissiveTexture": { "index": 6 },
            "emissiveFactor": [1.0, 0.0, 0.0],
            "alphaMode": "MASK",
            "alphaCutoff": 0.3,
            "doubleSided": true
        }));

        assert_eq!(material.name.as_deref(), Some("Skin"));
        assert_eq!(material.base_color_factor, Vec4::new(0.5, 0.25, 1.0, 0.75));
        assert_eq!(material.metallic_factor, 0.1);
        assert_eq!(material.roughness_factor, 0.9);
        assert_eq!(material.alpha_mode, AlphaMode::Mask);
        assert_eq!(material.alpha_cutoff, 0.3);
        assert!(material.double_sided);
        assert_eq!(material.base_color_texture, Some(2));
        assert_eq!(material.metallic_roughness_texture, Some(3));
        assert_eq!(material.normal_texture, Some(4));
        assert_eq!(material.occlusion_texture, Some(5));
        assert_eq!(material.emissive_texture, Some(6));
        assert_eq!(material.emissive_factor, Vec3::X);
    }

    #[test]
    fn test_material_blend_mode() {
        let material = parse(serde_json::json!({ "alphaMode": "BLEND" }));
        assert_eq!(material.alpha_mode, AlphaMode::Blend);
        assert_eq!(material.alpha_cutoff, DEFAULT_ALPHA_CUTOFF);
    }
}
