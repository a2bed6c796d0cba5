//! Minimal material description shared between drawables.

use crate::ids::TextureId;

/// Technique used by UI surfaces: unlit diffuse.
pub const DIFFUSE_UNLIT_TECHNIQUE: &str = "techniques/diffuse_unlit";

/// Texture unit a material binds a texture to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureUnit {
    Diffuse,
    Normal,
    Emissive,
}

/// A technique reference plus bound textures. Loading the technique itself
/// is the job of the material system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Material {
    technique: String,
    textures: Vec<(TextureUnit, TextureId)>,
}

impl Material {
    pub fn new(technique: impl Into<String>) -> Self {
        Self {
            technique: technique.into(),
            textures: Vec::new(),
        }
    }

    pub fn technique(&self) -> &str {
        &self.technique
    }

    /// Binds `texture` to `unit`, replacing any previous binding.
    pub fn set_texture(&mut self, unit: TextureUnit, texture: TextureId) {
        self.textures.retain(|(u, _)| *u != unit);
        self.textures.push((unit, texture));
    }

    pub fn texture(&self, unit: TextureUnit) -> Option<TextureId> {
        self.textures
            .iter()
            .find(|(u, _)| *u == unit)
            .map(|(_, t)| *t)
    }
}
