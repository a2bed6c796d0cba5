//! Configuration options for umbra.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, UmbraError};
use crate::AmbientOcclusionSettings;

/// Default edge length of a UI surface texture.
pub const UI_SURFACE_DEFAULT_TEXTURE_SIZE: u32 = 512;
/// Smallest allowed UI surface texture.
pub const UI_SURFACE_MIN_TEXTURE_SIZE: u32 = 64;
/// Largest allowed UI surface texture.
pub const UI_SURFACE_MAX_TEXTURE_SIZE: u32 = 4096;

/// Clamps a requested UI surface size into the supported range.
#[must_use]
pub fn clamp_ui_texture_size(size: u32) -> u32 {
    size.clamp(UI_SURFACE_MIN_TEXTURE_SIZE, UI_SURFACE_MAX_TEXTURE_SIZE)
}

/// UI surface options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSurfaceOptions {
    /// Edge length of the square render target (clamped on use).
    pub texture_size: u32,
    /// UI coordinates are system coordinates divided by this.
    pub ui_scale: f32,
}

impl Default for UiSurfaceOptions {
    fn default() -> Self {
        Self {
            texture_size: UI_SURFACE_DEFAULT_TEXTURE_SIZE,
            ui_scale: 1.0,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Ambient occlusion pass settings.
    pub ambient_occlusion: AmbientOcclusionSettings,
    /// UI surface options.
    pub ui: UiSurfaceOptions,
}

impl Options {
    /// Parses options from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Loads options from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        log::debug!("loading options from {}", path.as_ref().display());
        Self::from_json(&text)
    }

    /// Writes options as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.ambient_occlusion.validate()?;
        if !self.ui.ui_scale.is_finite() || self.ui.ui_scale <= 0.0 {
            return Err(UmbraError::InvalidSettings(format!(
                "ui_scale must be positive, got {}",
                self.ui.ui_scale
            )));
        }
        Ok(())
    }
}
