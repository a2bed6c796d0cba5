//! SSAO (Screen Space Ambient Occlusion) configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Result, UmbraError};

/// SSAO quality preset. Selects the sample count compiled into the
/// evaluation pipelines, so changing it rebuilds pipeline state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AmbientOcclusionQuality {
    /// 8 samples.
    Low,
    /// 16 samples.
    #[default]
    Medium,
    /// 32 samples.
    High,
    /// 64 samples.
    Ultra,
}

impl AmbientOcclusionQuality {
    /// Number of hemisphere samples evaluated per pixel.
    #[must_use]
    pub fn sample_count(self) -> u32 {
        match self {
            Self::Low => 8,
            Self::Medium => 16,
            Self::High => 32,
            Self::Ultra => 64,
        }
    }
}

/// Part of the settings that decides the size/format of the AO targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureKey {
    pub downscale: u32,
}

/// Part of the settings that decides which pipelines are compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateKey {
    pub quality: AmbientOcclusionQuality,
}

/// SSAO pass settings. A flat record; every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientOcclusionSettings {
    /// Whether the pass contributes anything.
    pub enabled: bool,
    /// AO targets are `output / downscale` pixels (1 = full resolution).
    pub downscale: u32,
    /// Quality preset.
    pub quality: AmbientOcclusionQuality,
    /// Strength of the darkening (0 = none).
    pub strength: f32,
    /// Power applied to the occlusion term.
    pub exponent: f32,
    /// Sample radius for geometry at `distance_near`.
    pub radius_near: f32,
    pub distance_near: f32,
    /// Sample radius for geometry at `distance_far`.
    pub radius_far: f32,
    pub distance_far: f32,
    /// Occlusion fades out between these view distances.
    pub fade_distance_begin: f32,
    pub fade_distance_end: f32,
    /// Depth difference (view units) beyond which blur taps are rejected.
    pub blur_depth_threshold: f32,
    /// Normal dot threshold below which blur taps are rejected (deferred only).
    pub blur_normal_threshold: f32,
    /// Distance in texels between blur taps.
    pub blur_radius: f32,
    /// Debug: replace the scene color with the blurred AO term.
    pub preview: bool,
}

impl Default for AmbientOcclusionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            downscale: 1,
            quality: AmbientOcclusionQuality::Medium,
            strength: 0.7,
            exponent: 1.5,
            radius_near: 0.05,
            distance_near: 1.0,
            radius_far: 1.0,
            distance_far: 100.0,
            fade_distance_begin: 100.0,
            fade_distance_end: 200.0,
            blur_depth_threshold: 0.1,
            blur_normal_threshold: 0.2,
            blur_radius: 1.0,
            preview: false,
        }
    }
}

impl AmbientOcclusionSettings {
    /// Parses settings from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Serializes settings to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks ranges and finiteness of every numeric field.
    pub fn validate(&self) -> Result<()> {
        if self.downscale == 0 {
            return Err(UmbraError::InvalidSettings(
                "downscale must be at least 1".into(),
            ));
        }

        let fields = [
            ("strength", self.strength),
            ("exponent", self.exponent),
            ("radius_near", self.radius_near),
            ("distance_near", self.distance_near),
            ("radius_far", self.radius_far),
            ("distance_far", self.distance_far),
            ("fade_distance_begin", self.fade_distance_begin),
            ("fade_distance_end", self.fade_distance_end),
            ("blur_depth_threshold", self.blur_depth_threshold),
            ("blur_normal_threshold", self.blur_normal_threshold),
            ("blur_radius", self.blur_radius),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(UmbraError::InvalidSettings(format!(
                    "{name} must be a finite non-negative number, got {value}"
                )));
            }
        }

        if self.distance_far < self.distance_near {
            return Err(UmbraError::InvalidSettings(
                "distance_far must not be less than distance_near".into(),
            ));
        }
        if self.fade_distance_end < self.fade_distance_begin {
            return Err(UmbraError::InvalidSettings(
                "fade_distance_end must not be less than fade_distance_begin".into(),
            ));
        }
        Ok(())
    }

    /// Key for texture cache invalidation.
    #[must_use]
    pub fn texture_key(&self) -> TextureKey {
        TextureKey {
            downscale: self.downscale.max(1),
        }
    }

    /// Key for pipeline state cache invalidation.
    #[must_use]
    pub fn state_key(&self) -> StateKey {
        StateKey {
            quality: self.quality,
        }
    }
}
