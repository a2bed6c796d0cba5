//! Conversion between UI coordinates and system (window pixel) coordinates.

use glam::IVec2;

/// UI scale factor: one UI unit covers `scale` system pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UiScaling {
    scale: f32,
}

impl Default for UiScaling {
    fn default() -> Self {
        Self { scale: 1.0 }
    }
}

impl UiScaling {
    /// Non-positive or non-finite factors fall back to 1.
    pub fn new(scale: f32) -> Self {
        if scale.is_finite() && scale > 0.0 {
            Self { scale }
        } else {
            log::warn!("invalid UI scale {scale}, using 1.0");
            Self::default()
        }
    }

    pub fn scale(self) -> f32 {
        self.scale
    }

    pub fn ui_to_system(self, position: IVec2) -> IVec2 {
        (position.as_vec2() * self.scale).round().as_ivec2()
    }

    pub fn system_to_ui(self, position: IVec2) -> IVec2 {
        (position.as_vec2() / self.scale).round().as_ivec2()
    }
}
