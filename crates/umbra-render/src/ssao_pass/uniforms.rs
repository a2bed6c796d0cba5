//! GPU-side parameter blocks of the ambient occlusion shaders.

use glam::{Mat4, UVec2};
use umbra_core::AmbientOcclusionSettings;

/// Parameters of the evaluation shader (`ssao.wgsl`).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SsaoUniforms {
    pub view_to_texture: [[f32; 4]; 4],
    pub texture_to_view: [[f32; 4]; 4],
    /// `radius_near`, `distance_near`, `radius_far`, `distance_far`.
    pub radius_info: [f32; 4],
    /// `fade_begin`, `fade_end`, `strength`, `exponent`.
    pub fade_info: [f32; 4],
}

impl SsaoUniforms {
    pub fn new(settings: &AmbientOcclusionSettings, view_to_texture: Mat4, texture_to_view: Mat4) -> Self {
        Self {
            view_to_texture: view_to_texture.to_cols_array_2d(),
            texture_to_view: texture_to_view.to_cols_array_2d(),
            radius_info: [
                settings.radius_near,
                settings.distance_near,
                settings.radius_far,
                settings.distance_far,
            ],
            fade_info: [
                settings.fade_distance_begin,
                settings.fade_distance_end,
                settings.strength,
                settings.exponent,
            ],
        }
    }
}

/// Parameters of one blur direction (`ssao_blur.wgsl`).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BlurUniforms {
    pub texture_to_view: [[f32; 4]; 4],
    /// Step in uv (x, y), depth threshold, normal threshold.
    pub step_thresholds: [f32; 4],
}

/// Direction of a separable blur step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlurAxis {
    Horizontal,
    Vertical,
}

impl BlurAxis {
    /// Axis used by the given blur iteration; iterations alternate.
    pub fn for_iteration(iteration: usize) -> Self {
        if iteration % 2 == 0 {
            Self::Horizontal
        } else {
            Self::Vertical
        }
    }
}

impl BlurUniforms {
    pub fn new(
        settings: &AmbientOcclusionSettings,
        texture_to_view: Mat4,
        target_size: UVec2,
        axis: BlurAxis,
    ) -> Self {
        let texel = 1.0 / target_size.max(UVec2::ONE).as_vec2() * settings.blur_radius;
        let step = match axis {
            BlurAxis::Horizontal => [texel.x, 0.0],
            BlurAxis::Vertical => [0.0, texel.y],
        };
        Self {
            texture_to_view: texture_to_view.to_cols_array_2d(),
            step_thresholds: [
                step[0],
                step[1],
                settings.blur_depth_threshold,
                settings.blur_normal_threshold,
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_sizes_are_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<SsaoUniforms>(), 160);
        assert_eq!(std::mem::size_of::<BlurUniforms>(), 80);
    }

    #[test]
    fn test_blur_axes_alternate() {
        let settings = AmbientOcclusionSettings::default();
        let size = UVec2::new(200, 100);
        let h = BlurUniforms::new(&settings, Mat4::IDENTITY, size, BlurAxis::for_iteration(0));
        let v = BlurUniforms::new(&settings, Mat4::IDENTITY, size, BlurAxis::for_iteration(1));
        assert!((h.step_thresholds[0] - 0.005).abs() < 1e-6);
        assert_eq!(h.step_thresholds[1], 0.0);
        assert_eq!(v.step_thresholds[0], 0.0);
        assert!((v.step_thresholds[1] - 0.01).abs() < 1e-6);
        assert_eq!(h.step_thresholds[2], settings.blur_depth_threshold);
    }
}
