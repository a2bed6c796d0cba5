//! Camera and view management.

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::geometry::Ray;

/// Camera projection mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectionMode {
    /// Perspective projection.
    #[default]
    Perspective,
    /// Orthographic projection.
    Orthographic,
}

/// A 3D camera looking from `position` towards `target`.
///
/// Projection follows wgpu conventions: right-handed view space looking down
/// -Z, clip-space depth in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Camera position in world space.
    pub position: Vec3,
    /// Point the camera is looking at.
    pub target: Vec3,
    /// Up vector.
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fov: f32,
    /// Aspect ratio (width / height).
    pub aspect_ratio: f32,
    /// Near clipping plane.
    pub near: f32,
    /// Far clipping plane.
    pub far: f32,
    /// Projection mode.
    pub projection_mode: ProjectionMode,
    /// Half height of the view volume in orthographic mode.
    pub ortho_scale: f32,
}

impl Camera {
    /// Creates a new camera with default settings.
    #[must_use]
    pub fn new(aspect_ratio: f32) -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 3.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov: std::f32::consts::FRAC_PI_4,
            aspect_ratio,
            near: 0.01,
            far: 1000.0,
            projection_mode: ProjectionMode::Perspective,
            ortho_scale: 1.0,
        }
    }

    /// Sets the aspect ratio.
    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        self.aspect_ratio = aspect_ratio;
    }

    /// Sets the field of view in radians.
    pub fn set_fov(&mut self, fov: f32) {
        self.fov = fov.clamp(0.1, std::f32::consts::PI - 0.1);
    }

    /// Returns the view matrix.
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Returns the projection matrix.
    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        match self.projection_mode {
            ProjectionMode::Perspective => {
                Mat4::perspective_rh(self.fov, self.aspect_ratio, self.near, self.far)
            }
            ProjectionMode::Orthographic => {
                let half_height = self.ortho_scale;
                let half_width = half_height * self.aspect_ratio;
                Mat4::orthographic_rh(
                    -half_width,
                    half_width,
                    -half_height,
                    half_height,
                    self.near,
                    self.far,
                )
            }
        }
    }

    /// Returns the combined view-projection matrix.
    #[must_use]
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Maps clip space to texture space: x,y from `[-1, 1]` to `[0, 1]` with
    /// y flipped so that `(0, 0)` is the top-left texel. Depth is untouched.
    #[must_use]
    pub fn clip_to_texture() -> Mat4 {
        Mat4::from_cols(
            Vec4::new(0.5, 0.0, 0.0, 0.0),
            Vec4::new(0.0, -0.5, 0.0, 0.0),
            Vec4::new(0.0, 0.0, 1.0, 0.0),
            Vec4::new(0.5, 0.5, 0.0, 1.0),
        )
    }

    /// View space to texture space (`uv`, depth).
    #[must_use]
    pub fn view_to_texture_space(&self) -> Mat4 {
        Self::clip_to_texture() * self.projection_matrix()
    }

    /// Texture space (`uv`, depth) back to view space. Needs a divide by `w`.
    #[must_use]
    pub fn texture_to_view_space(&self) -> Mat4 {
        self.view_to_texture_space().inverse()
    }

    /// Builds a world-space ray through a normalized screen position
    /// (`0..1` on both axes, origin at the top-left).
    #[must_use]
    pub fn screen_ray(&self, x: f32, y: f32) -> Ray {
        let ndc_x = x * 2.0 - 1.0;
        let ndc_y = 1.0 - y * 2.0;

        let inv_view_proj = self.view_projection_matrix().inverse();
        let near = inv_view_proj * Vec4::new(ndc_x, ndc_y, 0.0, 1.0);
        let far = inv_view_proj * Vec4::new(ndc_x, ndc_y, 1.0, 1.0);

        if near.w.abs() < 1e-6 || far.w.abs() < 1e-6 {
            return Ray::new(self.position, self.target - self.position);
        }

        let origin = near.truncate() / near.w;
        let far_point = far.truncate() / far.w;
        Ray::new(origin, far_point - origin)
    }

    /// Projects a world-space point to a normalized screen position
    /// (`0..1`, origin at the top-left). Inverse of [`Camera::screen_ray`].
    #[must_use]
    pub fn world_to_screen_point(&self, point: Vec3) -> Vec2 {
        let clip = self.view_projection_matrix() * point.extend(1.0);
        if clip.w.abs() < 1e-6 {
            return Vec2::splat(0.5);
        }
        let ndc = clip.truncate() / clip.w;
        Vec2::new(ndc.x * 0.5 + 0.5, 0.5 - ndc.y * 0.5)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(16.0 / 9.0)
    }
}
