//! Ray queries against scene geometry.

use glam::{Mat4, Vec2, Vec3};

use crate::geometry::Ray;
use crate::ids::DrawableId;

/// Drawable category flag: regular geometry.
pub const DRAWABLE_GEOMETRY: u32 = 0x1;
/// Drawable category flag: lights.
pub const DRAWABLE_LIGHT: u32 = 0x2;
/// Every drawable category.
pub const DRAWABLE_ANY: u32 = 0xff;
/// View mask matching every layer.
pub const DEFAULT_VIEW_MASK: u32 = u32::MAX;

/// Precision of a ray query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RayQueryLevel {
    /// Bounding boxes only.
    Aabb,
    /// Exact triangles.
    Triangle,
    /// Exact triangles, reporting interpolated texture coordinates.
    #[default]
    TriangleUv,
}

/// Kind of a drawable, as far as picking cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawableKind {
    StaticModel,
    AnimatedModel,
    BillboardSet,
    ParticleEmitter,
    Other,
}

impl DrawableKind {
    /// Camera-facing sprite types are transparent to UI picking unless they
    /// are the expected surface.
    #[must_use]
    pub fn is_excluded_by_default(self) -> bool {
        matches!(self, Self::BillboardSet | Self::ParticleEmitter)
    }
}

/// A ray query request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayQuery {
    pub ray: Ray,
    pub level: RayQueryLevel,
    pub max_distance: f32,
    pub drawable_flags: u32,
    pub view_mask: u32,
}

impl RayQuery {
    /// UV-producing triangle query with unbounded distance against
    /// geometry on every view layer.
    #[must_use]
    pub fn triangle_uv(ray: Ray) -> Self {
        Self {
            ray,
            level: RayQueryLevel::TriangleUv,
            max_distance: f32::INFINITY,
            drawable_flags: DRAWABLE_GEOMETRY,
            view_mask: DEFAULT_VIEW_MASK,
        }
    }
}

/// A single intersection reported by a [`SpatialIndex`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayQueryResult {
    /// Distance along the ray.
    pub distance: f32,
    /// World-space hit position.
    pub position: Vec3,
    /// Interpolated texture coordinate (zero unless the level is `TriangleUv`).
    pub uv: Vec2,
    /// What was hit.
    pub drawable: DrawableId,
    pub kind: DrawableKind,
}

/// Scene-wide structure answering ray queries.
///
/// Implementations must report hits sorted by increasing distance.
pub trait SpatialIndex {
    fn raycast(&self, query: &RayQuery) -> Vec<RayQueryResult>;
}

/// A triangle with per-vertex texture coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvTriangle {
    pub positions: [Vec3; 3],
    pub uvs: [Vec2; 3],
}

/// A drawable registered in a [`TriangleIndex`].
#[derive(Debug, Clone)]
pub struct IndexedDrawable {
    pub drawable: DrawableId,
    pub kind: DrawableKind,
    pub flags: u32,
    pub view_mask: u32,
    pub triangles: Vec<UvTriangle>,
}

/// Brute-force spatial index testing every triangle of every drawable.
#[derive(Debug, Clone, Default)]
pub struct TriangleIndex {
    drawables: Vec<IndexedDrawable>,
}

impl TriangleIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a drawable's geometry.
    pub fn insert(&mut self, entry: IndexedDrawable) {
        self.remove(entry.drawable);
        self.drawables.push(entry);
    }

    /// Adds a unit quad (`[-0.5, 0.5]` in local XY, facing +Z) transformed by
    /// `transform`. UV `(0, 0)` is the top-left corner.
    pub fn insert_quad(&mut self, drawable: DrawableId, kind: DrawableKind, transform: Mat4) {
        let corner = |x: f32, y: f32| transform.transform_point3(Vec3::new(x, y, 0.0));
        let top_left = corner(-0.5, 0.5);
        let top_right = corner(0.5, 0.5);
        let bottom_left = corner(-0.5, -0.5);
        let bottom_right = corner(0.5, -0.5);

        let triangles = vec![
            UvTriangle {
                positions: [top_left, bottom_left, bottom_right],
                uvs: [Vec2::new(0.0, 0.0), Vec2::new(0.0, 1.0), Vec2::new(1.0, 1.0)],
            },
            UvTriangle {
                positions: [top_left, bottom_right, top_right],
                uvs: [Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0), Vec2::new(1.0, 0.0)],
            },
        ];

        self.insert(IndexedDrawable {
            drawable,
            kind,
            flags: DRAWABLE_GEOMETRY,
            view_mask: DEFAULT_VIEW_MASK,
            triangles,
        });
    }

    pub fn remove(&mut self, drawable: DrawableId) {
        self.drawables.retain(|d| d.drawable != drawable);
    }

    pub fn len(&self) -> usize {
        self.drawables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drawables.is_empty()
    }
}

impl SpatialIndex for TriangleIndex {
    fn raycast(&self, query: &RayQuery) -> Vec<RayQueryResult> {
        let mut results = Vec::new();

        for entry in &self.drawables {
            if entry.flags & query.drawable_flags == 0 || entry.view_mask & query.view_mask == 0 {
                continue;
            }

            // Nearest triangle of this drawable.
            let mut best: Option<(f32, Vec2)> = None;
            for tri in &entry.triangles {
                let [v0, v1, v2] = tri.positions;
                let Some((t, u, v)) = query.ray.intersect_triangle(v0, v1, v2) else {
                    continue;
                };
                if t > query.max_distance {
                    continue;
                }
                if best.is_none_or(|(best_t, _)| t < best_t) {
                    let uv = match query.level {
                        RayQueryLevel::TriangleUv => {
                            tri.uvs[0] * (1.0 - u - v) + tri.uvs[1] * u + tri.uvs[2] * v
                        }
                        _ => Vec2::ZERO,
                    };
                    best = Some((t, uv));
                }
            }

            if let Some((distance, uv)) = best {
                results.push(RayQueryResult {
                    distance,
                    position: query.ray.point_at(distance),
                    uv,
                    drawable: entry.drawable,
                    kind: entry.kind,
                });
            }
        }

        results.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        results
    }
}
