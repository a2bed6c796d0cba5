//! Core abstractions for umbra.
//!
//! This crate holds everything that does not touch the GPU:
//! - [`AmbientOcclusionSettings`] and the rest of the [`Options`] record
//! - [`Camera`] math, rays and integer rectangles
//! - The [`World`] relation tables (scenes, nodes, drawables, viewports)
//! - The [`SpatialIndex`] ray query interface and a brute-force [`TriangleIndex`]
//! - The explicit [`TypeRegistry`] used instead of reflection-based factories

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Settings structs legitimately have many boolean flags
#![allow(clippy::struct_excessive_bools)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]

pub mod camera;
pub mod diagnostics;
pub mod error;
pub mod geometry;
pub mod ids;
pub mod material;
pub mod options;
pub mod registry;
pub mod scene;
pub mod spatial;
pub mod ssao;

pub use camera::{Camera, ProjectionMode};
pub use diagnostics::LogOnce;
pub use error::{Result, UmbraError};
pub use geometry::{IntRect, Ray};
pub use ids::{DrawableId, NodeId, SceneId, TextureId, ViewportId};
pub use material::{Material, TextureUnit, DIFFUSE_UNLIT_TECHNIQUE};
pub use options::{
    clamp_ui_texture_size, Options, UiSurfaceOptions, UI_SURFACE_DEFAULT_TEXTURE_SIZE,
    UI_SURFACE_MAX_TEXTURE_SIZE, UI_SURFACE_MIN_TEXTURE_SIZE,
};
pub use registry::{Factory, TypeRegistry};
pub use scene::{Drawable, Node, Scene, Viewport, World};
pub use spatial::{
    DrawableKind, IndexedDrawable, RayQuery, RayQueryLevel, RayQueryResult, SpatialIndex,
    TriangleIndex, UvTriangle, DEFAULT_VIEW_MASK, DRAWABLE_ANY, DRAWABLE_GEOMETRY,
    DRAWABLE_LIGHT,
};
pub use ssao::{AmbientOcclusionQuality, AmbientOcclusionSettings, StateKey, TextureKey};

// Re-export glam types for convenience
pub use glam::{IVec2, Mat4, UVec2, Vec2, Vec3, Vec4};
