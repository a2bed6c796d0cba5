//! UI surfaces placed in 3D scenes.
//!
//! A [`UiComponent`] renders a UI tree into its own texture and shows that
//! texture on a model in the scene. Pointer input reaches the tree through
//! [`UiElement3D`], which ray-casts screen positions onto the model.

#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
// Pixel coordinates round-trip through f32
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

pub mod component;
pub mod element;
pub mod element3d;
pub mod offscreen;
pub mod scaling;
pub mod surfaces;
pub mod types;

pub use component::{UiComponent, UI_SURFACE_FORMAT};
pub use element::{ScreenMapping, TraversalMode, UiElement};
pub use element3d::{MappingContext, MappingError, UiElement3D, NO_MAPPING};
pub use offscreen::OffscreenUi;
pub use scaling::UiScaling;
pub use surfaces::SurfaceTable;
pub use types::{
    register_ui_types, UiFactoryContext, UiObject, UiTypeRegistry, UI_COMPONENT_TYPE,
    UI_ELEMENT_3D_TYPE,
};
