//! umbra: screen-space ambient occlusion and UI surfaces placed in 3D scenes.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::rc::Rc;
//! use umbra::*;
//!
//! fn main() -> Result<()> {
//!     let mut registry = init()?;
//!
//!     let device: Rc<dyn RenderDevice> = Rc::new(WgpuDevice::new_headless().block_on()?);
//!     let mut ao = AmbientOcclusionPass::new(device.clone(), AmbientOcclusionSettings::default());
//!     ao.configure(AmbientOcclusionSettings {
//!         quality: AmbientOcclusionQuality::High,
//!         ..AmbientOcclusionSettings::default()
//!     })?;
//!
//!     let mut context = UiFactoryContext::new(device);
//!     let surface = registry.create(UI_COMPONENT_TYPE, &mut context)?;
//!     # let _ = (surface, &mut registry);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`AmbientOcclusionPass`] evaluates occlusion from depth (and normals on
//!   the deferred path), blurs it between two ping-pong targets and
//!   multiplies it onto the scene color. Textures and pipeline states are
//!   cached and rebuilt only when the settings that shape them change.
//! - [`UiComponent`] renders a UI tree into a texture shown on a model.
//!   [`UiElement3D`] maps pointer positions onto it by ray-casting through
//!   the viewport camera.
//! - Everything GPU-facing goes through [`RenderDevice`]; [`WgpuDevice`]
//!   drives wgpu and [`HeadlessDevice`] records calls for tests.

pub use umbra_core::{
    clamp_ui_texture_size, AmbientOcclusionQuality, AmbientOcclusionSettings, Camera, DrawableId,
    DrawableKind, IntRect, LogOnce, Material, NodeId, Options, Ray, RayQuery, RayQueryResult,
    Result, SceneId, SpatialIndex, TextureId, TextureUnit, TriangleIndex, UiSurfaceOptions,
    UmbraError, Viewport, ViewportId, World, DIFFUSE_UNLIT_TECHNIQUE,
    UI_SURFACE_DEFAULT_TEXTURE_SIZE, UI_SURFACE_MAX_TEXTURE_SIZE, UI_SURFACE_MIN_TEXTURE_SIZE,
};
pub use umbra_core::{IVec2, Mat4, UVec2, Vec2, Vec3, Vec4};

pub use umbra_render::{
    AmbientOcclusionPass, BindingSlot, DrawRecord, FrameContext, HeadlessDevice, LoadOp,
    PassOutcome, PassState, PipelineState, PipelineStateDesc, PostProcessPass,
    PostProcessPassFlags, QuadDraw, RenderDevice, RenderError, RenderPath, RenderResult,
    SkipReason, TextureDesc, TextureUsage, WgpuDevice, BLUR_ITERATIONS,
};

pub use umbra_ui::{
    register_ui_types, MappingContext, MappingError, ScreenMapping, SurfaceTable, UiComponent,
    UiElement, UiElement3D, UiFactoryContext, UiObject, UiScaling, UiTypeRegistry,
    NO_MAPPING, UI_COMPONENT_TYPE, UI_ELEMENT_3D_TYPE,
};

pub use pollster::FutureExt;

/// Sets up logging and returns a registry with the UI types registered.
///
/// Logging is configured through `RUST_LOG`. Calling this more than once is
/// fine; only the first call installs the logger.
pub fn init() -> Result<UiTypeRegistry> {
    let _ = env_logger::try_init();
    let mut registry = UiTypeRegistry::new();
    register_ui_types(&mut registry)?;
    log::info!("umbra initialized ({} types)", registry.len());
    Ok(registry)
}

/// Like [`init`], but also loads and validates options from a JSON file.
pub fn init_with_options(path: impl AsRef<std::path::Path>) -> Result<(UiTypeRegistry, Options)> {
    let registry = init()?;
    let options = Options::load(path)?;
    Ok((registry, options))
}

/// A [`MappingContext`] using the UI scale from `options`.
pub fn mapping_context<'a>(
    world: &'a World,
    options: &UiSurfaceOptions,
    output_size: UVec2,
) -> MappingContext<'a> {
    MappingContext {
        world,
        scaling: UiScaling::new(options.ui_scale),
        output_size,
    }
}
