//! Rendering backend for umbra.
//!
//! This crate provides:
//! - The [`RenderDevice`] abstraction (textures, pipeline states, quad draws)
//! - [`WgpuDevice`], the wgpu implementation, and [`HeadlessDevice`], a
//!   recording implementation without a GPU
//! - The post-process pass contract and the [`AmbientOcclusionPass`]

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
// Texture sizes and byte counts are u32 on the GPU side
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]

pub mod device;
pub mod error;
pub mod headless;
pub mod post_process;
pub mod ssao_pass;
pub mod wgpu_device;

pub use device::{
    BindingSlot, BlendMode, DrawBinding, LoadOp, PipelineState, PipelineStateDesc, QuadDraw,
    RenderDevice, TextureDesc, TextureSampling, TextureUsage,
};
pub use error::{RenderError, RenderResult};
pub use headless::{DrawRecord, HeadlessDevice};
pub use post_process::{
    FrameContext, PassOutcome, PostProcessPass, PostProcessPassFlags, RenderPath, SkipReason,
};
pub use ssao_pass::{
    AmbientOcclusionPass, CachedStates, CachedTextures, PassState, PingPong, BLUR_ITERATIONS,
};
pub use wgpu_device::WgpuDevice;
