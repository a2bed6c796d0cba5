//! Device abstraction used by the passes and the UI surfaces.
//!
//! A [`RenderDevice`] owns textures and compiled pipeline states and runs
//! fullscreen quad draws. Passes only see ids and descriptors, which lets the
//! same pass code run on the wgpu backend ([`crate::WgpuDevice`]) and on the
//! recording [`crate::HeadlessDevice`].

use std::borrow::Cow;

use glam::UVec2;
use umbra_core::TextureId;

use crate::error::RenderResult;

/// How a texture is going to be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureUsage {
    /// Uploaded from the CPU and sampled.
    Sampled,
    /// Rendered into and sampled afterwards.
    RenderTarget,
}

/// Sampler state a texture expects when it is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureSampling {
    pub filter: wgpu::FilterMode,
    pub address: wgpu::AddressMode,
}

impl TextureSampling {
    /// Bilinear filtering, clamped addressing.
    pub const BILINEAR_CLAMP: Self = Self {
        filter: wgpu::FilterMode::Linear,
        address: wgpu::AddressMode::ClampToEdge,
    };

    /// Nearest filtering, repeating addressing. Used for tiled noise.
    pub const NEAREST_REPEAT: Self = Self {
        filter: wgpu::FilterMode::Nearest,
        address: wgpu::AddressMode::Repeat,
    };
}

impl Default for TextureSampling {
    fn default() -> Self {
        Self::BILINEAR_CLAMP
    }
}

/// Texture creation parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureDesc {
    pub label: String,
    pub size: UVec2,
    pub format: wgpu::TextureFormat,
    pub usage: TextureUsage,
    pub sampling: TextureSampling,
    pub mip_levels: u32,
}

impl TextureDesc {
    /// A single-mip render target with bilinear clamped sampling.
    pub fn render_target(label: impl Into<String>, size: UVec2, format: wgpu::TextureFormat) -> Self {
        Self {
            label: label.into(),
            size,
            format,
            usage: TextureUsage::RenderTarget,
            sampling: TextureSampling::BILINEAR_CLAMP,
            mip_levels: 1,
        }
    }

    /// A single-mip texture filled from the CPU.
    pub fn sampled(label: impl Into<String>, size: UVec2, format: wgpu::TextureFormat) -> Self {
        Self {
            usage: TextureUsage::Sampled,
            ..Self::render_target(label, size, format)
        }
    }

    #[must_use]
    pub fn with_sampling(mut self, sampling: TextureSampling) -> Self {
        self.sampling = sampling;
        self
    }
}

/// Aspect and bytes per texel for uploading into `format`, or `None` when
/// the format cannot be a copy destination.
pub(crate) fn upload_layout(format: wgpu::TextureFormat) -> Option<(wgpu::TextureAspect, u32)> {
    let aspect = match format {
        wgpu::TextureFormat::Depth32Float
        | wgpu::TextureFormat::Depth24Plus
        | wgpu::TextureFormat::Depth24PlusStencil8
        | wgpu::TextureFormat::Depth32FloatStencil8 => return None,
        f if f.has_depth_aspect() => wgpu::TextureAspect::DepthOnly,
        _ => wgpu::TextureAspect::All,
    };
    Some((aspect, format.block_copy_size(Some(aspect))?))
}

/// Kind of resource bound at a given binding index.
///
/// Binding `i` of a draw must match slot `i` of the pipeline state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingSlot {
    /// A uniform buffer.
    Uniforms,
    /// The device's linear clamp sampler.
    Sampler,
    /// A filterable float texture.
    Texture,
    /// A depth texture bound as unfilterable float, read with `textureLoad`.
    DepthTexture,
}

/// How the fragment output combines with the render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// Overwrite the target.
    #[default]
    Replace,
    /// Multiply the target color by the output.
    Multiply,
}

impl BlendMode {
    pub(crate) fn to_wgpu(self) -> Option<wgpu::BlendState> {
        match self {
            Self::Replace => None,
            Self::Multiply => Some(wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::Dst,
                    dst_factor: wgpu::BlendFactor::Zero,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::Zero,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
            }),
        }
    }
}

/// Everything needed to compile one fullscreen pipeline state.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineStateDesc {
    pub label: String,
    pub source: Cow<'static, str>,
    pub vertex_entry: &'static str,
    pub fragment_entry: &'static str,
    /// Values for WGSL `override` constants.
    pub constants: Vec<(String, f64)>,
    pub slots: Vec<BindingSlot>,
    pub blend: BlendMode,
    pub target_format: wgpu::TextureFormat,
}

impl PipelineStateDesc {
    pub fn new(label: impl Into<String>, source: impl Into<Cow<'static, str>>) -> Self {
        Self {
            label: label.into(),
            source: source.into(),
            vertex_entry: "vs_main",
            fragment_entry: "fs_main",
            constants: Vec::new(),
            slots: Vec::new(),
            blend: BlendMode::Replace,
            target_format: wgpu::TextureFormat::Rgba8Unorm,
        }
    }

    #[must_use]
    pub fn with_fragment_entry(mut self, entry: &'static str) -> Self {
        self.fragment_entry = entry;
        self
    }

    #[must_use]
    pub fn with_constant(mut self, name: impl Into<String>, value: f64) -> Self {
        self.constants.push((name.into(), value));
        self
    }

    #[must_use]
    pub fn with_slots(mut self, slots: &[BindingSlot]) -> Self {
        self.slots = slots.to_vec();
        self
    }

    #[must_use]
    pub fn with_blend(mut self, blend: BlendMode) -> Self {
        self.blend = blend;
        self
    }

    #[must_use]
    pub fn with_target_format(mut self, format: wgpu::TextureFormat) -> Self {
        self.target_format = format;
        self
    }
}

/// Handle to a compiled (or failed) pipeline state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineState {
    id: u32,
    label: String,
    valid: bool,
}

impl PipelineState {
    pub(crate) fn new(id: u32, label: impl Into<String>, valid: bool) -> Self {
        Self {
            id,
            label: label.into(),
            valid,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// False when shader compilation or pipeline creation failed.
    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

/// A resource bound to one slot of a draw.
#[derive(Debug, Clone, Copy)]
pub enum DrawBinding<'a> {
    Uniforms(&'a [u8]),
    Sampler,
    Texture(TextureId),
}

impl DrawBinding<'_> {
    pub(crate) fn matches(&self, slot: BindingSlot) -> bool {
        matches!(
            (self, slot),
            (Self::Uniforms(_), BindingSlot::Uniforms)
                | (Self::Sampler, BindingSlot::Sampler)
                | (
                    Self::Texture(_),
                    BindingSlot::Texture | BindingSlot::DepthTexture
                )
        )
    }
}

/// What happens to the target before the quad is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoadOp {
    Load,
    Clear([f64; 4]),
}

/// One fullscreen quad draw.
#[derive(Debug, Clone, Copy)]
pub struct QuadDraw<'a> {
    pub label: &'a str,
    pub state: &'a PipelineState,
    pub target: TextureId,
    pub bindings: &'a [DrawBinding<'a>],
    pub load: LoadOp,
}

impl QuadDraw<'_> {
    /// Textures read by this draw, in binding order.
    pub fn sources(&self) -> impl Iterator<Item = TextureId> + '_ {
        self.bindings.iter().filter_map(|b| match b {
            DrawBinding::Texture(t) => Some(*t),
            _ => None,
        })
    }
}

/// GPU resource owner shared by passes and surfaces.
///
/// All methods take `&self`; implementations use interior mutability so a
/// device can be shared through `Rc<dyn RenderDevice>`.
pub trait RenderDevice {
    fn create_texture(&self, desc: &TextureDesc) -> RenderResult<TextureId>;

    /// Replaces the whole first mip level with `data` (tightly packed rows).
    fn write_texture(&self, texture: TextureId, data: &[u8]) -> RenderResult<()>;

    /// Releases a texture. Unknown ids are ignored.
    fn destroy_texture(&self, texture: TextureId);

    fn texture_size(&self, texture: TextureId) -> Option<UVec2>;

    /// Compiles a pipeline state. Failures are reported through
    /// [`PipelineState::is_valid`] rather than an error.
    fn create_pipeline_state(&self, desc: &PipelineStateDesc) -> PipelineState;

    fn draw_quad(&self, draw: &QuadDraw<'_>) -> RenderResult<()>;
}
