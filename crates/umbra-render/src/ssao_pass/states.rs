//! Pipeline states of the ambient occlusion pass.

use umbra_core::StateKey;

use super::textures::AO_TARGET_FORMAT;
use crate::device::{BindingSlot, BlendMode, PipelineState, PipelineStateDesc, RenderDevice};
use crate::post_process::RenderPath;

const SSAO_SHADER: &str = include_str!("../shaders/ssao.wgsl");
const BLUR_SHADER: &str = include_str!("../shaders/ssao_blur.wgsl");
const COMBINE_SHADER: &str = include_str!("../shaders/ssao_combine.wgsl");

const SSAO_FORWARD_SLOTS: &[BindingSlot] = &[
    BindingSlot::Uniforms,
    BindingSlot::DepthTexture,
    BindingSlot::Texture,
];
const SSAO_DEFERRED_SLOTS: &[BindingSlot] = &[
    BindingSlot::Uniforms,
    BindingSlot::DepthTexture,
    BindingSlot::Texture,
    BindingSlot::Texture,
];
const BLUR_FORWARD_SLOTS: &[BindingSlot] = &[
    BindingSlot::Uniforms,
    BindingSlot::Sampler,
    BindingSlot::Texture,
    BindingSlot::DepthTexture,
];
const BLUR_DEFERRED_SLOTS: &[BindingSlot] = &[
    BindingSlot::Uniforms,
    BindingSlot::Sampler,
    BindingSlot::Texture,
    BindingSlot::DepthTexture,
    BindingSlot::Texture,
];
const COMBINE_SLOTS: &[BindingSlot] = &[BindingSlot::Sampler, BindingSlot::Texture];

/// The six pipeline states the pass draws with.
///
/// Built together and only usable together: [`CachedStates::is_valid`] is
/// false if any one of them failed.
#[derive(Debug, Clone)]
pub struct CachedStates {
    pub ssao_forward: PipelineState,
    pub ssao_deferred: PipelineState,
    pub blur_forward: PipelineState,
    pub blur_deferred: PipelineState,
    pub combine: PipelineState,
    pub preview: PipelineState,
    key: StateKey,
    output_format: wgpu::TextureFormat,
}

impl CachedStates {
    /// Compiles every state for the given quality and color output format.
    pub fn build(device: &dyn RenderDevice, key: StateKey, output_format: wgpu::TextureFormat) -> Self {
        let samples = f64::from(key.quality.sample_count());
        let ssao = |label: &str, entry: &'static str, slots: &[BindingSlot]| {
            device.create_pipeline_state(
                &PipelineStateDesc::new(label, SSAO_SHADER)
                    .with_fragment_entry(entry)
                    .with_constant("SAMPLE_COUNT", samples)
                    .with_slots(slots)
                    .with_target_format(AO_TARGET_FORMAT),
            )
        };
        let blur = |label: &str, entry: &'static str, slots: &[BindingSlot]| {
            device.create_pipeline_state(
                &PipelineStateDesc::new(label, BLUR_SHADER)
                    .with_fragment_entry(entry)
                    .with_slots(slots)
                    .with_target_format(AO_TARGET_FORMAT),
            )
        };
        let composite = |label: &str, blend: BlendMode| {
            device.create_pipeline_state(
                &PipelineStateDesc::new(label, COMBINE_SHADER)
                    .with_slots(COMBINE_SLOTS)
                    .with_blend(blend)
                    .with_target_format(output_format),
            )
        };

        let states = Self {
            ssao_forward: ssao("ssao evaluate forward", "fs_forward", SSAO_FORWARD_SLOTS),
            ssao_deferred: ssao("ssao evaluate deferred", "fs_deferred", SSAO_DEFERRED_SLOTS),
            blur_forward: blur("ssao blur forward", "fs_forward", BLUR_FORWARD_SLOTS),
            blur_deferred: blur("ssao blur deferred", "fs_deferred", BLUR_DEFERRED_SLOTS),
            combine: composite("ssao combine", BlendMode::Multiply),
            preview: composite("ssao preview", BlendMode::Replace),
            key,
            output_format,
        };
        log::debug!(
            "built ambient occlusion states ({:?}, {} samples): valid = {}",
            key.quality,
            key.quality.sample_count(),
            states.is_valid()
        );
        states
    }

    /// True only if all six states compiled.
    pub fn is_valid(&self) -> bool {
        self.ssao_forward.is_valid()
            && self.ssao_deferred.is_valid()
            && self.blur_forward.is_valid()
            && self.blur_deferred.is_valid()
            && self.combine.is_valid()
            && self.preview.is_valid()
    }

    /// Whether these states were built for `key` and `output_format`.
    pub fn matches(&self, key: StateKey, output_format: wgpu::TextureFormat) -> bool {
        self.key == key && self.output_format == output_format
    }

    pub fn ssao(&self, path: RenderPath) -> &PipelineState {
        match path {
            RenderPath::Forward => &self.ssao_forward,
            RenderPath::Deferred { .. } => &self.ssao_deferred,
        }
    }

    pub fn blur(&self, path: RenderPath) -> &PipelineState {
        match path {
            RenderPath::Forward => &self.blur_forward,
            RenderPath::Deferred { .. } => &self.blur_deferred,
        }
    }

    /// State writing the result onto the color output.
    pub fn composite(&self, preview: bool) -> &PipelineState {
        if preview {
            &self.preview
        } else {
            &self.combine
        }
    }
}
