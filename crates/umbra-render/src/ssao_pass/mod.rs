//! Screen-space ambient occlusion post-process pass.
//!
//! Each frame the pass evaluates raw occlusion into one of two ping-pong
//! targets, blurs it back and forth between them, then composites the result
//! onto the color output. Textures and pipeline states are cached and only
//! rebuilt when the part of the settings they depend on changes:
//!
//! - `downscale` (and the output size) → textures
//! - `quality` (and the color output format) → pipeline states
//! - everything else only feeds uniforms

mod states;
mod textures;
mod uniforms;

use std::rc::Rc;

use glam::{Mat4, UVec2};
use umbra_core::{AmbientOcclusionSettings, Camera, LogOnce, Result, TextureId};

use crate::device::{DrawBinding, LoadOp, PipelineState, QuadDraw, RenderDevice};
use crate::error::RenderResult;
use crate::post_process::{
    FrameContext, PassOutcome, PostProcessPass, PostProcessPassFlags, RenderPath, SkipReason,
};

pub use states::CachedStates;
pub use textures::{
    generate_noise, CachedTextures, PingPong, TextureCache, AO_TARGET_FORMAT, NOISE_SIZE,
};
pub use uniforms::{BlurAxis, BlurUniforms, SsaoUniforms};

/// Number of blur draws per frame (horizontal, then vertical).
pub const BLUR_ITERATIONS: usize = 2;

const CLEAR_UNOCCLUDED: LoadOp = LoadOp::Clear([1.0, 1.0, 1.0, 1.0]);

/// Readiness of the pass resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassState {
    Uninitialized,
    TexturesReady,
    StatesReady,
    Executable,
}

/// Ambient occlusion pass.
pub struct AmbientOcclusionPass {
    device: Rc<dyn RenderDevice>,
    settings: AmbientOcclusionSettings,
    textures: TextureCache,
    pipeline_states: Option<CachedStates>,
    diagnostics: LogOnce,
}

impl AmbientOcclusionPass {
    /// Creates the pass. Nothing is allocated until the first execution.
    ///
    /// Settings that fail validation are replaced by the defaults.
    pub fn new(device: Rc<dyn RenderDevice>, settings: AmbientOcclusionSettings) -> Self {
        let settings = match settings.validate() {
            Ok(()) => settings,
            Err(err) => {
                log::error!("invalid ambient occlusion settings, using defaults: {err}");
                AmbientOcclusionSettings::default()
            }
        };
        Self {
            device,
            settings,
            textures: TextureCache::new(),
            pipeline_states: None,
            diagnostics: LogOnce::new(),
        }
    }

    pub fn settings(&self) -> &AmbientOcclusionSettings {
        &self.settings
    }

    /// Applies new settings.
    ///
    /// Identical settings are a no-op. Otherwise only the resources whose
    /// key changed are dropped, and a remembered allocation or compilation
    /// failure is forgotten so the next frame retries.
    pub fn configure(&mut self, settings: AmbientOcclusionSettings) -> Result<()> {
        settings.validate()?;
        if settings == self.settings {
            return Ok(());
        }

        if settings.texture_key() == self.settings.texture_key() {
            self.textures.clear_failure();
        } else {
            log::debug!(
                "ambient occlusion downscale {} -> {}",
                self.settings.downscale,
                settings.downscale
            );
            self.textures.invalidate(&*self.device);
        }

        let states_stale = self
            .pipeline_states
            .as_ref()
            .is_some_and(|s| !s.is_valid() || settings.state_key() != self.settings.state_key());
        if states_stale {
            self.pipeline_states = None;
        }

        self.settings = settings;
        Ok(())
    }

    /// Current readiness; textures and states are tracked independently.
    pub fn state(&self) -> PassState {
        let textures = self.textures.is_ready();
        let states = self
            .pipeline_states
            .as_ref()
            .is_some_and(CachedStates::is_valid);
        match (textures, states) {
            (false, false) => PassState::Uninitialized,
            (true, false) => PassState::TexturesReady,
            (false, true) => PassState::StatesReady,
            (true, true) => PassState::Executable,
        }
    }

    pub fn pipeline_states(&self) -> Option<&CachedStates> {
        self.pipeline_states.as_ref()
    }

    /// Size of the occlusion targets, once allocated.
    pub fn target_size(&self) -> Option<UVec2> {
        self.textures.size()
    }

    /// Size the occlusion targets get for a given output size.
    pub fn target_size_for(&self, output_size: UVec2) -> UVec2 {
        (output_size / self.settings.texture_key().downscale).max(UVec2::ONE)
    }

    /// Builds the states if missing or stale. Returns whether they are usable.
    fn ensure_states(&mut self, output_format: wgpu::TextureFormat) -> bool {
        let key = self.settings.state_key();
        let rebuild = self
            .pipeline_states
            .as_ref()
            .is_none_or(|s| !s.matches(key, output_format));
        if rebuild {
            let states = CachedStates::build(&*self.device, key, output_format);
            if !states.is_valid() {
                log::error!(
                    "ambient occlusion disabled: pipeline states for {:?} failed to compile",
                    key.quality
                );
            }
            self.pipeline_states = Some(states);
        }
        self.pipeline_states
            .as_ref()
            .is_some_and(CachedStates::is_valid)
    }

    fn draw(
        &self,
        label: &str,
        state: &PipelineState,
        target: TextureId,
        bindings: &[DrawBinding<'_>],
        load: LoadOp,
    ) -> RenderResult<()> {
        self.device.draw_quad(&QuadDraw {
            label,
            state,
            target,
            bindings,
            load,
        })
    }

    fn render(
        &self,
        frame: &FrameContext,
        color: TextureId,
        depth: TextureId,
        camera: &Camera,
        textures: CachedTextures,
        states: &CachedStates,
    ) -> RenderResult<()> {
        let view_to_texture = camera.view_to_texture_space();
        let texture_to_view: Mat4 = view_to_texture.inverse();
        let path = frame.render_path;
        let normal = match path {
            RenderPath::Forward => None,
            RenderPath::Deferred { normal } => Some(normal),
        };
        let mut targets = textures.targets;

        // Evaluate
        let uniforms = SsaoUniforms::new(&self.settings, view_to_texture, texture_to_view);
        let mut bindings = vec![
            DrawBinding::Uniforms(bytemuck::bytes_of(&uniforms)),
            DrawBinding::Texture(depth),
            DrawBinding::Texture(textures.noise),
        ];
        bindings.extend(normal.map(DrawBinding::Texture));
        self.draw(
            "ssao evaluate",
            states.ssao(path),
            targets.current(),
            &bindings,
            CLEAR_UNOCCLUDED,
        )?;

        // Blur
        for iteration in 0..BLUR_ITERATIONS {
            targets.swap();
            let blur = BlurUniforms::new(
                &self.settings,
                texture_to_view,
                textures.size,
                BlurAxis::for_iteration(iteration),
            );
            let mut bindings = vec![
                DrawBinding::Uniforms(bytemuck::bytes_of(&blur)),
                DrawBinding::Sampler,
                DrawBinding::Texture(targets.previous()),
                DrawBinding::Texture(depth),
            ];
            bindings.extend(normal.map(DrawBinding::Texture));
            self.draw(
                "ssao blur",
                states.blur(path),
                targets.current(),
                &bindings,
                CLEAR_UNOCCLUDED,
            )?;
        }

        // Composite
        self.draw(
            if self.settings.preview {
                "ssao preview"
            } else {
                "ssao combine"
            },
            states.composite(self.settings.preview),
            color,
            &[DrawBinding::Sampler, DrawBinding::Texture(targets.current())],
            LoadOp::Load,
        )?;

        log::trace!(
            "ambient occlusion applied at {}x{} for {}x{} output",
            textures.size.x,
            textures.size.y,
            frame.output_size.x,
            frame.output_size.y
        );
        Ok(())
    }
}

impl PostProcessPass for AmbientOcclusionPass {
    fn execution_flags(&self) -> PostProcessPassFlags {
        PostProcessPassFlags::NEED_COLOR_OUTPUT_BILINEAR
    }

    fn execute(&mut self, frame: &FrameContext, camera: Option<&Camera>) -> PassOutcome {
        if !self.settings.enabled {
            return PassOutcome::Skipped(SkipReason::Disabled);
        }
        let Some(camera) = camera else {
            self.diagnostics
                .warn("missing-camera", "ambient occlusion skipped: no camera");
            return PassOutcome::Skipped(SkipReason::MissingCamera);
        };
        let Some(color) = frame.color_output else {
            self.diagnostics
                .warn("missing-color", "ambient occlusion skipped: no color output");
            return PassOutcome::Skipped(SkipReason::MissingColorOutput);
        };
        let Some(depth) = frame.depth else {
            self.diagnostics
                .warn("missing-depth", "ambient occlusion skipped: no depth buffer");
            return PassOutcome::Skipped(SkipReason::MissingDepth);
        };

        let size = self.target_size_for(frame.output_size);
        let Ok(textures) = self.textures.ensure(&*self.device, size) else {
            return PassOutcome::Skipped(SkipReason::ResourcesUnavailable);
        };

        if !self.ensure_states(frame.color_format) {
            return PassOutcome::Skipped(SkipReason::ResourcesUnavailable);
        }
        let Some(states) = self.pipeline_states.as_ref() else {
            return PassOutcome::Skipped(SkipReason::ResourcesUnavailable);
        };

        match self.render(frame, color, depth, camera, textures, states) {
            Ok(()) => PassOutcome::Applied,
            Err(err) => {
                log::error!("ambient occlusion draw failed: {err}");
                PassOutcome::Skipped(SkipReason::DrawFailed)
            }
        }
    }
}

impl Drop for AmbientOcclusionPass {
    fn drop(&mut self) {
        self.textures.release(&*self.device);
    }
}
