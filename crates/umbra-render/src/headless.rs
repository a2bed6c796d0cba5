//! A device that records instead of rendering.
//!
//! [`HeadlessDevice`] validates draws the way a GPU backend would (live
//! textures, matching slots, no texture both read and written) and keeps a
//! log of everything it was asked to do. Failures can be injected to exercise
//! the resource-failure paths of passes and surfaces.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap, HashSet};

use glam::UVec2;
use umbra_core::TextureId;

use crate::device::{
    upload_layout, BindingSlot, DrawBinding, LoadOp, PipelineState, PipelineStateDesc, QuadDraw,
    RenderDevice, TextureDesc,
};
use crate::error::{RenderError, RenderResult};

/// One recorded quad draw.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    pub label: String,
    pub pipeline: String,
    pub target: TextureId,
    pub sources: Vec<TextureId>,
    pub uniform_bytes: usize,
    pub load: LoadOp,
}

/// Recording [`crate::RenderDevice`] without a GPU.
#[derive(Debug, Default)]
pub struct HeadlessDevice {
    next_id: Cell<u32>,
    textures: RefCell<BTreeMap<TextureId, TextureDesc>>,
    uploads: RefCell<HashMap<TextureId, usize>>,
    pipelines: RefCell<HashMap<u32, PipelineStateDesc>>,
    draws: RefCell<Vec<DrawRecord>>,
    textures_created: Cell<usize>,
    fail_textures: Cell<bool>,
    failing_pipelines: RefCell<HashSet<String>>,
}

impl HeadlessDevice {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> u32 {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        id
    }

    /// Makes every following texture allocation fail (or succeed again).
    pub fn fail_texture_allocations(&self, fail: bool) {
        self.fail_textures.set(fail);
    }

    /// Makes pipeline states whose label contains `pattern` fail to compile.
    pub fn fail_pipelines_matching(&self, pattern: impl Into<String>) {
        self.failing_pipelines.borrow_mut().insert(pattern.into());
    }

    pub fn clear_pipeline_failures(&self) {
        self.failing_pipelines.borrow_mut().clear();
    }

    /// Snapshot of the draw log.
    pub fn draws(&self) -> Vec<DrawRecord> {
        self.draws.borrow().clone()
    }

    /// Drains the draw log.
    pub fn take_draws(&self) -> Vec<DrawRecord> {
        std::mem::take(&mut *self.draws.borrow_mut())
    }

    pub fn texture_desc(&self, texture: TextureId) -> Option<TextureDesc> {
        self.textures.borrow().get(&texture).cloned()
    }

    pub fn contains_texture(&self, texture: TextureId) -> bool {
        self.textures.borrow().contains_key(&texture)
    }

    /// Number of textures currently alive.
    pub fn live_textures(&self) -> usize {
        self.textures.borrow().len()
    }

    /// Number of successful allocations over the device lifetime.
    pub fn textures_created(&self) -> usize {
        self.textures_created.get()
    }

    /// Number of pipeline state compilations requested, valid or not.
    pub fn pipelines_created(&self) -> usize {
        self.pipelines.borrow().len()
    }

    /// Size in bytes of the last upload to `texture`.
    pub fn uploaded_bytes(&self, texture: TextureId) -> Option<usize> {
        self.uploads.borrow().get(&texture).copied()
    }

    fn check_bindings(desc: &PipelineStateDesc, draw: &QuadDraw<'_>) -> RenderResult<()> {
        let mismatch = |reason: String| RenderError::BindingMismatch {
            label: draw.label.to_string(),
            reason,
        };
        if desc.slots.len() != draw.bindings.len() {
            return Err(mismatch(format!(
                "expected {} bindings, got {}",
                desc.slots.len(),
                draw.bindings.len()
            )));
        }
        for (index, (slot, binding)) in desc.slots.iter().zip(draw.bindings).enumerate() {
            if !binding.matches(*slot) {
                return Err(mismatch(format!("binding {index} is not {slot:?}")));
            }
        }
        Ok(())
    }
}

impl RenderDevice for HeadlessDevice {
    fn create_texture(&self, desc: &TextureDesc) -> RenderResult<TextureId> {
        if self.fail_textures.get() {
            return Err(RenderError::TextureCreationFailed(format!(
                "'{}': allocation refused",
                desc.label
            )));
        }
        if desc.size.x == 0 || desc.size.y == 0 {
            return Err(RenderError::TextureCreationFailed(format!(
                "'{}': zero-sized texture",
                desc.label
            )));
        }
        let id = TextureId(self.next_id());
        self.textures.borrow_mut().insert(id, desc.clone());
        self.textures_created.set(self.textures_created.get() + 1);
        Ok(id)
    }

    fn write_texture(&self, texture: TextureId, data: &[u8]) -> RenderResult<()> {
        let textures = self.textures.borrow();
        let desc = textures
            .get(&texture)
            .ok_or(RenderError::UnknownTexture(texture))?;
        let (_, texel) = upload_layout(desc.format).ok_or_else(|| {
            RenderError::TextureUploadFailed(format!(
                "'{}': {:?} cannot be uploaded",
                desc.label, desc.format
            ))
        })?;
        let texel = texel as usize;
        let expected = desc.size.x as usize * desc.size.y as usize * texel;
        if data.len() != expected {
            return Err(RenderError::TextureUploadFailed(format!(
                "'{}': expected {expected} bytes, got {}",
                desc.label,
                data.len()
            )));
        }
        self.uploads.borrow_mut().insert(texture, data.len());
        Ok(())
    }

    fn destroy_texture(&self, texture: TextureId) {
        self.textures.borrow_mut().remove(&texture);
        self.uploads.borrow_mut().remove(&texture);
    }

    fn texture_size(&self, texture: TextureId) -> Option<UVec2> {
        self.textures.borrow().get(&texture).map(|d| d.size)
    }

    fn create_pipeline_state(&self, desc: &PipelineStateDesc) -> PipelineState {
        let id = self.next_id();
        let failing = self
            .failing_pipelines
            .borrow()
            .iter()
            .any(|pattern| desc.label.contains(pattern.as_str()));
        self.pipelines.borrow_mut().insert(id, desc.clone());
        if failing {
            log::error!("pipeline state '{}' failed to compile", desc.label);
        }
        PipelineState::new(id, desc.label.clone(), !failing)
    }

    fn draw_quad(&self, draw: &QuadDraw<'_>) -> RenderResult<()> {
        if !draw.state.is_valid() {
            return Err(RenderError::InvalidPipelineState(
                draw.state.label().to_string(),
            ));
        }
        {
            let pipelines = self.pipelines.borrow();
            let desc = pipelines
                .get(&draw.state.id())
                .ok_or_else(|| RenderError::InvalidPipelineState(draw.state.label().to_string()))?;
            Self::check_bindings(desc, draw)?;
            if let Some(target) = self.textures.borrow().get(&draw.target) {
                if target.format != desc.target_format {
                    return Err(RenderError::BindingMismatch {
                        label: draw.label.to_string(),
                        reason: format!(
                            "target is {:?}, pipeline writes {:?}",
                            target.format, desc.target_format
                        ),
                    });
                }
            }
        }

        let textures = self.textures.borrow();
        if !textures.contains_key(&draw.target) {
            return Err(RenderError::UnknownTexture(draw.target));
        }
        let sources: Vec<TextureId> = draw.sources().collect();
        for source in &sources {
            if !textures.contains_key(source) {
                return Err(RenderError::UnknownTexture(*source));
            }
            if *source == draw.target {
                return Err(RenderError::ReadWriteHazard {
                    label: draw.label.to_string(),
                    texture: *source,
                });
            }
        }

        let uniform_bytes = draw
            .bindings
            .iter()
            .map(|b| match b {
                DrawBinding::Uniforms(bytes) => bytes.len(),
                _ => 0,
            })
            .sum();

        self.draws.borrow_mut().push(DrawRecord {
            label: draw.label.to_string(),
            pipeline: draw.state.label().to_string(),
            target: draw.target,
            sources,
            uniform_bytes,
            load: draw.load,
        });
        Ok(())
    }
}

impl HeadlessDevice {
    /// Number of texture slots in a recorded pipeline.
    pub fn texture_slots(&self, state: &PipelineState) -> Option<usize> {
        self.pipelines.borrow().get(&state.id()).map(|desc| {
            desc.slots
                .iter()
                .filter(|s| matches!(s, BindingSlot::Texture | BindingSlot::DepthTexture))
                .count()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_state(device: &HeadlessDevice) -> PipelineState {
        device.create_pipeline_state(
            &PipelineStateDesc::new("copy", "")
                .with_slots(&[BindingSlot::Sampler, BindingSlot::Texture])
                .with_target_format(wgpu::TextureFormat::R8Unorm),
        )
    }

    fn target(device: &HeadlessDevice) -> TextureId {
        device
            .create_texture(&TextureDesc::render_target(
                "t",
                UVec2::splat(8),
                wgpu::TextureFormat::R8Unorm,
            ))
            .unwrap()
    }

    #[test]
    fn test_records_draws() {
        let device = HeadlessDevice::new();
        let state = quad_state(&device);
        let a = target(&device);
        let b = target(&device);
        device
            .draw_quad(&QuadDraw {
                label: "copy a to b",
                state: &state,
                target: b,
                bindings: &[DrawBinding::Sampler, DrawBinding::Texture(a)],
                load: LoadOp::Load,
            })
            .unwrap();
        let draws = device.draws();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].sources, vec![a]);
        assert_eq!(draws[0].target, b);
        assert_eq!(device.texture_slots(&state), Some(1));
    }

    #[test]
    fn test_rejects_read_write_hazard() {
        let device = HeadlessDevice::new();
        let state = quad_state(&device);
        let a = target(&device);
        let result = device.draw_quad(&QuadDraw {
            label: "self copy",
            state: &state,
            target: a,
            bindings: &[DrawBinding::Sampler, DrawBinding::Texture(a)],
            load: LoadOp::Load,
        });
        assert!(matches!(result, Err(RenderError::ReadWriteHazard { .. })));
        assert!(device.draws().is_empty());
    }

    #[test]
    fn test_rejects_mismatched_bindings() {
        let device = HeadlessDevice::new();
        let state = quad_state(&device);
        let a = target(&device);
        let b = target(&device);
        let result = device.draw_quad(&QuadDraw {
            label: "bad",
            state: &state,
            target: b,
            bindings: &[DrawBinding::Texture(a), DrawBinding::Sampler],
            load: LoadOp::Load,
        });
        assert!(matches!(result, Err(RenderError::BindingMismatch { .. })));
    }

    #[test]
    fn test_injected_failures() {
        let device = HeadlessDevice::new();
        device.fail_texture_allocations(true);
        assert!(device
            .create_texture(&TextureDesc::sampled(
                "x",
                UVec2::ONE,
                wgpu::TextureFormat::Rgba8Unorm
            ))
            .is_err());
        device.fail_texture_allocations(false);
        assert_eq!(device.live_textures(), 0);

        device.fail_pipelines_matching("copy");
        let state = quad_state(&device);
        assert!(!state.is_valid());
        device.clear_pipeline_failures();
        assert!(quad_state(&device).is_valid());
        assert_eq!(device.pipelines_created(), 2);
    }

    #[test]
    fn test_upload_size_checked() {
        let device = HeadlessDevice::new();
        let noise = device
            .create_texture(&TextureDesc::sampled(
                "noise",
                UVec2::splat(4),
                wgpu::TextureFormat::Rgba8Unorm,
            ))
            .unwrap();
        assert!(device.write_texture(noise, &[0; 63]).is_err());
        device.write_texture(noise, &[0; 64]).unwrap();
        assert_eq!(device.uploaded_bytes(noise), Some(64));
        device.destroy_texture(noise);
        assert!(matches!(
            device.write_texture(noise, &[0; 64]),
            Err(RenderError::UnknownTexture(_))
        ));
    }

    #[test]
    fn test_depth32_is_not_uploadable() {
        let device = HeadlessDevice::new();
        let depth = device
            .create_texture(&TextureDesc::render_target(
                "depth",
                UVec2::splat(2),
                wgpu::TextureFormat::Depth32Float,
            ))
            .unwrap();
        assert!(matches!(
            device.write_texture(depth, &[0; 16]),
            Err(RenderError::TextureUploadFailed(_))
        ));
    }
}
