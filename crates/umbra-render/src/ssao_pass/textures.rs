//! Textures owned by the ambient occlusion pass.

use glam::UVec2;
use umbra_core::TextureId;

use crate::device::{RenderDevice, TextureDesc, TextureSampling};
use crate::error::{RenderError, RenderResult};

/// Side length of the tiled rotation noise.
pub const NOISE_SIZE: u32 = 4;

/// Format of the occlusion targets.
pub const AO_TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R8Unorm;

/// Two render targets whose roles swap between blur iterations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingPong {
    current: TextureId,
    previous: TextureId,
}

impl PingPong {
    pub fn new(current: TextureId, previous: TextureId) -> Self {
        debug_assert_ne!(current, previous);
        Self { current, previous }
    }

    /// The target written by the next draw.
    pub fn current(&self) -> TextureId {
        self.current
    }

    /// The target holding the last result.
    pub fn previous(&self) -> TextureId {
        self.previous
    }

    pub fn swap(&mut self) {
        std::mem::swap(&mut self.current, &mut self.previous);
    }
}

/// Snapshot of the cached textures for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedTextures {
    pub noise: TextureId,
    pub targets: PingPong,
    pub size: UVec2,
}

/// Lazily (re)built pass textures.
///
/// The noise texture is created once and kept across resizes. The targets
/// follow the requested size. A failed allocation is remembered for its size
/// and not retried until the size changes or the cache is invalidated.
#[derive(Debug, Default)]
pub struct TextureCache {
    noise: Option<TextureId>,
    targets: Option<(PingPong, UVec2)>,
    failed_size: Option<UVec2>,
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ready(&self) -> bool {
        self.noise.is_some() && self.targets.is_some()
    }

    /// Size of the current targets, if any.
    pub fn size(&self) -> Option<UVec2> {
        self.targets.map(|(_, size)| size)
    }

    pub fn noise(&self) -> Option<TextureId> {
        self.noise
    }

    /// Returns textures for `size`, creating them if needed.
    pub fn ensure(&mut self, device: &dyn RenderDevice, size: UVec2) -> RenderResult<CachedTextures> {
        let size = size.max(UVec2::ONE);

        if let (Some(noise), Some((targets, current))) = (self.noise, self.targets) {
            if current == size {
                return Ok(CachedTextures {
                    noise,
                    targets,
                    size,
                });
            }
        }

        if self.failed_size == Some(size) {
            return Err(RenderError::TextureCreationFailed(format!(
                "ambient occlusion targets {}x{} unavailable",
                size.x, size.y
            )));
        }

        self.release_targets(device);
        match self.allocate(device, size) {
            Ok(textures) => {
                self.failed_size = None;
                Ok(textures)
            }
            Err(err) => {
                log::error!("failed to create ambient occlusion textures: {err}");
                self.failed_size = Some(size);
                Err(err)
            }
        }
    }

    fn allocate(&mut self, device: &dyn RenderDevice, size: UVec2) -> RenderResult<CachedTextures> {
        let noise = match self.noise {
            Some(noise) => noise,
            None => {
                let noise = create_noise_texture(device)?;
                self.noise = Some(noise);
                noise
            }
        };

        let first = device.create_texture(&TextureDesc::render_target(
            "ambient occlusion target 0",
            size,
            AO_TARGET_FORMAT,
        ))?;
        let second = match device.create_texture(&TextureDesc::render_target(
            "ambient occlusion target 1",
            size,
            AO_TARGET_FORMAT,
        )) {
            Ok(second) => second,
            Err(err) => {
                device.destroy_texture(first);
                return Err(err);
            }
        };

        let targets = PingPong::new(first, second);
        self.targets = Some((targets, size));
        log::debug!("ambient occlusion targets resized to {}x{}", size.x, size.y);
        Ok(CachedTextures {
            noise,
            targets,
            size,
        })
    }

    fn release_targets(&mut self, device: &dyn RenderDevice) {
        if let Some((targets, _)) = self.targets.take() {
            device.destroy_texture(targets.current());
            device.destroy_texture(targets.previous());
        }
    }

    /// Forgets a remembered allocation failure so the next call retries.
    pub fn clear_failure(&mut self) {
        self.failed_size = None;
    }

    /// Drops the targets and forgets any remembered failure. Noise is kept.
    pub fn invalidate(&mut self, device: &dyn RenderDevice) {
        self.release_targets(device);
        self.failed_size = None;
    }

    /// Releases every texture, noise included.
    pub fn release(&mut self, device: &dyn RenderDevice) {
        self.invalidate(device);
        if let Some(noise) = self.noise.take() {
            device.destroy_texture(noise);
        }
    }
}

/// Random rotation vectors in the tangent plane, packed as RGBA8.
pub fn generate_noise() -> Vec<u8> {
    use rand::Rng;

    let mut rng = rand::thread_rng();
    let texels = (NOISE_SIZE * NOISE_SIZE) as usize;
    let mut data = Vec::with_capacity(texels * 4);
    for _ in 0..texels {
        let angle: f32 = rng.gen_range(0.0..std::f32::consts::TAU);
        let (sin, cos) = angle.sin_cos();
        data.push(((cos * 0.5 + 0.5) * 255.0).round() as u8);
        data.push(((sin * 0.5 + 0.5) * 255.0).round() as u8);
        data.push(0);
        data.push(255);
    }
    data
}

fn create_noise_texture(device: &dyn RenderDevice) -> RenderResult<TextureId> {
    let noise = device.create_texture(
        &TextureDesc::sampled(
            "ambient occlusion noise",
            UVec2::splat(NOISE_SIZE),
            wgpu::TextureFormat::Rgba8Unorm,
        )
        .with_sampling(TextureSampling::NEAREST_REPEAT),
    )?;
    if let Err(err) = device.write_texture(noise, &generate_noise()) {
        device.destroy_texture(noise);
        return Err(err);
    }
    Ok(noise)
}
