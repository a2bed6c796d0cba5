//! wgpu implementation of [`RenderDevice`].

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use glam::UVec2;
use pollster::FutureExt;
use umbra_core::TextureId;
use wgpu::util::DeviceExt;

use crate::device::{
    upload_layout, BindingSlot, DrawBinding, LoadOp, PipelineState, PipelineStateDesc, QuadDraw,
    RenderDevice, TextureDesc, TextureUsage,
};
use crate::error::{RenderError, RenderResult};

struct GpuTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
    size: UVec2,
    format: wgpu::TextureFormat,
}

struct GpuPipeline {
    pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
    target_format: wgpu::TextureFormat,
}

/// A [`RenderDevice`] backed by a wgpu device and queue.
///
/// Draws are recorded into one pending command encoder which is submitted by
/// [`WgpuDevice::flush`], by readbacks, and before textures are destroyed.
pub struct WgpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    next_id: Cell<u32>,
    textures: RefCell<HashMap<TextureId, GpuTexture>>,
    pipelines: RefCell<HashMap<u32, GpuPipeline>>,
    encoder: RefCell<Option<wgpu::CommandEncoder>>,
    linear_sampler: wgpu::Sampler,
}

impl WgpuDevice {
    /// Wraps an existing device and queue.
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        let linear_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("umbra linear clamp sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            ..Default::default()
        });
        Self {
            device,
            queue,
            next_id: Cell::new(0),
            textures: RefCell::new(HashMap::new()),
            pipelines: RefCell::new(HashMap::new()),
            encoder: RefCell::new(None),
            linear_sampler,
        }
    }

    /// Creates a device without any window or surface.
    pub async fn new_headless() -> RenderResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..wgpu::InstanceDescriptor::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|_| RenderError::AdapterCreationFailed)?;

        log::info!("umbra headless adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("umbra device (headless)"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
            })
            .await?;

        Ok(Self::new(device, queue))
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// View of a texture, for renderers that sample it directly.
    pub fn texture_view(&self, texture: TextureId) -> Option<wgpu::TextureView> {
        self.textures.borrow().get(&texture).map(|t| t.view.clone())
    }

    /// Sampler matching the texture's requested sampling state.
    pub fn texture_sampler(&self, texture: TextureId) -> Option<wgpu::Sampler> {
        self.textures.borrow().get(&texture).map(|t| t.sampler.clone())
    }

    fn next_id(&self) -> u32 {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        id
    }

    /// Runs `f` inside validation, out-of-memory and internal error scopes.
    ///
    /// Backend shader translation failures arrive as internal errors.
    fn scoped<T>(&self, f: impl FnOnce() -> T) -> (T, Option<wgpu::Error>) {
        self.device.push_error_scope(wgpu::ErrorFilter::Internal);
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = f();
        let validation = self.device.pop_error_scope().block_on();
        let out_of_memory = self.device.pop_error_scope().block_on();
        let internal = self.device.pop_error_scope().block_on();
        (value, validation.or(out_of_memory).or(internal))
    }

    /// Submits all recorded draws.
    pub fn flush(&self) {
        let Some(encoder) = self.encoder.borrow_mut().take() else {
            return;
        };
        let ((), error) = self.scoped(|| {
            self.queue.submit(std::iter::once(encoder.finish()));
        });
        if let Some(error) = error {
            log::error!("command submission failed: {error}");
        }
    }

    /// Copies a color texture back to the CPU as tightly packed rows.
    pub fn read_texture(&self, texture: TextureId) -> RenderResult<Vec<u8>> {
        self.flush();

        let textures = self.textures.borrow();
        let gpu = textures
            .get(&texture)
            .ok_or(RenderError::UnknownTexture(texture))?;
        let texel = gpu.format.block_copy_size(None).ok_or_else(|| {
            RenderError::TextureUploadFailed(format!("{:?} cannot be read back", gpu.format))
        })?;
        let row_bytes = gpu.size.x * texel;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let bytes_per_row = row_bytes.div_ceil(align) * align;

        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("umbra readback buffer"),
            size: u64::from(bytes_per_row) * u64::from(gpu.size.y),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("umbra readback encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &gpu.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(gpu.size.y),
                },
            },
            extent(gpu.size),
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = self.device.poll(wgpu::PollType::wait_indefinitely());
        rx.recv()
            .map_err(|_| RenderError::BufferMapFailed)?
            .map_err(|_| RenderError::BufferMapFailed)?;

        let data = slice.get_mapped_range();
        let mut pixels = Vec::with_capacity((row_bytes * gpu.size.y) as usize);
        for row in 0..gpu.size.y {
            let start = (row * bytes_per_row) as usize;
            pixels.extend_from_slice(&data[start..start + row_bytes as usize]);
        }
        drop(data);
        buffer.unmap();
        Ok(pixels)
    }

    fn create_bind_group_layout(&self, desc: &PipelineStateDesc) -> wgpu::BindGroupLayout {
        let entries: Vec<wgpu::BindGroupLayoutEntry> = desc
            .slots
            .iter()
            .zip(0u32..)
            .map(|(slot, binding)| wgpu::BindGroupLayoutEntry {
                binding,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: match slot {
                    BindingSlot::Uniforms => wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    BindingSlot::Sampler => {
                        wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering)
                    }
                    BindingSlot::Texture => wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    // Loaded as unfilterable float so GL backends accept `textureLoad`.
                    BindingSlot::DepthTexture => wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                },
                count: None,
            })
            .collect();

        self.device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(&format!("{} layout", desc.label)),
                entries: &entries,
            })
    }
}

fn extent(size: UVec2) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: size.x,
        height: size.y,
        depth_or_array_layers: 1,
    }
}

impl RenderDevice for WgpuDevice {
    fn create_texture(&self, desc: &TextureDesc) -> RenderResult<TextureId> {
        if desc.size.x == 0 || desc.size.y == 0 {
            return Err(RenderError::TextureCreationFailed(format!(
                "'{}': zero-sized texture",
                desc.label
            )));
        }

        let usage = match desc.usage {
            TextureUsage::Sampled => {
                wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST
            }
            TextureUsage::RenderTarget => {
                wgpu::TextureUsages::RENDER_ATTACHMENT
                    | wgpu::TextureUsages::TEXTURE_BINDING
                    | wgpu::TextureUsages::COPY_SRC
                    | wgpu::TextureUsages::COPY_DST
            }
        };

        let (created, error) = self.scoped(|| {
            let texture = self.device.create_texture(&wgpu::TextureDescriptor {
                label: Some(&desc.label),
                size: extent(desc.size),
                mip_level_count: desc.mip_levels.max(1),
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: desc.format,
                usage,
                view_formats: &[],
            });
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            let sampler = self.device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some(&desc.label),
                mag_filter: desc.sampling.filter,
                min_filter: desc.sampling.filter,
                address_mode_u: desc.sampling.address,
                address_mode_v: desc.sampling.address,
                ..Default::default()
            });
            (texture, view, sampler)
        });
        if let Some(error) = error {
            return Err(RenderError::TextureCreationFailed(format!(
                "'{}': {error}",
                desc.label
            )));
        }

        let (texture, view, sampler) = created;
        let id = TextureId(self.next_id());
        self.textures.borrow_mut().insert(
            id,
            GpuTexture {
                texture,
                view,
                sampler,
                size: desc.size,
                format: desc.format,
            },
        );
        Ok(id)
    }

    fn write_texture(&self, texture: TextureId, data: &[u8]) -> RenderResult<()> {
        let textures = self.textures.borrow();
        let gpu = textures
            .get(&texture)
            .ok_or(RenderError::UnknownTexture(texture))?;
        let (aspect, texel) = upload_layout(gpu.format).ok_or_else(|| {
            RenderError::TextureUploadFailed(format!("{:?} cannot be uploaded", gpu.format))
        })?;
        let expected = (gpu.size.x * gpu.size.y * texel) as usize;
        if data.len() != expected {
            return Err(RenderError::TextureUploadFailed(format!(
                "expected {expected} bytes, got {}",
                data.len()
            )));
        }

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &gpu.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(gpu.size.x * texel),
                rows_per_image: Some(gpu.size.y),
            },
            extent(gpu.size),
        );
        Ok(())
    }

    fn destroy_texture(&self, texture: TextureId) {
        // Pending draws may still reference the texture.
        self.flush();
        if let Some(gpu) = self.textures.borrow_mut().remove(&texture) {
            gpu.texture.destroy();
        }
    }

    fn texture_size(&self, texture: TextureId) -> Option<UVec2> {
        self.textures.borrow().get(&texture).map(|t| t.size)
    }

    fn create_pipeline_state(&self, desc: &PipelineStateDesc) -> PipelineState {
        let id = self.next_id();
        let constants: Vec<(&str, f64)> = desc
            .constants
            .iter()
            .map(|(name, value)| (name.as_str(), *value))
            .collect();

        let (created, error) = self.scoped(|| {
            let module = self
                .device
                .create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some(&desc.label),
                    source: wgpu::ShaderSource::Wgsl(desc.source.clone()),
                });
            let layout = self.create_bind_group_layout(desc);
            let pipeline_layout =
                self.device
                    .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                        label: Some(&desc.label),
                        bind_group_layouts: &[&layout],
                        push_constant_ranges: &[],
                    });
            let pipeline = self
                .device
                .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label: Some(&desc.label),
                    layout: Some(&pipeline_layout),
                    vertex: wgpu::VertexState {
                        module: &module,
                        entry_point: Some(desc.vertex_entry),
                        buffers: &[],
                        compilation_options: wgpu::PipelineCompilationOptions::default(),
                    },
                    fragment: Some(wgpu::FragmentState {
                        module: &module,
                        entry_point: Some(desc.fragment_entry),
                        targets: &[Some(wgpu::ColorTargetState {
                            format: desc.target_format,
                            blend: desc.blend.to_wgpu(),
                            write_mask: wgpu::ColorWrites::ALL,
                        })],
                        compilation_options: wgpu::PipelineCompilationOptions {
                            constants: &constants,
                            ..Default::default()
                        },
                    }),
                    primitive: wgpu::PrimitiveState {
                        topology: wgpu::PrimitiveTopology::TriangleList,
                        ..Default::default()
                    },
                    depth_stencil: None,
                    multisample: wgpu::MultisampleState::default(),
                    multiview: None,
                    cache: None,
                });
            (pipeline, layout)
        });

        if let Some(error) = error {
            log::error!("pipeline state '{}' failed to compile: {error}", desc.label);
            return PipelineState::new(id, desc.label.clone(), false);
        }

        let (pipeline, layout) = created;
        self.pipelines.borrow_mut().insert(
            id,
            GpuPipeline {
                pipeline,
                layout,
                target_format: desc.target_format,
            },
        );
        PipelineState::new(id, desc.label.clone(), true)
    }

    fn draw_quad(&self, draw: &QuadDraw<'_>) -> RenderResult<()> {
        let pipelines = self.pipelines.borrow();
        let gpu_pipeline = pipelines
            .get(&draw.state.id())
            .filter(|_| draw.state.is_valid())
            .ok_or_else(|| RenderError::InvalidPipelineState(draw.state.label().to_string()))?;

        let textures = self.textures.borrow();
        let target = textures
            .get(&draw.target)
            .ok_or(RenderError::UnknownTexture(draw.target))?;
        if target.format != gpu_pipeline.target_format {
            return Err(RenderError::BindingMismatch {
                label: draw.label.to_string(),
                reason: format!(
                    "target is {:?}, pipeline writes {:?}",
                    target.format, gpu_pipeline.target_format
                ),
            });
        }
        if let Some(texture) = draw.sources().find(|t| *t == draw.target) {
            return Err(RenderError::ReadWriteHazard {
                label: draw.label.to_string(),
                texture,
            });
        }

        let buffers: Vec<wgpu::Buffer> = draw
            .bindings
            .iter()
            .filter_map(|binding| match binding {
                DrawBinding::Uniforms(bytes) => Some(self.device.create_buffer_init(
                    &wgpu::util::BufferInitDescriptor {
                        label: Some(draw.label),
                        contents: bytes,
                        usage: wgpu::BufferUsages::UNIFORM,
                    },
                )),
                _ => None,
            })
            .collect();

        let mut buffer_iter = buffers.iter();
        let mut entries = Vec::with_capacity(draw.bindings.len());
        for (binding, index) in draw.bindings.iter().zip(0u32..) {
            let resource = match binding {
                DrawBinding::Uniforms(_) => buffer_iter
                    .next()
                    .ok_or_else(|| RenderError::BindingMismatch {
                        label: draw.label.to_string(),
                        reason: "missing uniform buffer".to_string(),
                    })?
                    .as_entire_binding(),
                DrawBinding::Sampler => wgpu::BindingResource::Sampler(&self.linear_sampler),
                DrawBinding::Texture(id) => wgpu::BindingResource::TextureView(
                    &textures
                        .get(id)
                        .ok_or(RenderError::UnknownTexture(*id))?
                        .view,
                ),
            };
            entries.push(wgpu::BindGroupEntry {
                binding: index,
                resource,
            });
        }

        let (bind_group, error) = self.scoped(|| {
            self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(draw.label),
                layout: &gpu_pipeline.layout,
                entries: &entries,
            })
        });
        if let Some(error) = error {
            return Err(RenderError::BindingMismatch {
                label: draw.label.to_string(),
                reason: error.to_string(),
            });
        }

        let load = match draw.load {
            LoadOp::Load => wgpu::LoadOp::Load,
            LoadOp::Clear([r, g, b, a]) => wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
        };

        let mut encoder_slot = self.encoder.borrow_mut();
        let encoder = encoder_slot.get_or_insert_with(|| {
            self.device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("umbra encoder"),
                })
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(draw.label),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&gpu_pipeline.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.draw(0..3, 0..1);
        }
        Ok(())
    }
}

impl Drop for WgpuDevice {
    fn drop(&mut self) {
        self.flush();
    }
}
