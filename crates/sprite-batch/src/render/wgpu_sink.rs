use std::collections::HashMap;

use anyhow::{bail, Context, Result};
use wgpu::util::DeviceExt;

use crate::batch::{FrameUniforms, RenderSink, TextureFactory};
use crate::command::{CommandInstance, TextureId};

use super::recording::BatchRecording;
use super::quad::{instance_layout, premul_alpha_blend, QuadVertex, QUAD_INDICES, QUAD_VERTICES};
use super::uniforms::{slot_stride, FrameUniform};
use super::{FrameEncoder, RenderCtx, RenderTarget};

/// Instance buffers grow in whole chunks of this many instances.
const INSTANCE_CHUNK: usize = 4096;

struct GpuTexture {
    _texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    width: u32,
    height: u32,
}

/// wgpu implementation of [`RenderSink`] and [`TextureFactory`].
///
/// Flushes only record: uploaded instances are staged on the CPU and every
/// draw is remembered with its instance range and the uniforms of its flush.
/// [`FrameEncoder::encode`] then writes the staged data once and replays all
/// draws in a single render pass, so several flushes per frame share one
/// instance buffer.
pub struct WgpuSink {
    device: wgpu::Device,
    queue: wgpu::Queue,

    texture_layout: wgpu::BindGroupLayout,
    frame_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    textures: HashMap<TextureId, GpuTexture>,
    next_texture: u32,

    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,

    quad_vbo: wgpu::Buffer,
    quad_ibo: wgpu::Buffer,

    instance_vbo: Option<wgpu::Buffer>,
    instance_capacity: usize,

    frame_ubo: Option<wgpu::Buffer>,
    frame_bind_group: Option<wgpu::BindGroup>,
    frame_slots: usize,
    slot_stride: u64,

    recording: BatchRecording,
}

impl WgpuSink {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sprite-batch texture bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sprite-batch frame bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: Some(FrameUniform::min_binding_size()),
                },
                count: None,
            }],
        });

        // Pixel art: no filtering, no wrap-around bleeding between atlas regions.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("sprite-batch nearest sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        let quad_vbo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sprite-batch quad vbo"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let quad_ibo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sprite-batch quad ibo"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });

        let slot_stride = slot_stride(device.limits().min_uniform_buffer_offset_alignment);

        Self {
            device: device.clone(),
            queue: queue.clone(),
            texture_layout,
            frame_layout,
            sampler,
            textures: HashMap::new(),
            next_texture: 1,
            pipeline_format: None,
            pipeline: None,
            quad_vbo,
            quad_ibo,
            instance_vbo: None,
            instance_capacity: 0,
            frame_ubo: None,
            frame_bind_group: None,
            frame_slots: 0,
            slot_stride,
            recording: BatchRecording::default(),
        }
    }

    /// Batches recorded since the last `encode`.
    #[inline]
    pub fn pending_draws(&self) -> usize {
        self.recording.draws().len()
    }

    /// Pixel size of a live texture.
    pub fn texture_size(&self, texture: TextureId) -> Option<(u32, u32)> {
        self.textures.get(&texture).map(|t| (t.width, t.height))
    }

    fn encode_pending(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>) -> Result<()> {
        if self.recording.draws().is_empty() {
            return Ok(());
        }

        self.ensure_pipeline(ctx);
        self.ensure_instance_capacity(self.recording.staged().len());
        self.ensure_frame_slots(self.recording.flushes().len());
        self.write_frame_uniforms(ctx);

        let vbo = self.instance_vbo.as_ref().context("instance buffer missing")?;
        self.queue.write_buffer(vbo, 0, bytemuck::cast_slice(self.recording.staged()));

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("sprite-batch pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        let pipeline = self.pipeline.as_ref().context("batch pipeline missing")?;
        let frame_bg = self.frame_bind_group.as_ref().context("frame bind group missing")?;
        let instance_vbo = self.instance_vbo.as_ref().context("instance buffer missing")?;

        rpass.set_pipeline(pipeline);
        rpass.set_vertex_buffer(0, self.quad_vbo.slice(..));
        rpass.set_vertex_buffer(1, instance_vbo.slice(..));
        rpass.set_index_buffer(self.quad_ibo.slice(..), wgpu::IndexFormat::Uint16);

        for draw in self.recording.draws() {
            let Some(texture) = self.textures.get(&draw.texture) else {
                log::warn!("texture {:?} released before encode; batch skipped", draw.texture);
                continue;
            };
            let offset = (draw.flush as u64 * self.slot_stride) as u32;
            rpass.set_bind_group(0, frame_bg, &[offset]);
            rpass.set_bind_group(1, &texture.bind_group, &[]);
            rpass.draw_indexed(0..6, 0, draw.instances.clone());
        }

        Ok(())
    }

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format == Some(ctx.surface_format) && self.pipeline.is_some() {
            return;
        }

        let shader = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sprite-batch shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/batch.wgsl").into()),
        });

        let layout = self.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sprite-batch pipeline layout"),
            bind_group_layouts: &[&self.frame_layout, &self.texture_layout],
            immediate_size: 0,
        });

        let pipeline = self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("sprite-batch pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[QuadVertex::layout(), instance_layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.surface_format,
                    blend: Some(premul_alpha_blend()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::debug!("batch pipeline built for {:?}", ctx.surface_format);
        self.pipeline_format = Some(ctx.surface_format);
        self.pipeline = Some(pipeline);
    }

    fn ensure_instance_capacity(&mut self, required: usize) {
        if required <= self.instance_capacity && self.instance_vbo.is_some() {
            return;
        }

        let new_cap = required.max(1).div_ceil(INSTANCE_CHUNK) * INSTANCE_CHUNK;
        self.instance_vbo = Some(self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("sprite-batch instance vbo"),
            size: (new_cap * std::mem::size_of::<CommandInstance>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.instance_capacity = new_cap;
    }

    fn ensure_frame_slots(&mut self, required: usize) {
        if required <= self.frame_slots && self.frame_bind_group.is_some() {
            return;
        }

        let slots = required.max(4).next_power_of_two();
        let ubo = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("sprite-batch frame ubo"),
            size: slots as u64 * self.slot_stride,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sprite-batch frame bind group"),
            layout: &self.frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &ubo,
                    offset: 0,
                    size: Some(FrameUniform::min_binding_size()),
                }),
            }],
        });

        self.frame_ubo = Some(ubo);
        self.frame_bind_group = Some(bind_group);
        self.frame_slots = slots;
    }

    fn write_frame_uniforms(&self, ctx: &RenderCtx<'_>) {
        let Some(ubo) = self.frame_ubo.as_ref() else { return };
        for (i, flush) in self.recording.flushes().iter().enumerate() {
            let u = FrameUniform::new(flush, ctx.viewport, ctx.scale_factor);
            self.queue.write_buffer(ubo, i as u64 * self.slot_stride, bytemuck::bytes_of(&u));
        }
    }
}

impl RenderSink for WgpuSink {
    fn begin_flush(&mut self, uniforms: &FrameUniforms) -> Result<()> {
        self.recording.begin_flush(uniforms);
        Ok(())
    }

    fn bind_texture(&mut self, texture: TextureId) -> Result<()> {
        if !self.textures.contains_key(&texture) {
            bail!("bind of unknown texture {texture:?}");
        }
        self.recording.bind(texture);
        Ok(())
    }

    fn upload_instances(&mut self, instances: &[CommandInstance]) -> Result<()> {
        self.recording.upload(instances)
    }

    fn draw_instanced(&mut self, instance_count: u32) -> Result<()> {
        self.recording.draw(instance_count)
    }
}

impl FrameEncoder for WgpuSink {
    /// Records one render pass replaying every batch flushed since the last
    /// encode or discard. The recording is cleared even when encoding fails.
    fn encode(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>) -> Result<()> {
        let result = self.encode_pending(ctx, target);
        self.recording.clear();
        result
    }

    fn discard(&mut self) {
        let dropped = self.recording.draws().len();
        if dropped > 0 {
            log::debug!("frame skipped; {dropped} recorded batches dropped");
        }
        self.recording.clear();
    }
}

impl TextureFactory for WgpuSink {
    fn create_texture(&mut self, width: u32, height: u32, rgba: &[u8]) -> Result<TextureId> {
        let max = self.device.limits().max_texture_dimension_2d;
        if width == 0 || height == 0 || width > max || height > max {
            bail!("texture size {width}x{height} outside 1..={max}");
        }
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            bail!("texture {width}x{height} needs {expected} bytes, got {}", rgba.len());
        }

        let size = wgpu::Extent3d { width, height, depth_or_array_layers: 1 };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("sprite-batch texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sprite-batch texture bind group"),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        let id = TextureId(self.next_texture);
        self.next_texture = self.next_texture.checked_add(1).context("texture ids exhausted")?;
        self.textures.insert(id, GpuTexture { _texture: texture, bind_group, width, height });

        log::debug!("texture {id:?} created ({width}x{height})");
        Ok(id)
    }

    fn release_texture(&mut self, texture: TextureId) {
        if self.textures.remove(&texture).is_none() {
            log::warn!("release of unknown texture {texture:?}");
        }
    }
}
