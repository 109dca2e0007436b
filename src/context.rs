//! The wgpu backend of the [`Gpu`] seam.
//!
//! [`WgpuContext`] owns the device and queue and emulates the small piece of
//! OpenGL state meshes rely on: an active program with named sampler uniforms,
//! texture units, a bound vertex array. A draw call snapshots that state into a
//! [`DrawCommand`] and then clears the texture units, sampler assignments and
//! vertex array, so every draw binds its own. [`WgpuContext::render_to_view`] and
//! [`WgpuContext::render_offscreen`] replay the recorded draws into a pass.
//!
//! Sampler uniforms that no texture unit feeds sample a 1x1 white texture.

use std::{collections::HashMap, iter, time::Duration};

use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        texture::{GpuTexture, create_default_sampler},
        vertex::Vertex,
    },
    error::GpuError,
    gpu::{BufferKind, Gpu, VertexLayout},
    pipelines::basic::{MODEL_SAMPLERS, MODEL_SHADER, mk_basic_pipeline, mk_texture_layout},
    render::{DrawCommand, replay},
    resources::image::DecodedImage,
    shader::Shader,
};

/// Color format of [`WgpuContext::render_offscreen`] targets.
pub const OFFSCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Vertex and index buffers that are drawn together.
#[derive(Clone, Debug)]
pub struct WgpuVertexArray {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WgpuProgram {
    id: usize,
}

struct ProgramState {
    pipeline: wgpu::RenderPipeline,
    texture_layout: wgpu::BindGroupLayout,
    /// Sampler uniform names; the i-th is bound at binding `i + 1`.
    samplers: Vec<String>,
    /// Texture unit each sampler uniform points at.
    units: HashMap<String, i32>,
}

#[derive(Default)]
struct DrawState {
    program: Option<usize>,
    active_unit: u32,
    bound: HashMap<u32, GpuTexture>,
    vertex_array: Option<WgpuVertexArray>,
}

pub struct WgpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    sampler: wgpu::Sampler,
    fallback: GpuTexture,
    programs: Vec<ProgramState>,
    state: DrawState,
    commands: Vec<DrawCommand>,
}

impl WgpuContext {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        let sampler = create_default_sampler(&device);
        let fallback = GpuTexture::create_fallback(&device, &queue);
        Self {
            device,
            queue,
            sampler,
            fallback,
            programs: Vec::new(),
            state: DrawState::default(),
            commands: Vec::new(),
        }
    }

    /// Open the default adapter without a surface, blocking until it is ready.
    pub fn headless() -> Result<Self, GpuError> {
        futures::executor::block_on(Self::request_headless())
    }

    pub async fn request_headless() -> Result<Self, GpuError> {
        let instance = wgpu::Instance::default();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| GpuError::Unavailable(e.to_string()))?;
        log::info!("Using adapter {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("flow-mesh device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                ..Default::default()
            })
            .await
            .map_err(|e| GpuError::Unavailable(e.to_string()))?;
        Ok(Self::new(device, queue))
    }

    /// Compile `wgsl` into a program whose fragment stage reads the given
    /// sampler uniforms.
    ///
    /// The shader must declare a sampler at `@group(0) @binding(0)` and one
    /// `texture_2d<f32>` per name at bindings `1..`, in the order given.
    pub fn create_program(
        &mut self,
        wgsl: &str,
        samplers: &[&str],
        vertex_layout: &VertexLayout,
        color_format: wgpu::TextureFormat,
    ) -> Result<Shader<Self>, GpuError> {
        let available = self.max_texture_units();
        if samplers.len() > available as usize {
            return Err(GpuError::TextureUnitsExceeded {
                mesh: "program".to_string(),
                requested: samplers.len(),
                available,
            });
        }
        let texture_layout = mk_texture_layout(&self.device, samplers.len());
        let pipeline = mk_basic_pipeline(
            &self.device,
            &texture_layout,
            color_format,
            vertex_layout,
            wgsl,
        );

        let id = self.programs.len();
        self.programs.push(ProgramState {
            pipeline,
            texture_layout,
            samplers: samplers.iter().map(|name| name.to_string()).collect(),
            units: HashMap::new(),
        });
        Ok(Shader::new(WgpuProgram { id }))
    }

    /// The built-in lit model shader sampling `diffuse_1` and `specular_1`.
    pub fn create_model_program(
        &mut self,
        color_format: wgpu::TextureFormat,
    ) -> Result<Shader<Self>, GpuError> {
        self.create_program(MODEL_SHADER, &MODEL_SAMPLERS, &Vertex::LAYOUT, color_format)
    }

    /// Draws recorded since the last render.
    pub fn pending_draws(&self) -> usize {
        self.commands.len()
    }

    /// Replay all recorded draws into `view` and submit them.
    pub fn render_to_view(
        &mut self,
        view: &wgpu::TextureView,
        depth: &GpuTexture,
        clear: wgpu::Color,
    ) {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        self.encode_pass(&mut encoder, view, depth, clear);
        self.queue.submit(iter::once(encoder.finish()));
    }

    /// Replay all recorded draws into a fresh `width`x`height` target and read
    /// it back.
    pub fn render_offscreen(
        &mut self,
        width: u32,
        height: u32,
        clear: wgpu::Color,
    ) -> Result<image::RgbaImage, GpuError> {
        if width == 0 || height == 0 {
            return Err(GpuError::EmptyTexture("offscreen target".to_string()));
        }
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let target = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("offscreen target"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: OFFSCREEN_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = target.create_view(&wgpu::TextureViewDescriptor::default());
        let depth = GpuTexture::create_depth_texture(&self.device, [width, height], "depth_texture");

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Offscreen Encoder"),
            });
        self.encode_pass(&mut encoder, &view, &depth, clear);

        let u32_size = std::mem::size_of::<u32>() as u32;
        let unpadded_row = u32_size * width;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded_row = unpadded_row.div_ceil(align) * align;
        let output_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            size: (padded_row * height) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            label: Some("readback buffer"),
            mapped_at_creation: false,
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &target,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &output_buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row),
                    rows_per_image: Some(height),
                },
            },
            size,
        );
        self.queue.submit(iter::once(encoder.finish()));

        let pixels = futures::executor::block_on(async {
            let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
            let buffer_slice = output_buffer.slice(..);
            buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
                let _ = tx.send(result);
            });
            self.device
                .poll(wgpu::PollType::Wait {
                    submission_index: None,
                    timeout: Some(Duration::from_secs(3)),
                })
                .map_err(|e| GpuError::Readback(e.to_string()))?;
            rx.receive()
                .await
                .ok_or_else(|| GpuError::Readback("map callback was dropped".to_string()))?
                .map_err(|e| GpuError::Readback(e.to_string()))?;

            let data = buffer_slice.get_mapped_range();
            let mut pixels = Vec::with_capacity((unpadded_row * height) as usize);
            for row in data.chunks(padded_row as usize) {
                pixels.extend_from_slice(&row[..unpadded_row as usize]);
            }
            Ok::<_, GpuError>(pixels)
        })?;
        output_buffer.unmap();

        image::RgbaImage::from_raw(width, height, pixels)
            .ok_or_else(|| GpuError::Readback("pixel buffer has the wrong size".to_string()))
    }

    fn encode_pass(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        depth: &GpuTexture,
        clear: wgpu::Color,
    ) {
        let commands = std::mem::take(&mut self.commands);
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Model Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            ..Default::default()
        });
        log::debug!("Replaying {} draws", commands.len());
        replay(&commands, &mut render_pass);
    }
}

impl Gpu for WgpuContext {
    type Buffer = wgpu::Buffer;
    type VertexArray = WgpuVertexArray;
    type Texture = GpuTexture;
    type Program = WgpuProgram;

    fn max_texture_units(&self) -> u32 {
        self.device.limits().max_sampled_textures_per_shader_stage
    }

    fn create_buffer(
        &mut self,
        kind: BufferKind,
        contents: &[u8],
        label: &str,
    ) -> Result<wgpu::Buffer, GpuError> {
        if contents.len() as u64 > self.device.limits().max_buffer_size {
            return Err(GpuError::OutOfMemory(label.to_string()));
        }
        let usage = match kind {
            BufferKind::Vertex => wgpu::BufferUsages::VERTEX,
            BufferKind::Index => wgpu::BufferUsages::INDEX,
        };
        Ok(self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage: usage | wgpu::BufferUsages::COPY_DST,
            }))
    }

    fn create_vertex_array(
        &mut self,
        vertex_buffer: &wgpu::Buffer,
        index_buffer: &wgpu::Buffer,
        _layout: &VertexLayout,
        _label: &str,
    ) -> Result<WgpuVertexArray, GpuError> {
        Ok(WgpuVertexArray {
            vertex_buffer: vertex_buffer.clone(),
            index_buffer: index_buffer.clone(),
        })
    }

    fn create_texture(&mut self, image: &DecodedImage, label: &str) -> Result<GpuTexture, GpuError> {
        if image.width == 0 || image.height == 0 {
            return Err(GpuError::EmptyTexture(label.to_string()));
        }
        let max = self.device.limits().max_texture_dimension_2d;
        if image.width > max || image.height > max {
            return Err(GpuError::TextureTooLarge {
                label: label.to_string(),
                width: image.width,
                height: image.height,
                max,
            });
        }
        Ok(GpuTexture::from_image(
            &self.device,
            &self.queue,
            image,
            Some(label),
        ))
    }

    fn use_program(&mut self, program: &WgpuProgram) {
        self.state.program = Some(program.id);
    }

    fn set_uniform_i32(&mut self, program: &WgpuProgram, name: &str, value: i32) {
        let Some(state) = self.programs.get_mut(program.id) else {
            return;
        };
        if state.samplers.iter().any(|sampler| sampler == name) {
            state.units.insert(name.to_string(), value);
        } else {
            log::trace!("Program {} has no uniform {name}", program.id);
        }
    }

    fn set_uniform_f32(&mut self, program: &WgpuProgram, name: &str, _value: f32) {
        log::trace!("Program {} has no float uniform {name}", program.id);
    }

    fn active_texture(&mut self, unit: u32) {
        self.state.active_unit = unit;
    }

    fn bind_texture(&mut self, texture: &GpuTexture) {
        self.state.bound.insert(self.state.active_unit, texture.clone());
    }

    fn bind_vertex_array(&mut self, vertex_array: &WgpuVertexArray) {
        self.state.vertex_array = Some(vertex_array.clone());
    }

    fn draw_elements(&mut self, index_count: u32) -> Result<(), GpuError> {
        let program_id = self
            .state
            .program
            .filter(|&id| id < self.programs.len())
            .ok_or(GpuError::NoProgram)?;
        let program = &self.programs[program_id];
        let vertex_array = self
            .state
            .vertex_array
            .as_ref()
            .ok_or(GpuError::NoVertexArray)?;

        let views: Vec<&wgpu::TextureView> = program
            .samplers
            .iter()
            .map(|name| {
                program
                    .units
                    .get(name)
                    .and_then(|&unit| u32::try_from(unit).ok())
                    .and_then(|unit| self.state.bound.get(&unit))
                    .map_or(&self.fallback.view, |texture| &texture.view)
            })
            .collect();
        let mut entries = vec![wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Sampler(&self.sampler),
        }];
        entries.extend(views.iter().enumerate().map(|(i, view)| wgpu::BindGroupEntry {
            binding: i as u32 + 1,
            resource: wgpu::BindingResource::TextureView(view),
        }));
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &program.texture_layout,
            entries: &entries,
            label: Some("Model texture_bind_group"),
        });

        let command = DrawCommand {
            pipeline: program.pipeline.clone(),
            bind_group,
            vertex_buffer: vertex_array.vertex_buffer.clone(),
            index_buffer: vertex_array.index_buffer.clone(),
            index_format: wgpu::IndexFormat::Uint32,
            index_count,
        };
        self.commands.push(command);

        // The next draw starts from nothing bound; the command holds what it needs.
        self.programs[program_id].units.clear();
        self.state.bound.clear();
        self.state.active_unit = 0;
        self.state.vertex_array = None;
        Ok(())
    }
}
