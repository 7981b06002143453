//! `wgpu` implementation of the `Graphics` seam.
//!
//! - `context` owns instance/device/surface wiring and rebuilds swapchain
//!   state when the window resizes.
//! - `uniforms` mirrors the fragment stage's uniform block and maps named
//!   uniform writes onto byte offsets.
//!
//! GL-style calls are translated as follows: a "program" is a render
//! pipeline plus its uniform buffer and bind group, a "vertex array" is the
//! vertex buffer binding used by `set_vertex_buffer`, and `draw_triangles`
//! records one render pass against the next swapchain texture and presents
//! it.

mod context;
mod uniforms;

use std::borrow::Cow;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, trace, warn};
use wgpu::naga;
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::error::DrawError;
use crate::geometry::POSITION_LAYOUT;
use crate::graphics::Graphics;
use crate::types::{
    GpuPowerPreference, ShaderStage, SurfaceSize, UniformValue, VertexLayout, Viewport, VsyncMode,
};

use context::GpuContext;
use uniforms::{uniform_write, ProgramUniforms};

pub struct WgpuShader {
    stage: ShaderStage,
    module: Option<wgpu::ShaderModule>,
}

pub struct WgpuProgram {
    pipeline: Option<wgpu::RenderPipeline>,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

pub struct WgpuBuffer {
    buffer: wgpu::Buffer,
}

pub struct WgpuVertexArray {
    buffer: wgpu::Buffer,
    slot: u32,
    offset: u64,
}

struct BoundProgram {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
}

/// Graphics context backed by a `wgpu` device and window surface.
pub struct WgpuGraphics {
    context: GpuContext,
    viewport: Viewport,
    uniform_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    bound_program: Option<BoundProgram>,
    bound_vertices: Option<WgpuVertexArray>,
}

impl WgpuGraphics {
    /// Acquires adapter, device and surface for `window`.
    pub fn acquire(
        window: Arc<Window>,
        initial_size: SurfaceSize,
        gpu_power: GpuPowerPreference,
        vsync: VsyncMode,
    ) -> Result<Self> {
        let context = GpuContext::new(window, initial_size, gpu_power, vsync)?;
        let uniform_layout =
            context
                .device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("uniform layout"),
                    entries: &[wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: wgpu::BufferSize::new(ProgramUniforms::SIZE),
                        },
                        count: None,
                    }],
                });
        let pipeline_layout =
            context
                .device
                .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some("backdrop pipeline layout"),
                    bind_group_layouts: &[&uniform_layout],
                    push_constant_ranges: &[],
                });
        let viewport = Viewport::covering(context.size());

        Ok(Self {
            context,
            viewport,
            uniform_layout,
            pipeline_layout,
            bound_program: None,
            bound_vertices: None,
        })
    }

    /// Human-readable adapter name for start-up logs.
    pub fn adapter_name(&self) -> &str {
        &self.context.adapter_profile.name
    }

    /// Runs `create` inside a validation error scope and returns the
    /// captured diagnostic, if any.
    fn capture_validation<T>(&self, create: impl FnOnce(&wgpu::Device) -> T) -> (T, Option<String>) {
        let device = &self.context.device;
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = create(device);
        let error = pollster::block_on(device.pop_error_scope());
        (value, error.map(|err| err.to_string()))
    }

    fn clamped_viewport(&self) -> Viewport {
        let size = self.context.size();
        let x = self.viewport.x.min(size.width.saturating_sub(1));
        let y = self.viewport.y.min(size.height.saturating_sub(1));
        Viewport {
            x,
            y,
            width: self.viewport.width.min(size.width - x).max(1),
            height: self.viewport.height.min(size.height - y).max(1),
        }
    }
}

fn vertex_format(components: u32) -> wgpu::VertexFormat {
    match components {
        1 => wgpu::VertexFormat::Float32,
        2 => wgpu::VertexFormat::Float32x2,
        3 => wgpu::VertexFormat::Float32x3,
        _ => wgpu::VertexFormat::Float32x4,
    }
}

impl Graphics for WgpuGraphics {
    type Shader = WgpuShader;
    type Program = WgpuProgram;
    type Buffer = WgpuBuffer;
    type VertexArray = WgpuVertexArray;

    fn surface_size(&self) -> SurfaceSize {
        self.context.size()
    }

    fn max_surface_dimension(&self) -> u32 {
        self.context.max_dimension
    }

    fn resize_surface(&mut self, size: SurfaceSize) {
        self.context.resize(size);
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn create_shader(&mut self, stage: ShaderStage) -> WgpuShader {
        WgpuShader {
            stage,
            module: None,
        }
    }

    fn compile_shader(&mut self, shader: &mut WgpuShader, source: &str) -> Result<(), String> {
        let stage = match shader.stage {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Fragment => naga::ShaderStage::Fragment,
        };
        let label = format!("backdrop {}", shader.stage);
        let (module, error) = self.capture_validation(|device| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label.as_str()),
                source: wgpu::ShaderSource::Glsl {
                    shader: Cow::Owned(source.to_owned()),
                    stage,
                    defines: &[],
                },
            })
        });
        match error {
            Some(log) => Err(log),
            None => {
                shader.module = Some(module);
                Ok(())
            }
        }
    }

    fn delete_shader(&mut self, shader: WgpuShader) {
        trace!(stage = %shader.stage, "releasing shader module");
        drop(shader);
    }

    fn create_program(&mut self) -> WgpuProgram {
        let uniform_buffer =
            self.context
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("backdrop uniforms"),
                    contents: bytemuck::bytes_of(&ProgramUniforms::default()),
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                });
        let bind_group = self
            .context
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("backdrop uniform bind group"),
                layout: &self.uniform_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                }],
            });
        WgpuProgram {
            pipeline: None,
            uniform_buffer,
            bind_group,
        }
    }

    fn link_program(
        &mut self,
        program: &mut WgpuProgram,
        vertex: &WgpuShader,
        fragment: &WgpuShader,
    ) -> Result<(), String> {
        let (Some(vertex_module), Some(fragment_module)) =
            (vertex.module.as_ref(), fragment.module.as_ref())
        else {
            return Err("cannot link: a shader stage has not been compiled".to_string());
        };

        let attributes = [wgpu::VertexAttribute {
            format: vertex_format(POSITION_LAYOUT.components),
            offset: 0,
            shader_location: POSITION_LAYOUT.location,
        }];
        let surface_format = self.context.format();
        let pipeline_layout = &self.pipeline_layout;
        let (pipeline, error) = self.capture_validation(|device| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("backdrop pipeline"),
                layout: Some(pipeline_layout),
                vertex: wgpu::VertexState {
                    module: vertex_module,
                    entry_point: Some("main"),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: POSITION_LAYOUT.effective_stride(),
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &attributes,
                    }],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
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
                fragment: Some(wgpu::FragmentState {
                    module: fragment_module,
                    entry_point: Some("main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: surface_format,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                multiview: None,
                cache: None,
            })
        });
        match error {
            Some(log) => Err(log),
            None => {
                program.pipeline = Some(pipeline);
                Ok(())
            }
        }
    }

    fn delete_program(&mut self, program: WgpuProgram) {
        trace!("releasing render pipeline and uniform buffer");
        program.uniform_buffer.destroy();
        self.bound_program = None;
    }

    fn create_buffer(&mut self, contents: &[u8]) -> WgpuBuffer {
        let buffer = self
            .context
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("backdrop quad"),
                contents,
                usage: wgpu::BufferUsages::VERTEX,
            });
        WgpuBuffer { buffer }
    }

    fn delete_buffer(&mut self, buffer: WgpuBuffer) {
        trace!(size = buffer.buffer.size(), "releasing vertex buffer");
        drop(buffer);
    }

    fn create_vertex_array(&mut self, buffer: &WgpuBuffer, layout: VertexLayout) -> WgpuVertexArray {
        if layout.location != POSITION_LAYOUT.location
            || layout.components != POSITION_LAYOUT.components
            || layout.effective_stride() != POSITION_LAYOUT.effective_stride()
        {
            warn!(
                ?layout,
                expected = ?POSITION_LAYOUT,
                "vertex layout differs from the pipeline's position attribute"
            );
        }
        WgpuVertexArray {
            buffer: buffer.buffer.clone(),
            slot: 0,
            offset: layout.offset,
        }
    }

    fn delete_vertex_array(&mut self, vertex_array: WgpuVertexArray) {
        trace!(slot = vertex_array.slot, "releasing vertex binding");
        self.bound_vertices = None;
        drop(vertex_array);
    }

    fn use_program(&mut self, program: &WgpuProgram) {
        self.bound_program = program.pipeline.as_ref().map(|pipeline| BoundProgram {
            pipeline: pipeline.clone(),
            bind_group: program.bind_group.clone(),
        });
    }

    fn bind_vertex_array(&mut self, vertex_array: &WgpuVertexArray) {
        self.bound_vertices = Some(WgpuVertexArray {
            buffer: vertex_array.buffer.clone(),
            slot: vertex_array.slot,
            offset: vertex_array.offset,
        });
    }

    fn set_uniform(&mut self, program: &WgpuProgram, name: &str, value: UniformValue) {
        match uniform_write(name, value) {
            Some((offset, payload)) => {
                self.context
                    .queue
                    .write_buffer(&program.uniform_buffer, offset, &payload);
            }
            None => debug!(name, ?value, "ignoring write to unknown uniform"),
        }
    }

    fn draw_triangles(&mut self, first: u32, count: u32) -> Result<(), DrawError> {
        let (Some(program), Some(vertices)) =
            (self.bound_program.as_ref(), self.bound_vertices.as_ref())
        else {
            return Err(DrawError::Other(
                "draw issued without a linked program and vertex array bound".to_string(),
            ));
        };

        let frame = self.context.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let viewport = self.clamped_viewport();
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("backdrop encoder"),
                });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("backdrop pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            render_pass.set_viewport(
                viewport.x as f32,
                viewport.y as f32,
                viewport.width as f32,
                viewport.height as f32,
                0.0,
                1.0,
            );
            render_pass.set_pipeline(&program.pipeline);
            render_pass.set_bind_group(0, &program.bind_group, &[]);
            render_pass.set_vertex_buffer(vertices.slot, vertices.buffer.slice(vertices.offset..));
            render_pass.draw(first..first + count, 0..1);
        }
        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}
