//! Seams between the backdrop lifecycle and the environment it runs in.
//!
//! `Graphics` is the context bound to the drawing surface: it owns the GPU
//! objects and hands out opaque handles for them. `Host` is everything the
//! backdrop needs from the windowing side: viewport size, a monotonic clock,
//! next-frame scheduling, and the resize subscription. The `wgpu` and `winit`
//! implementations live in `gpu` and `window`; tests drive the lifecycle with
//! recording doubles instead.

use std::time::Instant;

use crate::error::DrawError;
use crate::types::{ShaderStage, SurfaceSize, UniformValue, VertexLayout, Viewport};

pub trait Graphics {
    type Shader;
    type Program;
    type Buffer;
    type VertexArray;

    /// Current pixel size of the surface.
    fn surface_size(&self) -> SurfaceSize;
    /// Largest surface edge the device accepts.
    fn max_surface_dimension(&self) -> u32;
    /// Reconfigures the surface at the given pixel size.
    fn resize_surface(&mut self, size: SurfaceSize);
    fn set_viewport(&mut self, viewport: Viewport);

    fn create_shader(&mut self, stage: ShaderStage) -> Self::Shader;
    /// Compiles `source` into `shader`; the error carries the driver log.
    fn compile_shader(&mut self, shader: &mut Self::Shader, source: &str) -> Result<(), String>;
    fn delete_shader(&mut self, shader: Self::Shader);

    fn create_program(&mut self) -> Self::Program;
    /// Links both stages into `program`; the error carries the driver log.
    fn link_program(
        &mut self,
        program: &mut Self::Program,
        vertex: &Self::Shader,
        fragment: &Self::Shader,
    ) -> Result<(), String>;
    fn delete_program(&mut self, program: Self::Program);

    /// Uploads immutable vertex data.
    fn create_buffer(&mut self, contents: &[u8]) -> Self::Buffer;
    fn delete_buffer(&mut self, buffer: Self::Buffer);

    fn create_vertex_array(
        &mut self,
        buffer: &Self::Buffer,
        layout: VertexLayout,
    ) -> Self::VertexArray;
    fn delete_vertex_array(&mut self, vertex_array: Self::VertexArray);

    fn use_program(&mut self, program: &Self::Program);
    fn bind_vertex_array(&mut self, vertex_array: &Self::VertexArray);
    /// Sets a uniform on `program`. Unknown names are ignored.
    fn set_uniform(&mut self, program: &Self::Program, name: &str, value: UniformValue);
    /// Draws `count` vertices as a triangle list with the bound state.
    fn draw_triangles(&mut self, first: u32, count: u32) -> Result<(), DrawError>;
}

/// Environment services consumed by the backdrop.
pub trait Host {
    /// Current viewport size in physical pixels.
    fn viewport_size(&self) -> SurfaceSize;
    /// Monotonic clock.
    fn now(&self) -> Instant;
    /// Schedules one more frame callback.
    fn request_frame(&mut self);
    /// Drops a pending frame callback, if any. A callback already running
    /// completes.
    fn cancel_frame(&mut self);
    fn subscribe_resize(&mut self);
    fn unsubscribe_resize(&mut self);
}

/// Recording doubles for lifecycle tests.
#[cfg(test)]
pub(crate) mod testing {
    use std::time::{Duration, Instant};

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        ResizeSurface(SurfaceSize),
        SetViewport(Viewport),
        CreateShader(ShaderStage, u32),
        CompileShader(u32),
        DeleteShader(u32),
        CreateProgram(u32),
        LinkProgram(u32),
        DeleteProgram(u32),
        CreateBuffer(u32, Vec<u8>),
        DeleteBuffer(u32),
        CreateVertexArray(u32, VertexLayout),
        DeleteVertexArray(u32),
        UseProgram(u32),
        BindVertexArray(u32),
        SetUniform(String, UniformValue),
        DrawTriangles(u32, u32),
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Handle {
        pub id: u32,
        pub stage: Option<ShaderStage>,
    }

    #[derive(Debug)]
    pub struct RecordingGraphics {
        pub calls: Vec<Call>,
        pub size: SurfaceSize,
        pub max_dimension: u32,
        pub fail_compile: Option<ShaderStage>,
        pub fail_link: bool,
        pub draw_results: Vec<Result<(), DrawError>>,
        pub next_id: u32,
    }

    impl Default for RecordingGraphics {
        fn default() -> Self {
            Self {
                calls: Vec::new(),
                size: SurfaceSize::new(1, 1),
                max_dimension: 8192,
                fail_compile: None,
                fail_link: false,
                draw_results: Vec::new(),
                next_id: 0,
            }
        }
    }

    impl RecordingGraphics {
        fn next(&mut self) -> u32 {
            self.next_id += 1;
            self.next_id
        }

        pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
            self.calls.iter().filter(|call| predicate(call)).count()
        }

        pub fn creations(&self) -> usize {
            self.count(|call| {
                matches!(
                    call,
                    Call::CreateShader(..)
                        | Call::CreateProgram(_)
                        | Call::CreateBuffer(..)
                        | Call::CreateVertexArray(..)
                )
            })
        }

        pub fn deletions(&self) -> usize {
            self.count(|call| {
                matches!(
                    call,
                    Call::DeleteShader(_)
                        | Call::DeleteProgram(_)
                        | Call::DeleteBuffer(_)
                        | Call::DeleteVertexArray(_)
                )
            })
        }
    }

    impl Graphics for RecordingGraphics {
        type Shader = Handle;
        type Program = Handle;
        type Buffer = Handle;
        type VertexArray = Handle;

        fn surface_size(&self) -> SurfaceSize {
            self.size
        }

        fn max_surface_dimension(&self) -> u32 {
            self.max_dimension
        }

        fn resize_surface(&mut self, size: SurfaceSize) {
            self.size = size;
            self.calls.push(Call::ResizeSurface(size));
        }

        fn set_viewport(&mut self, viewport: Viewport) {
            self.calls.push(Call::SetViewport(viewport));
        }

        fn create_shader(&mut self, stage: ShaderStage) -> Handle {
            let id = self.next();
            self.calls.push(Call::CreateShader(stage, id));
            Handle {
                id,
                stage: Some(stage),
            }
        }

        fn compile_shader(&mut self, shader: &mut Handle, _source: &str) -> Result<(), String> {
            self.calls.push(Call::CompileShader(shader.id));
            if shader.stage.is_some() && shader.stage == self.fail_compile {
                Err("ERROR: 0:1: syntax error".to_string())
            } else {
                Ok(())
            }
        }

        fn delete_shader(&mut self, shader: Handle) {
            self.calls.push(Call::DeleteShader(shader.id));
        }

        fn create_program(&mut self) -> Handle {
            let id = self.next();
            self.calls.push(Call::CreateProgram(id));
            Handle { id, stage: None }
        }

        fn link_program(
            &mut self,
            program: &mut Handle,
            _vertex: &Handle,
            _fragment: &Handle,
        ) -> Result<(), String> {
            self.calls.push(Call::LinkProgram(program.id));
            if self.fail_link {
                Err("link error: varying mismatch".to_string())
            } else {
                Ok(())
            }
        }

        fn delete_program(&mut self, program: Handle) {
            self.calls.push(Call::DeleteProgram(program.id));
        }

        fn create_buffer(&mut self, contents: &[u8]) -> Handle {
            let id = self.next();
            self.calls.push(Call::CreateBuffer(id, contents.to_vec()));
            Handle { id, stage: None }
        }

        fn delete_buffer(&mut self, buffer: Handle) {
            self.calls.push(Call::DeleteBuffer(buffer.id));
        }

        fn create_vertex_array(&mut self, _buffer: &Handle, layout: VertexLayout) -> Handle {
            let id = self.next();
            self.calls.push(Call::CreateVertexArray(id, layout));
            Handle { id, stage: None }
        }

        fn delete_vertex_array(&mut self, vertex_array: Handle) {
            self.calls.push(Call::DeleteVertexArray(vertex_array.id));
        }

        fn use_program(&mut self, program: &Handle) {
            self.calls.push(Call::UseProgram(program.id));
        }

        fn bind_vertex_array(&mut self, vertex_array: &Handle) {
            self.calls.push(Call::BindVertexArray(vertex_array.id));
        }

        fn set_uniform(&mut self, _program: &Handle, name: &str, value: UniformValue) {
            self.calls.push(Call::SetUniform(name.to_string(), value));
        }

        fn draw_triangles(&mut self, first: u32, count: u32) -> Result<(), DrawError> {
            self.calls.push(Call::DrawTriangles(first, count));
            if self.draw_results.is_empty() {
                Ok(())
            } else {
                self.draw_results.remove(0)
            }
        }
    }

    #[derive(Debug)]
    pub struct RecordingHost {
        pub viewport: SurfaceSize,
        pub origin: Instant,
        pub clock: Duration,
        pub frame_requests: usize,
        pub frame_pending: bool,
        pub cancellations: usize,
        pub resize_subscribed: bool,
        pub unsubscriptions: usize,
    }

    impl RecordingHost {
        pub fn new(width: u32, height: u32) -> Self {
            Self {
                viewport: SurfaceSize::new(width, height),
                origin: Instant::now(),
                clock: Duration::ZERO,
                frame_requests: 0,
                frame_pending: false,
                cancellations: 0,
                resize_subscribed: false,
                unsubscriptions: 0,
            }
        }

        pub fn advance(&mut self, by: Duration) {
            self.clock += by;
        }

        /// Consumes the pending frame the way the event loop would.
        pub fn take_frame(&mut self) -> bool {
            std::mem::take(&mut self.frame_pending)
        }
    }

    impl Host for RecordingHost {
        fn viewport_size(&self) -> SurfaceSize {
            self.viewport
        }

        fn now(&self) -> Instant {
            self.origin + self.clock
        }

        fn request_frame(&mut self) {
            self.frame_requests += 1;
            self.frame_pending = true;
        }

        fn cancel_frame(&mut self) {
            self.cancellations += 1;
            self.frame_pending = false;
        }

        fn subscribe_resize(&mut self) {
            self.resize_subscribed = true;
        }

        fn unsubscribe_resize(&mut self) {
            self.unsubscriptions += 1;
            self.resize_subscribed = false;
        }
    }
}
