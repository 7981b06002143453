use tracing::{error, info};

use crate::compile::{build_program, ProgramParts};
use crate::driver::{DriverState, FrameDriver, TickOutcome};
use crate::error::InitError;
use crate::geometry::{upload_quad, QuadGeometry};
use crate::graphics::{Graphics, Host};
use crate::surface::SurfaceManager;
use crate::types::SurfaceSize;

struct Resources<G: Graphics> {
    program: ProgramParts<G>,
    quad: QuadGeometry<G>,
}

/// A mounted full-screen shader: graphics context, GPU objects and the frame
/// loop that feeds them.
///
/// Mounting either produces a running backdrop or fails without leaving
/// anything scheduled. `unmount` may be called more than once; only the first
/// call releases anything. Dropping a backdrop releases its GPU objects too.
pub struct Backdrop<G: Graphics> {
    graphics: G,
    surface: SurfaceManager,
    resources: Option<Resources<G>>,
    driver: FrameDriver,
    mounted: bool,
}

impl<G: Graphics> Backdrop<G> {
    /// Acquires the context through `acquire`, sizes the surface, builds the
    /// program and quad, subscribes to resize, and schedules the first frame.
    pub fn mount<H, F>(host: &mut H, acquire: F) -> Result<Self, InitError>
    where
        H: Host,
        F: FnOnce(SurfaceSize) -> anyhow::Result<G>,
    {
        let viewport = host.viewport_size();
        let mut graphics = acquire(viewport).map_err(|err| {
            let message = format!("{err:#}");
            error!(error = %message, "graphics context unavailable; backdrop stays inert");
            InitError::ContextUnavailable(message)
        })?;

        let mut surface = SurfaceManager::new();
        surface.sync(&mut graphics, viewport);

        let program = build_program(&mut graphics)?;
        let quad = upload_quad(&mut graphics);

        host.subscribe_resize();
        let driver = FrameDriver::start(host);
        info!(size = %graphics.surface_size(), "backdrop mounted");

        Ok(Self {
            graphics,
            surface,
            resources: Some(Resources { program, quad }),
            driver,
            mounted: true,
        })
    }

    /// Resize reaction: re-reads the viewport and resyncs the surface.
    pub fn resize<H: Host>(&mut self, host: &H) {
        if !self.mounted {
            return;
        }
        self.surface.sync(&mut self.graphics, host.viewport_size());
    }

    /// Frame callback.
    pub fn tick<H: Host>(&mut self, host: &mut H) -> TickOutcome {
        let Some(resources) = self.resources.as_ref() else {
            return TickOutcome::Idle;
        };
        self.driver.tick(
            &mut self.graphics,
            host,
            &resources.program.program,
            &resources.quad.vertex_array,
        )
    }

    /// Tears the backdrop down: resize subscription first, then the pending
    /// frame, then every GPU object.
    pub fn unmount<H: Host>(&mut self, host: &mut H) {
        if !self.mounted {
            return;
        }
        self.mounted = false;
        host.unsubscribe_resize();
        self.driver.stop(host);
        self.release();
        info!(frames = self.driver.frames_drawn(), "backdrop unmounted");
    }

    pub fn is_running(&self) -> bool {
        self.driver.state() == DriverState::Running
    }

    /// Size last applied to the surface.
    pub fn surface_size(&self) -> Option<SurfaceSize> {
        self.surface.current()
    }

    pub fn graphics(&self) -> &G {
        &self.graphics
    }

    fn release(&mut self) {
        if let Some(Resources { program, quad }) = self.resources.take() {
            self.graphics.delete_program(program.program);
            self.graphics.delete_shader(program.vertex);
            self.graphics.delete_shader(program.fragment);
            self.graphics.delete_buffer(quad.buffer);
            self.graphics.delete_vertex_array(quad.vertex_array);
        }
    }
}

impl<G: Graphics> Drop for Backdrop<G> {
    fn drop(&mut self) {
        self.release();
    }
}
