//! Renderer crate for fractaldrift.
//!
//! A single full-screen animated shader hosted in a `winit` window and drawn
//! with `wgpu`. The flow is:
//!
//! ```text
//!   CLI / fractaldrift
//!          │ RendererConfig
//!          ▼
//!   Renderer::run ──▶ window::run ──▶ Backdrop::mount ──▶ winit event loop
//!                                          │                   │
//!                                          │   Resized ────────┼─▶ SurfaceManager::sync
//!                                          │   RedrawRequested ┴─▶ FrameDriver::tick
//!                                          ▼
//!                           context ▶ program ▶ quad ▶ first frame
//! ```
//!
//! `Backdrop` owns the lifecycle and talks to the outside world only through
//! the `Graphics` and `Host` traits, so the mount/tick/teardown rules are
//! exercised in tests without a GPU. `gpu` and `window` provide the real
//! implementations.

mod backdrop;
mod compile;
mod driver;
mod error;
mod geometry;
mod gpu;
mod graphics;
mod surface;
mod types;
mod window;

use anyhow::Result;

pub use backdrop::Backdrop;
pub use compile::{dump_shaders, stage_source};
pub use driver::{DriverState, TickOutcome, RESOLUTION_UNIFORM, TIME_UNIFORM};
pub use error::{DrawError, InitError};
pub use geometry::{POSITION_LAYOUT, QUAD_VERTEX_COUNT, QUAD_VERTICES};
pub use gpu::WgpuGraphics;
pub use graphics::{Graphics, Host};
pub use types::{
    GpuPowerPreference, RendererConfig, ShaderStage, SurfaceSize, UniformValue, VertexLayout,
    Viewport, VsyncMode, WindowMode,
};

/// High-level entry point that owns the chosen configuration.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    /// Builds a renderer for the supplied configuration.
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    /// Opens the backdrop window and blocks until it closes.
    ///
    /// Returns an error only when the window system itself fails. A missing
    /// GPU context or a shader that does not compile is logged and leaves the
    /// window blank.
    pub fn run(&self) -> Result<()> {
        tracing::debug!(config = ?self.config, "starting renderer");
        window::run(&self.config)
    }
}
