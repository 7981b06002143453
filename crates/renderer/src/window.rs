use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Result};
use tracing::{debug, error, info, warn};
use winit::dpi::PhysicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::{Fullscreen, Window, WindowBuilder};

use crate::backdrop::Backdrop;
use crate::driver::TickOutcome;
use crate::gpu::WgpuGraphics;
use crate::graphics::Host;
use crate::types::{RendererConfig, SurfaceSize, WindowMode};

const WINDOW_TITLE: &str = "fractaldrift";

/// `Host` backed by a `winit` window.
///
/// Frame requests become a pending flag that the event loop turns into
/// `request_redraw`; a `RedrawRequested` without a pending request is
/// ignored, which is how cancellation takes effect.
pub(crate) struct WindowHost {
    window: Arc<Window>,
    frame_pending: bool,
    resize_subscribed: bool,
}

impl WindowHost {
    pub(crate) fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            frame_pending: false,
            resize_subscribed: false,
        }
    }

    fn window(&self) -> &Window {
        &self.window
    }

    fn take_pending_frame(&mut self) -> bool {
        std::mem::take(&mut self.frame_pending)
    }
}

impl Host for WindowHost {
    fn viewport_size(&self) -> SurfaceSize {
        self.window.inner_size().into()
    }

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn request_frame(&mut self) {
        self.frame_pending = true;
    }

    fn cancel_frame(&mut self) {
        self.frame_pending = false;
    }

    fn subscribe_resize(&mut self) {
        self.resize_subscribed = true;
    }

    fn unsubscribe_resize(&mut self) {
        self.resize_subscribed = false;
    }
}

pub(crate) fn window_title(attribution: Option<&str>) -> String {
    match attribution {
        Some(text) if !text.trim().is_empty() => format!("{WINDOW_TITLE} ({})", text.trim()),
        _ => WINDOW_TITLE.to_string(),
    }
}

fn build_window(event_loop: &EventLoop<()>, config: &RendererConfig) -> Result<Window> {
    let mut builder = WindowBuilder::new().with_title(window_title(config.attribution.as_deref()));
    builder = match config.window_mode {
        WindowMode::Fullscreen => builder
            .with_decorations(false)
            .with_fullscreen(Some(Fullscreen::Borderless(None))),
        WindowMode::Windowed { width, height } => {
            builder.with_inner_size(PhysicalSize::new(width.max(1), height.max(1)))
        }
    };
    builder
        .build(event_loop)
        .map_err(|err| anyhow!("failed to create backdrop window: {err}"))
}

/// Opens the window, mounts the backdrop and drives the event loop until the
/// window closes.
///
/// Initialisation failures are logged and leave the window open and blank;
/// only window-system failures are returned as errors.
pub(crate) fn run(config: &RendererConfig) -> Result<()> {
    let event_loop = EventLoop::new().map_err(|err| anyhow!("failed to create event loop: {err}"))?;
    let window = Arc::new(build_window(&event_loop, config)?);

    if config.click_through {
        if let Err(err) = window.set_cursor_hittest(false) {
            warn!(error = %err, "pointer pass-through unsupported on this platform");
        }
    }
    if let Some(text) = config.attribution.as_deref() {
        info!(attribution = %text, "shader attribution");
    }

    let mut host = WindowHost::new(window.clone());
    let mut backdrop = match Backdrop::mount(&mut host, |size| {
        let graphics = WgpuGraphics::acquire(window.clone(), size, config.gpu_power, config.vsync)?;
        info!(adapter = graphics.adapter_name(), "graphics context acquired");
        Ok(graphics)
    }) {
        Ok(backdrop) => Some(backdrop),
        Err(err) => {
            error!(error = %err, "backdrop failed to initialise; window stays blank");
            None
        }
    };

    let run_result = event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { window_id, event } if window_id == host.window().id() => {
            match event {
                WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                    if let Some(mut backdrop) = backdrop.take() {
                        backdrop.unmount(&mut host);
                    }
                    elwt.exit();
                }
                WindowEvent::Resized(new_size) => {
                    if !host.resize_subscribed {
                        return;
                    }
                    debug!(width = new_size.width, height = new_size.height, "viewport resized");
                    if let Some(backdrop) = backdrop.as_mut() {
                        backdrop.resize(&host);
                    }
                }
                WindowEvent::RedrawRequested => {
                    if !host.take_pending_frame() {
                        return;
                    }
                    let Some(active) = backdrop.as_mut() else {
                        return;
                    };
                    if let TickOutcome::Halted(err) = active.tick(&mut host) {
                        error!(error = %err, "frame driver halted; closing backdrop");
                        active.unmount(&mut host);
                        backdrop = None;
                        elwt.exit();
                    }
                }
                _ => {}
            }
        }
        Event::AboutToWait => {
            if host.frame_pending {
                tracing::trace!("scheduler: issuing redraw now");
                host.window().request_redraw();
            }
            elwt.set_control_flow(ControlFlow::Wait);
        }
        Event::LoopExiting => {
            if let Some(mut backdrop) = backdrop.take() {
                backdrop.unmount(&mut host);
            }
        }
        _ => {}
    });

    run_result.map_err(|err| anyhow!("window event loop error: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_carries_trimmed_attribution() {
        assert_eq!(window_title(None), "fractaldrift");
        assert_eq!(window_title(Some("   ")), "fractaldrift");
        assert_eq!(
            window_title(Some(" shader by someone ")),
            "fractaldrift (shader by someone)"
        );
    }
}
