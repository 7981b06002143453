use std::sync::Arc;

use anyhow::{anyhow, Context as AnyhowContext, Result};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::window::Window;

use crate::types::{GpuPowerPreference, SurfaceSize, VsyncMode};

/// Adapter details worth logging and reacting to.
#[derive(Debug, Clone)]
pub(crate) struct AdapterProfile {
    pub name: String,
    pub backend: wgpu::Backend,
    pub device_type: wgpu::DeviceType,
}

impl AdapterProfile {
    fn from_wgpu(info: &wgpu::AdapterInfo) -> Self {
        Self {
            name: info.name.clone(),
            backend: info.backend,
            device_type: info.device_type,
        }
    }

    pub(crate) fn is_software(&self) -> bool {
        matches!(self.device_type, wgpu::DeviceType::Cpu)
            || self.name.to_ascii_lowercase().contains("llvmpipe")
    }
}

/// Instance, device and configured surface for one window.
pub(crate) struct GpuContext {
    // Declared before `_window` so the surface is dropped while the window
    // it points into is still alive.
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub max_dimension: u32,
    pub adapter_profile: AdapterProfile,
    _instance: wgpu::Instance,
    _window: Arc<Window>,
}

impl GpuContext {
    pub(crate) fn new(
        window: Arc<Window>,
        initial_size: SurfaceSize,
        gpu_power: GpuPowerPreference,
        vsync_mode: VsyncMode,
    ) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            flags: wgpu::InstanceFlags::default(),
            memory_budget_thresholds: wgpu::MemoryBudgetThresholds::default(),
            backend_options: wgpu::BackendOptions::default(),
        });

        let window_handle = window
            .window_handle()
            .map_err(|err| anyhow!("failed to acquire window handle: {err}"))?;
        let display_handle = window
            .display_handle()
            .map_err(|err| anyhow!("failed to acquire display handle: {err}"))?;

        // SAFETY: the window is kept alive in `_window` for as long as the
        // surface exists.
        let surface = unsafe {
            instance.create_surface_unsafe(wgpu::SurfaceTargetUnsafe::RawHandle {
                raw_display_handle: display_handle.as_raw(),
                raw_window_handle: window_handle.as_raw(),
            })
        }
        .context("failed to create rendering surface")?;

        let power_preference = match gpu_power {
            GpuPowerPreference::Low => wgpu::PowerPreference::LowPower,
            GpuPowerPreference::High => wgpu::PowerPreference::HighPerformance,
        };
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("failed to find a suitable GPU adapter")?;

        let adapter_profile = AdapterProfile::from_wgpu(&adapter.get_info());
        let limits = adapter.limits();
        tracing::debug!(
            name = %adapter_profile.name,
            backend = ?adapter_profile.backend,
            device_type = ?adapter_profile.device_type,
            is_software = adapter_profile.is_software(),
            "selected GPU adapter"
        );
        if adapter_profile.is_software() {
            tracing::warn!(
                adapter = %adapter_profile.name,
                "software rasterizer detected; expect a low frame rate"
            );
        }

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("fractaldrift device"),
            required_features: wgpu::Features::empty(),
            required_limits: limits.clone(),
            memory_hints: wgpu::MemoryHints::MemoryUsage,
            trace: wgpu::Trace::default(),
        }))
        .context("failed to create GPU device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|format| !format.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| anyhow!("surface reports no supported formats"))?;

        let present_mode = select_present_mode(&surface_caps.present_modes, vsync_mode);
        tracing::debug!(?present_mode, ?vsync_mode, ?surface_format, "using present mode");

        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let max_dimension = limits.max_texture_dimension_2d;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: initial_size.width.clamp(1, max_dimension),
            height: initial_size.height.clamp(1, max_dimension),
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            max_dimension,
            adapter_profile,
            _instance: instance,
            _window: window,
        })
    }

    pub(crate) fn size(&self) -> SurfaceSize {
        SurfaceSize::new(self.config.width, self.config.height)
    }

    pub(crate) fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Reconfigures the swapchain. Empty sizes are ignored.
    pub(crate) fn resize(&mut self, new_size: SurfaceSize) {
        if new_size.is_empty() {
            return;
        }

        self.config.width = new_size.width.min(self.max_dimension);
        self.config.height = new_size.height.min(self.max_dimension);
        self.surface.configure(&self.device, &self.config);
    }
}

/// Fifo when vsync is on; Immediate, then Mailbox, when it is off.
fn select_present_mode(available: &[wgpu::PresentMode], vsync: VsyncMode) -> wgpu::PresentMode {
    let find = |mode: wgpu::PresentMode| available.iter().copied().find(|m| *m == mode);
    let fifo = find(wgpu::PresentMode::Fifo)
        .or_else(|| available.first().copied())
        .unwrap_or(wgpu::PresentMode::Fifo);
    match vsync {
        VsyncMode::On => fifo,
        VsyncMode::Off => find(wgpu::PresentMode::Immediate)
            .or_else(|| find(wgpu::PresentMode::Mailbox))
            .unwrap_or(fifo),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vsync_on_prefers_fifo() {
        let modes = [wgpu::PresentMode::Immediate, wgpu::PresentMode::Fifo];
        assert_eq!(
            select_present_mode(&modes, VsyncMode::On),
            wgpu::PresentMode::Fifo
        );
    }

    #[test]
    fn vsync_off_falls_back_through_mailbox_to_fifo() {
        let with_mailbox = [wgpu::PresentMode::Fifo, wgpu::PresentMode::Mailbox];
        assert_eq!(
            select_present_mode(&with_mailbox, VsyncMode::Off),
            wgpu::PresentMode::Mailbox
        );
        let fifo_only = [wgpu::PresentMode::Fifo];
        assert_eq!(
            select_present_mode(&fifo_only, VsyncMode::Off),
            wgpu::PresentMode::Fifo
        );
    }

    #[test]
    fn llvmpipe_counts_as_software() {
        let profile = AdapterProfile {
            name: "llvmpipe (LLVM 17.0.6, 256 bits)".into(),
            backend: wgpu::Backend::Vulkan,
            device_type: wgpu::DeviceType::Other,
        };
        assert!(profile.is_software());
    }
}
