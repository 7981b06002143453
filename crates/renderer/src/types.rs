/// Pixel dimensions of the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when either axis is zero, e.g. while the window is minimised.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Resolution as fed to the fragment stage.
    pub fn as_resolution(&self) -> [f32; 2] {
        [self.width as f32, self.height as f32]
    }
}

impl From<winit::dpi::PhysicalSize<u32>> for SurfaceSize {
    fn from(size: winit::dpi::PhysicalSize<u32>) -> Self {
        Self::new(size.width, size.height)
    }
}

impl std::fmt::Display for SurfaceSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Rectangle the rasterizer maps clip space onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// Viewport covering the whole surface, anchored at the origin.
    pub fn covering(size: SurfaceSize) -> Self {
        Self {
            x: 0,
            y: 0,
            width: size.width,
            height: size.height,
        }
    }
}

/// The two programmable stages the backdrop compiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Value written to a named uniform of the active program.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2([f32; 2]),
}

/// Describes how a vertex buffer feeds a program attribute.
///
/// A `stride` of zero means the components are tightly packed, matching the
/// usual graphics API convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexLayout {
    /// Attribute slot the buffer feeds.
    pub location: u32,
    /// Number of `f32` components per vertex.
    pub components: u32,
    /// Distance in bytes between consecutive vertices (0 = tightly packed).
    pub stride: u64,
    /// Byte offset of the first vertex.
    pub offset: u64,
}

impl VertexLayout {
    /// Stride with the tightly-packed convention resolved.
    pub fn effective_stride(&self) -> u64 {
        if self.stride == 0 {
            u64::from(self.components) * std::mem::size_of::<f32>() as u64
        } else {
            self.stride
        }
    }
}

/// GPU adapter selection preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GpuPowerPreference {
    /// Prefer integrated / low-power adapters.
    #[default]
    Low,
    /// Prefer discrete / high-performance adapters.
    High,
}

/// Presentation pacing for the swapchain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VsyncMode {
    /// Present on vertical blank (Fifo).
    #[default]
    On,
    /// Present as soon as possible (Immediate, then Mailbox, else Fifo).
    Off,
}

/// How the host window covers the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowMode {
    /// Borderless fullscreen on the current monitor.
    Fullscreen,
    /// Regular decorated window at the requested size.
    Windowed { width: u32, height: u32 },
}

impl Default for WindowMode {
    fn default() -> Self {
        Self::Fullscreen
    }
}

/// Immutable configuration passed to the renderer at start-up.
#[derive(Debug, Clone, PartialEq)]
pub struct RendererConfig {
    /// Fullscreen backdrop or a regular window.
    pub window_mode: WindowMode,
    /// Adapter selection preference.
    pub gpu_power: GpuPowerPreference,
    /// Swapchain presentation pacing.
    pub vsync: VsyncMode,
    /// Attribution text shown in the window title and logged at start-up.
    pub attribution: Option<String>,
    /// Let pointer input pass through the window to whatever is below it.
    pub click_through: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            window_mode: WindowMode::default(),
            gpu_power: GpuPowerPreference::default(),
            vsync: VsyncMode::default(),
            attribution: None,
            click_through: true,
        }
    }
}
