use crate::types::ShaderStage;

/// Reasons the backdrop can fail to come up.
///
/// Every variant is terminal for the backdrop but never for the host: the
/// window stays open and blank.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("graphics context unavailable: {0}")]
    ContextUnavailable(String),
    #[error("failed to compile {stage} shader: {log}")]
    Compile { stage: ShaderStage, log: String },
    #[error("failed to link shader program: {log}")]
    Link { log: String },
}

/// Per-frame draw failures reported by a graphics backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DrawError {
    /// The surface is lost or outdated and must be reconfigured.
    #[error("surface lost or outdated")]
    SurfaceLost,
    #[error("timed out acquiring the next frame")]
    Timeout,
    #[error("out of GPU memory")]
    OutOfMemory,
    #[error("{0}")]
    Other(String),
}

impl From<wgpu::SurfaceError> for DrawError {
    fn from(err: wgpu::SurfaceError) -> Self {
        match err {
            wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => DrawError::SurfaceLost,
            wgpu::SurfaceError::Timeout => DrawError::Timeout,
            wgpu::SurfaceError::OutOfMemory => DrawError::OutOfMemory,
            other => DrawError::Other(other.to_string()),
        }
    }
}
