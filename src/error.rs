//! Error types for the water surface.

use thiserror::Error;

/// Errors raised while building or driving the simulator and renderer.
#[derive(Error, Debug)]
pub enum WaterError {
    /// Configuration rejected before any GPU work.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// No adapter matched the request.
    #[error("failed to find a suitable GPU adapter")]
    AdapterNotFound,

    /// The adapter refused to create a device.
    #[error("failed to request GPU device: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),

    /// The window could not back a surface.
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    /// The surface cannot be presented with this adapter.
    #[error("surface not supported by adapter")]
    SurfaceUnsupported,

    /// GPU allocation or validation failure.
    #[error("GPU resource error: {0}")]
    Resource(String),

    /// Mapping a staging buffer failed.
    #[error("buffer map failed: {0}")]
    BufferMap(#[from] wgpu::BufferAsyncError),

    /// The map callback was dropped without reporting.
    #[error("readback channel disconnected")]
    ReadbackDisconnected,

    /// The object was used after `dispose()`.
    #[error("GPU resources already disposed")]
    Disposed,
}

/// Result type for water operations.
pub type Result<T> = std::result::Result<T, WaterError>;
