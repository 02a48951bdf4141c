use thiserror::Error;

/// Failure to bring up the rendering environment. Anything allocated before
/// the failure has already been dropped when this is returned.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("no usable GPU adapter: {0}")]
    Unsupported(#[source] wgpu::RequestAdapterError),
    #[error("failed to create rendering surface: {0}")]
    Surface(#[source] wgpu::CreateSurfaceError),
    #[error("failed to create GPU device: {0}")]
    Device(#[source] wgpu::RequestDeviceError),
    #[error("surface {width}x{height} exceeds the GPU texture limit of {max}")]
    TooLarge { width: u32, height: u32, max: u32 },
    #[error("surface reports no supported formats for this adapter")]
    IncompatibleSurface,
}

/// Invalid request for the current [`crate::DriverState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DriverError {
    #[error("frame driver is already running")]
    AlreadyRunning,
    #[error("frame driver has not been started")]
    NotStarted,
    #[error("frame driver has been disposed")]
    Disposed,
}
