//! Error types for particle fields.
//!
//! The simulation core never fails: bad configuration is clamped and a
//! missing drawing surface leaves a field idle. These errors cover the host
//! side only (GPU setup, windowing, PNG export and option parsing).

use thiserror::Error;

/// Errors that can occur during GPU initialization.
#[derive(Debug, Error)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    #[error("Failed to create GPU surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    #[error("No compatible GPU adapter found. Ensure your system has a GPU with WebGPU/Vulkan/Metal/DX12 support.")]
    NoAdapter,
    /// Failed to create GPU device.
    #[error("Failed to create GPU device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),
}

/// Errors surfaced by hosts that drive a particle field.
#[derive(Debug, Error)]
pub enum FieldError {
    /// GPU initialization failed.
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
    /// Failed to create event loop.
    #[error("Failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    /// Failed to create window.
    #[error("Failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    /// Failed to encode or write a rendered frame.
    #[error("Failed to write image: {0}")]
    Image(#[from] image::ImageError),
    /// Field options could not be parsed.
    #[error("Invalid field options: {0}")]
    Options(#[from] serde_json::Error),
}
