//! Rendering error types.

use thiserror::Error;
use umbra_core::{TextureId, UmbraError};

/// Errors that can occur during rendering operations.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Failed to create wgpu adapter.
    #[error("failed to create graphics adapter")]
    AdapterCreationFailed,

    /// Failed to create wgpu device.
    #[error("failed to create graphics device: {0}")]
    DeviceCreationFailed(#[from] wgpu::RequestDeviceError),

    /// Texture creation failed.
    #[error("texture creation failed: {0}")]
    TextureCreationFailed(String),

    /// Texture upload failed.
    #[error("texture upload failed: {0}")]
    TextureUploadFailed(String),

    /// The texture id does not name a live texture.
    #[error("unknown texture {0}")]
    UnknownTexture(TextureId),

    /// The pipeline state was never compiled successfully.
    #[error("pipeline state '{0}' is not valid")]
    InvalidPipelineState(String),

    /// Draw bindings do not match the pipeline's declared slots.
    #[error("binding mismatch in '{label}': {reason}")]
    BindingMismatch { label: String, reason: String },

    /// A texture is bound for reading while also being the render target.
    #[error("draw '{label}' reads and writes {texture}")]
    ReadWriteHazard { label: String, texture: TextureId },

    /// Reading back GPU memory failed.
    #[error("buffer map failed")]
    BufferMapFailed,
}

impl From<RenderError> for UmbraError {
    fn from(err: RenderError) -> Self {
        UmbraError::ResourceAllocationFailure(err.to_string())
    }
}

/// A specialized Result type for rendering operations.
pub type RenderResult<T> = std::result::Result<T, RenderError>;
