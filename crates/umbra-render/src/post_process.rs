//! Post-process pass plumbing shared by the frame pipeline and its passes.

use std::fmt;
use std::ops::BitOr;

use glam::UVec2;
use umbra_core::{Camera, TextureId};

/// Requirements a pass places on the frame's color output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PostProcessPassFlags(u32);

impl PostProcessPassFlags {
    pub const NONE: Self = Self(0);
    /// The pass reads the color output while also writing it.
    pub const NEED_COLOR_OUTPUT_READ_AND_WRITE: Self = Self(1);
    /// The pass samples the color output with bilinear filtering.
    pub const NEED_COLOR_OUTPUT_BILINEAR: Self = Self(1 << 1);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn bits(self) -> u32 {
        self.0
    }
}

impl BitOr for PostProcessPassFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// How the scene was rendered before post-processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPath {
    /// Only color and depth are available.
    Forward,
    /// A geometry buffer with view-space normals (`rgb`, signed) exists.
    Deferred { normal: TextureId },
}

/// Per-frame inputs handed to post-process passes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameContext {
    pub color_output: Option<TextureId>,
    pub color_format: wgpu::TextureFormat,
    pub depth: Option<TextureId>,
    pub output_size: UVec2,
    pub render_path: RenderPath,
}

impl FrameContext {
    /// A forward frame with both color and depth.
    pub fn forward(color: TextureId, depth: TextureId, output_size: UVec2) -> Self {
        Self {
            color_output: Some(color),
            color_format: wgpu::TextureFormat::Rgba8Unorm,
            depth: Some(depth),
            output_size,
            render_path: RenderPath::Forward,
        }
    }

    #[must_use]
    pub fn with_render_path(mut self, render_path: RenderPath) -> Self {
        self.render_path = render_path;
        self
    }

    #[must_use]
    pub fn with_color_format(mut self, format: wgpu::TextureFormat) -> Self {
        self.color_format = format;
        self
    }
}

/// Why a pass did nothing this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Disabled,
    MissingCamera,
    MissingColorOutput,
    MissingDepth,
    /// Textures or pipeline states could not be created.
    ResourcesUnavailable,
    /// A draw was rejected by the device.
    DrawFailed,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Disabled => "disabled",
            Self::MissingCamera => "no camera",
            Self::MissingColorOutput => "no color output",
            Self::MissingDepth => "no depth buffer",
            Self::ResourcesUnavailable => "resources unavailable",
            Self::DrawFailed => "draw failed",
        };
        f.write_str(text)
    }
}

/// Result of running a pass for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    Applied,
    Skipped(SkipReason),
}

impl PassOutcome {
    pub fn is_applied(self) -> bool {
        self == Self::Applied
    }
}

/// A pass that runs after the scene has been rendered.
pub trait PostProcessPass {
    fn execution_flags(&self) -> PostProcessPassFlags;

    fn execute(&mut self, frame: &FrameContext, camera: Option<&Camera>) -> PassOutcome;
}
