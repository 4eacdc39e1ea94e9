//! Graphics collaborators used by the terrain renderers.
//!
//! The bench never talks to a device directly. Uploads, command recording,
//! fences and presentation go through the traits below, and a context object
//! implementing them is passed explicitly to whoever needs it.

use std::fmt;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

pub mod frame;
pub mod headless;
pub mod terrain;

pub use frame::FrameRing;
pub use headless::HeadlessContext;
pub use terrain::{ChunkedTerrain, ClipmapTerrain, DrawStats, TerrainRenderer};

/// Constant slot holding [`TerrainConstants`].
pub const FRAME_CONSTANTS_SLOT: u32 = 0;
/// Constant slot holding the clipmap ring being drawn.
pub const RING_CONSTANTS_SLOT: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(u32);

impl BufferHandle {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    Vertex { stride: u32 },
    /// 32-bit indices.
    Index,
    Storage,
}

pub struct BufferInfo<'a> {
    pub debug_name: &'a str,
    pub usage: BufferUsage,
    pub initial_data: &'a [u8],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawIndexed {
    pub index_count: u32,
    pub first_index: u32,
    pub base_vertex: i32,
}

#[derive(Debug)]
pub enum GpuError {
    EmptyUpload { name: String },
    OutOfMemory { name: String, requested: usize, available: usize },
    BufferCreation { name: String, reason: String },
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::EmptyUpload { name } => write!(f, "refusing to create empty buffer {name}"),
            GpuError::OutOfMemory {
                name,
                requested,
                available,
            } => write!(
                f,
                "buffer {name} needs {requested} bytes but only {available} are available"
            ),
            GpuError::BufferCreation { name, reason } => {
                write!(f, "failed to create buffer {name}: {reason}")
            }
        }
    }
}

impl std::error::Error for GpuError {}

/// Creates GPU resident buffers and fills them with their initial contents.
pub trait GpuUploader {
    fn create_and_upload(&mut self, info: &BufferInfo) -> Result<BufferHandle, GpuError>;
}

/// Records the commands of the current frame.
pub trait CommandList {
    fn set_vertex_buffer(&mut self, buffer: BufferHandle);
    fn set_index_buffer(&mut self, buffer: BufferHandle);
    fn set_constants(&mut self, slot: u32, data: &[u8]);
    fn draw_indexed(&mut self, draw: DrawIndexed);
}

/// Monotonic GPU completion fence.
pub trait FrameFence {
    /// Submit recorded work and return the value the fence reaches once the
    /// GPU has finished it.
    fn signal(&mut self) -> u64;
    fn completed_value(&self) -> u64;
    /// Block until the fence reaches `value`.
    fn wait_for(&mut self, value: u64);
}

pub trait GraphicsContext: GpuUploader + CommandList + FrameFence {
    /// Reset the command recording resources of frame `slot`.
    fn begin_frame(&mut self, slot: usize);
    fn present(&mut self);
}

/// Per-frame constants shared by every terrain draw.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct TerrainConstants {
    pub view_proj: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
    pub planet_scale_ratio: f32,
    pub _padding: [f32; 3],
}

impl TerrainConstants {
    pub fn new(view_proj: Mat4, camera_position: Vec3, planet_scale_ratio: f32) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            camera_position: camera_position.extend(1.0).to_array(),
            planet_scale_ratio,
            _padding: [0.0; 3],
        }
    }
}
