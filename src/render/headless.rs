//! A [`GraphicsContext`] that keeps buffers in host memory and records draw
//! calls instead of submitting them. Used by the bench binary when no device is
//! attached and by the tests.

use std::collections::VecDeque;

use tracing::{debug, warn};

use super::{
    BufferHandle, BufferInfo, BufferUsage, CommandList, DrawIndexed, FrameFence, GpuError,
    GpuUploader, GraphicsContext,
};

pub struct HeadlessBuffer {
    pub name: String,
    pub usage: BufferUsage,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordedFrame {
    pub slot: usize,
    pub draws: Vec<DrawIndexed>,
    pub constants: Vec<(u32, Vec<u8>)>,
    /// Draws whose index range ran past the bound index buffer.
    pub out_of_range_draws: u32,
}

pub struct HeadlessContext {
    buffers: Vec<HeadlessBuffer>,
    memory_budget: Option<usize>,
    allocated: usize,
    vertex_buffer: Option<BufferHandle>,
    index_buffer: Option<BufferHandle>,
    current: RecordedFrame,
    last_presented: Option<RecordedFrame>,
    frames_presented: u64,
    /// Frames the simulated GPU trails behind submission.
    latency: usize,
    in_flight: VecDeque<u64>,
    next_fence: u64,
    completed_fence: u64,
    fence_waits: u64,
}

impl Default for HeadlessContext {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessContext {
    pub fn new() -> Self {
        Self {
            buffers: Vec::new(),
            memory_budget: None,
            allocated: 0,
            vertex_buffer: None,
            index_buffer: None,
            current: RecordedFrame::default(),
            last_presented: None,
            frames_presented: 0,
            latency: 1,
            in_flight: VecDeque::new(),
            next_fence: 0,
            completed_fence: 0,
            fence_waits: 0,
        }
    }

    /// Fail uploads once `bytes` have been allocated.
    pub fn with_memory_budget(mut self, bytes: usize) -> Self {
        self.memory_budget = Some(bytes);
        self
    }

    /// Keep up to `frames` submissions unfinished after each present.
    pub fn with_latency(mut self, frames: usize) -> Self {
        self.latency = frames;
        self
    }

    pub fn buffer(&self, handle: BufferHandle) -> Option<&HeadlessBuffer> {
        self.buffers.get(handle.id() as usize)
    }

    pub fn buffers(&self) -> &[HeadlessBuffer] {
        &self.buffers
    }

    pub fn allocated_bytes(&self) -> usize {
        self.allocated
    }

    pub fn last_frame(&self) -> Option<&RecordedFrame> {
        self.last_presented.as_ref()
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    pub fn fence_waits(&self) -> u64 {
        self.fence_waits
    }

    fn index_count(&self, handle: BufferHandle) -> Option<u32> {
        self.buffer(handle)
            .filter(|b| b.usage == BufferUsage::Index)
            .map(|b| (b.bytes.len() / std::mem::size_of::<u32>()) as u32)
    }
}

impl GpuUploader for HeadlessContext {
    fn create_and_upload(&mut self, info: &BufferInfo) -> Result<BufferHandle, GpuError> {
        if info.initial_data.is_empty() {
            return Err(GpuError::EmptyUpload {
                name: info.debug_name.to_string(),
            });
        }
        if let Some(budget) = self.memory_budget {
            let available = budget.saturating_sub(self.allocated);
            if info.initial_data.len() > available {
                return Err(GpuError::OutOfMemory {
                    name: info.debug_name.to_string(),
                    requested: info.initial_data.len(),
                    available,
                });
            }
        }

        let handle = BufferHandle::new(self.buffers.len() as u32);
        self.allocated += info.initial_data.len();
        self.buffers.push(HeadlessBuffer {
            name: info.debug_name.to_string(),
            usage: info.usage,
            bytes: info.initial_data.to_vec(),
        });
        debug!(
            "created buffer {} ({} bytes, {:?})",
            info.debug_name,
            info.initial_data.len(),
            info.usage
        );
        Ok(handle)
    }
}

impl CommandList for HeadlessContext {
    fn set_vertex_buffer(&mut self, buffer: BufferHandle) {
        self.vertex_buffer = Some(buffer);
    }

    fn set_index_buffer(&mut self, buffer: BufferHandle) {
        self.index_buffer = Some(buffer);
    }

    fn set_constants(&mut self, slot: u32, data: &[u8]) {
        self.current.constants.push((slot, data.to_vec()));
    }

    fn draw_indexed(&mut self, draw: DrawIndexed) {
        let available = self.index_buffer.and_then(|h| self.index_count(h));
        let end = draw.first_index as u64 + draw.index_count as u64;
        if self.vertex_buffer.is_none() || available.map_or(true, |count| end > count as u64) {
            warn!(
                "draw of {} indices from {} is outside the bound index buffer",
                draw.index_count, draw.first_index
            );
            self.current.out_of_range_draws += 1;
        }
        self.current.draws.push(draw);
    }
}

impl FrameFence for HeadlessContext {
    fn signal(&mut self) -> u64 {
        self.next_fence += 1;
        self.in_flight.push_back(self.next_fence);
        self.next_fence
    }

    fn completed_value(&self) -> u64 {
        self.completed_fence
    }

    fn wait_for(&mut self, value: u64) {
        self.fence_waits += 1;
        while let Some(&front) = self.in_flight.front() {
            if front > value {
                break;
            }
            self.completed_fence = front;
            self.in_flight.pop_front();
        }
    }
}

impl GraphicsContext for HeadlessContext {
    fn begin_frame(&mut self, slot: usize) {
        self.current = RecordedFrame {
            slot,
            ..Default::default()
        };
        self.vertex_buffer = None;
        self.index_buffer = None;
    }

    fn present(&mut self) {
        while self.in_flight.len() > self.latency {
            if let Some(done) = self.in_flight.pop_front() {
                self.completed_fence = done;
            }
        }
        self.frames_presented += 1;
        self.last_presented = Some(std::mem::take(&mut self.current));
    }
}
