//! Auto-growing GPU buffer for per-frame vertex data

/// Initial buffer size (64KB)
const INITIAL_BUFFER_SIZE: u64 = 64 * 1024;

/// Growth factor when buffer needs to expand (2x)
const BUFFER_GROWTH_FACTOR: u64 = 2;

/// Vertex buffer rewritten every frame.
///
/// Doubles its capacity whenever a frame needs more room and never shrinks.
pub struct GrowableBuffer {
    buffer: wgpu::Buffer,
    usage: wgpu::BufferUsages,
    /// Current capacity in bytes
    capacity: u64,
    /// Bytes written this frame
    used: u64,
    label: String,
}

impl GrowableBuffer {
    pub fn new(device: &wgpu::Device, usage: wgpu::BufferUsages, label: &str) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: INITIAL_BUFFER_SIZE,
            usage: usage | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            buffer,
            usage,
            capacity: INITIAL_BUFFER_SIZE,
            used: 0,
            label: label.to_string(),
        }
    }

    /// Make room for `additional_bytes` past the current end.
    ///
    /// Growing replaces the buffer, so previous contents are lost; call this
    /// before writing the frame's data. Returns true if the buffer grew.
    pub fn ensure_capacity(&mut self, device: &wgpu::Device, additional_bytes: u64) -> bool {
        let required = self.used + additional_bytes;
        if required <= self.capacity {
            return false;
        }

        let mut new_capacity = self.capacity * BUFFER_GROWTH_FACTOR;
        while new_capacity < required {
            new_capacity *= BUFFER_GROWTH_FACTOR;
        }

        tracing::debug!(
            "Growing buffer '{}': {} -> {} bytes",
            self.label,
            self.capacity,
            new_capacity
        );

        self.buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&self.label),
            size: new_capacity,
            usage: self.usage | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        self.capacity = new_capacity;
        self.used = 0;

        true
    }

    /// Append `data`, returning its byte offset.
    ///
    /// Panics if there is not enough capacity (call `ensure_capacity` first).
    pub fn write(&mut self, queue: &wgpu::Queue, data: &[u8]) -> u64 {
        let offset = self.used;
        assert!(
            offset + data.len() as u64 <= self.capacity,
            "Buffer overflow: {} + {} > {}",
            offset,
            data.len(),
            self.capacity
        );

        if !data.is_empty() {
            queue.write_buffer(&self.buffer, offset, data);
        }
        self.used += data.len() as u64;

        offset
    }

    pub fn reset(&mut self) {
        self.used = 0;
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn used(&self) -> u64 {
        self.used
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }
}
