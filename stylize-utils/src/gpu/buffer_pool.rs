use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::gpu::GpuContext;

#[derive(Debug, Error)]
pub enum BufferPoolError {
    #[error(
        "GPU memory limit exceeded (allocation size: {size}, current usage: {usage}, limit: {limit})"
    )]
    MemoryLimitExceeded { size: u64, usage: u64, limit: u64 },
    #[error("Failed to create GPU buffer: {0}")]
    AllocationFailed(String),
}

struct BufferEntry {
    buffer: wgpu::Buffer,
    size: u64,
}

/// Best-fit pool for `wgpu::Buffer` allocations organized by usage flags.
/// Buffers are grouped by usage so acquire never scans incompatible entries.
pub struct GpuBufferPool {
    context: Arc<GpuContext>,
    idle: Mutex<HashMap<wgpu::BufferUsages, Vec<BufferEntry>>>,
    allocated_bytes: AtomicU64,
    max_memory: Option<u64>,
}

impl GpuBufferPool {
    pub fn new(context: Arc<GpuContext>, max_memory: Option<u64>) -> Self {
        Self {
            context,
            idle: Mutex::new(HashMap::new()),
            allocated_bytes: AtomicU64::new(0),
            max_memory,
        }
    }

    /// Reuse the smallest idle buffer that fits, or allocate a fresh one.
    pub fn acquire(
        &self,
        size: u64,
        usage: wgpu::BufferUsages,
        label: Option<&str>,
    ) -> Result<wgpu::Buffer, BufferPoolError> {
        if let Some(entry) = self.take_best_fit(size, usage) {
            return Ok(entry.buffer);
        }

        if let Some(limit) = self.max_memory {
            let current = self.memory_usage();
            if current + size > limit {
                // Drop idle buffers before giving up.
                self.clear();
                let current = self.memory_usage();
                if current + size > limit {
                    return Err(BufferPoolError::MemoryLimitExceeded {
                        size,
                        usage: current,
                        limit,
                    });
                }
            }
        }

        let buffer = self
            .context
            .device()
            .create_buffer(&wgpu::BufferDescriptor {
                label,
                size,
                usage,
                mapped_at_creation: false,
            });

        self.allocated_bytes.fetch_add(size, Ordering::Relaxed);
        Ok(buffer)
    }

    /// Return a buffer to the pool for later reuse.
    pub fn recycle(&self, buffer: wgpu::Buffer, size: u64, usage: wgpu::BufferUsages) {
        let mut idle = match self.idle.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        idle.entry(usage)
            .or_default()
            .push(BufferEntry { buffer, size });
    }

    pub fn available(&self) -> usize {
        let idle = match self.idle.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        idle.values().map(|v| v.len()).sum()
    }

    /// Total size in bytes of all buffers allocated through this pool that
    /// have not been freed via [`clear`](Self::clear). Buffers dropped by the
    /// caller instead of recycled are not observable and keep counting.
    pub fn memory_usage(&self) -> u64 {
        self.allocated_bytes.load(Ordering::Relaxed)
    }

    /// Drops every idle buffer, releasing its GPU memory.
    pub fn clear(&self) {
        let mut idle = match self.idle.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let freed: u64 = idle
            .values()
            .flat_map(|entries| entries.iter().map(|entry| entry.size))
            .sum();
        idle.clear();

        self.allocated_bytes.fetch_sub(freed, Ordering::Relaxed);
    }

    fn take_best_fit(&self, size: u64, usage: wgpu::BufferUsages) -> Option<BufferEntry> {
        let mut idle = match self.idle.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let buffers = idle.get_mut(&usage)?;

        let mut best_index = None;
        let mut best_size = u64::MAX;
        for (index, entry) in buffers.iter().enumerate() {
            if entry.size < size {
                continue;
            }
            if entry.size < best_size {
                best_size = entry.size;
                best_index = Some(index);
                if entry.size == size {
                    break;
                }
            }
        }

        best_index.map(|index| buffers.swap_remove(index))
    }
}

impl fmt::Debug for GpuBufferPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpuBufferPool")
            .field("idle_buffers", &self.available())
            .field("memory_usage", &self.memory_usage())
            .field("max_memory", &self.max_memory)
            .finish()
    }
}
