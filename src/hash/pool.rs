use crossbeam::queue::ArrayQueue;
use std::ops::{Deref, DerefMut};

/// Bounded pool of reusable read buffers
///
/// Buffers are checked out with [`BufferPool::checkout`] and handed back when
/// the returned [`PooledBuffer`] is dropped, on every exit path. When the pool
/// is empty a fresh buffer is allocated; when it is full a returned buffer is
/// simply freed, so the pool never holds more than `capacity` buffers.
#[derive(Debug)]
pub struct BufferPool {
    buffers: ArrayQueue<Vec<u8>>,
    buffer_size: usize,
}

impl BufferPool {
    pub fn new(capacity: usize, buffer_size: usize) -> Self {
        Self {
            buffers: ArrayQueue::new(capacity.max(1)),
            buffer_size,
        }
    }

    pub fn checkout(&self) -> PooledBuffer<'_> {
        let buffer = self
            .buffers
            .pop()
            .unwrap_or_else(|| vec![0; self.buffer_size]);

        PooledBuffer {
            buffer: Some(buffer),
            pool: self,
        }
    }

    /// Number of idle buffers currently held by the pool
    pub fn available(&self) -> usize {
        self.buffers.len()
    }

    pub fn capacity(&self) -> usize {
        self.buffers.capacity()
    }

    fn give_back(&self, buffer: Vec<u8>) {
        // Full pool: let the extra buffer drop
        let _ = self.buffers.push(buffer);
    }
}

/// A buffer borrowed from a [`BufferPool`]
pub struct PooledBuffer<'a> {
    buffer: Option<Vec<u8>>,
    pool: &'a BufferPool,
}

impl Deref for PooledBuffer<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.buffer.as_deref().unwrap_or_default()
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.buffer.as_deref_mut().unwrap_or_default()
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        if let Some(buffer) = self.buffer.take() {
            self.pool.give_back(buffer);
        }
    }
}
