use parking_lot::Mutex;

use crate::models::audio_models::Chunk;

/// Thread-safe, append-only sequence of captured chunks.
///
/// Shared as `Arc<FrameAccumulator>` between the capture worker (the only
/// appender) and the stop path (the only drainer). Insertion order is
/// capture order.
#[derive(Debug, Default)]
pub struct FrameAccumulator {
    inner: Mutex<Accumulated>,
}

#[derive(Debug, Default)]
struct Accumulated {
    chunks: Vec<Chunk>,
    frames: usize,
}

impl FrameAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk at the tail. Takes ownership; the chunk is never copied.
    pub fn append(&self, chunk: Chunk) {
        let mut inner = self.inner.lock();
        inner.frames += chunk.frames();
        inner.chunks.push(chunk);
    }

    /// Take every chunk in capture order and leave the accumulator empty.
    ///
    /// The swap happens under one lock, so an append racing with the drain
    /// lands either entirely before or entirely after it.
    pub fn snapshot_and_clear(&self) -> Vec<Chunk> {
        let mut inner = self.inner.lock();
        inner.frames = 0;
        std::mem::take(&mut inner.chunks)
    }

    /// Discard everything. Called when a new session starts.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.chunks.clear();
        inner.frames = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().chunks.is_empty()
    }

    /// Number of chunks held.
    pub fn len(&self) -> usize {
        self.inner.lock().chunks.len()
    }

    /// Total frames (samples per channel) across all chunks.
    pub fn frame_count(&self) -> usize {
        self.inner.lock().frames
    }
}
