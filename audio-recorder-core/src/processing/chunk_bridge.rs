use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use super::ring_buffer::RingBuffer;
use crate::models::audio_models::Chunk;
use crate::models::error::RecorderError;

/// Hands buffers pushed by a device callback to a thread that pulls
/// fixed-size chunks.
///
/// The callback side calls [`push`](Self::push) (or [`fail`](Self::fail) on a
/// stream error); the capture worker blocks in [`next_chunk`](Self::next_chunk)
/// until a full chunk is buffered, the wait expires, or an error arrives.
pub struct ChunkBridge {
    channels: u16,
    state: Mutex<BridgeState>,
    ready: Condvar,
}

struct BridgeState {
    ring: RingBuffer,
    error: Option<RecorderError>,
}

impl ChunkBridge {
    pub fn new(channels: u16, capacity_frames: usize) -> Self {
        Self {
            channels,
            state: Mutex::new(BridgeState {
                ring: RingBuffer::new(capacity_frames, channels),
                error: None,
            }),
            ready: Condvar::new(),
        }
    }

    /// Most frames the bridge holds before dropping the oldest.
    pub fn capacity_frames(&self) -> usize {
        self.state.lock().ring.capacity_frames()
    }

    /// Buffer interleaved samples already in the bridge's channel layout.
    pub fn push(&self, samples: &[f32]) {
        let mut state = self.state.lock();
        let dropped_before = state.ring.dropped_frames();
        state.ring.write(samples);
        let dropped = state.ring.dropped_frames() - dropped_before;
        drop(state);

        if dropped > 0 {
            log::warn!("capture reader fell behind, dropped {} frames", dropped);
        }
        self.ready.notify_one();
    }

    /// Record a stream failure; the next `next_chunk` call returns it.
    pub fn fail(&self, error: RecorderError) {
        self.state.lock().error = Some(error);
        self.ready.notify_all();
    }

    /// Wait up to `timeout` for `frames` frames.
    ///
    /// Returns `Ok(None)` if the wait expired first. A pending stream error
    /// takes precedence over buffered data.
    pub fn next_chunk(&self, frames: usize, timeout: Duration) -> Result<Option<Chunk>, RecorderError> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        loop {
            if let Some(error) = state.error.take() {
                return Err(error);
            }
            if let Some(samples) = state.ring.read_frames(frames) {
                return Ok(Some(Chunk::new(self.channels, samples)));
            }
            if self.ready.wait_until(&mut state, deadline).timed_out() {
                if let Some(error) = state.error.take() {
                    return Err(error);
                }
                return Ok(state
                    .ring
                    .read_frames(frames)
                    .map(|samples| Chunk::new(self.channels, samples)));
            }
        }
    }

    /// Everything still buffered as one (possibly short) chunk.
    pub fn drain(&self) -> Option<Chunk> {
        let samples = self.state.lock().ring.drain();
        if samples.is_empty() {
            None
        } else {
            Some(Chunk::new(self.channels, samples))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn returns_chunk_once_enough_frames_arrive() {
        let bridge = Arc::new(ChunkBridge::new(2, 1000));
        let producer = {
            let bridge = Arc::clone(&bridge);
            thread::spawn(move || {
                for _ in 0..4 {
                    bridge.push(&[0.5; 10]);
                    thread::sleep(Duration::from_millis(5));
                }
            })
        };

        let chunk = bridge
            .next_chunk(20, Duration::from_secs(5))
            .unwrap()
            .expect("chunk before timeout");
        producer.join().unwrap();

        assert_eq!(chunk.channels(), 2);
        assert_eq!(chunk.frames(), 20);
        assert!(chunk.samples().iter().all(|&s| s == 0.5));
    }

    #[test]
    fn times_out_without_data() {
        let bridge = ChunkBridge::new(1, 100);
        bridge.push(&[0.1; 5]);

        let result = bridge.next_chunk(10, Duration::from_millis(20)).unwrap();

        assert!(result.is_none());
        assert_eq!(bridge.drain().map(|c| c.frames()), Some(5));
    }

    #[test]
    fn error_wins_over_buffered_data() {
        let bridge = ChunkBridge::new(1, 100);
        bridge.push(&[0.1; 50]);
        bridge.fail(RecorderError::CaptureFailure("device unplugged".into()));

        let err = bridge.next_chunk(10, Duration::from_millis(20)).unwrap_err();
        assert_eq!(err, RecorderError::CaptureFailure("device unplugged".into()));
    }
}
