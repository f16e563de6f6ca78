/// Fixed-capacity circular buffer of interleaved samples.
///
/// Capacity and all reads are measured in whole frames so a channel pair
/// is never split. Not synchronized; wrap it in a lock for cross-thread
/// use (see `ChunkBridge`).
///
/// Overflow behavior: drops the oldest frames and counts them.
#[derive(Debug)]
pub struct RingBuffer {
    buffer: Vec<f32>,
    channels: usize,
    write_index: usize,
    read_index: usize,
    available: usize,
    dropped_frames: u64,
}

impl RingBuffer {
    pub fn new(capacity_frames: usize, channels: u16) -> Self {
        let channels = channels.max(1) as usize;
        let capacity = capacity_frames.max(1) * channels;
        Self {
            buffer: vec![0.0; capacity],
            channels,
            write_index: 0,
            read_index: 0,
            available: 0,
            dropped_frames: 0,
        }
    }

    /// Write interleaved samples. A trailing partial frame is ignored.
    ///
    /// If the buffer overflows, the oldest frames are dropped. If `samples`
    /// alone exceeds capacity, only its newest frames are kept.
    pub fn write(&mut self, samples: &[f32]) {
        let whole = samples.len() - samples.len() % self.channels;
        let mut samples = &samples[..whole];
        if samples.is_empty() {
            return;
        }

        let capacity = self.buffer.len();
        if samples.len() > capacity {
            let skipped = samples.len() - capacity;
            self.dropped_frames += (skipped / self.channels) as u64;
            samples = &samples[skipped..];
        }

        let overflow = (self.available + samples.len()).saturating_sub(capacity);
        if overflow > 0 {
            self.read_index = (self.read_index + overflow) % capacity;
            self.available -= overflow;
            self.dropped_frames += (overflow / self.channels) as u64;
        }

        for &sample in samples {
            self.buffer[self.write_index] = sample;
            self.write_index = (self.write_index + 1) % capacity;
        }
        self.available += samples.len();
    }

    /// Remove and return exactly `frames` frames, or `None` if fewer are buffered.
    pub fn read_frames(&mut self, frames: usize) -> Option<Vec<f32>> {
        let count = frames * self.channels;
        if count == 0 || count > self.available {
            return None;
        }
        Some(self.take(count))
    }

    /// Remove and return everything buffered.
    pub fn drain(&mut self) -> Vec<f32> {
        self.take(self.available)
    }

    fn take(&mut self, count: usize) -> Vec<f32> {
        let capacity = self.buffer.len();
        let mut result = Vec::with_capacity(count);
        for i in 0..count {
            result.push(self.buffer[(self.read_index + i) % capacity]);
        }
        self.read_index = (self.read_index + count) % capacity;
        self.available -= count;
        result
    }

    /// Frames currently buffered.
    pub fn frames_available(&self) -> usize {
        self.available / self.channels
    }

    pub fn is_empty(&self) -> bool {
        self.available == 0
    }

    /// Frames discarded because the reader fell behind.
    pub fn dropped_frames(&self) -> u64 {
        self.dropped_frames
    }

    pub fn capacity_frames(&self) -> usize {
        self.buffer.len() / self.channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_write_read() {
        let mut buf = RingBuffer::new(10, 1);
        buf.write(&[1.0, 2.0, 3.0]);

        assert_eq!(buf.frames_available(), 3);
        assert_eq!(buf.read_frames(3), Some(vec![1.0, 2.0, 3.0]));
        assert!(buf.is_empty());
    }

    #[test]
    fn read_requires_full_request() {
        let mut buf = RingBuffer::new(10, 1);
        buf.write(&[1.0, 2.0]);

        assert_eq!(buf.read_frames(3), None);
        assert_eq!(buf.frames_available(), 2);
        assert_eq!(buf.drain(), vec![1.0, 2.0]);
    }

    #[test]
    fn stereo_reads_whole_frames() {
        let mut buf = RingBuffer::new(4, 2);
        buf.write(&[1.0, -1.0, 2.0, -2.0, 3.0]);

        // trailing half frame is ignored
        assert_eq!(buf.frames_available(), 2);
        assert_eq!(buf.read_frames(1), Some(vec![1.0, -1.0]));
        assert_eq!(buf.read_frames(1), Some(vec![2.0, -2.0]));
    }

    #[test]
    fn overflow_drops_oldest_frames() {
        let mut buf = RingBuffer::new(2, 2);
        buf.write(&[1.0, 1.0, 2.0, 2.0]);
        buf.write(&[3.0, 3.0]);

        assert_eq!(buf.dropped_frames(), 1);
        assert_eq!(buf.read_frames(2), Some(vec![2.0, 2.0, 3.0, 3.0]));
    }

    #[test]
    fn write_larger_than_capacity_keeps_newest() {
        let mut buf = RingBuffer::new(3, 1);
        buf.write(&[1.0, 2.0, 3.0, 4.0, 5.0]);

        assert_eq!(buf.dropped_frames(), 2);
        assert_eq!(buf.read_frames(3), Some(vec![3.0, 4.0, 5.0]));
    }

    #[test]
    fn wraparound() {
        let mut buf = RingBuffer::new(4, 1);

        buf.write(&[1.0, 2.0, 3.0]);
        buf.read_frames(2);
        buf.write(&[4.0, 5.0, 6.0]);

        assert_eq!(buf.frames_available(), 4);
        assert_eq!(buf.read_frames(4), Some(vec![3.0, 4.0, 5.0, 6.0]));
    }

    #[test]
    fn capacity_is_in_frames() {
        assert_eq!(RingBuffer::new(4, 2).capacity_frames(), 4);
        assert_eq!(RingBuffer::new(0, 1).capacity_frames(), 1);
    }
}
