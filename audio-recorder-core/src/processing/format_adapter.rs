/// Converts device buffers to the session's sample rate and channel layout.
///
/// Devices deliver whatever their mix format is (commonly 48 kHz stereo);
/// sessions record at a fixed rate with one channel for microphones and two
/// for loopback. Channel conversion happens first, then linear-interpolation
/// resampling that carries its phase and the previous frame across calls so
/// buffer boundaries do not click.
#[derive(Debug, Clone)]
pub struct FormatAdapter {
    target_rate: u32,
    target_channels: u16,
    /// Source position of the next output frame, relative to the start of the
    /// next input buffer. `-1.0` addresses `last_frame`.
    position: f64,
    last_frame: Option<Vec<f32>>,
}

impl FormatAdapter {
    pub fn new(target_rate: u32, target_channels: u16) -> Self {
        Self {
            target_rate,
            target_channels: target_channels.max(1),
            position: 0.0,
            last_frame: None,
        }
    }

    /// Convert one interleaved buffer.
    pub fn convert(&mut self, samples: &[f32], source_rate: u32, source_channels: u16) -> Vec<f32> {
        let remapped = remap_channels(samples, source_channels as usize, self.target_channels as usize);
        self.resample(&remapped, source_rate)
    }

    fn resample(&mut self, samples: &[f32], source_rate: u32) -> Vec<f32> {
        if source_rate == self.target_rate || source_rate == 0 {
            return samples.to_vec();
        }

        let channels = self.target_channels as usize;
        let frame_count = samples.len() / channels;
        if frame_count == 0 {
            return Vec::new();
        }

        let step = source_rate as f64 / self.target_rate as f64;
        let last = self.last_frame.take();
        let frame_at = |index: isize, ch: usize| -> f32 {
            if index < 0 {
                last.as_ref().map(|f| f[ch]).unwrap_or(samples[ch])
            } else {
                samples[index as usize * channels + ch]
            }
        };

        let estimated = ((frame_count as f64) / step).ceil() as usize + 1;
        let mut output = Vec::with_capacity(estimated * channels);
        let limit = (frame_count - 1) as f64;
        while self.position < limit {
            let index = self.position.floor();
            let fraction = (self.position - index) as f32;
            let index = index as isize;
            for ch in 0..channels {
                let a = frame_at(index, ch);
                let b = frame_at(index + 1, ch);
                output.push(a * (1.0 - fraction) + b * fraction);
            }
            self.position += step;
        }

        self.position -= frame_count as f64;
        let tail = (frame_count - 1) * channels;
        self.last_frame = Some(samples[tail..tail + channels].to_vec());
        output
    }
}

/// Convert interleaved audio between channel counts.
///
/// Many → mono averages each frame; mono → many duplicates; otherwise the
/// leading channels are kept and missing ones are silent.
pub fn remap_channels(samples: &[f32], from: usize, to: usize) -> Vec<f32> {
    if from == 0 || to == 0 {
        return Vec::new();
    }
    if from == to {
        return samples.to_vec();
    }

    let frame_count = samples.len() / from;
    let mut output = Vec::with_capacity(frame_count * to);
    for frame in samples.chunks_exact(from) {
        if to == 1 {
            let sum: f32 = frame.iter().sum();
            output.push(sum / from as f32);
        } else if from == 1 {
            output.extend(std::iter::repeat(frame[0]).take(to));
        } else {
            for ch in 0..to {
                output.push(frame.get(ch).copied().unwrap_or(0.0));
            }
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn downmix_stereo_to_mono() {
        let mono = remap_channels(&[0.2, 0.8, 0.4, 0.6], 2, 1);
        assert_eq!(mono.len(), 2);
        assert_relative_eq!(mono[0], 0.5, epsilon = 1e-6);
        assert_relative_eq!(mono[1], 0.5, epsilon = 1e-6);
    }

    #[test]
    fn mono_to_stereo_duplicates() {
        assert_eq!(remap_channels(&[0.1, 0.2], 1, 2), vec![0.1, 0.1, 0.2, 0.2]);
    }

    #[test]
    fn surround_to_stereo_keeps_front_pair() {
        let frame = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6];
        assert_eq!(remap_channels(&frame, 6, 2), vec![0.1, 0.2]);
    }

    #[test]
    fn same_format_is_passthrough() {
        let mut adapter = FormatAdapter::new(44100, 2);
        let samples = vec![0.1, 0.2, 0.3, 0.4];
        assert_eq!(adapter.convert(&samples, 44100, 2), samples);
    }

    #[test]
    fn downsample_48k_to_44k1_frame_count() {
        let mut adapter = FormatAdapter::new(44100, 1);
        let one_second = vec![0.25f32; 48000];

        let mut total = 0;
        for buffer in one_second.chunks(480) {
            total += adapter.convert(buffer, 48000, 1).len();
        }

        // Within one frame of the exact ratio across buffer boundaries.
        assert!((total as i64 - 44100).abs() <= 1, "got {}", total);
    }

    #[test]
    fn constant_signal_stays_constant_across_buffers() {
        let mut adapter = FormatAdapter::new(44100, 2);
        for _ in 0..10 {
            let out = adapter.convert(&[0.5f32; 960], 48000, 2);
            assert!(out.iter().all(|&s| (s - 0.5).abs() < 1e-6));
        }
    }

    #[test]
    fn ramp_is_continuous_at_boundaries() {
        let mut adapter = FormatAdapter::new(24000, 1);
        let ramp: Vec<f32> = (0..200).map(|i| i as f32).collect();

        let mut out = Vec::new();
        for buffer in ramp.chunks(30) {
            out.extend(adapter.convert(buffer, 48000, 1));
        }

        // 2:1 decimation of a ramp: every output is the even input index.
        for (i, value) in out.iter().enumerate() {
            assert_relative_eq!(*value, (i * 2) as f32, epsilon = 1e-3);
        }
    }

    #[test]
    fn upsample_interpolates() {
        let mut adapter = FormatAdapter::new(48000, 1);
        let out = adapter.convert(&[0.0, 1.0, 0.0], 24000, 1);

        assert_relative_eq!(out[0], 0.0);
        assert_relative_eq!(out[1], 0.5);
        assert_relative_eq!(out[2], 1.0);
        assert_relative_eq!(out[3], 0.5);
    }
}
