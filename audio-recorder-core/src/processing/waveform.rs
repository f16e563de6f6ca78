use std::fs;
use std::path::Path;

use serde::Serialize;

use super::pcm::decode_i16;
use super::wav_format;
use crate::models::error::RecorderError;

/// Time/amplitude pairs for plotting one channel of a recording.
///
/// `times[i] == i / sample_rate`; both vectors always have the same length.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaveformSeries {
    pub sample_rate: u32,
    pub times: Vec<f64>,
    pub amplitudes: Vec<i16>,
}

impl WaveformSeries {
    pub fn from_samples(amplitudes: Vec<i16>, sample_rate: u32) -> Self {
        let rate = sample_rate as f64;
        let times = (0..amplitudes.len()).map(|i| i as f64 / rate).collect();
        Self {
            sample_rate,
            times,
            amplitudes,
        }
    }

    pub fn len(&self) -> usize {
        self.amplitudes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.amplitudes.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        self.amplitudes.len() as f64 / self.sample_rate as f64
    }

    /// Largest absolute amplitude.
    pub fn peak(&self) -> u16 {
        self.amplitudes
            .iter()
            .map(|a| a.unsigned_abs())
            .max()
            .unwrap_or(0)
    }

    /// Every `k`-th point so that at most `max_points` remain, for renderers
    /// that choke on millions of points. Times are kept, not recomputed.
    pub fn thin(&self, max_points: usize) -> WaveformSeries {
        if max_points == 0 || self.len() <= max_points {
            return self.clone();
        }
        let stride = self.len().div_ceil(max_points);
        WaveformSeries {
            sample_rate: self.sample_rate,
            times: self.times.iter().step_by(stride).copied().collect(),
            amplitudes: self.amplitudes.iter().step_by(stride).copied().collect(),
        }
    }
}

/// Reads a finished recording back into a plottable series.
pub struct WaveformProjector;

impl WaveformProjector {
    /// Read `path` and project it. See [`project_bytes`](Self::project_bytes).
    pub fn project(path: &Path) -> Result<WaveformSeries, RecorderError> {
        let bytes = fs::read(path).map_err(|e| {
            RecorderError::StorageError(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::project_bytes(&bytes)
    }

    /// Decode a 16-bit PCM WAV buffer to a single-channel series.
    ///
    /// Stereo input keeps the left channel only (every other sample from
    /// offset 0); the right channel is dropped, not averaged. Wider layouts
    /// likewise keep their first channel.
    pub fn project_bytes(bytes: &[u8]) -> Result<WaveformSeries, RecorderError> {
        let view = wav_format::parse_wav(bytes)?;
        let spec = view.spec;

        if spec.bits_per_sample != 16 {
            return Err(RecorderError::CorruptContainer(format!(
                "expected 16-bit samples, found {}-bit",
                spec.bits_per_sample
            )));
        }
        if spec.channels == 0 || spec.sample_rate == 0 {
            return Err(RecorderError::CorruptContainer(format!(
                "invalid format: {} channels at {} Hz",
                spec.channels, spec.sample_rate
            )));
        }
        let frame_size = spec.frame_bytes();
        if view.payload.len() % frame_size != 0 {
            return Err(RecorderError::CorruptContainer(format!(
                "payload of {} bytes is not a multiple of the {}-byte frame",
                view.payload.len(),
                frame_size
            )));
        }

        let samples = decode_i16(view.payload);
        let amplitudes = if spec.channels > 1 {
            samples.into_iter().step_by(spec.channels as usize).collect()
        } else {
            samples
        };

        Ok(WaveformSeries::from_samples(amplitudes, spec.sample_rate))
    }
}
