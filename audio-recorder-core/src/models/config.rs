use std::path::PathBuf;
use std::time::Duration;

use super::audio_models::CaptureMode;

/// Longest chunk a session may request. Push-driven sources buffer a few
/// seconds between the device and the worker, and a chunk must fit in that
/// buffer with room to spare.
pub const MAX_CHUNK_DURATION: Duration = Duration::from_secs(2);

/// Configuration for a recording session.
#[derive(Debug, Clone)]
pub struct RecorderConfiguration {
    /// Which device to record from; also fixes the output channel count.
    pub capture_mode: CaptureMode,

    /// Sample rate in Hz (default: 44100).
    pub sample_rate: u32,

    /// Duration of one captured chunk (default: 100 ms).
    pub chunk_duration: Duration,

    /// Directory where recording files are written.
    pub output_directory: PathBuf,

    /// Create the output directory on `start` if it does not exist.
    pub create_output_directory: bool,

    /// Upper bound on how long `stop` waits for the capture worker to exit.
    pub stop_timeout: Duration,

    /// Write a `<name>.metadata.json` sidecar next to each recording.
    pub write_metadata: bool,
}

impl RecorderConfiguration {
    pub fn new(capture_mode: CaptureMode, output_directory: impl Into<PathBuf>) -> Self {
        Self {
            capture_mode,
            output_directory: output_directory.into(),
            ..Default::default()
        }
    }

    pub fn channels(&self) -> u16 {
        self.capture_mode.channels()
    }

    /// Frames in one chunk at the configured rate.
    pub fn frames_per_chunk(&self) -> usize {
        (self.sample_rate as f64 * self.chunk_duration.as_secs_f64()).round() as usize
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.sample_rate == 0 {
            return Err("sample rate must be positive".into());
        }
        if self.frames_per_chunk() == 0 {
            return Err(format!(
                "chunk duration {:?} holds no frames at {} Hz",
                self.chunk_duration, self.sample_rate
            ));
        }
        if self.chunk_duration > MAX_CHUNK_DURATION {
            return Err(format!(
                "chunk duration {:?} exceeds the {:?} limit",
                self.chunk_duration, MAX_CHUNK_DURATION
            ));
        }
        if self.stop_timeout.is_zero() {
            return Err("stop timeout must be positive".into());
        }
        Ok(())
    }
}

impl Default for RecorderConfiguration {
    fn default() -> Self {
        Self {
            capture_mode: CaptureMode::Microphone,
            sample_rate: 44100,
            chunk_duration: Duration::from_millis(100),
            output_directory: PathBuf::from("."),
            create_output_directory: true,
            stop_timeout: Duration::from_secs(2),
            write_metadata: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_recorder_format() {
        let config = RecorderConfiguration::default();
        assert_eq!(config.sample_rate, 44100);
        assert_eq!(config.frames_per_chunk(), 4410);
        assert_eq!(config.channels(), 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn loopback_is_stereo() {
        let config = RecorderConfiguration::new(CaptureMode::Loopback, "/tmp");
        assert_eq!(config.channels(), 2);
    }

    #[test]
    fn rejects_zero_length_chunks() {
        let config = RecorderConfiguration {
            chunk_duration: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_chunks_longer_than_the_limit() {
        let config = RecorderConfiguration {
            chunk_duration: Duration::from_secs(6),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.contains("exceeds"));

        let longest = RecorderConfiguration {
            chunk_duration: MAX_CHUNK_DURATION,
            ..Default::default()
        };
        assert!(longest.validate().is_ok());
    }
}
