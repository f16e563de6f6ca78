use serde::{Deserialize, Serialize};

/// Which device a session records from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    /// First enumerated input device, recorded mono.
    Microphone,
    /// First enumerated output device captured via loopback, recorded stereo.
    Loopback,
}

impl CaptureMode {
    /// Channel count written to the output file.
    pub fn channels(&self) -> u16 {
        match self {
            Self::Microphone => 1,
            Self::Loopback => 2,
        }
    }

    /// File name prefix distinguishing microphone and system recordings.
    pub fn file_prefix(&self) -> &'static str {
        match self {
            Self::Microphone => "recording",
            Self::Loopback => "system_audio",
        }
    }
}

/// One captured block of interleaved, normalized samples.
///
/// `samples.len()` is `channels × frames`. Values are nominally in
/// `[-1.0, 1.0]`; the encoder clamps anything outside.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    channels: u16,
    samples: Vec<f32>,
}

impl Chunk {
    pub fn new(channels: u16, samples: Vec<f32>) -> Self {
        Self { channels, samples }
    }

    /// A chunk of `frames` frames all holding `value`.
    pub fn filled(channels: u16, frames: usize, value: f32) -> Self {
        Self::new(channels, vec![value; frames * channels as usize])
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    /// Whether the sample count divides evenly into frames.
    pub fn is_well_formed(&self) -> bool {
        self.channels > 0 && self.samples.len() % self.channels as usize == 0
    }

    /// Level metering for this chunk.
    pub fn level(&self) -> AudioLevel {
        AudioLevel::measure(&self.samples)
    }
}

/// Per-chunk level for volume display.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct AudioLevel {
    /// Mean absolute sample value (0.0–1.0 for normalized audio).
    pub mean_abs: f32,
    /// `mean_abs × 100`, capped at 100, for a percentage volume bar.
    pub display: f32,
    /// Peak absolute sample value.
    pub peak: f32,
}

impl AudioLevel {
    pub fn measure(samples: &[f32]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        let sum: f32 = samples.iter().map(|s| s.abs()).sum();
        let mean_abs = sum / samples.len() as f32;
        let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);
        Self {
            mean_abs,
            display: (mean_abs * 100.0).min(100.0),
            peak,
        }
    }
}

/// Kind of endpoint a device represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Input,
    Output,
}

/// An audio device available for capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioDevice {
    pub name: String,
    pub kind: DeviceKind,
    pub is_default: bool,
}
