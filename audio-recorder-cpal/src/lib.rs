//! # audio-recorder-cpal
//!
//! cpal device backend for audio-recorder.
//!
//! Provides:
//! - `CpalCapture`: push-driven capture from the first input device
//!   (microphone) or the first output device opened for loopback
//! - `DeviceEnumerator`: input/output device listing on the default host
//!
//! ## Platform Requirements
//! - Loopback needs a host that can open output devices as input streams
//!   (WASAPI); elsewhere loopback fails with `DeviceUnavailable`
//! - Linux builds link ALSA (`libasound2-dev`)
//!
//! ## Usage
//! ```ignore
//! use audio_recorder_core::{CaptureMode, CaptureSession, RecorderConfiguration};
//! use audio_recorder_cpal::cpal_source;
//!
//! let config = RecorderConfiguration::new(CaptureMode::Microphone, "/tmp/recordings");
//! let mut session = CaptureSession::new(cpal_source(), config);
//! session.start()?;
//! ```

pub mod cpal_capture;
pub mod device_enumerator;

pub use cpal_capture::CpalCapture;
pub use device_enumerator::DeviceEnumerator;

use audio_recorder_core::PushSource;

/// cpal capture adapted to the pull-driven `AudioSource` contract.
pub type CpalSource = PushSource<CpalCapture>;

/// A source on the default host's devices.
pub fn cpal_source() -> CpalSource {
    PushSource::new(CpalCapture::new())
}
