//! # audio-recorder-core
//!
//! Platform-agnostic audio recorder core library.
//!
//! Provides the capture state machine, frame accumulation, 16-bit PCM WAV
//! encoding and numbered file output, and waveform projection for plotting.
//! Device backends implement either the pull-driven `AudioSource` trait or
//! the push-driven `CaptureProvider` trait (wrapped in `PushSource`) and
//! plug into the generic `CaptureSession`.
//!
//! ## Architecture
//!
//! ```text
//! audio-recorder-core (this crate)
//! ├── traits/       ← AudioSource, CaptureProvider, RecorderDelegate
//! ├── models/       ← RecorderError, CaptureState, RecorderConfiguration, Chunk, etc.
//! ├── processing/   ← FrameAccumulator, PcmEncoder, WAV parsing, WaveformProjector
//! ├── session/      ← CaptureSession (state machine + capture worker)
//! └── storage/      ← destination checks, numbered WAV writer, metadata sidecar
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::audio_models::{AudioDevice, AudioLevel, CaptureMode, Chunk, DeviceKind};
pub use models::config::RecorderConfiguration;
pub use models::error::RecorderError;
pub use models::recording_result::{RecordingMetadata, RecordingResult};
pub use models::state::CaptureState;
pub use processing::frame_accumulator::FrameAccumulator;
pub use processing::pcm::PcmEncoder;
pub use processing::waveform::{WaveformProjector, WaveformSeries};
pub use session::capture_session::CaptureSession;
pub use storage::recording_writer::RecordingWriter;
pub use traits::audio_source::AudioSource;
pub use traits::capture_provider::{AudioBufferCallback, CaptureProvider, PushSource, StreamErrorCallback};
pub use traits::recorder_delegate::{RecorderDelegate, RecorderEvent};
