use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::audio_source::AudioSource;
use crate::models::audio_models::{AudioDevice, CaptureMode, Chunk};
use crate::models::error::RecorderError;
use crate::processing::chunk_bridge::ChunkBridge;
use crate::processing::format_adapter::FormatAdapter;

/// Callback invoked when an audio buffer is available.
///
/// Parameters:
/// - `samples`: Interleaved f32 samples in the device's native layout.
/// - `sample_rate`: The actual sample rate of the delivered audio.
/// - `channels`: Number of interleaved channels.
pub type AudioBufferCallback = Arc<dyn Fn(&[f32], u32, u16) + Send + Sync + 'static>;

/// Callback invoked when the device stream fails mid-capture.
pub type StreamErrorCallback = Arc<dyn Fn(RecorderError) + Send + Sync + 'static>;

/// Push-driven capture device: the backend calls back with each buffer.
pub trait CaptureProvider: Send {
    /// Whether a device for `mode` is currently enumerated.
    fn is_available(&self, mode: CaptureMode) -> bool;

    /// Start capturing from the first device for `mode`.
    ///
    /// `on_buffer` fires on the backend's audio thread; keep work minimal.
    fn start(
        &mut self,
        mode: CaptureMode,
        on_buffer: AudioBufferCallback,
        on_error: StreamErrorCallback,
    ) -> Result<(), RecorderError>;

    /// Stop capturing and release the device. Idempotent.
    fn stop(&mut self) -> Result<(), RecorderError>;

    /// Information about the device `start` would use for `mode`.
    fn device_info(&self, mode: CaptureMode) -> Option<AudioDevice>;
}

/// Seconds of audio buffered between the device callback and the reader.
/// Comfortably more than two of the longest chunk a session may request.
const BRIDGE_CAPACITY_SECS: usize = 5;

/// Adapts a push-driven [`CaptureProvider`] to the pull-driven
/// [`AudioSource`] contract.
///
/// Device buffers are converted to the session format as they arrive and
/// queued in a [`ChunkBridge`]; `read_chunk` takes fixed-size chunks out.
pub struct PushSource<P: CaptureProvider> {
    provider: P,
    bridge: Option<Arc<ChunkBridge>>,
    sample_rate: u32,
    started: bool,
}

impl<P: CaptureProvider> PushSource<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            bridge: None,
            sample_rate: 0,
            started: false,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

impl<P: CaptureProvider> AudioSource for PushSource<P> {
    fn is_available(&self, mode: CaptureMode) -> bool {
        self.provider.is_available(mode)
    }

    fn device_info(&self, mode: CaptureMode) -> Option<AudioDevice> {
        self.provider.device_info(mode)
    }

    fn open(&mut self, sample_rate: u32, mode: CaptureMode) -> Result<(), RecorderError> {
        let channels = mode.channels();
        let bridge = Arc::new(ChunkBridge::new(
            channels,
            sample_rate as usize * BRIDGE_CAPACITY_SECS,
        ));
        let adapter = Mutex::new(FormatAdapter::new(sample_rate, channels));

        let on_buffer: AudioBufferCallback = {
            let bridge = Arc::clone(&bridge);
            Arc::new(move |samples: &[f32], rate: u32, device_channels: u16| {
                let converted = adapter.lock().convert(samples, rate, device_channels);
                bridge.push(&converted);
            })
        };
        let on_error: StreamErrorCallback = {
            let bridge = Arc::clone(&bridge);
            Arc::new(move |error: RecorderError| {
                log::error!("Capture stream error: {}", error);
                bridge.fail(error);
            })
        };

        self.sample_rate = sample_rate;
        self.bridge = Some(bridge);
        self.provider.start(mode, on_buffer, on_error)?;
        self.started = true;
        Ok(())
    }

    fn read_chunk(&mut self, duration: Duration) -> Result<Option<Chunk>, RecorderError> {
        let bridge = self
            .bridge
            .as_ref()
            .ok_or_else(|| RecorderError::CaptureFailure("source is not open".into()))?;
        let frames = (self.sample_rate as f64 * duration.as_secs_f64()).round() as usize;
        if frames > bridge.capacity_frames() {
            return Err(RecorderError::CaptureFailure(format!(
                "a {}-frame chunk does not fit the {}-frame capture buffer",
                frames,
                bridge.capacity_frames()
            )));
        }
        // Devices deliver in real time; allow half a chunk of slack.
        bridge.next_chunk(frames.max(1), duration + duration / 2)
    }

    fn take_remaining(&mut self) -> Option<Chunk> {
        self.bridge.as_ref().and_then(|bridge| bridge.drain())
    }

    fn close(&mut self) {
        if self.started {
            if let Err(e) = self.provider.stop() {
                log::warn!("Failed to stop capture provider: {}", e);
            }
            self.started = false;
        }
        self.bridge = None;
    }
}
