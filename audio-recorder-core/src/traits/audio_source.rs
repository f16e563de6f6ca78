use std::time::Duration;

use crate::models::audio_models::{AudioDevice, CaptureMode, Chunk};
use crate::models::error::RecorderError;

/// Pull-driven capture device.
///
/// The capture worker owns the source for the length of a session:
/// `open` once, `read_chunk` repeatedly, `close` on every exit path.
/// Push-driven backends plug in through
/// [`PushSource`](crate::traits::capture_provider::PushSource).
pub trait AudioSource: Send {
    /// Whether a device for `mode` is currently enumerated.
    fn is_available(&self, mode: CaptureMode) -> bool;

    /// The device `open` would use for `mode`.
    fn device_info(&self, mode: CaptureMode) -> Option<AudioDevice>;

    /// Acquire the first enumerated device for `mode`.
    ///
    /// Chunks produced afterwards are at `sample_rate` with
    /// `mode.channels()` channels.
    fn open(&mut self, sample_rate: u32, mode: CaptureMode) -> Result<(), RecorderError>;

    /// Block for up to about `duration` and return that much audio.
    ///
    /// `Ok(None)` means the device delivered nothing in time (loopback
    /// endpoints go quiet when nothing is playing); callers just retry.
    fn read_chunk(&mut self, duration: Duration) -> Result<Option<Chunk>, RecorderError>;

    /// Audio captured since the last full chunk, if any. Called once after
    /// a normal stop, before `close`.
    fn take_remaining(&mut self) -> Option<Chunk> {
        None
    }

    /// Release the device. Must be safe to call when not open.
    fn close(&mut self);
}

impl<S: AudioSource + ?Sized> AudioSource for Box<S> {
    fn is_available(&self, mode: CaptureMode) -> bool {
        (**self).is_available(mode)
    }

    fn device_info(&self, mode: CaptureMode) -> Option<AudioDevice> {
        (**self).device_info(mode)
    }

    fn open(&mut self, sample_rate: u32, mode: CaptureMode) -> Result<(), RecorderError> {
        (**self).open(sample_rate, mode)
    }

    fn read_chunk(&mut self, duration: Duration) -> Result<Option<Chunk>, RecorderError> {
        (**self).read_chunk(duration)
    }

    fn take_remaining(&mut self) -> Option<Chunk> {
        (**self).take_remaining()
    }

    fn close(&mut self) {
        (**self).close()
    }
}

/// Closes the wrapped source when dropped, including on `?` and panics.
pub struct OpenSource<'a, S: AudioSource + ?Sized> {
    source: &'a mut S,
}

impl<'a, S: AudioSource + ?Sized> OpenSource<'a, S> {
    /// Open `source`; if opening fails it is still closed before returning.
    pub fn open(source: &'a mut S, sample_rate: u32, mode: CaptureMode) -> Result<Self, RecorderError> {
        let mut guard = Self { source };
        guard.source.open(sample_rate, mode)?;
        Ok(guard)
    }

    pub fn read_chunk(&mut self, duration: Duration) -> Result<Option<Chunk>, RecorderError> {
        self.source.read_chunk(duration)
    }

    pub fn take_remaining(&mut self) -> Option<Chunk> {
        self.source.take_remaining()
    }
}

impl<S: AudioSource + ?Sized> Drop for OpenSource<'_, S> {
    fn drop(&mut self) {
        self.source.close();
    }
}
