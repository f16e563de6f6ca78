//! cpal capture provider.
//!
//! The cpal `Stream` is not `Send` on every host, so it lives on a dedicated
//! `cpal-stream` thread for its whole life; the provider only holds a
//! command channel and the join handle.

use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig};

use audio_recorder_core::models::audio_models::{AudioDevice, CaptureMode};
use audio_recorder_core::models::error::RecorderError;
use audio_recorder_core::traits::capture_provider::{AudioBufferCallback, CaptureProvider, StreamErrorCallback};

use crate::device_enumerator::DeviceEnumerator;

/// Commands sent to the stream thread.
enum StreamCommand {
    Stop,
}

/// Push-driven capture from the first enumerated cpal device for a mode.
///
/// Buffers are delivered in the device's native rate and channel count as
/// f32; wrap in `PushSource` to get session-format chunks.
pub struct CpalCapture {
    enumerator: DeviceEnumerator,
    command_tx: Option<mpsc::Sender<StreamCommand>>,
    thread_handle: Option<JoinHandle<()>>,
}

impl Default for CpalCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl CpalCapture {
    pub fn new() -> Self {
        Self::with_enumerator(DeviceEnumerator::new())
    }

    pub fn with_enumerator(enumerator: DeviceEnumerator) -> Self {
        Self {
            enumerator,
            command_tx: None,
            thread_handle: None,
        }
    }

    pub fn enumerator(&self) -> &DeviceEnumerator {
        &self.enumerator
    }

    pub fn is_running(&self) -> bool {
        self.thread_handle.is_some()
    }
}

impl CaptureProvider for CpalCapture {
    fn is_available(&self, mode: CaptureMode) -> bool {
        self.enumerator.first_device(mode).is_ok()
    }

    fn start(
        &mut self,
        mode: CaptureMode,
        on_buffer: AudioBufferCallback,
        on_error: StreamErrorCallback,
    ) -> Result<(), RecorderError> {
        if self.is_running() {
            return Err(RecorderError::ConfigurationFailed("cpal capture already running".into()));
        }

        let enumerator = self.enumerator;
        let (command_tx, command_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("cpal-stream".into())
            .spawn(move || {
                let stream = match open_stream(&enumerator, mode, on_buffer, on_error) {
                    Ok(stream) => {
                        let _ = ready_tx.send(Ok(()));
                        stream
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                // Block until stopped or the provider is dropped.
                match command_rx.recv() {
                    Ok(StreamCommand::Stop) => log::debug!("cpal stream stopping"),
                    Err(_) => log::debug!("cpal stream command channel disconnected"),
                }
                drop(stream);
                log::info!("cpal stream closed");
            })
            .map_err(|e| RecorderError::CaptureFailure(format!("failed to spawn stream thread: {}", e)))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                self.command_tx = Some(command_tx);
                self.thread_handle = Some(handle);
                Ok(())
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                let _ = handle.join();
                Err(RecorderError::CaptureFailure(
                    "stream thread exited before opening the device".into(),
                ))
            }
        }
    }

    fn stop(&mut self) -> Result<(), RecorderError> {
        if let Some(tx) = self.command_tx.take() {
            let _ = tx.send(StreamCommand::Stop);
        }
        if let Some(handle) = self.thread_handle.take() {
            handle
                .join()
                .map_err(|_| RecorderError::CaptureFailure("cpal stream thread panicked".into()))?;
        }
        Ok(())
    }

    fn device_info(&self, mode: CaptureMode) -> Option<AudioDevice> {
        self.enumerator.first_device_info(mode)
    }
}

impl Drop for CpalCapture {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// Open the device for `mode` and start streaming into `on_buffer`.
fn open_stream(
    enumerator: &DeviceEnumerator,
    mode: CaptureMode,
    on_buffer: AudioBufferCallback,
    on_error: StreamErrorCallback,
) -> Result<cpal::Stream, RecorderError> {
    let device = enumerator.first_device(mode)?;
    let name = device.name().unwrap_or_else(|_| "<unnamed>".into());

    // Loopback records what the output device is playing, in its output format.
    let supported = match mode {
        CaptureMode::Microphone => device.default_input_config(),
        CaptureMode::Loopback => device.default_output_config(),
    }
    .map_err(|e| RecorderError::DeviceUnavailable(format!("{}: no usable stream config: {}", name, e)))?;

    let sample_format = supported.sample_format();
    let config: StreamConfig = supported.into();
    log::info!(
        "Opening {} ({} Hz, {} ch, {:?})",
        name,
        config.sample_rate.0,
        config.channels,
        sample_format
    );

    let stream = match sample_format {
        SampleFormat::F32 => build_stream::<f32>(&device, &config, on_buffer, on_error),
        SampleFormat::I16 => build_stream::<i16>(&device, &config, on_buffer, on_error),
        SampleFormat::U16 => build_stream::<u16>(&device, &config, on_buffer, on_error),
        other => {
            return Err(RecorderError::DeviceUnavailable(format!(
                "{}: unsupported sample format {:?}",
                name, other
            )))
        }
    }
    .map_err(|e| RecorderError::DeviceUnavailable(format!("{}: failed to build stream: {}", name, e)))?;

    stream
        .play()
        .map_err(|e| RecorderError::CaptureFailure(format!("{}: failed to start stream: {}", name, e)))?;
    Ok(stream)
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    on_buffer: AudioBufferCallback,
    on_error: StreamErrorCallback,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: cpal::SizedSample,
    f32: cpal::FromSample<T>,
{
    let sample_rate = config.sample_rate.0;
    let channels = config.channels;
    device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            let samples = to_f32_samples(data);
            on_buffer(&samples, sample_rate, channels);
        },
        move |err| {
            on_error(RecorderError::CaptureFailure(format!("stream error: {}", err)));
        },
        None,
    )
}

/// Convert device samples to normalized f32.
fn to_f32_samples<T>(data: &[T]) -> Vec<f32>
where
    T: cpal::Sample,
    f32: cpal::FromSample<T>,
{
    data.iter().map(|s| cpal::Sample::from_sample(*s)).collect()
}
