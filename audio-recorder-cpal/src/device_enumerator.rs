//! Audio device enumeration via cpal.
//!
//! Microphone capture uses input devices. Loopback capture uses output
//! devices, which cpal can open as input streams on hosts that support it
//! (WASAPI).

use cpal::traits::{DeviceTrait, HostTrait};

use audio_recorder_core::models::audio_models::{AudioDevice, CaptureMode, DeviceKind};
use audio_recorder_core::models::error::RecorderError;

/// Enumerates devices on one cpal host.
///
/// Holds only the host id and resolves the host per call, so it can be
/// shared freely across threads.
#[derive(Debug, Clone, Copy)]
pub struct DeviceEnumerator {
    host_id: cpal::HostId,
}

impl Default for DeviceEnumerator {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceEnumerator {
    /// Enumerator for the platform's default host.
    pub fn new() -> Self {
        Self {
            host_id: cpal::default_host().id(),
        }
    }

    pub fn host_name(&self) -> &'static str {
        self.host_id.name()
    }

    /// List input (microphone) devices.
    pub fn list_input_devices(&self) -> Result<Vec<AudioDevice>, RecorderError> {
        self.list_devices(CaptureMode::Microphone)
    }

    /// List output devices usable for loopback.
    pub fn list_output_devices(&self) -> Result<Vec<AudioDevice>, RecorderError> {
        self.list_devices(CaptureMode::Loopback)
    }

    pub fn list_devices(&self, mode: CaptureMode) -> Result<Vec<AudioDevice>, RecorderError> {
        let host = self.host()?;
        let default_name = default_device(&host, mode).and_then(|d| d.name().ok());

        let devices = enumerate(&host, mode)?
            .filter_map(|device| device.name().ok())
            .map(|name| AudioDevice {
                is_default: default_name.as_deref() == Some(name.as_str()),
                kind: device_kind(mode),
                name,
            })
            .collect();
        Ok(devices)
    }

    /// The device a session in `mode` records from: the first one enumerated.
    pub fn first_device(&self, mode: CaptureMode) -> Result<cpal::Device, RecorderError> {
        let host = self.host()?;
        enumerate(&host, mode)?.next().ok_or_else(|| {
            RecorderError::DeviceUnavailable(format!(
                "no {} device found on {}",
                kind_label(mode),
                self.host_name()
            ))
        })
    }

    pub fn first_device_info(&self, mode: CaptureMode) -> Option<AudioDevice> {
        self.list_devices(mode).ok()?.into_iter().next()
    }

    fn host(&self) -> Result<cpal::Host, RecorderError> {
        cpal::host_from_id(self.host_id).map_err(|e| {
            RecorderError::DeviceUnavailable(format!("audio host {} unavailable: {}", self.host_id.name(), e))
        })
    }
}

fn enumerate(
    host: &cpal::Host,
    mode: CaptureMode,
) -> Result<Box<dyn Iterator<Item = cpal::Device>>, RecorderError> {
    let devices: Box<dyn Iterator<Item = cpal::Device>> = match mode {
        CaptureMode::Microphone => Box::new(host.input_devices().map_err(enumeration_error)?),
        CaptureMode::Loopback => Box::new(host.output_devices().map_err(enumeration_error)?),
    };
    Ok(devices)
}

fn default_device(host: &cpal::Host, mode: CaptureMode) -> Option<cpal::Device> {
    match mode {
        CaptureMode::Microphone => host.default_input_device(),
        CaptureMode::Loopback => host.default_output_device(),
    }
}

fn enumeration_error(e: cpal::DevicesError) -> RecorderError {
    RecorderError::DeviceUnavailable(format!("failed to enumerate devices: {}", e))
}

pub(crate) fn device_kind(mode: CaptureMode) -> DeviceKind {
    match mode {
        CaptureMode::Microphone => DeviceKind::Input,
        CaptureMode::Loopback => DeviceKind::Output,
    }
}

pub(crate) fn kind_label(mode: CaptureMode) -> &'static str {
    match mode {
        CaptureMode::Microphone => "input",
        CaptureMode::Loopback => "output",
    }
}
