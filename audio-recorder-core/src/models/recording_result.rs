use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::audio_models::CaptureMode;
use crate::processing::waveform::WaveformSeries;

/// Result returned when a session stops with a saved recording.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingResult {
    pub file_path: PathBuf,
    pub duration_secs: f64,
    pub chunk_count: usize,
    pub checksum: String,
    pub metadata: RecordingMetadata,
    /// Series for plotting; `None` if reading the file back failed.
    pub waveform: Option<WaveformSeries>,
}

/// Metadata written alongside a recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    pub id: String,
    pub created_at: String,
    pub file_path: String,
    pub capture_mode: CaptureMode,
    pub channels: u16,
    pub sample_rate: u32,
    pub bit_depth: u16,
    pub duration_secs: f64,
    pub chunk_count: usize,
    pub checksum: String,
}

impl RecordingMetadata {
    pub fn new(
        capture_mode: CaptureMode,
        sample_rate: u32,
        file_path: &str,
        duration_secs: f64,
        chunk_count: usize,
        checksum: &str,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            file_path: file_path.to_string(),
            capture_mode,
            channels: capture_mode.channels(),
            sample_rate,
            bit_depth: 16,
            duration_secs,
            chunk_count,
            checksum: checksum.to_string(),
        }
    }
}
