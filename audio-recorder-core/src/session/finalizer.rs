use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread::JoinHandle;

use super::shared::SessionShared;
use super::worker::CaptureStats;
use crate::models::audio_models::Chunk;
use crate::models::config::RecorderConfiguration;
use crate::models::error::RecorderError;
use crate::models::recording_result::{RecordingMetadata, RecordingResult};
use crate::models::state::CaptureState;
use crate::processing::frame_accumulator::FrameAccumulator;
use crate::processing::pcm::PcmEncoder;
use crate::processing::waveform::WaveformProjector;
use crate::storage::metadata::write_metadata;
use crate::storage::recording_writer::RecordingWriter;

/// A capture thread plus the channel it reports its outcome on.
pub(crate) struct PendingWorker {
    pub(crate) done: Receiver<Result<CaptureStats, RecorderError>>,
    pub(crate) thread: JoinHandle<()>,
}

/// Second half of `stop`: runs with the session already in `Stopping` and
/// always leaves it `Idle`.
pub(crate) struct Finalizer {
    config: RecorderConfiguration,
    shared: Arc<SessionShared>,
    accumulator: Arc<FrameAccumulator>,
    worker: Option<PendingWorker>,
}

impl Finalizer {
    pub(crate) fn new(
        config: RecorderConfiguration,
        shared: Arc<SessionShared>,
        accumulator: Arc<FrameAccumulator>,
        worker: Option<PendingWorker>,
    ) -> Self {
        Self {
            config,
            shared,
            accumulator,
            worker,
        }
    }

    pub(crate) fn run(mut self) -> Result<RecordingResult, RecorderError> {
        let outcome = self.wait_for_worker().and_then(|()| self.save());
        match &outcome {
            Ok(result) => {
                log::info!(
                    "Saved {} ({:.2}s, {} chunks)",
                    result.file_path.display(),
                    result.duration_secs,
                    result.chunk_count
                );
                self.shared.report_finished(result);
            }
            Err(e) => {
                log::warn!("Recording not saved: {}", e);
                self.shared.report_error(e);
            }
        }
        self.shared.reset_level();
        self.shared.set_state(CaptureState::Idle);
        outcome
    }

    /// Bounded join. A worker stuck in a device read past the timeout is
    /// detached; its gate is already stopped and its accumulator is ours.
    fn wait_for_worker(&mut self) -> Result<(), RecorderError> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };
        match worker.done.recv_timeout(self.config.stop_timeout) {
            Ok(Ok(stats)) => {
                let _ = worker.thread.join();
                log::debug!(
                    "Capture worker joined: {} read, {} kept",
                    stats.chunks_read,
                    stats.chunks_kept
                );
                Ok(())
            }
            Ok(Err(e)) => {
                let _ = worker.thread.join();
                Err(e)
            }
            Err(RecvTimeoutError::Timeout) => {
                log::warn!(
                    "Capture worker did not exit within {:?}; detaching it",
                    self.config.stop_timeout
                );
                Ok(())
            }
            Err(RecvTimeoutError::Disconnected) => {
                self.accumulator.clear();
                Err(RecorderError::CaptureFailure(
                    "capture worker exited without reporting".into(),
                ))
            }
        }
    }

    fn save(&self) -> Result<RecordingResult, RecorderError> {
        let chunks = self.accumulator.snapshot_and_clear();
        if chunks.is_empty() {
            return Err(RecorderError::EmptyCapture);
        }

        let mode = self.config.capture_mode;
        let sample_rate = self.config.sample_rate;
        let bytes = PcmEncoder::new(mode.channels(), sample_rate).encode(&chunks)?;

        let writer = RecordingWriter::new(self.config.output_directory.clone(), mode.file_prefix());
        let written = writer.write(&bytes)?;

        let frames: usize = chunks.iter().map(Chunk::frames).sum();
        let duration_secs = frames as f64 / sample_rate as f64;
        let metadata = RecordingMetadata::new(
            mode,
            sample_rate,
            &written.path.to_string_lossy(),
            duration_secs,
            chunks.len(),
            &written.checksum,
        );
        if self.config.write_metadata {
            if let Err(e) = write_metadata(&metadata, &written.path) {
                log::warn!("Failed to write metadata for {}: {}", written.path.display(), e);
                self.shared.report_error(&e);
            }
        }

        // The recording stays on disk even if it cannot be read back.
        let waveform = match WaveformProjector::project(&written.path) {
            Ok(series) => Some(series),
            Err(e) => {
                log::error!("Failed to project {}: {}", written.path.display(), e);
                self.shared.report_error(&e);
                None
            }
        };

        Ok(RecordingResult {
            file_path: written.path,
            duration_secs,
            chunk_count: chunks.len(),
            checksum: written.checksum,
            metadata,
            waveform,
        })
    }
}
