use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;

use super::finalizer::{Finalizer, PendingWorker};
use super::shared::{CaptureGate, SessionShared};
use super::worker::{run_worker, WorkerContext};
use crate::models::audio_models::{AudioDevice, AudioLevel};
use crate::models::config::RecorderConfiguration;
use crate::models::error::RecorderError;
use crate::models::recording_result::RecordingResult;
use crate::models::state::CaptureState;
use crate::processing::frame_accumulator::FrameAccumulator;
use crate::storage::destination::validate_destination;
use crate::traits::audio_source::AudioSource;
use crate::traits::recorder_delegate::RecorderDelegate;

/// Per-session handles. Replaced on every `start` so a detached worker from
/// an earlier session can only ever touch its own gate and accumulator.
struct ActiveRun {
    gate: Arc<CaptureGate>,
    accumulator: Arc<FrameAccumulator>,
    worker: Option<PendingWorker>,
}

/// Recording controller.
///
/// Owns one [`AudioSource`] and drives the capture state machine:
///
/// ```text
/// Idle ──start──▶ Recording ◀──pause/resume──▶ Paused
///                     │                          │
///                     └──────────stop────────────┘
///                                 ▼
///                             Stopping ──▶ Idle
/// ```
///
/// Capture runs on a dedicated `audio-capture` thread; the controller is
/// never blocked by device I/O except for the bounded join inside `stop`.
/// A capture failure moves the session straight back to `Idle` and
/// discards what had been captured.
pub struct CaptureSession<S: AudioSource + 'static> {
    config: RecorderConfiguration,
    shared: Arc<SessionShared>,
    source: Arc<Mutex<Option<S>>>,
    run: Option<ActiveRun>,
}

impl<S: AudioSource + 'static> CaptureSession<S> {
    pub fn new(source: S, config: RecorderConfiguration) -> Self {
        Self {
            config,
            shared: Arc::new(SessionShared::new()),
            source: Arc::new(Mutex::new(Some(source))),
            run: None,
        }
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn RecorderDelegate>) {
        self.shared.set_delegate(Some(delegate));
    }

    pub fn clear_delegate(&mut self) {
        self.shared.set_delegate(None);
    }

    pub fn config(&self) -> &RecorderConfiguration {
        &self.config
    }

    /// Replace the configuration. Only allowed while idle.
    pub fn set_config(&mut self, config: RecorderConfiguration) -> Result<(), RecorderError> {
        if !self.shared.state().is_idle() {
            return Err(RecorderError::SessionActive);
        }
        self.config = config;
        Ok(())
    }

    pub fn state(&self) -> CaptureState {
        self.shared.state()
    }

    /// Level of the most recently accumulated chunk.
    pub fn current_level(&self) -> AudioLevel {
        self.shared.level()
    }

    /// Chunks accumulated so far in the current session.
    pub fn captured_chunks(&self) -> usize {
        self.run.as_ref().map_or(0, |run| run.accumulator.len())
    }

    pub fn captured_duration_secs(&self) -> f64 {
        let frames = self.run.as_ref().map_or(0, |run| run.accumulator.frame_count());
        frames as f64 / self.config.sample_rate.max(1) as f64
    }

    /// Whether the source is back from its last worker and has a device
    /// for the configured mode.
    pub fn is_device_available(&self) -> bool {
        self.source
            .lock()
            .as_ref()
            .is_some_and(|source| source.is_available(self.config.capture_mode))
    }

    pub fn device_info(&self) -> Option<AudioDevice> {
        self.source
            .lock()
            .as_ref()
            .and_then(|source| source.device_info(self.config.capture_mode))
    }

    /// Begin recording. Transitions: idle → recording.
    ///
    /// Rejected with `SessionActive` and no side effects unless idle.
    /// Fails with `FolderUnwritable` before the device is touched if the
    /// output directory cannot be written.
    pub fn start(&mut self) -> Result<(), RecorderError> {
        let state = self.shared.state();
        if !state.is_idle() {
            log::warn!("start ignored: session is {}", state);
            return Err(RecorderError::SessionActive);
        }

        if let Err(e) = self.preflight() {
            log::error!("Cannot start recording: {}", e);
            self.shared.report_error(&e);
            return Err(e);
        }

        let run = ActiveRun {
            gate: Arc::new(CaptureGate::running()),
            accumulator: Arc::new(FrameAccumulator::new()),
            worker: None,
        };
        self.shared.reset_level();
        if !self.shared.transition(&[CaptureState::Idle], CaptureState::Recording) {
            return Err(RecorderError::SessionActive);
        }

        let ctx = WorkerContext {
            gate: Arc::clone(&run.gate),
            accumulator: Arc::clone(&run.accumulator),
            shared: Arc::clone(&self.shared),
            mode: self.config.capture_mode,
            sample_rate: self.config.sample_rate,
            chunk_duration: self.config.chunk_duration,
        };
        let slot = Arc::clone(&self.source);
        let (done_tx, done_rx) = mpsc::channel();

        let spawned = thread::Builder::new()
            .name("audio-capture".into())
            .spawn(move || run_worker(slot, ctx, done_tx));

        match spawned {
            Ok(thread) => {
                self.run = Some(ActiveRun {
                    worker: Some(PendingWorker { done: done_rx, thread }),
                    ..run
                });
                log::info!(
                    "Recording started: {:?} @ {} Hz into {}",
                    self.config.capture_mode,
                    self.config.sample_rate,
                    self.config.output_directory.display()
                );
                Ok(())
            }
            Err(e) => {
                let err = RecorderError::CaptureFailure(format!("failed to spawn capture thread: {}", e));
                self.shared.set_state(CaptureState::Idle);
                self.shared.report_error(&err);
                Err(err)
            }
        }
    }

    fn preflight(&self) -> Result<(), RecorderError> {
        self.config
            .validate()
            .map_err(RecorderError::ConfigurationFailed)?;
        validate_destination(&self.config.output_directory, self.config.create_output_directory)?;

        let mode = self.config.capture_mode;
        match self.source.lock().as_ref() {
            None => Err(RecorderError::DeviceUnavailable(
                "capture device is still held by a previous session".into(),
            )),
            Some(source) if !source.is_available(mode) => Err(RecorderError::DeviceUnavailable(format!(
                "no device available for {:?} capture",
                mode
            ))),
            Some(_) => Ok(()),
        }
    }

    /// Stop keeping captured chunks. Transitions: recording → paused.
    /// No-op in any other state. Returns the state afterwards.
    pub fn pause(&mut self) -> CaptureState {
        if let Some(run) = &self.run {
            if self.shared.state() == CaptureState::Recording {
                run.gate.pause();
                if self.shared.transition(&[CaptureState::Recording], CaptureState::Paused) {
                    log::info!("Recording paused");
                }
            }
        }
        self.shared.state()
    }

    /// Transitions: paused → recording. No-op in any other state.
    pub fn resume(&mut self) -> CaptureState {
        if let Some(run) = &self.run {
            if self.shared.transition(&[CaptureState::Paused], CaptureState::Recording) {
                run.gate.resume();
                log::info!("Recording resumed");
            }
        }
        self.shared.state()
    }

    pub fn toggle_pause(&mut self) -> CaptureState {
        match self.shared.state() {
            CaptureState::Recording => self.pause(),
            CaptureState::Paused => self.resume(),
            other => other,
        }
    }

    /// Stop recording and save. Transitions: recording/paused → stopping → idle.
    ///
    /// Returns `Ok(None)` without side effects when nothing is recording,
    /// so repeated calls are harmless. `EmptyCapture` when no audio was
    /// kept; no file is written in that case.
    pub fn stop(&mut self) -> Result<Option<RecordingResult>, RecorderError> {
        match self.begin_stop() {
            Some(finalizer) => finalizer.run().map(Some),
            None => Ok(None),
        }
    }

    /// Like [`stop`](Self::stop), but encoding and saving happen on a
    /// `recording-finalize` thread. The session reads `Stopping` until that
    /// thread finishes; `Ok(None)` when nothing is recording.
    pub fn stop_in_background(
        &mut self,
    ) -> Result<Option<JoinHandle<Result<RecordingResult, RecorderError>>>, RecorderError> {
        let Some(finalizer) = self.begin_stop() else {
            return Ok(None);
        };
        let shared = Arc::clone(&self.shared);
        thread::Builder::new()
            .name("recording-finalize".into())
            .spawn(move || finalizer.run())
            .map(Some)
            .map_err(|e| {
                let err = RecorderError::CaptureFailure(format!("failed to spawn finalize thread: {}", e));
                shared.report_error(&err);
                shared.set_state(CaptureState::Idle);
                err
            })
    }

    fn begin_stop(&mut self) -> Option<Finalizer> {
        if !self.shared.transition(
            &[CaptureState::Recording, CaptureState::Paused],
            CaptureState::Stopping,
        ) {
            log::debug!("stop ignored: session is {}", self.shared.state());
            return None;
        }
        let Some(run) = self.run.take() else {
            self.shared.set_state(CaptureState::Idle);
            return None;
        };
        run.gate.request_stop();
        Some(Finalizer::new(
            self.config.clone(),
            Arc::clone(&self.shared),
            run.accumulator,
            run.worker,
        ))
    }
}

impl<S: AudioSource + 'static> Drop for CaptureSession<S> {
    fn drop(&mut self) {
        if let Some(run) = &self.run {
            if self.shared.state().is_active() {
                log::warn!("Capture session dropped while {}; discarding audio", self.shared.state());
            }
            run.gate.request_stop();
        }
    }
}
