use std::sync::mpsc::Sender;

use crate::models::audio_models::AudioLevel;
use crate::models::error::RecorderError;
use crate::models::recording_result::RecordingResult;
use crate::models::state::CaptureState;

/// Event delegate for capture session notifications.
///
/// Methods are called from whichever thread caused the event: the
/// controller for `start`/`pause`, the capture worker for levels and
/// capture failures, the finalizer for background stops. Implementations
/// should marshal to a UI thread if they need one.
pub trait RecorderDelegate: Send + Sync {
    /// Called after every state transition.
    fn on_state_changed(&self, state: CaptureState);

    /// Called with the level of each chunk as it is accumulated.
    fn on_level(&self, level: &AudioLevel);

    /// Called for every reported failure.
    fn on_error(&self, error: &RecorderError);

    /// Called when a recording has been written and projected.
    fn on_recording_finished(&self, result: &RecordingResult);
}

/// Owned form of delegate callbacks, for consumers that prefer a channel.
#[derive(Debug, Clone, PartialEq)]
pub enum RecorderEvent {
    StateChanged(CaptureState),
    Level(AudioLevel),
    Error(RecorderError),
    Finished(Box<RecordingResult>),
}

/// Forwards every callback as a [`RecorderEvent`]. Send failures (receiver
/// dropped) are ignored.
impl RecorderDelegate for Sender<RecorderEvent> {
    fn on_state_changed(&self, state: CaptureState) {
        let _ = self.send(RecorderEvent::StateChanged(state));
    }

    fn on_level(&self, level: &AudioLevel) {
        let _ = self.send(RecorderEvent::Level(*level));
    }

    fn on_error(&self, error: &RecorderError) {
        let _ = self.send(RecorderEvent::Error(error.clone()));
    }

    fn on_recording_finished(&self, result: &RecordingResult) {
        let _ = self.send(RecorderEvent::Finished(Box::new(result.clone())));
    }
}
