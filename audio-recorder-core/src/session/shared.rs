use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::models::audio_models::AudioLevel;
use crate::models::error::RecorderError;
use crate::models::recording_result::RecordingResult;
use crate::models::state::CaptureState;
use crate::traits::recorder_delegate::RecorderDelegate;

/// Run and pause flags shared by the controller and one capture worker.
///
/// A fresh gate is made for every session, so a worker left behind by a
/// timed-out stop can never be revived by the next `start`.
#[derive(Debug, Default)]
pub struct CaptureGate {
    running: AtomicBool,
    paused: AtomicBool,
}

impl CaptureGate {
    pub fn running() -> Self {
        Self {
            running: AtomicBool::new(true),
            paused: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn request_stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }
}

/// Session state visible to the controller, the worker and the finalizer.
///
/// Delegate callbacks are always made after the state lock is released.
pub(crate) struct SessionShared {
    state: Mutex<CaptureState>,
    level: Mutex<AudioLevel>,
    delegate: RwLock<Option<Arc<dyn RecorderDelegate>>>,
}

impl SessionShared {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(CaptureState::Idle),
            level: Mutex::new(AudioLevel::default()),
            delegate: RwLock::new(None),
        }
    }

    pub(crate) fn set_delegate(&self, delegate: Option<Arc<dyn RecorderDelegate>>) {
        *self.delegate.write() = delegate;
    }

    fn delegate(&self) -> Option<Arc<dyn RecorderDelegate>> {
        self.delegate.read().clone()
    }

    pub(crate) fn state(&self) -> CaptureState {
        *self.state.lock()
    }

    pub(crate) fn level(&self) -> AudioLevel {
        *self.level.lock()
    }

    /// Move to `to` if the current state is one of `from`. Returns whether
    /// the transition happened.
    pub(crate) fn transition(&self, from: &[CaptureState], to: CaptureState) -> bool {
        {
            let mut state = self.state.lock();
            if !from.contains(&state) {
                return false;
            }
            *state = to;
        }
        log::debug!("Capture state -> {}", to);
        self.notify_state(to);
        true
    }

    /// Unconditionally move to `to`.
    pub(crate) fn set_state(&self, to: CaptureState) {
        *self.state.lock() = to;
        log::debug!("Capture state -> {}", to);
        self.notify_state(to);
    }

    /// The worker behind `gate` failed on its own. If its session is still
    /// the active one, end it here; once the gate is stopped the stop path
    /// owns reporting, and a later session must not be touched.
    ///
    /// The gate is checked under the state lock: a stop always stops the
    /// gate before its session can reach `Idle`, so a running gate means the
    /// current state belongs to this worker's session.
    pub(crate) fn fail_active(&self, gate: &CaptureGate, error: &RecorderError) -> bool {
        {
            let mut state = self.state.lock();
            if !gate.is_running() || !state.is_active() {
                return false;
            }
            *state = CaptureState::Idle;
        }
        log::debug!("Capture state -> {}", CaptureState::Idle);
        *self.level.lock() = AudioLevel::default();
        self.notify_state(CaptureState::Idle);
        self.report_error(error);
        true
    }

    pub(crate) fn report_level(&self, level: AudioLevel) {
        *self.level.lock() = level;
        if let Some(delegate) = self.delegate() {
            delegate.on_level(&level);
        }
    }

    pub(crate) fn reset_level(&self) {
        *self.level.lock() = AudioLevel::default();
    }

    pub(crate) fn report_error(&self, error: &RecorderError) {
        if let Some(delegate) = self.delegate() {
            delegate.on_error(error);
        }
    }

    pub(crate) fn report_finished(&self, result: &RecordingResult) {
        if let Some(delegate) = self.delegate() {
            delegate.on_recording_finished(result);
        }
    }

    fn notify_state(&self, state: CaptureState) {
        if let Some(delegate) = self.delegate() {
            delegate.on_state_changed(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::recorder_delegate::RecorderEvent;
    use std::sync::mpsc;

    #[test]
    fn gate_flags() {
        let gate = CaptureGate::running();
        assert!(gate.is_running());
        assert!(!gate.is_paused());

        gate.pause();
        assert!(gate.is_paused());
        gate.resume();
        assert!(!gate.is_paused());

        gate.request_stop();
        assert!(!gate.is_running());
    }

    #[test]
    fn transition_only_from_listed_states() {
        let shared = SessionShared::new();
        let (tx, rx) = mpsc::channel();
        shared.set_delegate(Some(Arc::new(tx)));

        assert!(!shared.transition(&[CaptureState::Recording], CaptureState::Paused));
        assert!(shared.transition(&[CaptureState::Idle], CaptureState::Recording));

        assert_eq!(shared.state(), CaptureState::Recording);
        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events, vec![RecorderEvent::StateChanged(CaptureState::Recording)]);
    }

    #[test]
    fn fail_active_ignored_while_stopping() {
        let shared = SessionShared::new();
        shared.set_state(CaptureState::Stopping);

        let failed = shared.fail_active(&CaptureGate::running(), &RecorderError::CaptureFailure("late".into()));

        assert!(!failed);
        assert_eq!(shared.state(), CaptureState::Stopping);
    }

    #[test]
    fn stopped_gate_cannot_end_next_session() {
        let shared = SessionShared::new();
        let stale = CaptureGate::running();
        stale.request_stop();
        shared.set_state(CaptureState::Recording);
        let (tx, rx) = mpsc::channel();
        shared.set_delegate(Some(Arc::new(tx)));

        let failed = shared.fail_active(&stale, &RecorderError::CaptureFailure("late".into()));

        assert!(!failed);
        assert_eq!(shared.state(), CaptureState::Recording);
        assert_eq!(rx.try_iter().count(), 0);
    }

    #[test]
    fn fail_active_ends_recording() {
        let shared = SessionShared::new();
        let (tx, rx) = mpsc::channel();
        shared.set_state(CaptureState::Paused);
        shared.set_delegate(Some(Arc::new(tx)));

        let error = RecorderError::CaptureFailure("unplugged".into());
        assert!(shared.fail_active(&CaptureGate::running(), &error));

        assert_eq!(shared.state(), CaptureState::Idle);
        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                RecorderEvent::StateChanged(CaptureState::Idle),
                RecorderEvent::Error(error),
            ]
        );
    }
}
