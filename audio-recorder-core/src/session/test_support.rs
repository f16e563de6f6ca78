//! Scripted capture devices shared by the session tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::models::audio_models::{AudioDevice, CaptureMode, Chunk, DeviceKind};
use crate::models::error::RecorderError;
use crate::traits::audio_source::AudioSource;
use crate::traits::capture_provider::{AudioBufferCallback, CaptureProvider, StreamErrorCallback};

type ChunkHook = Box<dyn FnMut(usize) + Send>;

/// Pull source that hands out a fixed list of chunks, then reports silence.
pub(crate) struct ScriptedSource {
    chunks: VecDeque<Chunk>,
    tail: Option<Chunk>,
    hook: Option<ChunkHook>,
    fail_at: Option<usize>,
    fail_open: bool,
    available: bool,
    block_for: Option<Duration>,
    produced: usize,
    pub(crate) open_count: Arc<AtomicUsize>,
    pub(crate) close_count: Arc<AtomicUsize>,
}

impl ScriptedSource {
    pub(crate) fn new(chunks: Vec<Chunk>) -> Self {
        Self {
            chunks: chunks.into(),
            tail: None,
            hook: None,
            fail_at: None,
            fail_open: false,
            available: true,
            block_for: None,
            produced: 0,
            open_count: Arc::new(AtomicUsize::new(0)),
            close_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Run `hook(i)` just before chunk `i` is returned.
    pub(crate) fn on_chunk(mut self, hook: impl FnMut(usize) + Send + 'static) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    pub(crate) fn with_tail(mut self, tail: Chunk) -> Self {
        self.tail = Some(tail);
        self
    }

    /// Fail the read that would return chunk `index`.
    pub(crate) fn fail_at(mut self, index: usize) -> Self {
        self.fail_at = Some(index);
        self
    }

    pub(crate) fn fail_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub(crate) fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Every read blocks for `duration`, like a wedged device.
    pub(crate) fn blocking(mut self, duration: Duration) -> Self {
        self.block_for = Some(duration);
        self
    }
}

impl AudioSource for ScriptedSource {
    fn is_available(&self, _mode: CaptureMode) -> bool {
        self.available
    }

    fn device_info(&self, mode: CaptureMode) -> Option<AudioDevice> {
        self.available.then(|| AudioDevice {
            name: "Scripted".into(),
            kind: match mode {
                CaptureMode::Microphone => DeviceKind::Input,
                CaptureMode::Loopback => DeviceKind::Output,
            },
            is_default: true,
        })
    }

    fn open(&mut self, _sample_rate: u32, _mode: CaptureMode) -> Result<(), RecorderError> {
        self.open_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_open {
            return Err(RecorderError::DeviceUnavailable("scripted open failure".into()));
        }
        Ok(())
    }

    fn read_chunk(&mut self, _duration: Duration) -> Result<Option<Chunk>, RecorderError> {
        if let Some(block) = self.block_for {
            thread::sleep(block);
        }
        if self.fail_at == Some(self.produced) {
            return Err(RecorderError::CaptureFailure("scripted read failure".into()));
        }
        match self.chunks.pop_front() {
            Some(chunk) => {
                let index = self.produced;
                self.produced += 1;
                if let Some(hook) = self.hook.as_mut() {
                    hook(index);
                }
                Ok(Some(chunk))
            }
            None => {
                thread::sleep(Duration::from_millis(2));
                Ok(None)
            }
        }
    }

    fn take_remaining(&mut self) -> Option<Chunk> {
        self.tail.take()
    }

    fn close(&mut self) {
        self.close_count.fetch_add(1, Ordering::SeqCst);
    }
}

/// Push provider delivering 10 ms mono buffers at 44.1 kHz from its own thread.
pub(crate) struct ConstantProvider {
    value: f32,
    running: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ConstantProvider {
    pub(crate) fn new(value: f32) -> Self {
        Self {
            value,
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }
}

impl CaptureProvider for ConstantProvider {
    fn is_available(&self, _mode: CaptureMode) -> bool {
        true
    }

    fn start(
        &mut self,
        _mode: CaptureMode,
        on_buffer: AudioBufferCallback,
        _on_error: StreamErrorCallback,
    ) -> Result<(), RecorderError> {
        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);
        let buffer = vec![self.value; 441];
        self.handle = Some(thread::spawn(move || {
            while running.load(Ordering::SeqCst) {
                on_buffer(&buffer, 44100, 1);
                thread::sleep(Duration::from_millis(1));
            }
        }));
        Ok(())
    }

    fn stop(&mut self) -> Result<(), RecorderError> {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        Ok(())
    }

    fn device_info(&self, _mode: CaptureMode) -> Option<AudioDevice> {
        None
    }
}
