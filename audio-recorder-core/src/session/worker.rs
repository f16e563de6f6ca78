use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::shared::{CaptureGate, SessionShared};
use crate::models::audio_models::{CaptureMode, Chunk};
use crate::models::error::RecorderError;
use crate::processing::frame_accumulator::FrameAccumulator;
use crate::traits::audio_source::{AudioSource, OpenSource};

/// Everything one capture worker needs, cloned out of the session at start.
pub(crate) struct WorkerContext {
    pub(crate) gate: Arc<CaptureGate>,
    pub(crate) accumulator: Arc<FrameAccumulator>,
    pub(crate) shared: Arc<SessionShared>,
    pub(crate) mode: CaptureMode,
    pub(crate) sample_rate: u32,
    pub(crate) chunk_duration: Duration,
}

/// Counters reported back to the controller when the worker exits cleanly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct CaptureStats {
    pub(crate) chunks_read: usize,
    pub(crate) chunks_kept: usize,
    pub(crate) chunks_discarded: usize,
}

/// Capture until the gate stops running.
///
/// The source is opened here and closed on every exit path. Chunks read
/// while paused are discarded; after a normal stop the source's partial
/// tail is kept unless the session ended paused.
pub(crate) fn capture_loop<S: AudioSource + ?Sized>(
    source: &mut S,
    ctx: &WorkerContext,
) -> Result<CaptureStats, RecorderError> {
    let expected_channels = ctx.mode.channels();
    let mut open = OpenSource::open(source, ctx.sample_rate, ctx.mode)?;
    log::info!(
        "Capture worker started: {} @ {} Hz, {} ch",
        ctx.mode.file_prefix(),
        ctx.sample_rate,
        expected_channels
    );

    let mut stats = CaptureStats::default();
    while ctx.gate.is_running() {
        let Some(chunk) = open.read_chunk(ctx.chunk_duration)? else {
            continue;
        };
        stats.chunks_read += 1;

        if ctx.gate.is_paused() {
            stats.chunks_discarded += 1;
            continue;
        }
        accept(ctx, chunk, expected_channels)?;
        stats.chunks_kept += 1;
    }

    if let Some(tail) = open.take_remaining() {
        if ctx.gate.is_paused() {
            stats.chunks_discarded += 1;
        } else {
            accept(ctx, tail, expected_channels)?;
            stats.chunks_kept += 1;
        }
    }

    log::info!(
        "Capture worker finished: {} chunks kept, {} discarded while paused",
        stats.chunks_kept,
        stats.chunks_discarded
    );
    Ok(stats)
}

/// Body of the `audio-capture` thread.
///
/// Borrows the source out of `slot` for the session and puts it back
/// before reporting, so the next `start` finds it as soon as this session
/// is observably over.
pub(crate) fn run_worker<S: AudioSource>(
    slot: Arc<Mutex<Option<S>>>,
    ctx: WorkerContext,
    done: Sender<Result<CaptureStats, RecorderError>>,
) {
    let taken = slot.lock().take();
    let result = match taken {
        Some(mut source) => {
            let result = panic::catch_unwind(AssertUnwindSafe(|| capture_loop(&mut source, &ctx)))
                .unwrap_or_else(|_| Err(RecorderError::CaptureFailure("capture worker panicked".into())));
            *slot.lock() = Some(source);
            result
        }
        None => Err(RecorderError::DeviceUnavailable(
            "capture device is held by another worker".into(),
        )),
    };

    if let Err(e) = &result {
        log::error!("Capture failed: {}", e);
        ctx.accumulator.clear();
        ctx.shared.fail_active(&ctx.gate, e);
    }
    let _ = done.send(result);
}

fn accept(ctx: &WorkerContext, chunk: Chunk, expected_channels: u16) -> Result<(), RecorderError> {
    if chunk.channels() != expected_channels || !chunk.is_well_formed() {
        return Err(RecorderError::CaptureFailure(format!(
            "device delivered a {}-channel chunk of {} samples, expected {} channels",
            chunk.channels(),
            chunk.samples().len(),
            expected_channels
        )));
    }
    ctx.shared.report_level(chunk.level());
    ctx.accumulator.append(chunk);
    Ok(())
}
