//! Line-oriented console front end: command parsing, a printing delegate,
//! and small text renderings of levels and waveforms.

use std::io::{self, Write};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use audio_recorder_core::{AudioLevel, CaptureState, RecorderDelegate, RecorderError, RecordingResult, WaveformSeries};

/// Width of the waveform sparkline printed after each recording.
const SPARKLINE_WIDTH: usize = 60;
const SPARK_LEVELS: [char; 9] = [' ', '▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Minimum time between redraws of the live level meter.
const METER_INTERVAL: Duration = Duration::from_millis(100);
const METER_WIDTH: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Pause,
    Resume,
    Toggle,
    Stop,
    Status,
    Help,
    Quit,
}

impl Command {
    /// Parse one input line. Case-insensitive; surrounding whitespace ignored.
    pub fn parse(line: &str) -> Option<Self> {
        let command = match line.trim().to_ascii_lowercase().as_str() {
            "start" | "record" | "r" => Self::Start,
            "pause" => Self::Pause,
            "resume" => Self::Resume,
            "toggle" | "p" => Self::Toggle,
            "stop" | "s" => Self::Stop,
            "status" | "?" => Self::Status,
            "help" | "h" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            _ => return None,
        };
        Some(command)
    }
}

pub const HELP: &str = "\
commands:
  start   (r)  begin recording
  pause        pause recording
  resume       resume recording
  toggle  (p)  pause or resume
  stop    (s)  stop and save
  status  (?)  show state and level
  quit    (q)  save any recording in progress and exit";

/// Prints session events to the terminal.
///
/// While recording, the input level is redrawn in place on stderr; any other
/// event first ends the meter line.
#[derive(Default)]
pub struct ConsoleDelegate {
    last_meter: Mutex<Option<Instant>>,
}

impl ConsoleDelegate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the meter should be redrawn at `now`. Records the redraw.
    fn meter_due(&self, now: Instant) -> bool {
        let mut last = self.last_meter.lock();
        match *last {
            Some(previous) if now.duration_since(previous) < METER_INTERVAL => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }

    fn end_meter(&self) {
        if self.last_meter.lock().take().is_some() {
            eprintln!();
        }
    }
}

impl RecorderDelegate for ConsoleDelegate {
    fn on_state_changed(&self, state: CaptureState) {
        self.end_meter();
        println!("[{}]", state);
    }

    fn on_level(&self, level: &AudioLevel) {
        log::trace!("level {:.1} peak {:.3}", level.display, level.peak);
        if self.meter_due(Instant::now()) {
            eprint!("\rlevel {}", level_bar(level, METER_WIDTH));
            let _ = io::stderr().flush();
        }
    }

    fn on_error(&self, error: &RecorderError) {
        self.end_meter();
        eprintln!("error: {}", error);
    }

    fn on_recording_finished(&self, result: &RecordingResult) {
        self.end_meter();
        println!(
            "saved {} ({:.2}s, {} chunks)",
            result.file_path.display(),
            result.duration_secs,
            result.chunk_count
        );
        if let Some(waveform) = &result.waveform {
            println!("{}", waveform_summary(waveform));
        }
    }
}

/// `[########            ]  40%`
pub fn level_bar(level: &AudioLevel, width: usize) -> String {
    let filled = ((level.display / 100.0) * width as f32).round() as usize;
    let filled = filled.min(width);
    format!(
        "[{}{}] {:>3.0}%",
        "#".repeat(filled),
        " ".repeat(width - filled),
        level.display
    )
}

pub fn status_line(state: CaptureState, captured_secs: f64, level: &AudioLevel) -> String {
    if state.is_active() {
        format!("{} {:.1}s {}", state, captured_secs, level_bar(level, 20))
    } else {
        state.to_string()
    }
}

/// One character per bucket of the series, scaled to the series peak.
pub fn sparkline(series: &WaveformSeries, width: usize) -> String {
    if series.is_empty() || width == 0 {
        return String::new();
    }
    let peak = series.peak().max(1) as f32;
    let bucket = series.len().div_ceil(width);
    series
        .amplitudes
        .chunks(bucket)
        .map(|window| {
            let loudest = window.iter().map(|a| a.unsigned_abs()).max().unwrap_or(0) as f32;
            let index = ((loudest / peak) * (SPARK_LEVELS.len() - 1) as f32).round() as usize;
            SPARK_LEVELS[index.min(SPARK_LEVELS.len() - 1)]
        })
        .collect()
}

fn waveform_summary(series: &WaveformSeries) -> String {
    format!(
        "waveform: {} points over {:.2}s, peak {}\n{}",
        series.len(),
        series.duration_secs(),
        series.peak(),
        sparkline(series, SPARKLINE_WIDTH)
    )
}
