//! audio-recorder - record the microphone or system audio to numbered WAV files
//!
//! Reads commands from stdin (`start`, `pause`, `resume`, `toggle`, `stop`,
//! `status`, `quit`). A recording in progress is saved on `quit` or EOF.

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};

use audio_recorder_core::{CaptureMode, CaptureSession, PushSource, RecorderConfiguration, RecorderError};
use audio_recorder_cpal::{CpalCapture, DeviceEnumerator};

mod console;

use console::{Command, ConsoleDelegate};

#[derive(Parser)]
#[command(name = "audio-recorder")]
#[command(about = "Record the microphone or system audio to numbered WAV files")]
#[command(version)]
struct Cli {
    /// What to record
    #[arg(short, long, value_enum, default_value_t = Mode::Mic)]
    mode: Mode,

    /// Output directory (default: ~/Recordings)
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// Sample rate in Hz
    #[arg(long, default_value_t = 44100)]
    sample_rate: u32,

    /// Do not write a .metadata.json sidecar next to recordings
    #[arg(long)]
    no_metadata: bool,

    /// Start recording immediately
    #[arg(long)]
    start: bool,

    /// List capture devices and exit
    #[arg(long)]
    list_devices: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    /// Microphone, mono, saved as recording_<n>.wav
    Mic,
    /// System audio from the output device, stereo, saved as system_audio_<n>.wav
    Loopback,
}

impl From<Mode> for CaptureMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Mic => CaptureMode::Microphone,
            Mode::Loopback => CaptureMode::Loopback,
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn default_recordings_dir() -> PathBuf {
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Recordings")
}

fn run(cli: Cli) -> Result<(), RecorderError> {
    let enumerator = DeviceEnumerator::new();
    if cli.list_devices {
        return list_devices(&enumerator);
    }

    let mut config = RecorderConfiguration::new(cli.mode.into(), cli.dir.unwrap_or_else(default_recordings_dir));
    config.sample_rate = cli.sample_rate;
    config.write_metadata = !cli.no_metadata;
    config.validate().map_err(RecorderError::ConfigurationFailed)?;

    let mut session = CaptureSession::new(PushSource::new(CpalCapture::with_enumerator(enumerator)), config);
    session.set_delegate(Arc::new(ConsoleDelegate::new()));

    match session.device_info() {
        Some(device) => log::info!("Recording device: {}", device.name),
        None => log::warn!("No {:?} device found on {}", cli.mode, enumerator.host_name()),
    }
    log::info!("Saving to {}", session.config().output_directory.display());
    println!("{}", console::HELP);

    if cli.start {
        start(&mut session);
    }

    let stdin = io::stdin();
    for line in stdin.lock().lines().map_while(Result::ok) {
        let Some(command) = Command::parse(&line) else {
            if !line.trim().is_empty() {
                println!("unknown command: {} (try `help`)", line.trim());
            }
            continue;
        };
        match command {
            Command::Start => start(&mut session),
            Command::Pause => {
                session.pause();
            }
            Command::Resume => {
                session.resume();
            }
            Command::Toggle => {
                session.toggle_pause();
            }
            Command::Stop => {
                // Failures are printed by the delegate.
                if let Ok(None) = session.stop() {
                    println!("not recording");
                }
            }
            Command::Status => println!(
                "{}",
                console::status_line(
                    session.state(),
                    session.captured_duration_secs(),
                    &session.current_level()
                )
            ),
            Command::Help => println!("{}", console::HELP),
            Command::Quit => break,
        }
    }

    if session.state().is_active() {
        log::info!("Saving recording before exit");
        let _ = session.stop();
    }
    Ok(())
}

fn start(session: &mut CaptureSession<PushSource<CpalCapture>>) {
    if let Err(RecorderError::SessionActive) = session.start() {
        println!("already {}", session.state());
    }
}

fn list_devices(enumerator: &DeviceEnumerator) -> Result<(), RecorderError> {
    println!("host: {}", enumerator.host_name());
    for (title, mode) in [("input (mic)", CaptureMode::Microphone), ("output (loopback)", CaptureMode::Loopback)] {
        println!("{} devices:", title);
        let devices = enumerator.list_devices(mode)?;
        if devices.is_empty() {
            println!("  (none)");
        }
        for (i, device) in devices.iter().enumerate() {
            let used = if i == 0 { "  <- used" } else { "" };
            let default = if device.is_default { " (default)" } else { "" };
            println!("  {}{}{}", device.name, default, used);
        }
    }
    Ok(())
}
