pub mod audio_source;
pub mod capture_provider;
pub mod recorder_delegate;
