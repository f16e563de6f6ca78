pub mod chunk_bridge;
pub mod format_adapter;
pub mod frame_accumulator;
pub mod pcm;
pub mod ring_buffer;
pub mod wav_format;
pub mod waveform;
