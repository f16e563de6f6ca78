pub mod destination;
pub mod metadata;
pub mod recording_writer;
