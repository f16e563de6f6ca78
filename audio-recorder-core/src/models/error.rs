use thiserror::Error;

/// Errors reported by the recorder.
///
/// Cloneable so the same error can be handed to the delegate and returned
/// to the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecorderError {
    #[error("no capture device available: {0}")]
    DeviceUnavailable(String),

    #[error("destination folder is not writable: {0}")]
    FolderUnwritable(String),

    #[error("capture failed: {0}")]
    CaptureFailure(String),

    #[error("nothing was captured")]
    EmptyCapture,

    #[error("corrupt audio container: {0}")]
    CorruptContainer(String),

    #[error("a recording session is already active")]
    SessionActive,

    #[error("encoding failed: {0}")]
    EncodingFailed(String),

    #[error("storage error: {0}")]
    StorageError(String),

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),
}
