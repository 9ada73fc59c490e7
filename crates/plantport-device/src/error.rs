use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeviceError {
    /// The session is closed. Callers surface this and carry on without the
    /// device; nothing here tries to reopen the port.
    #[error("device on {port} is not connected")]
    DeviceUnavailable { port: String },
    #[error("invalid command line {0:?}: must be non-empty and contain no line breaks")]
    InvalidCommand(String),
    #[error("serial I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

pub type DeviceResult<T> = std::result::Result<T, DeviceError>;
