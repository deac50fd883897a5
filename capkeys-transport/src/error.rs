//! Serial link error types

use thiserror::Error;

/// Errors that can occur while managing the serial link
#[derive(Error, Debug)]
pub enum LinkError {
    /// Requested name is not among the currently enumerable ports
    #[error("Port {0} is not available")]
    PortUnavailable(String),

    /// Port is enumerable but the OS refused to open it
    #[error("Failed to open {port}: {reason}")]
    Open { port: String, reason: String },

    /// Open connection stopped yielding bytes (usually the board was unplugged)
    #[error("Read from {port} failed: {source}")]
    Read {
        port: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Link is not open")]
    NotOpen,

    #[error("Failed to enumerate ports: {0}")]
    Enumerate(String),
}

impl From<serialport::Error> for LinkError {
    fn from(e: serialport::Error) -> Self {
        LinkError::Enumerate(e.to_string())
    }
}
