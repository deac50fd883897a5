//! Keyboard-side error types

use thiserror::Error;

use crate::keymap::MAX_SENSORS;

/// A character that could not become part of a key mapping
///
/// These are warnings: the rest of the mapping is still built.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyMapError {
    #[error("Unrecognized key character {0:?}")]
    UnrecognizedKeyChar(char),

    #[error(
        "Key {ch:?} at position {position} is beyond the {} sensors a sample carries",
        MAX_SENSORS
    )]
    BeyondSensorWidth { ch: char, position: usize },
}

/// Errors from key event output
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to create virtual device: {0}")]
    CreateDevice(#[source] std::io::Error),
    #[error("Failed to emit event: {0}")]
    EmitEvent(#[source] std::io::Error),
}
