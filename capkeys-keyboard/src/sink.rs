//! Key event output

use tracing::info;

use crate::edge::{KeyEvent, Transition};
use crate::error::SinkError;
use crate::keys::KeyId;

/// Receives key transitions and performs the host-side key simulation
pub trait InputSink: Send {
    fn key_down(&mut self, key: KeyId) -> Result<(), SinkError>;

    fn key_up(&mut self, key: KeyId) -> Result<(), SinkError>;

    /// Forward one detected edge
    fn send(&mut self, event: &KeyEvent) -> Result<(), SinkError> {
        match event.transition {
            Transition::Pressed => self.key_down(event.key),
            Transition::Released => self.key_up(event.key),
        }
    }
}

/// Logs key transitions instead of injecting them (`--dry-run`)
#[derive(Debug, Default)]
pub struct LogSink;

impl InputSink for LogSink {
    fn key_down(&mut self, key: KeyId) -> Result<(), SinkError> {
        info!("key down {}", key);
        Ok(())
    }

    fn key_up(&mut self, key: KeyId) -> Result<(), SinkError> {
        info!("key up   {}", key);
        Ok(())
    }
}
