//! Serial link layer for capacitive-touch sensor boards
//!
//! The board streams one byte per sample, each bit the state of one sensor.
//! This crate owns the connection lifecycle:
//!
//! ```text
//! [PortDiscovery]   ← enumerates and opens ports (serialport or a test double)
//!        |
//!   [SerialLink]     ← Closed/Open state, one connection at a time
//!        |
//!   [ByteSource]     ← the open connection, one byte per read
//! ```

pub mod error;
pub mod link;
pub mod types;

mod discovery;

pub use discovery::{SerialDiscovery, SerialPortSource};
pub use error::LinkError;
pub use link::SerialLink;
pub use types::{LinkStatus, PortInfo, PortKind, SerialSettings};

use std::io;

/// An open connection that yields the sensor byte stream
pub trait ByteSource: Send {
    /// Read the next byte
    ///
    /// # Returns
    /// `Ok(None)` if nothing arrived within the read timeout,
    /// `Err` if the connection is gone.
    fn read_byte(&mut self) -> io::Result<Option<u8>>;
}

/// Port enumeration and opening
///
/// Implemented by [`SerialDiscovery`] for real hardware.
pub trait PortDiscovery: Send + Sync {
    /// List the ports the host currently exposes
    fn list_ports(&self) -> Result<Vec<PortInfo>, LinkError>;

    /// Open a port by name
    ///
    /// Implementations report OS-level failures as [`LinkError::Open`].
    fn open_port(
        &self,
        name: &str,
        settings: &SerialSettings,
    ) -> Result<Box<dyn ByteSource>, LinkError>;
}
