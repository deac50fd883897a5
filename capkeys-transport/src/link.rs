//! Serial link lifecycle
//!
//! `SerialLink` tracks which port is targeted, whether a connection is open
//! and which port names the host exposed at the last refresh. It never
//! retries on its own: the caller decides what a failed read means.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::LinkError;
use crate::types::{LinkStatus, PortInfo, SerialSettings};
use crate::{ByteSource, PortDiscovery};

pub struct SerialLink {
    discovery: Arc<dyn PortDiscovery>,
    settings: SerialSettings,
    /// Last port a successful open targeted
    port_name: Option<String>,
    connection: Option<Box<dyn ByteSource>>,
    /// Ports seen at the last enumeration
    available: Vec<PortInfo>,
}

impl SerialLink {
    pub fn new(discovery: Arc<dyn PortDiscovery>, settings: SerialSettings) -> Self {
        Self {
            discovery,
            settings,
            port_name: None,
            connection: None,
            available: Vec::new(),
        }
    }

    pub fn status(&self) -> LinkStatus {
        if self.connection.is_some() {
            LinkStatus::Open
        } else {
            LinkStatus::Closed
        }
    }

    pub fn is_open(&self) -> bool {
        self.connection.is_some()
    }

    /// Name of the port last opened, kept after a close for reporting
    pub fn port_name(&self) -> Option<&str> {
        self.port_name.as_deref()
    }

    /// Re-enumerate the host's ports
    pub fn refresh_ports(&mut self) -> Result<&[PortInfo], LinkError> {
        self.available = self.discovery.list_ports()?;
        debug!("Enumerated {} port(s)", self.available.len());
        Ok(&self.available)
    }

    /// Open `name`, replacing any current connection
    ///
    /// Fails with [`LinkError::PortUnavailable`] without touching the current
    /// connection if the host does not list `name`. Otherwise the current
    /// connection is closed before the open is attempted, so an
    /// [`LinkError::Open`] leaves the link closed.
    pub fn try_open(&mut self, name: &str) -> Result<(), LinkError> {
        self.refresh_ports()?;
        if !self.available.iter().any(|p| p.name == name) {
            return Err(LinkError::PortUnavailable(name.to_string()));
        }

        self.close();

        let connection = self.discovery.open_port(name, &self.settings)?;
        self.connection = Some(connection);
        self.port_name = Some(name.to_string());
        info!("Serial link open on {}", name);
        Ok(())
    }

    /// Read one byte from the open connection
    ///
    /// `Ok(None)` means the read timed out with nothing pending.
    pub fn read_byte(&mut self) -> Result<Option<u8>, LinkError> {
        let connection = self.connection.as_mut().ok_or(LinkError::NotOpen)?;
        connection.read_byte().map_err(|source| {
            let port = self.port_name.clone().unwrap_or_default();
            warn!("Read from {} failed: {}", port, source);
            LinkError::Read { port, source }
        })
    }

    /// Drop the connection. Safe to call when already closed.
    pub fn close(&mut self) {
        if self.connection.take().is_some() {
            debug!(
                "Closed serial link on {}",
                self.port_name.as_deref().unwrap_or("?")
            );
        }
    }
}
