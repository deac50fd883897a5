//! Port discovery backed by the `serialport` crate

use std::io::{self, Read};

use serialport::{SerialPort, SerialPortType};
use tracing::{debug, warn};

use crate::error::LinkError;
use crate::types::{PortInfo, PortKind, SerialSettings};
use crate::{ByteSource, PortDiscovery};

/// Enumerates and opens OS serial ports
#[derive(Debug, Default, Clone, Copy)]
pub struct SerialDiscovery;

impl SerialDiscovery {
    pub fn new() -> Self {
        Self
    }
}

impl PortDiscovery for SerialDiscovery {
    fn list_ports(&self) -> Result<Vec<PortInfo>, LinkError> {
        let ports = serialport::available_ports()?;

        Ok(ports
            .into_iter()
            // On macOS only the cu.* (calling unit) nodes open without carrier detect
            .filter(|_p| {
                #[cfg(target_os = "macos")]
                {
                    !_p.port_name.starts_with("/dev/tty.")
                }
                #[cfg(not(target_os = "macos"))]
                {
                    true
                }
            })
            .map(|p| {
                let kind = match p.port_type {
                    SerialPortType::UsbPort(info) => PortKind::Usb {
                        vid: info.vid,
                        pid: info.pid,
                        product: info.product,
                    },
                    SerialPortType::BluetoothPort => PortKind::Bluetooth,
                    SerialPortType::PciPort => PortKind::Pci,
                    SerialPortType::Unknown => PortKind::Unknown,
                };
                PortInfo::new(p.port_name, kind)
            })
            .collect())
    }

    fn open_port(
        &self,
        name: &str,
        settings: &SerialSettings,
    ) -> Result<Box<dyn ByteSource>, LinkError> {
        let port = serialport::new(name, settings.baud_rate)
            .timeout(settings.read_timeout)
            .open()
            .map_err(|e| LinkError::Open {
                port: name.to_string(),
                reason: e.to_string(),
            })?;

        // Drop whatever the board sent before we were listening
        if let Err(e) = port.clear(serialport::ClearBuffer::Input) {
            warn!("Failed to clear input buffer on {}: {}", name, e);
        }
        debug!("Opened {} at {} baud", name, settings.baud_rate);

        Ok(Box::new(SerialPortSource::new(port)))
    }
}

/// An open OS serial port
pub struct SerialPortSource {
    port: Box<dyn SerialPort>,
}

impl SerialPortSource {
    pub fn new(port: Box<dyn SerialPort>) -> Self {
        Self { port }
    }
}

impl ByteSource for SerialPortSource {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut buf = [0u8; 1];
        match self.port.read(&mut buf) {
            Ok(0) => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "serial device returned end of stream",
            )),
            Ok(_) => Ok(Some(buf[0])),
            Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::Interrupted) => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
