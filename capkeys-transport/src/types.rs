//! Common types for the serial link

use std::time::Duration;

/// What kind of hardware sits behind a port name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortKind {
    Usb {
        vid: u16,
        pid: u16,
        product: Option<String>,
    },
    Bluetooth,
    Pci,
    Unknown,
}

impl PortKind {
    /// Short label for listings
    pub fn label(&self) -> String {
        match self {
            PortKind::Usb { vid, pid, product } => match product {
                Some(p) => format!("USB {vid:04x}:{pid:04x} {p}"),
                None => format!("USB {vid:04x}:{pid:04x}"),
            },
            PortKind::Bluetooth => "Bluetooth".to_string(),
            PortKind::Pci => "PCI".to_string(),
            PortKind::Unknown => "Unknown".to_string(),
        }
    }
}

/// An enumerable port as reported by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// OS port name (`/dev/ttyACM0`, `COM3`, ...)
    pub name: String,
    pub kind: PortKind,
}

impl PortInfo {
    pub fn new(name: impl Into<String>, kind: PortKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Line settings used when opening a port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialSettings {
    pub baud_rate: u32,
    /// Upper bound on how long a single read may block
    pub read_timeout: Duration,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            read_timeout: Duration::from_millis(10),
        }
    }
}

/// Open/closed status of the link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Closed,
    Open,
}

impl LinkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkStatus::Closed => "closed",
            LinkStatus::Open => "open",
        }
    }
}
