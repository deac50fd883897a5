//! Key side of the capacitive keyboard bridge
//!
//! Turns sensor samples into key presses: a [`KeyMapping`] assigns keys to
//! sensor bits, [`detect_edges`] finds press/release transitions against a
//! [`KeyState`], and an [`InputSink`] performs them on the host.

pub mod edge;
pub mod error;
pub mod keymap;
pub mod keys;
pub mod sink;
#[cfg(target_os = "linux")]
pub mod virtual_keyboard;

pub use edge::{detect_edges, KeyEvent, KeyState, Transition};
pub use error::{KeyMapError, SinkError};
pub use keymap::{KeyMapping, MAX_SENSORS};
pub use keys::KeyId;
pub use sink::{InputSink, LogSink};
#[cfg(target_os = "linux")]
pub use virtual_keyboard::VirtualKeyboard;
