//! Virtual keyboard device using evdev/uinput
//!
//! Creates a uinput keyboard that advertises every key in the vocabulary, so
//! synthesized presses look like a real keyboard to the desktop.

use evdev::{
    uinput::{VirtualDevice, VirtualDeviceBuilder},
    AttributeSet, EventType, InputEvent, Key,
};
use tracing::trace;

use crate::error::SinkError;
use crate::keys::KeyId;
use crate::sink::InputSink;

/// Key event values understood by the input layer
const KEY_RELEASED: i32 = 0;
const KEY_PRESSED: i32 = 1;

/// Virtual keyboard device
pub struct VirtualKeyboard {
    device: VirtualDevice,
}

impl VirtualKeyboard {
    /// Create a new virtual keyboard device
    ///
    /// # Arguments
    /// * `name` - Device name (shown in `evtest` and desktop input settings)
    pub fn new(name: &str) -> Result<Self, SinkError> {
        let mut keys = AttributeSet::<Key>::new();
        for &key in KeyId::ALL {
            keys.insert(key_id_to_code(key));
        }

        let device = VirtualDeviceBuilder::new()
            .map_err(SinkError::CreateDevice)?
            .name(name)
            .with_keys(&keys)
            .map_err(SinkError::CreateDevice)?
            .build()
            .map_err(SinkError::CreateDevice)?;

        Ok(Self { device })
    }

    /// Get the device path (e.g., /dev/input/eventX)
    pub fn device_path(&mut self) -> Option<std::path::PathBuf> {
        self.device
            .enumerate_dev_nodes_blocking()
            .ok()?
            .next()?
            .ok()
    }

    fn emit_key(&mut self, key: KeyId, value: i32) -> Result<(), SinkError> {
        let code = key_id_to_code(key);
        trace!("uinput {:?} = {}", code, value);
        // emit() appends the SYN_REPORT
        self.device
            .emit(&[InputEvent::new(EventType::KEY, code.code(), value)])
            .map_err(SinkError::EmitEvent)
    }
}

impl InputSink for VirtualKeyboard {
    fn key_down(&mut self, key: KeyId) -> Result<(), SinkError> {
        self.emit_key(key, KEY_PRESSED)
    }

    fn key_up(&mut self, key: KeyId) -> Result<(), SinkError> {
        self.emit_key(key, KEY_RELEASED)
    }
}

/// Convert our KeyId to the evdev key code
fn key_id_to_code(key: KeyId) -> Key {
    match key {
        KeyId::A => Key::KEY_A,
        KeyId::B => Key::KEY_B,
        KeyId::C => Key::KEY_C,
        KeyId::D => Key::KEY_D,
        KeyId::E => Key::KEY_E,
        KeyId::F => Key::KEY_F,
        KeyId::G => Key::KEY_G,
        KeyId::H => Key::KEY_H,
        KeyId::I => Key::KEY_I,
        KeyId::J => Key::KEY_J,
        KeyId::K => Key::KEY_K,
        KeyId::L => Key::KEY_L,
        KeyId::M => Key::KEY_M,
        KeyId::N => Key::KEY_N,
        KeyId::O => Key::KEY_O,
        KeyId::P => Key::KEY_P,
        KeyId::Q => Key::KEY_Q,
        KeyId::R => Key::KEY_R,
        KeyId::S => Key::KEY_S,
        KeyId::T => Key::KEY_T,
        KeyId::U => Key::KEY_U,
        KeyId::V => Key::KEY_V,
        KeyId::W => Key::KEY_W,
        KeyId::X => Key::KEY_X,
        KeyId::Y => Key::KEY_Y,
        KeyId::Z => Key::KEY_Z,
        KeyId::Digit0 => Key::KEY_0,
        KeyId::Digit1 => Key::KEY_1,
        KeyId::Digit2 => Key::KEY_2,
        KeyId::Digit3 => Key::KEY_3,
        KeyId::Digit4 => Key::KEY_4,
        KeyId::Digit5 => Key::KEY_5,
        KeyId::Digit6 => Key::KEY_6,
        KeyId::Digit7 => Key::KEY_7,
        KeyId::Digit8 => Key::KEY_8,
        KeyId::Digit9 => Key::KEY_9,
        KeyId::Minus => Key::KEY_MINUS,
        KeyId::Equal => Key::KEY_EQUAL,
        KeyId::LeftBracket => Key::KEY_LEFTBRACE,
        KeyId::RightBracket => Key::KEY_RIGHTBRACE,
        KeyId::Backslash => Key::KEY_BACKSLASH,
        KeyId::Semicolon => Key::KEY_SEMICOLON,
        KeyId::Apostrophe => Key::KEY_APOSTROPHE,
        KeyId::Grave => Key::KEY_GRAVE,
        KeyId::Comma => Key::KEY_COMMA,
        KeyId::Period => Key::KEY_DOT,
        KeyId::Slash => Key::KEY_SLASH,
    }
}
