//! Press/release edge detection over sensor samples
//!
//! Each sample is compared against the remembered pressed state of every
//! monitored bit; only 0→1 and 1→0 changes produce events. There is no
//! filtering beyond that, the board debounces in hardware.

use crate::keymap::KeyMapping;
use crate::keys::KeyId;

/// Edge direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Pressed,
    Released,
}

/// A single key transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// Sensor bit that changed
    pub bit: u8,
    pub key: KeyId,
    pub transition: Transition,
}

/// Remembered pressed state, one flag per monitored bit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyState {
    pressed: Vec<bool>,
}

impl KeyState {
    /// All-released state for `width` bits
    pub fn new(width: usize) -> Self {
        Self {
            pressed: vec![false; width],
        }
    }

    /// Forget every press and resize to `width` bits
    pub fn reset(&mut self, width: usize) {
        self.pressed.clear();
        self.pressed.resize(width, false);
    }

    pub fn len(&self) -> usize {
        self.pressed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pressed.is_empty()
    }

    pub fn is_pressed(&self, bit: usize) -> bool {
        self.pressed.get(bit).copied().unwrap_or(false)
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.pressed
    }

    /// Bits currently held
    pub fn held_bits(&self) -> impl Iterator<Item = usize> + '_ {
        self.pressed
            .iter()
            .enumerate()
            .filter(|(_, down)| **down)
            .map(|(bit, _)| bit)
    }
}

impl From<Vec<bool>> for KeyState {
    fn from(pressed: Vec<bool>) -> Self {
        Self { pressed }
    }
}

/// Apply one sample, calling `emit` for each transition in bit order
///
/// Bits at or beyond the mapping width are ignored. Returns the number of
/// events emitted.
pub fn detect_edges(
    sample: u8,
    state: &mut KeyState,
    mapping: &KeyMapping,
    mut emit: impl FnMut(KeyEvent),
) -> usize {
    let mut emitted = 0;

    // zip stops at the shorter of mapping and state
    for (bit, (&key, was_down)) in mapping
        .keys()
        .iter()
        .zip(state.pressed.iter_mut())
        .enumerate()
    {
        let is_down = (sample >> bit) & 1 == 1;
        let transition = match (*was_down, is_down) {
            (false, true) => Transition::Pressed,
            (true, false) => Transition::Released,
            _ => continue,
        };
        *was_down = is_down;
        emit(KeyEvent {
            bit: bit as u8,
            key,
            transition,
        });
        emitted += 1;
    }

    emitted
}
