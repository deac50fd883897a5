//! Sensor bit to key mapping
//!
//! A mapping is configured as a string of single characters: the `i`th
//! accepted character is the key driven by bit `i` of each sample. `"DFJK"`
//! maps bit 0 to D, bit 1 to F, and so on.

use tracing::warn;

use crate::error::KeyMapError;
use crate::keys::KeyId;

/// Bits in one sample byte
pub const MAX_SENSORS: usize = 8;

/// Ordered bit-position → key assignment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyMapping {
    keys: Vec<KeyId>,
}

impl KeyMapping {
    /// Build a mapping from a configuration string
    ///
    /// Unsupported characters, and characters past the eighth accepted key,
    /// are dropped and returned alongside the mapping. This never fails as a
    /// whole; an empty string monitors no bits.
    ///
    /// Bits are assigned to accepted keys in order, so a dropped character
    /// does not hold a bit: `"A?B"` maps bit 0 to A and bit 1 to B.
    pub fn build(chars: &str) -> (KeyMapping, Vec<KeyMapError>) {
        let mut keys = Vec::with_capacity(MAX_SENSORS);
        let mut rejected = Vec::new();

        for (position, ch) in chars.chars().enumerate() {
            match KeyId::from_char(ch) {
                Some(_) if keys.len() == MAX_SENSORS => {
                    rejected.push(KeyMapError::BeyondSensorWidth { ch, position });
                }
                Some(key) => keys.push(key),
                None => rejected.push(KeyMapError::UnrecognizedKeyChar(ch)),
            }
        }

        for e in &rejected {
            warn!("Skipping key: {}", e);
        }

        (KeyMapping { keys }, rejected)
    }

    /// Number of monitored bits
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Key assigned to bit `bit`
    pub fn key(&self, bit: usize) -> Option<KeyId> {
        self.keys.get(bit).copied()
    }

    pub fn keys(&self) -> &[KeyId] {
        &self.keys
    }

    /// Mapping back as its configuration string
    pub fn to_chars(&self) -> String {
        self.keys.iter().map(|k| k.as_char()).collect()
    }
}

impl std::fmt::Display for KeyMapping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.keys.is_empty() {
            return write!(f, "(none)");
        }
        for (bit, key) in self.keys.iter().enumerate() {
            if bit > 0 {
                write!(f, " ")?;
            }
            write!(f, "{bit}:{key}")?;
        }
        Ok(())
    }
}
