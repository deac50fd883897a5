//! Supported key vocabulary
//!
//! A mapping character is uppercased and looked up here. Only keys that can
//! be typed without a modifier are supported, so `!` or `?` are rejected.

/// Host-independent key identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyId {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,
    Digit0,
    Digit1,
    Digit2,
    Digit3,
    Digit4,
    Digit5,
    Digit6,
    Digit7,
    Digit8,
    Digit9,
    Minus,
    Equal,
    LeftBracket,
    RightBracket,
    Backslash,
    Semicolon,
    Apostrophe,
    Grave,
    Comma,
    Period,
    Slash,
}

impl KeyId {
    /// Every supported key, in vocabulary order
    pub const ALL: &'static [KeyId] = &[
        KeyId::A,
        KeyId::B,
        KeyId::C,
        KeyId::D,
        KeyId::E,
        KeyId::F,
        KeyId::G,
        KeyId::H,
        KeyId::I,
        KeyId::J,
        KeyId::K,
        KeyId::L,
        KeyId::M,
        KeyId::N,
        KeyId::O,
        KeyId::P,
        KeyId::Q,
        KeyId::R,
        KeyId::S,
        KeyId::T,
        KeyId::U,
        KeyId::V,
        KeyId::W,
        KeyId::X,
        KeyId::Y,
        KeyId::Z,
        KeyId::Digit0,
        KeyId::Digit1,
        KeyId::Digit2,
        KeyId::Digit3,
        KeyId::Digit4,
        KeyId::Digit5,
        KeyId::Digit6,
        KeyId::Digit7,
        KeyId::Digit8,
        KeyId::Digit9,
        KeyId::Minus,
        KeyId::Equal,
        KeyId::LeftBracket,
        KeyId::RightBracket,
        KeyId::Backslash,
        KeyId::Semicolon,
        KeyId::Apostrophe,
        KeyId::Grave,
        KeyId::Comma,
        KeyId::Period,
        KeyId::Slash,
    ];

    /// Look up a mapping character (case-insensitive)
    pub fn from_char(ch: char) -> Option<KeyId> {
        let upper = ch.to_ascii_uppercase();
        KeyId::ALL.iter().copied().find(|k| k.as_char() == upper)
    }

    /// The character that selects this key in a mapping string
    pub fn as_char(&self) -> char {
        match self {
            KeyId::A => 'A',
            KeyId::B => 'B',
            KeyId::C => 'C',
            KeyId::D => 'D',
            KeyId::E => 'E',
            KeyId::F => 'F',
            KeyId::G => 'G',
            KeyId::H => 'H',
            KeyId::I => 'I',
            KeyId::J => 'J',
            KeyId::K => 'K',
            KeyId::L => 'L',
            KeyId::M => 'M',
            KeyId::N => 'N',
            KeyId::O => 'O',
            KeyId::P => 'P',
            KeyId::Q => 'Q',
            KeyId::R => 'R',
            KeyId::S => 'S',
            KeyId::T => 'T',
            KeyId::U => 'U',
            KeyId::V => 'V',
            KeyId::W => 'W',
            KeyId::X => 'X',
            KeyId::Y => 'Y',
            KeyId::Z => 'Z',
            KeyId::Digit0 => '0',
            KeyId::Digit1 => '1',
            KeyId::Digit2 => '2',
            KeyId::Digit3 => '3',
            KeyId::Digit4 => '4',
            KeyId::Digit5 => '5',
            KeyId::Digit6 => '6',
            KeyId::Digit7 => '7',
            KeyId::Digit8 => '8',
            KeyId::Digit9 => '9',
            KeyId::Minus => '-',
            KeyId::Equal => '=',
            KeyId::LeftBracket => '[',
            KeyId::RightBracket => ']',
            KeyId::Backslash => '\\',
            KeyId::Semicolon => ';',
            KeyId::Apostrophe => '\'',
            KeyId::Grave => '`',
            KeyId::Comma => ',',
            KeyId::Period => '.',
            KeyId::Slash => '/',
        }
    }
}

impl std::fmt::Display for KeyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}
