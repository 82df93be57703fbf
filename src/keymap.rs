use std::collections::HashSet;
use std::fmt;
use crate::error::StrumError;
use crate::theory::{Chord, ChordType, Letter, Pitch};

// Variant names double as the physical key code strings (`KeyboardEvent.code` naming).
macro_rules! keys {
    ($($variant:ident),* $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Key {
            $($variant),*
        }

        impl Key {
            pub const ALL: &'static [Key] = &[$(Key::$variant),*];

            pub fn code(&self) -> &'static str {
                match self {
                    $(Key::$variant => stringify!($variant)),*
                }
            }
        }
    };
}

keys! {
    Digit1, Digit2, Digit3, Digit4, Digit5, Digit6, Digit7, Digit8, Digit9, Digit0,
    Minus, Equal, Backspace,
    KeyQ, KeyW, KeyE, KeyR, KeyT, KeyY, KeyU, KeyI, KeyO, KeyP,
    BracketLeft, BracketRight, Backslash,
    KeyA, KeyS, KeyD, KeyF, KeyG, KeyH, KeyJ, KeyK, KeyL,
    Semicolon, Quote, Enter,
    KeyZ, KeyX, KeyC, KeyV, KeyB, KeyN, KeyM,
    Comma, Period, Slash,
    Space, Escape, ArrowUp, ArrowDown, ArrowLeft, ArrowRight,
}

impl Key {
    pub fn from_code(code: &str) -> Result<Key, StrumError> {
        let code = code.trim();
        Key::ALL.iter()
            .copied()
            .find(|key| key.code() == code)
            .ok_or_else(|| StrumError::UnknownKey(code.to_string()))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Keys that change the quality of the chord held alongside them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    Seventh,
    Sus2,
    Sus4,
}

impl Modifier {
    pub fn apply(&self, chord_type: ChordType) -> ChordType {
        match self {
            Modifier::Seventh => chord_type.with_seventh(),
            Modifier::Sus2 => ChordType::Sus2,
            Modifier::Sus4 => ChordType::Sus4,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyRow {
    pub chord_type: ChordType,
    pub keys: Vec<Key>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Keymap {
    pub rows: Vec<KeyRow>,
    pub roots: Vec<Pitch>, // one per column
    pub modifiers: Vec<(Key, Modifier)>,
}

impl Default for Keymap {
    fn default() -> Self {
        use Key::*;
        use Letter as L;

        Keymap {
            rows: vec![
                KeyRow {
                    chord_type: ChordType::Major,
                    keys: vec![Digit1, Digit2, Digit3, Digit4, Digit5, Digit6, Digit7, Digit8, Digit9, Digit0, Minus, Equal],
                },
                KeyRow {
                    chord_type: ChordType::Minor,
                    // O comes before U and I in this row
                    keys: vec![KeyQ, KeyW, KeyE, KeyR, KeyT, KeyY, KeyO, KeyU, KeyI, KeyP, BracketLeft, BracketRight],
                },
                KeyRow {
                    chord_type: ChordType::MajorSeventh,
                    keys: vec![KeyA, KeyS, KeyD, KeyF, KeyG, KeyH, KeyJ, KeyK, KeyL, Semicolon, Quote, Backslash],
                },
            ],
            // Circle of fifths, so neighbouring columns are closely related keys
            roots: vec![
                Pitch::new(L::D, -1),
                Pitch::new(L::A, -1),
                Pitch::new(L::E, -1),
                Pitch::new(L::B, -1),
                Pitch::natural(L::F),
                Pitch::natural(L::C),
                Pitch::natural(L::G),
                Pitch::natural(L::D),
                Pitch::natural(L::A),
                Pitch::natural(L::E),
                Pitch::natural(L::B),
                Pitch::new(L::F, 1),
            ],
            modifiers: vec![
                (Comma, Modifier::Seventh),
                (Period, Modifier::Sus2),
                (Slash, Modifier::Sus4),
            ],
        }
    }
}

impl Keymap {
    /// Row gives the chord quality, column gives the root.
    pub fn resolve(&self, key: Key) -> Option<Chord> {
        self.rows.iter().find_map(|row| {
            let column = row.keys.iter().position(|&k| k == key)?;
            let root = *self.roots.get(column)?;
            Some(Chord::new(root, row.chord_type))
        })
    }

    pub fn modifier(&self, key: Key) -> Option<Modifier> {
        self.modifiers.iter().find(|(k, _)| *k == key).map(|&(_, m)| m)
    }

    pub fn is_chord_key(&self, key: Key) -> bool {
        self.resolve(key).is_some()
    }

    /// The most recently pressed chord key wins; held modifiers are applied in press order.
    pub fn resolve_held(&self, held: &HeldKeys) -> Option<Chord> {
        let chord = held.iter().rev().find_map(|key| self.resolve(key))?;
        let chord_type = held.iter()
            .filter_map(|key| self.modifier(key))
            .fold(chord.chord_type, |chord_type, modifier| modifier.apply(chord_type));
        Some(chord.with_type(chord_type))
    }

    /// Every chord some combination of held keys can produce.
    pub fn chords(&self) -> Vec<Chord> {
        let mut chords = Vec::new();
        for row in &self.rows {
            let mut types = vec![row.chord_type];
            let mut next = 0;
            while next < types.len() {
                for &(_, modifier) in &self.modifiers {
                    let altered = modifier.apply(types[next]);
                    if !types.contains(&altered) {
                        types.push(altered);
                    }
                }
                next += 1;
            }

            for &root in self.roots.iter().take(row.keys.len()) {
                for &chord_type in &types {
                    let chord = Chord::new(root, chord_type);
                    if !chords.contains(&chord) {
                        chords.push(chord);
                    }
                }
            }
        }
        chords
    }

    pub fn validate(&self) -> Result<(), StrumError> {
        if self.roots.is_empty() {
            return Err(StrumError::InvalidInstrument("Keymap has no roots".to_string()));
        }

        let mut seen = HashSet::new();
        let all_keys = self.rows.iter()
            .flat_map(|row| row.keys.iter().copied())
            .chain(self.modifiers.iter().map(|&(key, _)| key));
        for key in all_keys {
            if !seen.insert(key) {
                return Err(StrumError::InvalidInstrument(format!("Key {} is mapped twice", key)));
            }
        }

        for row in &self.rows {
            if row.keys.len() > self.roots.len() {
                log::warn!(
                    "{} row has {} keys but only {} roots; extra keys are silent",
                    row.chord_type, row.keys.len(), self.roots.len()
                );
            }
        }
        Ok(())
    }
}

/// Pressed keys in the order they went down.
#[derive(Debug, Clone, Default)]
pub struct HeldKeys {
    keys: Vec<Key>,
}

impl HeldKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when the key was already down (keyboard auto-repeat).
    pub fn press(&mut self, key: Key) -> bool {
        if self.contains(key) {
            return false;
        }
        self.keys.push(key);
        true
    }

    pub fn release(&mut self, key: Key) -> bool {
        let before = self.keys.len();
        self.keys.retain(|&k| k != key);
        self.keys.len() != before
    }

    pub fn contains(&self, key: Key) -> bool {
        self.keys.contains(&key)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = Key> + '_ {
        self.keys.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }
}
