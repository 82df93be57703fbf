use std::fmt;
use std::str::FromStr;
use crate::error::StrumError;

const NOTES_PER_OCTAVE: i32 = 12;
const A4_FREQ_HZ: f32 = 440.0;
const A4_MIDI_INDEX: i32 = 69;
pub const MAX_MIDI: i32 = 127;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Letter {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl Letter {
    const ALL: [Letter; 7] = [Letter::C, Letter::D, Letter::E, Letter::F, Letter::G, Letter::A, Letter::B];

    fn semitones(self) -> i32 {
        match self {
            Letter::C => 0,
            Letter::D => 2,
            Letter::E => 4,
            Letter::F => 5,
            Letter::G => 7,
            Letter::A => 9,
            Letter::B => 11,
        }
    }

    fn step(self, steps: i32) -> Letter {
        Self::ALL[(self as i32 + steps).rem_euclid(7) as usize]
    }

    fn from_char(c: char) -> Option<Letter> {
        match c.to_ascii_uppercase() {
            'C' => Some(Letter::C),
            'D' => Some(Letter::D),
            'E' => Some(Letter::E),
            'F' => Some(Letter::F),
            'G' => Some(Letter::G),
            'A' => Some(Letter::A),
            'B' => Some(Letter::B),
            _ => None,
        }
    }
}

/// A distance counted both in letter names and in semitones, so that transposing keeps
/// the spelling a musician would expect (Db up a major third is F, not E#).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub steps: i32,
    pub semitones: i32,
}

impl Interval {
    pub const UNISON: Self = Self { steps: 0, semitones: 0 };
    pub const MAJOR_SECOND: Self = Self { steps: 1, semitones: 2 };
    pub const MINOR_THIRD: Self = Self { steps: 2, semitones: 3 };
    pub const MAJOR_THIRD: Self = Self { steps: 2, semitones: 4 };
    pub const PERFECT_FOURTH: Self = Self { steps: 3, semitones: 5 };
    pub const DIMINISHED_FIFTH: Self = Self { steps: 4, semitones: 6 };
    pub const PERFECT_FIFTH: Self = Self { steps: 4, semitones: 7 };
    pub const AUGMENTED_FIFTH: Self = Self { steps: 4, semitones: 8 };
    pub const MINOR_SEVENTH: Self = Self { steps: 6, semitones: 10 };
    pub const MAJOR_SEVENTH: Self = Self { steps: 6, semitones: 11 };
}

/// A spelled note name without an octave, e.g. `Db` or `F#`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pitch {
    pub letter: Letter,
    pub accidental: i8, // sharps positive, flats negative
}

impl Pitch {
    pub const fn new(letter: Letter, accidental: i8) -> Self {
        Pitch { letter, accidental }
    }

    pub const fn natural(letter: Letter) -> Self {
        Pitch { letter, accidental: 0 }
    }

    /// Pitch class in `0..12`, with C at 0.
    pub fn class(&self) -> u8 {
        (self.letter.semitones() + self.accidental as i32).rem_euclid(NOTES_PER_OCTAVE) as u8
    }

    pub fn transpose(&self, interval: Interval) -> Pitch {
        let letter = self.letter.step(interval.steps);
        let natural_distance = (letter.semitones() - self.letter.semitones()).rem_euclid(NOTES_PER_OCTAVE);
        let accidental = self.accidental as i32 + interval.semitones - natural_distance;
        Pitch { letter, accidental: accidental as i8 }
    }

    pub fn in_octave(self, octave: i8) -> Note {
        Note { pitch: self, octave }
    }

    pub fn parse(name: &str) -> Result<Pitch, StrumError> {
        let name = name.trim();
        let (pitch, rest) = Self::parse_prefix(name)?;
        if !rest.is_empty() {
            return Err(StrumError::ParseError(format!("Invalid note name '{}'", name)));
        }
        Ok(pitch)
    }

    // Letter plus any run of accidentals; returns the unparsed remainder.
    fn parse_prefix(text: &str) -> Result<(Pitch, &str), StrumError> {
        let mut chars = text.chars();
        let letter = chars.next()
            .and_then(Letter::from_char)
            .ok_or_else(|| StrumError::ParseError(format!("Invalid note name '{}'", text)))?;

        let rest = chars.as_str();
        let sharps = rest.chars().take_while(|&c| c == '#').count();
        let flats = if sharps == 0 { rest.chars().take_while(|&c| c == 'b').count() } else { 0 };
        let accidental = sharps as i8 - flats as i8;

        Ok((Pitch { letter, accidental }, &rest[sharps + flats..]))
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self.letter)?;
        let symbol = if self.accidental > 0 { "#" } else { "b" };
        for _ in 0..self.accidental.unsigned_abs() {
            f.write_str(symbol)?;
        }
        Ok(())
    }
}

impl FromStr for Pitch {
    type Err = StrumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pitch::parse(s)
    }
}

/// A pitch in a specific octave. The octave number belongs to the letter, so `Cb4`
/// sounds a semitone below `C4` (the same key as `B3`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Note {
    pub pitch: Pitch,
    pub octave: i8,
}

impl Note {
    pub fn midi(&self) -> i32 {
        (self.octave as i32 + 1) * NOTES_PER_OCTAVE + self.pitch.letter.semitones() + self.pitch.accidental as i32
    }

    pub fn freq(&self) -> f32 {
        midi_to_freq(self.midi())
    }

    pub fn is_playable(&self) -> bool {
        (0..=MAX_MIDI).contains(&self.midi())
    }

    pub fn parse(text: &str) -> Result<Note, StrumError> {
        let text = text.trim();
        let (pitch, rest) = Pitch::parse_prefix(text)?;
        let octave = rest.parse::<i8>()
            .map_err(|_| StrumError::ParseError(format!("Invalid octave in '{}'", text)))?;
        Ok(Note { pitch, octave })
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.pitch, self.octave)
    }
}

impl FromStr for Note {
    type Err = StrumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Note::parse(s)
    }
}

pub fn midi_to_freq(midi: i32) -> f32 {
    A4_FREQ_HZ * 2.0_f32.powf((midi - A4_MIDI_INDEX) as f32 / NOTES_PER_OCTAVE as f32)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChordType {
    Major,
    Minor,
    MajorSeventh,
    DominantSeventh,
    MinorSeventh,
    Diminished,
    Augmented,
    Sus2,
    Sus4,
}

impl ChordType {
    pub fn intervals(&self) -> &'static [Interval] {
        use Interval as I;
        match self {
            ChordType::Major => &[I::UNISON, I::MAJOR_THIRD, I::PERFECT_FIFTH],
            ChordType::Minor => &[I::UNISON, I::MINOR_THIRD, I::PERFECT_FIFTH],
            ChordType::MajorSeventh => &[I::UNISON, I::MAJOR_THIRD, I::PERFECT_FIFTH, I::MAJOR_SEVENTH],
            ChordType::DominantSeventh => &[I::UNISON, I::MAJOR_THIRD, I::PERFECT_FIFTH, I::MINOR_SEVENTH],
            ChordType::MinorSeventh => &[I::UNISON, I::MINOR_THIRD, I::PERFECT_FIFTH, I::MINOR_SEVENTH],
            ChordType::Diminished => &[I::UNISON, I::MINOR_THIRD, I::DIMINISHED_FIFTH],
            ChordType::Augmented => &[I::UNISON, I::MAJOR_THIRD, I::AUGMENTED_FIFTH],
            ChordType::Sus2 => &[I::UNISON, I::MAJOR_SECOND, I::PERFECT_FIFTH],
            ChordType::Sus4 => &[I::UNISON, I::PERFECT_FOURTH, I::PERFECT_FIFTH],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ChordType::Major => "major",
            ChordType::Minor => "minor",
            ChordType::MajorSeventh => "major seventh",
            ChordType::DominantSeventh => "dominant seventh",
            ChordType::MinorSeventh => "minor seventh",
            ChordType::Diminished => "diminished",
            ChordType::Augmented => "augmented",
            ChordType::Sus2 => "suspended second",
            ChordType::Sus4 => "suspended fourth",
        }
    }

    /// Adds a seventh matching the third: minor chords take a minor seventh, the rest a major one.
    pub fn with_seventh(self) -> ChordType {
        match self {
            ChordType::Minor | ChordType::MinorSeventh => ChordType::MinorSeventh,
            ChordType::DominantSeventh => ChordType::DominantSeventh,
            _ => ChordType::MajorSeventh,
        }
    }

    pub fn parse(name: &str) -> Result<ChordType, StrumError> {
        let trimmed = name.trim();
        // "M" and "m" only differ by case
        match trimmed {
            "M" => return Ok(ChordType::Major),
            "m" => return Ok(ChordType::Minor),
            _ => {}
        }
        match trimmed.to_lowercase().as_str() {
            "major" | "maj" => Ok(ChordType::Major),
            "minor" | "min" => Ok(ChordType::Minor),
            "major seventh" | "maj7" => Ok(ChordType::MajorSeventh),
            "dominant seventh" | "seventh" | "7" | "dom7" => Ok(ChordType::DominantSeventh),
            "minor seventh" | "m7" | "min7" => Ok(ChordType::MinorSeventh),
            "diminished" | "dim" => Ok(ChordType::Diminished),
            "augmented" | "aug" => Ok(ChordType::Augmented),
            "suspended second" | "sus2" => Ok(ChordType::Sus2),
            "suspended fourth" | "sus4" | "sus" => Ok(ChordType::Sus4),
            _ => Err(StrumError::ParseError(format!("Unknown chord type '{}'", trimmed))),
        }
    }
}

impl fmt::Display for ChordType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ChordType {
    type Err = StrumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChordType::parse(s)
    }
}

/// Spelled chord tones, root first.
pub fn chord_notes(chord_type: ChordType, root: Pitch) -> Vec<Pitch> {
    chord_type.intervals().iter().map(|&interval| root.transpose(interval)).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Chord {
    pub root: Pitch,
    pub chord_type: ChordType,
}

impl Chord {
    pub fn new(root: Pitch, chord_type: ChordType) -> Self {
        Chord { root, chord_type }
    }

    pub fn notes(&self) -> Vec<Pitch> {
        chord_notes(self.chord_type, self.root)
    }

    /// Every tone gets the same octave number, so upper tones whose letter wraps past B
    /// land below the root rather than above it.
    pub fn voiced(&self, octave: i8) -> Vec<Note> {
        self.notes().into_iter().map(|pitch| pitch.in_octave(octave)).collect()
    }

    pub fn with_type(self, chord_type: ChordType) -> Chord {
        Chord { chord_type, ..self }
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.root, self.chord_type)
    }
}
