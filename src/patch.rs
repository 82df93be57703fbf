use std::error::Error;
use std::path::Path;
use crate::error::StrumError;
use crate::instrument::Instrument;
use crate::keymap::{Key, KeyRow, Keymap, Modifier};
use crate::strumplate::{MAX_SEGMENTS, Strumplate};
use crate::theory::{ChordType, Pitch};
use crate::waveform::WaveformType;

pub const DEFAULT_OCTAVE: i8 = 4;
pub const DEFAULT_STRUM_LENGTH: f32 = 0.25; // an eighth note at 120 bpm

/// Everything configurable about the instrument, loaded from a `key: value` patch file.
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    pub instrument: Instrument,
    pub keymap: Keymap,
    pub strumplate: Strumplate,
    pub octave: i8, // octave chord keys sound in
    pub strum_length: f32,
    pub strum_humanize: f32, // 0.0 = every string at full velocity
}

impl Default for Patch {
    fn default() -> Self {
        Patch {
            instrument: Instrument::default(),
            keymap: Keymap::default(),
            strumplate: Strumplate::default(),
            octave: DEFAULT_OCTAVE,
            strum_length: DEFAULT_STRUM_LENGTH,
            strum_humanize: 0.0,
        }
    }
}

impl Patch {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| StrumError::FileError(format!("{}: {}", path.display(), e)))?;
        let patch = Patch::parse(&content)?;
        log::info!("Loaded patch '{}' from {}", patch.instrument.name, path.display());
        Ok(patch)
    }

    pub fn parse(content: &str) -> Result<Self, StrumError> {
        let mut patch = Patch::default();
        let mut custom_rows = false;
        let mut custom_modifiers = false;

        macro_rules! parse_field {
            ($line:expr, $prefix:expr, $field:expr) => {
                if let Some(v) = $line.strip_prefix($prefix) {
                    $field = v.trim().parse()
                        .map_err(|_| StrumError::ParseError(format!("Invalid {} '{}'", $prefix, v.trim())))?;
                    continue;
                }
            };
        }

        for line in content.lines() {
            let line = line.split("//").next().unwrap_or("").trim();
            if line.is_empty() { continue; } // Comments (//) & empty lines

            if let Some(v) = line.strip_prefix("name:") {
                patch.instrument.name = v.trim().to_string();

            } else if let Some(v) = line.strip_prefix("waveform:") {
                patch.instrument.waveform = WaveformType::parse(v)
                    .ok_or_else(|| StrumError::ParseError(format!("Unknown waveform '{}'", v.trim())))?;

            } else if let Some(v) = line.strip_prefix("partials:") {
                let amplitudes: Result<Vec<f32>, _> = split_list(v).map(|a| a.parse::<f32>()).collect();
                let amplitudes = amplitudes
                    .map_err(|_| StrumError::ParseError(format!("Invalid partials '{}'", v.trim())))?;
                if amplitudes.is_empty() {
                    return Err(StrumError::ParseError("partials: needs at least one amplitude".to_string()));
                }
                patch.instrument.waveform = WaveformType::Partials(amplitudes);

            } else if let Some(v) = line.strip_prefix("row:") {
                let (chord_type, keys) = v.split_once(':')
                    .ok_or_else(|| StrumError::ParseError(format!("row: expects '<chord type>: <keys>', got '{}'", v.trim())))?;
                let chord_type = ChordType::parse(chord_type)?;
                let keys: Result<Vec<Key>, _> = split_list(keys).map(Key::from_code).collect();

                if !custom_rows {
                    patch.keymap.rows.clear();
                    custom_rows = true;
                }
                patch.keymap.rows.push(KeyRow { chord_type, keys: keys? });

            } else if let Some(v) = line.strip_prefix("roots:") {
                let roots: Result<Vec<Pitch>, _> = split_list(v).map(Pitch::parse).collect();
                patch.keymap.roots = roots?;

            } else if let Some(v) = line.strip_prefix("modifier:") {
                let mut parts = split_list(v);
                let (Some(key), Some(kind), None) = (parts.next(), parts.next(), parts.next()) else {
                    return Err(StrumError::ParseError(format!("modifier: expects '<key> <kind>', got '{}'", v.trim())));
                };
                let modifier = match kind.to_lowercase().as_str() {
                    "seventh" | "7" => Modifier::Seventh,
                    "sus2" => Modifier::Sus2,
                    "sus4" => Modifier::Sus4,
                    _ => return Err(StrumError::ParseError(format!("Unknown modifier '{}'", kind))),
                };

                if !custom_modifiers {
                    patch.keymap.modifiers.clear();
                    custom_modifiers = true;
                }
                patch.keymap.modifiers.push((Key::from_code(key)?, modifier));

            } else {
                parse_field!(line, "attack:", patch.instrument.attack);
                parse_field!(line, "decay:", patch.instrument.decay);
                parse_field!(line, "sustain:", patch.instrument.sustain);
                parse_field!(line, "release:", patch.instrument.release);
                parse_field!(line, "volume:", patch.instrument.volume);
                parse_field!(line, "detune:", patch.instrument.detune);
                parse_field!(line, "polyphony:", patch.instrument.polyphony);
                parse_field!(line, "octave:", patch.octave);
                parse_field!(line, "strum_segments:", patch.strumplate.segments);
                parse_field!(line, "strum_octave:", patch.strumplate.base_octave);
                parse_field!(line, "strum_length:", patch.strum_length);
                parse_field!(line, "strum_humanize:", patch.strum_humanize);
                log::warn!("Ignoring unknown patch line '{}'", line);
            }
        }

        patch.validate()?;
        Ok(patch)
    }

    pub fn validate(&self) -> Result<(), StrumError> {
        self.instrument.validate()?;
        self.keymap.validate()?;
        if !(1..=MAX_SEGMENTS).contains(&self.strumplate.segments) {
            return Err(StrumError::InvalidInstrument(format!(
                "strum_segments must be within 1..={}, got {}", MAX_SEGMENTS, self.strumplate.segments
            )));
        }
        if !(self.strum_length >= 0.0) {
            return Err(StrumError::InvalidInstrument(format!("strum_length must be non-negative, got {}", self.strum_length)));
        }
        if !(0.0..=1.0).contains(&self.strum_humanize) {
            return Err(StrumError::InvalidInstrument(format!("strum_humanize must be within 0..1, got {}", self.strum_humanize)));
        }

        // Every reachable chord has to land on MIDI notes, from the keys and from every string
        for chord in self.keymap.chords() {
            if let Some(note) = chord.voiced(self.octave).into_iter().find(|note| !note.is_playable()) {
                return Err(StrumError::InvalidInstrument(format!(
                    "octave {} puts {} of {} outside the MIDI range", self.octave, note, chord
                )));
            }
            if self.strumplate.notes(&chord).len() < self.strumplate.segments {
                return Err(StrumError::InvalidInstrument(format!(
                    "strum_octave {} with {} segments runs {} outside the MIDI range",
                    self.strumplate.base_octave, self.strumplate.segments, chord
                )));
            }
        }
        Ok(())
    }
}

fn split_list(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| c == ',' || c.is_whitespace()).filter(|s| !s.is_empty())
}
