//  ____ _____ ____  _   _ __  __ ____   ___    _    ____  ____
// / ___|_   _|  _ \| | | |  \/  | __ ) / _ \  / \  |  _ \|  _ \
// \___ \ | | | |_) | | | | |\/| |  _ \| | | |/ _ \ | |_) | | | |
//  ___) || | |  _ <| |_| | |  | | |_) | |_| / ___ \|  _ <| |_| |
// |____/ |_| |_| \_\\___/|_|  |_|____/ \___/_/   \_\_| \_\____/

//! Chord keyboard and strumplate instrument.
//!
//! Each chord key sounds a whole chord (row picks the quality, column the root), and sweeping
//! across the strumplate plays the held chord one string at a time.

pub mod error;
pub mod theory;
pub mod waveform;
pub mod instrument;
pub mod keymap;
pub mod strumplate;
pub mod knob;
pub mod voice;
pub mod patch;
pub mod controller;
pub mod engine;
pub mod score;

pub use error::StrumError;
pub use theory::{Chord, ChordType, Interval, Letter, Note, Pitch, chord_notes, midi_to_freq};
pub use waveform::WaveformType;
pub use instrument::Instrument;
pub use keymap::{HeldKeys, Key, KeyRow, Keymap, Modifier};
pub use strumplate::{StrumTracker, Strumplate};
pub use knob::Knob;
pub use voice::{Envelope, NoteSink, VoiceBank};
pub use patch::Patch;
pub use controller::Performer;
pub use engine::SynthEngine;
pub use score::{Action, Score, render_score, write_wav};
