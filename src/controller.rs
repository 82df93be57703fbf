use std::collections::HashMap;
use crate::keymap::{HeldKeys, Key, Keymap};
use crate::patch::Patch;
use crate::strumplate::{StrumTracker, Strumplate};
use crate::theory::{Chord, Note};
use crate::voice::NoteSink;

/// Turns key presses and strumplate sweeps into note triggers.
///
/// Chord tones are reference counted by MIDI number: two held chords sharing a tone attack it
/// once, and it is only released when the last chord sounding it is let go.
pub struct Performer {
    keymap: Keymap,
    strumplate: Strumplate,
    octave: i8,
    strum_length: f32,
    strum_humanize: f32,
    held: HeldKeys,
    tracker: StrumTracker,
    voiced: HashMap<Key, Vec<Note>>,
    sounding: HashMap<i32, (Note, usize)>,
}

impl Performer {
    pub fn new(keymap: Keymap, strumplate: Strumplate, octave: i8) -> Self {
        Performer {
            keymap,
            strumplate,
            octave,
            strum_length: crate::patch::DEFAULT_STRUM_LENGTH,
            strum_humanize: 0.0,
            held: HeldKeys::new(),
            tracker: StrumTracker::new(),
            voiced: HashMap::new(),
            sounding: HashMap::new(),
        }
    }

    pub fn from_patch(patch: &Patch) -> Self {
        let mut performer = Self::new(patch.keymap.clone(), patch.strumplate, patch.octave);
        performer.strum_length = patch.strum_length;
        performer.strum_humanize = patch.strum_humanize;
        performer
    }

    pub fn octave(&self) -> i8 {
        self.octave
    }

    /// Applies to chords pressed after the change.
    pub fn set_octave(&mut self, octave: i8) {
        self.octave = octave;
    }

    pub fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    pub fn strumplate(&self) -> &Strumplate {
        &self.strumplate
    }

    pub fn current_chord(&self) -> Option<Chord> {
        self.keymap.resolve_held(&self.held)
    }

    pub fn pressed_keys(&self) -> impl Iterator<Item = Key> + '_ {
        self.held.iter()
    }

    pub fn is_pressed(&self, key: Key) -> bool {
        self.held.contains(key)
    }

    /// Notes currently held by chord keys.
    pub fn sounding_notes(&self) -> Vec<Note> {
        let mut notes: Vec<Note> = self.sounding.values().map(|&(note, _)| note).collect();
        notes.sort_by_key(Note::midi);
        notes
    }

    /// Returns true if the key did something: a chord key or a modifier that was not already down.
    pub fn key_down(&mut self, key: Key, sink: &mut impl NoteSink) -> bool {
        let is_chord = self.keymap.is_chord_key(key);
        let is_modifier = self.keymap.modifier(key).is_some();
        if !(is_chord || is_modifier) || !self.held.press(key) {
            return false;
        }

        if is_chord {
            let Some(chord) = self.current_chord() else {
                return false;
            };
            log::debug!("{} down: {}", key, chord);
            let notes = self.voicing(&chord);
            for &note in &notes {
                self.hold(note, sink);
            }
            self.voiced.insert(key, notes);
        } else {
            self.revoice(sink);
        }
        true
    }

    pub fn key_up(&mut self, key: Key, sink: &mut impl NoteSink) -> bool {
        if !self.held.release(key) {
            return false;
        }

        if let Some(notes) = self.voiced.remove(&key) {
            log::debug!("{} up", key);
            for note in notes {
                self.let_go(note, sink);
            }
        } else if self.keymap.modifier(key).is_some() {
            self.revoice(sink);
        }
        true
    }

    /// Moves the pointer to `x` (0.0..=1.0 across the plate) and plays every string crossed.
    pub fn strum(&mut self, x: f32, sink: &mut impl NoteSink) -> Vec<Note> {
        let segments = self.tracker.sweep_to(&self.strumplate, x);
        let Some(chord) = self.current_chord() else {
            return Vec::new();
        };

        let mut played = Vec::with_capacity(segments.len());
        for segment in segments {
            if let Some(note) = self.strumplate.note_for_segment(&chord, segment) {
                let velocity = 1.0 - self.strum_humanize * fastrand::f32();
                sink.trigger_attack_release(note, self.strum_length, velocity);
                played.push(note);
            }
        }
        played
    }

    /// The pointer left the plate.
    pub fn lift(&mut self) {
        self.tracker.lift();
    }

    pub fn release_all(&mut self, sink: &mut impl NoteSink) {
        for (_, (note, _)) in self.sounding.drain() {
            sink.trigger_release(note);
        }
        self.voiced.clear();
        self.held.clear();
        self.tracker.lift();
    }

    // Re-applies modifiers to the most recent chord key.
    fn revoice(&mut self, sink: &mut impl NoteSink) {
        let Some(key) = self.held.iter().rev().find(|&k| self.voiced.contains_key(&k)) else {
            return;
        };
        let Some(chord) = self.current_chord() else {
            return;
        };
        log::debug!("revoiced {} as {}", key, chord);

        let notes = self.voicing(&chord);
        // attack first so shared tones never drop to zero
        for &note in &notes {
            self.hold(note, sink);
        }
        if let Some(old) = self.voiced.insert(key, notes) {
            for note in old {
                self.let_go(note, sink);
            }
        }
    }

    // Tones pushed past the MIDI range by `set_octave` are left out.
    fn voicing(&self, chord: &Chord) -> Vec<Note> {
        chord.voiced(self.octave).into_iter().filter(Note::is_playable).collect()
    }

    fn hold(&mut self, note: Note, sink: &mut impl NoteSink) {
        let entry = self.sounding.entry(note.midi()).or_insert((note, 0));
        entry.1 += 1;
        if entry.1 == 1 {
            sink.trigger_attack(note, 1.0);
        }
    }

    fn let_go(&mut self, note: Note, sink: &mut impl NoteSink) {
        let midi = note.midi();
        let Some(entry) = self.sounding.get_mut(&midi) else {
            return;
        };
        entry.1 -= 1;
        if entry.1 == 0 {
            let (sounding_note, _) = entry.clone();
            self.sounding.remove(&midi);
            sink.trigger_release(sounding_note);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Attack(String),
        Release(String),
        Strum(String),
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<Event>,
        velocities: Vec<f32>,
    }

    impl NoteSink for Recorder {
        fn trigger_attack(&mut self, note: Note, _velocity: f32) {
            self.events.push(Event::Attack(note.to_string()));
        }

        fn trigger_release(&mut self, note: Note) {
            self.events.push(Event::Release(note.to_string()));
        }

        fn trigger_attack_release(&mut self, note: Note, _duration: f32, velocity: f32) {
            self.events.push(Event::Strum(note.to_string()));
            self.velocities.push(velocity);
        }
    }

    fn performer() -> Performer {
        Performer::from_patch(&Patch::default())
    }

    fn attacks(events: &[Event]) -> Vec<String> {
        events.iter().filter_map(|e| match e { Event::Attack(n) => Some(n.clone()), _ => None }).collect()
    }

    fn releases(events: &[Event]) -> Vec<String> {
        events.iter().filter_map(|e| match e { Event::Release(n) => Some(n.clone()), _ => None }).collect()
    }

    #[test]
    fn chord_key_attacks_and_releases_its_tones() {
        let mut p = performer();
        let mut sink = Recorder::default();
        assert!(p.key_down(Key::Digit1, &mut sink));
        assert_eq!(attacks(&sink.events), ["Db4", "F4", "Ab4"]);
        assert!(p.key_up(Key::Digit1, &mut sink));
        let mut released = releases(&sink.events);
        released.sort();
        assert_eq!(released, ["Ab4", "Db4", "F4"]);
        assert!(p.sounding_notes().is_empty());
    }

    #[test]
    fn auto_repeat_and_unmapped_keys_do_nothing() {
        let mut p = performer();
        let mut sink = Recorder::default();
        p.key_down(Key::Digit6, &mut sink);
        assert!(!p.key_down(Key::Digit6, &mut sink));
        assert!(!p.key_down(Key::KeyZ, &mut sink));
        assert!(!p.key_up(Key::KeyZ, &mut sink));
        assert_eq!(sink.events.len(), 3);
    }

    #[test]
    fn shared_tones_survive_until_last_chord_released() {
        let mut p = performer();
        let mut sink = Recorder::default();
        p.key_down(Key::Digit6, &mut sink); // C major: C4 E4 G4
        p.key_down(Key::Digit7, &mut sink); // G major: G4 B4 D4
        assert_eq!(attacks(&sink.events), ["C4", "E4", "G4", "B4", "D4"]);

        sink.events.clear();
        p.key_up(Key::Digit6, &mut sink);
        let mut released = releases(&sink.events);
        released.sort();
        assert_eq!(released, ["C4", "E4"]);
        assert_eq!(p.current_chord().unwrap().to_string(), "G major");
    }

    #[test]
    fn modifier_revoices_held_chord() {
        let mut p = performer();
        let mut sink = Recorder::default();
        p.key_down(Key::KeyY, &mut sink); // C minor
        sink.events.clear();

        assert!(p.key_down(Key::Comma, &mut sink));
        assert_eq!(attacks(&sink.events), ["Bb4"]);
        assert!(releases(&sink.events).is_empty());
        assert_eq!(p.current_chord().unwrap().to_string(), "C minor seventh");

        sink.events.clear();
        p.key_up(Key::Comma, &mut sink);
        assert_eq!(releases(&sink.events), ["Bb4"]);
    }

    #[test]
    fn strum_follows_held_chord() {
        let mut p = performer();
        let mut sink = Recorder::default();
        assert!(p.strum(0.0, &mut sink).is_empty());

        p.key_down(Key::Digit6, &mut sink);
        sink.events.clear();
        let played: Vec<String> = p.strum(0.3, &mut sink).iter().map(|n| n.to_string()).collect();
        assert_eq!(played, ["E3", "G3", "C4"]);
        assert_eq!(sink.events, vec![
            Event::Strum("E3".to_string()),
            Event::Strum("G3".to_string()),
            Event::Strum("C4".to_string()),
        ]);

        p.lift();
        let played = p.strum(0.0, &mut sink);
        assert_eq!(played.len(), 1);
    }

    #[test]
    fn release_all_clears_everything() {
        let mut p = performer();
        let mut sink = Recorder::default();
        p.key_down(Key::Digit6, &mut sink);
        p.key_down(Key::KeyA, &mut sink);
        p.release_all(&mut sink);
        assert!(p.sounding_notes().is_empty());
        assert_eq!(p.pressed_keys().count(), 0);
        assert_eq!(p.current_chord(), None);
    }

    #[test]
    fn modifier_held_before_chord_key_applies() {
        let mut p = performer();
        let mut sink = Recorder::default();
        assert!(p.key_down(Key::Period, &mut sink));
        assert!(sink.events.is_empty());

        p.key_down(Key::Digit6, &mut sink);
        assert_eq!(p.current_chord().unwrap().to_string(), "C suspended second");
        assert_eq!(attacks(&sink.events), ["C4", "D4", "G4"]);
    }

    #[test]
    fn humanized_strums_stay_within_range() {
        let patch = Patch::parse("strum_humanize: 0.4").unwrap();
        let mut p = Performer::from_patch(&patch);
        let mut sink = Recorder::default();
        p.key_down(Key::Digit6, &mut sink);
        p.strum(0.0, &mut sink);
        p.strum(1.0, &mut sink);
        p.strum(0.0, &mut sink);

        assert_eq!(sink.velocities.len(), 13 + 12);
        assert!(sink.velocities.iter().all(|v| (0.6..=1.0).contains(v)));

        let mut plain = performer();
        let mut sink = Recorder::default();
        plain.key_down(Key::Digit6, &mut sink);
        plain.strum(0.0, &mut sink);
        plain.strum(1.0, &mut sink);
        assert!(sink.velocities.iter().all(|&v| v == 1.0));
    }

    #[test]
    fn extreme_octave_drops_unplayable_tones() {
        let mut p = performer();
        let mut sink = Recorder::default();
        p.set_octave(9);
        p.key_down(Key::Digit6, &mut sink); // C9 E9 G9 all fit
        assert_eq!(attacks(&sink.events), ["C9", "E9", "G9"]);
        p.key_up(Key::Digit6, &mut sink);

        sink.events.clear();
        p.key_down(Key::Digit7, &mut sink); // B9 and D9 of G major, G9 fits
        assert_eq!(attacks(&sink.events), ["G9", "D9"]);
    }
}
