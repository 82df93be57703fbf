use crate::theory::{Chord, Note, Pitch};

/// Three octaves of a triad plus the top root.
pub const DEFAULT_SEGMENTS: usize = 3 * 4 + 1;
pub const DEFAULT_BASE_OCTAVE: i8 = 3;
/// One string per MIDI note.
pub const MAX_SEGMENTS: usize = 128;

/// A strip divided into equal segments ("strings"). Segment `i` plays chord tone
/// `i % tones`, one octave higher for every full pass through the chord.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Strumplate {
    pub segments: usize,
    pub base_octave: i8,
}

impl Default for Strumplate {
    fn default() -> Self {
        Strumplate { segments: DEFAULT_SEGMENTS, base_octave: DEFAULT_BASE_OCTAVE }
    }
}

impl Strumplate {
    pub fn new(segments: usize, base_octave: i8) -> Self {
        Strumplate { segments, base_octave }
    }

    /// `x` is the position across the plate, 0.0 at the left edge and 1.0 at the right.
    pub fn segment_at(&self, x: f32) -> Option<usize> {
        if !x.is_finite() || self.segments == 0 {
            return None;
        }
        let scaled = x.clamp(0.0, 1.0) * self.segments as f32;
        Some((scaled as usize).min(self.segments - 1))
    }

    pub fn note_for_segment(&self, chord: &Chord, segment: usize) -> Option<Note> {
        let tones = chord.notes();
        if tones.is_empty() || segment >= self.segments {
            return None;
        }
        let pitch = tones[segment % tones.len()];
        let octave = self.base_octave as i32 + (segment / tones.len()) as i32 + wraps_past_b(chord.root, pitch);
        let octave = i8::try_from(octave).ok()?;

        let note = pitch.in_octave(octave);
        note.is_playable().then_some(note)
    }

    /// Every segment's note, left to right.
    pub fn notes(&self, chord: &Chord) -> Vec<Note> {
        (0..self.segments).filter_map(|i| self.note_for_segment(chord, i)).collect()
    }
}

// Tones spelled with an earlier letter than the root sit in the next octave up, so each
// pass through the chord ascends.
fn wraps_past_b(root: Pitch, tone: Pitch) -> i32 {
    if (tone.letter as i32) < (root.letter as i32) { 1 } else { 0 }
}

/// Follows a pointer across a strumplate and reports the segments it passes over.
#[derive(Debug, Clone, Default)]
pub struct StrumTracker {
    last: Option<usize>,
}

impl StrumTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Segments entered since the previous position, in the order the pointer crossed them.
    /// A fast sweep still sounds every string in between.
    pub fn sweep_to(&mut self, plate: &Strumplate, x: f32) -> Vec<usize> {
        let Some(segment) = plate.segment_at(x) else {
            return Vec::new();
        };
        let crossed = match self.last {
            None => vec![segment],
            Some(last) if last == segment => Vec::new(),
            Some(last) if segment > last => (last + 1..=segment).collect(),
            Some(last) => (segment..last).rev().collect(),
        };
        self.last = Some(segment);
        crossed
    }

    pub fn lift(&mut self) {
        self.last = None;
    }

    pub fn position(&self) -> Option<usize> {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theory::ChordType;

    fn chord(root: &str, chord_type: ChordType) -> Chord {
        Chord::new(Pitch::parse(root).unwrap(), chord_type)
    }

    #[test]
    fn positions_map_to_segments() {
        let plate = Strumplate::default();
        assert_eq!(plate.segment_at(0.0), Some(0));
        assert_eq!(plate.segment_at(0.5), Some(6));
        assert_eq!(plate.segment_at(1.0), Some(12));
        assert_eq!(plate.segment_at(-3.0), Some(0));
        assert_eq!(plate.segment_at(7.0), Some(12));
        assert_eq!(plate.segment_at(f32::NAN), None);
        assert_eq!(Strumplate::new(0, 3).segment_at(0.5), None);
    }

    #[test]
    fn triad_cycles_up_the_octaves() {
        let plate = Strumplate::default();
        let names: Vec<String> = plate.notes(&chord("C", ChordType::Major)).iter().map(|n| n.to_string()).collect();
        assert_eq!(names, [
            "C3", "E3", "G3", "C4", "E4", "G4", "C5", "E5", "G5", "C6", "E6", "G6", "C7",
        ]);
    }

    #[test]
    fn every_pass_ascends() {
        let plate = Strumplate::default();
        for root in ["A", "B", "F#", "Db"] {
            let midis: Vec<i32> = plate.notes(&chord(root, ChordType::MajorSeventh)).iter().map(Note::midi).collect();
            assert!(midis.windows(2).all(|w| w[0] < w[1]), "{} not ascending: {:?}", root, midis);
        }
    }

    #[test]
    fn out_of_range_segments_are_silent() {
        let plate = Strumplate::new(4, 9);
        let c = chord("C", ChordType::Major);
        assert!(plate.note_for_segment(&c, 0).is_some());
        assert_eq!(plate.note_for_segment(&c, 3), None); // C10 is above MIDI 127
        assert_eq!(plate.note_for_segment(&c, 4), None);
    }

    #[test]
    fn sweep_reports_crossed_segments() {
        let plate = Strumplate::default();
        let mut tracker = StrumTracker::new();
        assert_eq!(tracker.sweep_to(&plate, 0.0), vec![0]);
        assert_eq!(tracker.sweep_to(&plate, 0.01), Vec::<usize>::new());
        assert_eq!(tracker.sweep_to(&plate, 0.3), vec![1, 2, 3]);
        assert_eq!(tracker.sweep_to(&plate, 0.0), vec![2, 1, 0]);
        tracker.lift();
        assert_eq!(tracker.position(), None);
        assert_eq!(tracker.sweep_to(&plate, 0.99), vec![12]);
    }
}
