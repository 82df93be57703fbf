use crate::instrument::{Instrument, MAX_POLYPHONY};
use crate::theory::Note;

/// Anything chord tones can be played into: the live engine, or a bare voice bank when
/// rendering offline.
pub trait NoteSink {
    fn trigger_attack(&mut self, note: Note, velocity: f32);
    fn trigger_release(&mut self, note: Note);
    fn trigger_attack_release(&mut self, note: Note, duration: f32, velocity: f32);
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Stage {
    Attack,
    Decay,
    Sustain,
    Release,
    Done,
}

/// Gate-driven ADSR. Times come from the instrument at each step, the release time is fixed
/// when the gate closes.
#[derive(Debug, Clone)]
pub struct Envelope {
    stage: Stage,
    level: f32,
    release_rate: f32,
}

impl Envelope {
    pub fn new() -> Self {
        Envelope { stage: Stage::Attack, level: 0.0, release_rate: 0.0 }
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn is_gated(&self) -> bool {
        matches!(self.stage, Stage::Attack | Stage::Decay | Stage::Sustain)
    }

    pub fn is_done(&self) -> bool {
        self.stage == Stage::Done
    }

    pub fn release(&mut self, release_time: f32) {
        if !self.is_gated() {
            return;
        }
        if release_time <= 0.0 || self.level <= 0.0 {
            self.stage = Stage::Done;
            self.level = 0.0;
        } else {
            self.stage = Stage::Release;
            self.release_rate = self.level / release_time;
        }
    }

    pub fn next(&mut self, dt: f32, instr: &Instrument) -> f32 {
        match self.stage {
            Stage::Attack => {
                if instr.attack <= 0.0 {
                    self.level = 1.0;
                } else {
                    self.level += dt / instr.attack;
                }
                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.stage = Stage::Decay;
                }
            }
            Stage::Decay => {
                if instr.decay <= 0.0 {
                    self.level = instr.sustain;
                } else {
                    self.level -= dt * (1.0 - instr.sustain) / instr.decay;
                }
                if self.level <= instr.sustain {
                    self.level = instr.sustain;
                    self.stage = Stage::Sustain;
                }
            }
            Stage::Sustain => self.level = instr.sustain,
            Stage::Release => {
                self.level -= dt * self.release_rate;
                if self.level <= 0.0 {
                    self.level = 0.0;
                    self.stage = Stage::Done;
                }
            }
            Stage::Done => self.level = 0.0,
        }
        self.level
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
struct Voice {
    midi: i32,
    freq: f32,
    phase: f32,
    velocity: f32,
    envelope: Envelope,
    started_at: u64,
    release_after: Option<usize>, // samples left before an automatic release
}

/// Fixed-size pool of voices, like a polyphonic synth. When every voice is busy the oldest
/// released voice is reused, failing that the oldest held one.
pub struct VoiceBank {
    instrument: Instrument,
    sample_rate: f32,
    voices: Vec<Voice>,
    release: f32,
    gain: f32,
    started: u64,
}

impl VoiceBank {
    pub fn new(mut instrument: Instrument, sample_rate: f32) -> Self {
        instrument.polyphony = instrument.polyphony.min(MAX_POLYPHONY);
        let release = instrument.release;
        VoiceBank {
            voices: Vec::with_capacity(instrument.polyphony),
            instrument,
            sample_rate,
            release,
            gain: 1.0,
            started: 0,
        }
    }

    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Release time used for notes released from now on.
    pub fn set_release(&mut self, seconds: f32) {
        self.release = seconds.max(0.0);
    }

    pub fn release_time(&self) -> f32 {
        self.release
    }

    pub fn set_gain(&mut self, gain: f32) {
        self.gain = gain.max(0.0);
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn active_voices(&self) -> usize {
        self.voices.iter().filter(|v| !v.envelope.is_done()).count()
    }

    pub fn held_voices(&self) -> usize {
        self.voices.iter().filter(|v| v.envelope.is_gated()).count()
    }

    pub fn is_sounding(&self, note: Note) -> bool {
        let midi = note.midi();
        self.voices.iter().any(|v| v.midi == midi && v.envelope.is_gated())
    }

    fn start_voice(&mut self, note: Note, velocity: f32, release_after: Option<usize>) {
        let voice = Voice {
            midi: note.midi(),
            freq: note.freq() * self.instrument.detune_ratio(),
            phase: 0.0,
            velocity: velocity.clamp(0.0, 1.0),
            envelope: Envelope::new(),
            started_at: self.started,
            release_after,
        };
        self.started += 1;

        if self.voices.len() < self.instrument.polyphony {
            self.voices.push(voice);
            return;
        }

        let steal = self.voices.iter()
            .enumerate()
            .min_by_key(|(_, v)| (v.envelope.is_gated(), v.started_at))
            .map(|(i, _)| i);
        if let Some(index) = steal {
            log::debug!("voice stolen from midi note {}", self.voices[index].midi);
            self.voices[index] = voice;
        }
    }

    pub fn release_all(&mut self) {
        let release = self.release;
        for voice in &mut self.voices {
            voice.envelope.release(release);
            voice.release_after = None;
        }
    }

    pub fn next_sample(&mut self) -> f32 {
        let dt = 1.0 / self.sample_rate;
        let mut output = 0.0;

        for voice in &mut self.voices {
            if let Some(remaining) = voice.release_after.as_mut() {
                if *remaining == 0 {
                    voice.envelope.release(self.release);
                    voice.release_after = None;
                } else {
                    *remaining -= 1;
                }
            }

            let level = voice.envelope.next(dt, &self.instrument);
            output += self.instrument.waveform.generate_sample(voice.phase) * level * voice.velocity;

            voice.phase = (voice.phase + voice.freq * dt).fract();
        }

        if self.voices.iter().any(|v| v.envelope.is_done()) {
            self.voices.retain(|v| !v.envelope.is_done());
        }

        output * self.instrument.volume * self.gain
    }

    /// Fill interleaved frames, the mono mix copied into every channel.
    pub fn render(&mut self, data: &mut [f32], channels: usize) {
        for frame in data.chunks_mut(channels.max(1)) {
            let sample = self.next_sample();
            for out in frame.iter_mut() {
                *out = sample;
            }
        }
    }
}

impl NoteSink for VoiceBank {
    fn trigger_attack(&mut self, note: Note, velocity: f32) {
        self.start_voice(note, velocity, None);
    }

    fn trigger_release(&mut self, note: Note) {
        let midi = note.midi();
        let release = self.release;
        for voice in self.voices.iter_mut().filter(|v| v.midi == midi && v.release_after.is_none()) {
            voice.envelope.release(release);
        }
    }

    fn trigger_attack_release(&mut self, note: Note, duration: f32, velocity: f32) {
        let samples = (duration.max(0.0) * self.sample_rate) as usize;
        self.start_voice(note, velocity, Some(samples));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waveform::WaveformType;

    const RATE: f32 = 1000.0;

    fn note(name: &str) -> Note {
        Note::parse(name).unwrap()
    }

    fn bank(polyphony: usize) -> VoiceBank {
        let instrument = Instrument {
            waveform: WaveformType::Sine,
            attack: 0.01,
            decay: 0.01,
            sustain: 0.5,
            release: 0.1,
            polyphony,
            ..Instrument::default()
        };
        VoiceBank::new(instrument, RATE)
    }

    #[test]
    fn oversized_polyphony_is_capped() {
        let bank = bank(usize::MAX);
        assert_eq!(bank.instrument().polyphony, MAX_POLYPHONY);
        assert_eq!(bank.active_voices(), 0);
    }

    fn advance(bank: &mut VoiceBank, seconds: f32) {
        for _ in 0..(seconds * RATE) as usize {
            bank.next_sample();
        }
    }

    #[test]
    fn envelope_reaches_sustain_then_releases() {
        let instrument = Instrument { attack: 0.01, decay: 0.01, sustain: 0.5, ..Instrument::default() };
        let mut env = Envelope::new();
        for _ in 0..100 {
            env.next(0.001, &instrument);
        }
        assert!((env.level() - 0.5).abs() < 1e-6);
        env.release(0.05);
        assert!(!env.is_gated());
        for _ in 0..60 {
            env.next(0.001, &instrument);
        }
        assert!(env.is_done());
    }

    #[test]
    fn release_during_attack_starts_from_current_level() {
        let instrument = Instrument { attack: 1.0, ..Instrument::default() };
        let mut env = Envelope::new();
        env.next(0.1, &instrument);
        let before = env.level();
        env.release(1.0);
        let after = env.next(0.1, &instrument);
        assert!(after < before);
        assert!(after > 0.0);
    }

    #[test]
    fn attack_and_release_track_notes() {
        let mut bank = bank(8);
        bank.trigger_attack(note("C4"), 1.0);
        bank.trigger_attack(note("E4"), 1.0);
        assert_eq!(bank.held_voices(), 2);
        assert!(bank.is_sounding(note("C4")));

        bank.trigger_release(note("C4"));
        assert_eq!(bank.held_voices(), 1);
        assert!(!bank.is_sounding(note("C4")));

        advance(&mut bank, 0.5);
        assert_eq!(bank.active_voices(), 1);
    }

    #[test]
    fn release_matches_enharmonic_spelling() {
        let mut bank = bank(4);
        bank.trigger_attack(note("Fb4"), 1.0);
        bank.trigger_release(note("E4"));
        assert_eq!(bank.held_voices(), 0);
    }

    #[test]
    fn attack_release_ends_by_itself() {
        let mut bank = bank(4);
        bank.trigger_attack_release(note("A4"), 0.05, 1.0);
        advance(&mut bank, 0.04);
        assert_eq!(bank.held_voices(), 1);
        advance(&mut bank, 0.2);
        assert_eq!(bank.active_voices(), 0);
    }

    #[test]
    fn steals_released_voice_before_held_ones() {
        let mut bank = bank(2);
        bank.trigger_attack(note("C4"), 1.0);
        bank.trigger_attack(note("D4"), 1.0);
        bank.trigger_release(note("D4"));
        bank.trigger_attack(note("E4"), 1.0);
        assert!(bank.is_sounding(note("C4")));
        assert!(bank.is_sounding(note("E4")));

        bank.trigger_attack(note("F4"), 1.0);
        assert!(!bank.is_sounding(note("C4")));
        assert_eq!(bank.active_voices(), 2);
    }

    #[test]
    fn render_fills_every_channel() {
        let mut bank = bank(4);
        bank.trigger_attack(note("A4"), 1.0);
        let mut data = vec![0.0; 64];
        bank.render(&mut data, 2);
        assert!(data.chunks(2).all(|frame| frame[0] == frame[1]));
        assert!(data.iter().any(|s| *s != 0.0));
    }

    #[test]
    fn silent_without_notes() {
        let mut bank = bank(4);
        let mut data = vec![1.0; 32];
        bank.render(&mut data, 1);
        assert!(data.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn sustain_setting_applies_to_later_releases() {
        let mut bank = bank(4);
        bank.set_release(0.0);
        bank.trigger_attack(note("C4"), 1.0);
        bank.trigger_release(note("C4"));
        bank.next_sample();
        assert_eq!(bank.active_voices(), 0);
    }
}
