use crate::error::StrumError;
use crate::waveform::WaveformType;

pub const MAX_POLYPHONY: usize = 256;

/// The synthesized voice every chord tone is played with.
#[derive(Debug, Clone, PartialEq)]
pub struct Instrument {
    pub name: String,
    pub waveform: WaveformType,
    pub attack: f32, // ADSR envelope parameters, seconds except sustain level
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
    pub volume: f32,
    pub detune: f32, // Pitch offset in cents
    pub polyphony: usize,
}

impl Default for Instrument {
    fn default() -> Self {
        Instrument {
            name: "Strumboard".to_string(),
            waveform: WaveformType::Partials(vec![0.0, 2.0, 3.0, 4.0]),
            attack: 0.005,
            decay: 0.1,
            sustain: 0.3,
            release: 1.0,
            volume: 0.25,
            detune: 0.0,
            polyphony: 32,
        }
    }
}

impl Instrument {
    pub fn validate(&self) -> Result<(), StrumError> {
        let times = [("attack", self.attack), ("decay", self.decay), ("release", self.release)];
        for (field, value) in times {
            if !(value >= 0.0) {
                return Err(StrumError::InvalidInstrument(format!("{} must be a non-negative time, got {}", field, value)));
            }
        }
        if !(0.0..=1.0).contains(&self.sustain) {
            return Err(StrumError::InvalidInstrument(format!("sustain must be within 0..1, got {}", self.sustain)));
        }
        if !(self.volume >= 0.0) {
            return Err(StrumError::InvalidInstrument(format!("volume must be non-negative, got {}", self.volume)));
        }
        if !(1..=MAX_POLYPHONY).contains(&self.polyphony) {
            return Err(StrumError::InvalidInstrument(format!("polyphony must be within 1..={}, got {}", MAX_POLYPHONY, self.polyphony)));
        }
        Ok(())
    }

    /// Frequency multiplier for the detune setting.
    pub fn detune_ratio(&self) -> f32 {
        2.0_f32.powf(self.detune / 1200.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(Instrument::default().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_fields() {
        let bad_sustain = Instrument { sustain: 1.5, ..Instrument::default() };
        assert!(bad_sustain.validate().is_err());
        let bad_attack = Instrument { attack: -0.1, ..Instrument::default() };
        assert!(bad_attack.validate().is_err());
        let nan_release = Instrument { release: f32::NAN, ..Instrument::default() };
        assert!(nan_release.validate().is_err());
        let silent = Instrument { polyphony: 0, ..Instrument::default() };
        assert!(silent.validate().is_err());
    }

    #[test]
    fn polyphony_has_a_ceiling() {
        let widest = Instrument { polyphony: MAX_POLYPHONY, ..Instrument::default() };
        assert!(widest.validate().is_ok());
        let huge = Instrument { polyphony: usize::MAX, ..Instrument::default() };
        assert!(matches!(huge.validate(), Err(StrumError::InvalidInstrument(_))));
    }

    #[test]
    fn detune_of_an_octave_doubles() {
        let up = Instrument { detune: 1200.0, ..Instrument::default() };
        assert!((up.detune_ratio() - 2.0).abs() < 1e-5);
        assert_eq!(Instrument::default().detune_ratio(), 1.0);
    }
}
