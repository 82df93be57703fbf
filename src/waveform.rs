use std::f32::consts::TAU;

#[derive(Debug, Clone, PartialEq)]
pub enum WaveformType {
    Sine,
    Square,
    Triangle,
    Sawtooth,
    Noise,
    /// Harmonic amplitudes, fundamental first.
    Partials(Vec<f32>),
}

impl WaveformType {
    pub fn generate_sample(&self, phase: f32) -> f32 { // Phase should be in the range [0.0, 1.0)
        match self {
            WaveformType::Sine => (phase * TAU).sin(),
            WaveformType::Square => if phase < 0.5 { 1.0 } else { -1.0 },
            WaveformType::Sawtooth => phase * 2.0 - 1.0,
            WaveformType::Noise => fastrand::f32() * 2.0 - 1.0,
            WaveformType::Triangle => {
                if phase < 0.5 { phase * 4.0 - 1.0 } else { 3.0 - phase * 4.0 }
            }
            WaveformType::Partials(amplitudes) => {
                let norm: f32 = amplitudes.iter().map(|a| a.abs()).sum();
                if norm == 0.0 {
                    return 0.0;
                }
                let sum: f32 = amplitudes.iter()
                    .enumerate()
                    .filter(|(_, a)| **a != 0.0)
                    .map(|(i, a)| a * (phase * TAU * (i + 1) as f32).sin())
                    .sum();
                sum / norm
            }
        }
    }

    pub fn parse(name: &str) -> Option<WaveformType> {
        match name.trim().to_lowercase().as_str() {
            "sine" => Some(WaveformType::Sine),
            "square" => Some(WaveformType::Square),
            "triangle" => Some(WaveformType::Triangle),
            "sawtooth" | "saw" => Some(WaveformType::Sawtooth),
            "noise" => Some(WaveformType::Noise),
            _ => None,
        }
    }
}
