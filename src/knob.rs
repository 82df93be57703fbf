/// A stepped, clamped control value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Knob {
    value: f32,
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl Knob {
    pub fn new(value: f32, min: f32, max: f32, step: f32) -> Self {
        let mut knob = Knob { value: min, min, max, step };
        knob.set(value);
        knob
    }

    /// Master output level, 0.0 to 1.0.
    pub fn volume(value: f32) -> Self {
        Self::new(value, 0.0, 1.0, 0.05)
    }

    /// Release time in seconds applied when a chord is let go.
    pub fn sustain(value: f32) -> Self {
        Self::new(value, 0.0, 4.0, 0.25)
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn set(&mut self, value: f32) -> f32 {
        if value.is_finite() {
            self.value = value.clamp(self.min, self.max);
        }
        self.value
    }

    pub fn turn(&mut self, steps: i32) -> f32 {
        self.set(self.value + steps as f32 * self.step)
    }

    /// Position within the range, 0.0 to 1.0.
    pub fn fraction(&self) -> f32 {
        if self.max > self.min { (self.value - self.min) / (self.max - self.min) } else { 0.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turning_clamps() {
        let mut volume = Knob::volume(0.5);
        volume.turn(4);
        assert!((volume.value() - 0.7).abs() < 1e-5);
        volume.turn(100);
        assert_eq!(volume.value(), 1.0);
        volume.turn(-100);
        assert_eq!(volume.value(), 0.0);
    }

    #[test]
    fn construction_clamps_and_ignores_nan() {
        let mut sustain = Knob::sustain(9.0);
        assert_eq!(sustain.value(), 4.0);
        sustain.set(f32::NAN);
        assert_eq!(sustain.value(), 4.0);
        assert_eq!(sustain.fraction(), 1.0);
    }
}
