use std::error::Error;
use std::path::Path;
use crate::controller::Performer;
use crate::error::StrumError;
use crate::keymap::Key;
use crate::patch::Patch;
use crate::voice::VoiceBank;

const MAX_TAIL_SECONDS: f32 = 10.0;
const MOVES_PER_SEGMENT: usize = 4;

/// One step of a scripted performance.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Press(Key),
    Release(Key),
    /// Sweep the pointer from one plate position to another over `seconds`.
    Strum { from: f32, to: f32, seconds: f32 },
    Lift,
    Wait(f32),
    Volume(f32),
    Sustain(f32),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Score {
    pub actions: Vec<Action>,
}

impl Score {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| StrumError::FileError(format!("{}: {}", path.display(), e)))?;
        Ok(Score::parse(&content)?)
    }

    pub fn parse(content: &str) -> Result<Self, StrumError> {
        let mut score = Score::default();
        for (number, line) in content.lines().enumerate() {
            if let Some(action) = parse_line(line).map_err(|e| e.at_line(number + 1))? {
                score.actions.push(action);
            }
        }
        Ok(score)
    }
}

fn parse_line(line: &str) -> Result<Option<Action>, StrumError> {
    let line = line.split("//").next().unwrap_or("").trim();
    if line.is_empty() {
        return Ok(None);
    }

    let mut words = line.split_whitespace();
    let command = words.next().unwrap_or("");
    let args: Vec<&str> = words.collect();

    let float = |index: usize| -> Result<f32, StrumError> {
        args.get(index)
            .and_then(|v| v.parse::<f32>().ok())
            .filter(|v| v.is_finite())
            .ok_or_else(|| StrumError::ParseError(format!("'{}' needs a number at argument {}", command, index + 1)))
    };
    let key = || -> Result<Key, StrumError> {
        Key::from_code(args.first().copied().unwrap_or(""))
    };

    let action = match command {
        "press" => Action::Press(key()?),
        "release" => Action::Release(key()?),
        "strum" => Action::Strum {
            from: float(0)?,
            to: float(1)?,
            seconds: if args.len() > 2 { float(2)?.max(0.0) } else { 0.0 },
        },
        "lift" => Action::Lift,
        "wait" => Action::Wait(float(0)?.max(0.0)),
        "volume" => Action::Volume(float(0)?),
        "sustain" => Action::Sustain(float(0)?),
        _ => return Err(StrumError::ParseError(format!("unknown command '{}'", command))),
    };
    Ok(Some(action))
}

struct Take {
    bank: VoiceBank,
    samples: Vec<f32>,
}

impl Take {
    fn advance(&mut self, seconds: f32) {
        let count = (seconds * self.bank.sample_rate()) as usize;
        self.samples.reserve(count);
        for _ in 0..count {
            let sample = self.bank.next_sample();
            self.samples.push(sample);
        }
    }
}

/// Plays a score through the patch's instrument without an audio device. The voices are
/// allowed to ring out after the last action.
pub fn render_score(score: &Score, patch: &Patch, sample_rate: f32) -> Result<Vec<f32>, StrumError> {
    patch.validate()?;
    if !(sample_rate > 0.0) {
        return Err(StrumError::AudioError(format!("Invalid sample rate {}", sample_rate)));
    }

    let mut performer = Performer::from_patch(patch);
    let mut take = Take {
        bank: VoiceBank::new(patch.instrument.clone(), sample_rate),
        samples: Vec::new(),
    };

    for action in &score.actions {
        match *action {
            Action::Press(key) => {
                if !performer.key_down(key, &mut take.bank) {
                    log::debug!("score: {} does nothing", key);
                }
            }
            Action::Release(key) => {
                performer.key_up(key, &mut take.bank);
            }
            Action::Strum { from, to, seconds } => {
                let moves = (patch.strumplate.segments * MOVES_PER_SEGMENT).max(1);
                for i in 0..=moves {
                    let x = from + (to - from) * i as f32 / moves as f32;
                    performer.strum(x, &mut take.bank);
                    take.advance(seconds / (moves + 1) as f32);
                }
            }
            Action::Lift => performer.lift(),
            Action::Wait(seconds) => take.advance(seconds),
            Action::Volume(volume) => take.bank.set_gain(volume.clamp(0.0, 1.0)),
            Action::Sustain(seconds) => take.bank.set_release(seconds),
        }
    }

    performer.release_all(&mut take.bank);
    let block = 0.05;
    let mut tail = 0.0;
    while take.bank.active_voices() > 0 && tail < MAX_TAIL_SECONDS {
        take.advance(block);
        tail += block;
    }

    let mut samples = take.samples;
    // Normalize
    if let Some(max) = samples.iter().map(|v| v.abs()).reduce(f32::max) {
        if max > 1.0 { samples.iter_mut().for_each(|s| *s /= max); }
    }
    log::info!("rendered {:.2}s of audio", samples.len() as f32 / sample_rate);
    Ok(samples)
}

/// Writes mono 16-bit PCM.
pub fn write_wav(path: impl AsRef<Path>, samples: &[f32], sample_rate: u32) -> Result<(), StrumError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path.as_ref(), spec)?;
    for &sample in samples {
        writer.write_sample((sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)?;
    }
    writer.finalize()?;
    log::info!("wrote {}", path.as_ref().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        let score = Score::parse(
            "press Digit6 // C major\n\
             wait 0.5\n\
             strum 0 1 0.4\n\
             strum 1 0\n\
             lift\n\
             release Digit6\n\
             volume 0.8\n\
             sustain 2\n",
        ).unwrap();
        assert_eq!(score.actions, vec![
            Action::Press(Key::Digit6),
            Action::Wait(0.5),
            Action::Strum { from: 0.0, to: 1.0, seconds: 0.4 },
            Action::Strum { from: 1.0, to: 0.0, seconds: 0.0 },
            Action::Lift,
            Action::Release(Key::Digit6),
            Action::Volume(0.8),
            Action::Sustain(2.0),
        ]);
    }

    #[test]
    fn reports_line_numbers() {
        match Score::parse("wait 1\nwait soon") {
            Err(StrumError::ParseError(msg)) => assert!(msg.contains("line 2")),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(Score::parse("press F13"), Err(StrumError::UnknownKey(_))));
        assert!(Score::parse("dance").is_err());
    }

    #[test]
    fn silence_renders_silence() {
        let score = Score::parse("wait 0.1").unwrap();
        let samples = render_score(&score, &Patch::default(), 8000.0).unwrap();
        assert_eq!(samples.len(), 800);
        assert!(samples.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn oversized_plate_is_an_error_not_a_panic() {
        let mut patch = Patch::default();
        patch.strumplate.segments = usize::MAX;
        let score = Score::parse("press Digit6\nstrum 0 1 0.1").unwrap();
        assert!(matches!(render_score(&score, &patch, 8000.0), Err(StrumError::InvalidInstrument(_))));
    }

    #[test]
    fn rejects_bad_sample_rate() {
        assert!(render_score(&Score::default(), &Patch::default(), 0.0).is_err());
    }
}
