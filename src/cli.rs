//! Command-line argument parsing.

use std::path::PathBuf;
use clap::Parser;
use strumboard::Patch;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "strumboard")]
#[command(about = "Chord keyboard and strumplate instrument", long_about = None)]
pub struct Args {
    /// Patch file describing the voice, key layout and strumplate
    #[arg(long, value_name = "FILE")]
    pub patch: Option<PathBuf>,

    /// Octave chord keys sound in (overrides the patch)
    #[arg(long, value_name = "OCTAVE")]
    pub octave: Option<i8>,

    /// Starting position of the volume knob, 0.0 to 1.0
    #[arg(long, value_name = "LEVEL", default_value = "0.5")]
    pub volume: f32,

    /// Starting release time in seconds (overrides the patch)
    #[arg(long, value_name = "SECONDS")]
    pub sustain: Option<f32>,

    /// Play a score file offline instead of opening a window
    #[arg(long, value_name = "SCORE", requires = "out")]
    pub render: Option<PathBuf>,

    /// WAV file written by --render
    #[arg(long, value_name = "WAV")]
    pub out: Option<PathBuf>,

    /// Sample rate used by --render
    #[arg(long, value_name = "HZ", default_value = "44100")]
    pub sample_rate: u32,
}

impl Args {
    /// Patch file (or the built-in default) with command-line overrides applied.
    pub fn load_patch(&self) -> anyhow::Result<Patch> {
        let mut patch = match &self.patch {
            Some(path) => Patch::load(path).map_err(|e| anyhow::anyhow!("{}", e))?,
            None => Patch::default(),
        };
        if let Some(octave) = self.octave {
            patch.octave = octave;
        }
        if let Some(sustain) = self.sustain {
            patch.instrument.release = sustain;
        }
        patch.validate()?;
        Ok(patch)
    }
}
