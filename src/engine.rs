use std::sync::{Arc, Mutex, MutexGuard};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};

use crate::error::StrumError;
use crate::instrument::Instrument;
use crate::theory::{Letter, Note, Pitch};
use crate::voice::{NoteSink, VoiceBank};

const START_BLIP_SECONDS: f32 = 0.25;

/// Live output. Audio only runs after `start`, until then every trigger is dropped.
pub struct SynthEngine {
    device: Device,
    stream_config: StreamConfig,
    sample_rate: f32,
    bank: Arc<Mutex<VoiceBank>>,
    stream: Option<Stream>,
}

impl SynthEngine {
    pub fn new(instrument: Instrument) -> Result<Self, StrumError> {
        instrument.validate()?;

        let host = cpal::default_host();
        log::info!("cpal host: {}", host.id().name());
        let device = host.default_output_device()
            .ok_or_else(|| StrumError::AudioError("No output device found".to_string()))?;
        match device.name() {
            Ok(name) => log::info!("cpal device: {}", name),
            Err(_) => log::info!("cpal device: (no name)"),
        }

        let config = device.default_output_config()
            .map_err(|e| StrumError::AudioError(e.to_string()))?;
        log::info!("sample format: {}", config.sample_format());
        log::info!("sample rate: {}", config.sample_rate().0);
        log::info!("num channels: {}", config.channels());

        let stream_config = config.config();
        let sample_rate = stream_config.sample_rate.0 as f32;

        Ok(SynthEngine {
            device,
            stream_config,
            sample_rate,
            bank: Arc::new(Mutex::new(VoiceBank::new(instrument, sample_rate))),
            stream: None,
        })
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn is_started(&self) -> bool {
        self.stream.is_some()
    }

    /// Opens the output stream and plays a short C4 to confirm sound is working.
    pub fn start(&mut self) -> Result<(), StrumError> {
        if self.stream.is_some() {
            return Ok(());
        }

        let channels = self.stream_config.channels as usize;
        let bank = Arc::clone(&self.bank);

        let stream = self.device.build_output_stream(
            &self.stream_config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let mut bank = bank.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                bank.render(data, channels);
            },
            |err| log::error!("stream error: {}", err),
            None,
        )?;

        stream.play()?;
        self.stream = Some(stream);
        log::info!("audio started");

        let c4 = Pitch::natural(Letter::C).in_octave(4);
        self.bank().trigger_attack_release(c4, START_BLIP_SECONDS, 1.0);
        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            drop(stream);
            log::info!("audio stopped");
        }
        self.bank().release_all();
    }

    pub fn set_volume(&self, volume: f32) {
        self.bank().set_gain(volume);
    }

    /// Release time for notes let go from now on.
    pub fn set_release(&self, seconds: f32) {
        self.bank().set_release(seconds);
    }

    pub fn release_all(&self) {
        self.bank().release_all();
    }

    pub fn active_voices(&self) -> usize {
        self.bank().active_voices()
    }

    // The audio callback never panics while holding the lock, but a poisoned bank is still usable.
    fn bank(&self) -> MutexGuard<'_, VoiceBank> {
        self.bank.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl NoteSink for SynthEngine {
    fn trigger_attack(&mut self, note: Note, velocity: f32) {
        if !self.is_started() {
            log::debug!("audio not started, dropping attack {}", note);
            return;
        }
        self.bank().trigger_attack(note, velocity);
    }

    fn trigger_release(&mut self, note: Note) {
        if !self.is_started() {
            return;
        }
        self.bank().trigger_release(note);
    }

    fn trigger_attack_release(&mut self, note: Note, duration: f32, velocity: f32) {
        if !self.is_started() {
            log::debug!("audio not started, dropping strum {}", note);
            return;
        }
        self.bank().trigger_attack_release(note, duration, velocity);
    }
}
