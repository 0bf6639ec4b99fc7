//! Player - wires the synthesizer to cpal and drives it from the main thread

use std::{path::PathBuf, sync::Arc, thread, time::Duration};

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use additive_synth::{
    io::MidiEvent,
    patch::{JsonPresetStore, Preset, PresetLibrary},
    Adsr, SynthConfig, SynthController, Synthesizer, MAX_BLOCK_SIZE, NUM_ADDITIVE_FREQS,
};

/// C major arpeggio, up and back down.
const PHRASE: [u8; 8] = [60, 64, 67, 72, 76, 72, 67, 64];

const MIDI_CHANNEL: u8 = 0;

pub struct Player {
    note_length_ms: u64,
    preset_dir: Option<PathBuf>,
}

impl Player {
    pub fn new() -> Self {
        Self {
            note_length_ms: 250,
            preset_dir: None,
        }
    }

    pub fn note_length_ms(mut self, ms: u64) -> Self {
        self.note_length_ms = ms;
        self
    }

    /// Directory of JSON presets; the first one found replaces the demo sound.
    pub fn presets(mut self, dir: Option<PathBuf>) -> Self {
        self.preset_dir = dir;
        self
    }

    pub fn run(self) -> EyreResult<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = config.sample_rate().0 as f32;
        let channels = config.channels() as usize;

        println!("=== additive ===");
        println!("Sample rate: {} Hz", sample_rate);
        println!("Channels: {}", channels);
        println!();

        let (mut synth, mut controller) = Synthesizer::with_controller(SynthConfig::with_sample_rate(sample_rate));
        demo_sound(&mut controller)?;

        let library = self.preset_dir.clone().map(|dir| {
            let library = PresetLibrary::new(JsonPresetStore::new(dir));
            library.spawn_load(|result| match result {
                Ok(count) => log::info!("{count} presets available"),
                Err(err) => log::warn!("presets unavailable: {err}"),
            });
            library
        });

        // The synthesizer moves into the callback; the controller stays here
        let mut render_buf = vec![0.0f32; MAX_BLOCK_SIZE];

        let stream = device.build_output_stream(
            &config.into(),
            move |data: &mut [f32], _| {
                let total_frames = data.len() / channels;
                let mut frames_written = 0;

                while frames_written < total_frames {
                    let frames_to_render = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
                    let block = &mut render_buf[..frames_to_render];
                    synth.render_block(block);

                    // Copy to output (mono to all channels)
                    let out_off = frames_written * channels;
                    for (i, &s) in block.iter().enumerate() {
                        for ch in 0..channels {
                            data[out_off + i * channels + ch] = s;
                        }
                    }

                    frames_written += frames_to_render;
                }
            },
            |err| log::error!("audio stream error: {err}"),
            None,
        )?;

        stream.play()?;

        println!("Playing demo phrase...");
        self.play_phrase(&mut controller)?;

        if let Some(library) = library.as_ref() {
            if let Some(preset) = first_preset(library) {
                println!("Playing again with preset '{}'...", preset.name);
                controller.apply_preset(&preset)?;
                self.play_phrase(&mut controller)?;
            }
        }

        // Let the last release ring out
        thread::sleep(Duration::from_millis(600));
        Ok(())
    }

    fn play_phrase(&self, controller: &mut SynthController) -> EyreResult<()> {
        let note_length = Duration::from_millis(self.note_length_ms);
        for key in PHRASE {
            let note_on = MidiEvent::NoteOn {
                channel: MIDI_CHANNEL,
                key,
                velocity: 100,
            };
            controller.handle_midi(note_on, MIDI_CHANNEL)?;
            thread::sleep(note_length);

            let note_off = MidiEvent::NoteOff {
                channel: MIDI_CHANNEL,
                key,
                velocity: 0,
            };
            controller.handle_midi(note_off, MIDI_CHANNEL)?;
        }
        Ok(())
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

/// Organ-like stack on oscillator 1 with a softer square an octave up on 2.
fn demo_sound(controller: &mut SynthController) -> EyreResult<()> {
    let mut organ = [0.0; NUM_ADDITIVE_FREQS];
    for (i, level) in organ.iter_mut().take(8).enumerate() {
        *level = 1.0 / (i + 1) as f32;
    }
    controller.set_additive_levels(0, &organ)?;
    controller.set_adsr(0, Adsr::new(5, 80, 0.6, 300))?;

    let mut square = [0.0; NUM_ADDITIVE_FREQS];
    for (i, level) in square.iter_mut().enumerate().step_by(2) {
        *level = 1.0 / (i + 1) as f32;
    }
    controller.set_additive_levels(1, &square)?;
    controller.set_transpose(1, 2.0)?;
    controller.set_volume(1, 0.3)?;
    Ok(())
}

/// Waits for the background load to finish if it has not yet.
fn first_preset(library: &Arc<PresetLibrary>) -> Option<Preset> {
    library.presets().into_iter().next()
}
