//! Audible feedback: a short decaying tone for every recorded note.

use crate::note::midi_to_hz;
use crate::types::NoteRecord;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, Stream, StreamConfig};
use crossbeam_channel::{Receiver, Sender};
use log::{debug, error, info};
use std::f32::consts::TAU;
use std::thread;

/// MIDI-style velocity every note is played at.
pub const VELOCITY: u8 = 100;
/// Seconds for a tone to fall to 1/e of its start level.
const DECAY_SECS: f32 = 0.35;
/// Tones quieter than this are dropped.
const SILENCE: f32 = 1e-4;
/// Cap on simultaneous tones; the oldest is dropped first.
const MAX_VOICES: usize = 16;

#[derive(Debug, Clone)]
struct Voice {
    phase: f32,
    step: f32,
    amp: f32,
    decay: f32,
}

impl Voice {
    fn new(freq_hz: f32, velocity: u8, sample_rate: u32) -> Self {
        let sr = sample_rate as f32;
        Self {
            phase: 0.0,
            step: TAU * freq_hz / sr,
            amp: 0.25 * velocity as f32 / 127.0,
            decay: (-1.0 / (DECAY_SECS * sr)).exp(),
        }
    }

    fn next(&mut self) -> f32 {
        let s = self.amp * self.phase.sin();
        self.phase = (self.phase + self.step) % TAU;
        self.amp *= self.decay;
        s
    }
}

/// Mix `voices` into an interleaved buffer, dropping finished ones.
fn render(voices: &mut Vec<Voice>, out: &mut [f32], channels: usize) {
    for frame in out.chunks_mut(channels.max(1)) {
        let s: f32 = voices.iter_mut().map(Voice::next).sum();
        let s = s.clamp(-1.0, 1.0);
        frame.iter_mut().for_each(|x| *x = s);
    }
    voices.retain(|v| v.amp > SILENCE);
}

/// Plays recorded notes on the default output device.
///
/// Holds the cpal `Stream` alive. Drop this to stop playback.
pub struct ToneNotePlayer {
    _stream: Stream,
}

impl ToneNotePlayer {
    /// Open the default output device and start listening for notes on `rx`.
    /// Returns immediately; notes are consumed on a background thread.
    pub fn start(rx: Receiver<NoteRecord>) -> Result<Self, String> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| "No default audio output device found".to_string())?;

        info!(
            "Audio output: {}",
            device.name().unwrap_or_else(|_| "unknown".into())
        );

        let supported = device
            .default_output_config()
            .map_err(|e| format!("No supported output config: {e}"))?;
        let format = supported.sample_format();
        let sample_rate = supported.sample_rate().0;
        let config: StreamConfig = supported.into();
        let channels = config.channels as usize;

        info!("Playback config: {}Hz  {} ch  {:?}", sample_rate, channels, format);

        // Note thread → realtime callback. try_recv keeps the callback lock-free.
        let (voice_tx, voice_rx) = crossbeam_channel::bounded::<Voice>(64);
        let err_fn = |e: cpal::StreamError| error!("Audio stream error: {e}");

        let stream = match format {
            SampleFormat::F32 => {
                let mut voices: Vec<Voice> = Vec::with_capacity(MAX_VOICES);
                device
                    .build_output_stream(
                        &config,
                        move |data: &mut [f32], _| {
                            take_voices(&voice_rx, &mut voices);
                            render(&mut voices, data, channels);
                        },
                        err_fn,
                        None,
                    )
                    .map_err(|e| e.to_string())?
            }
            SampleFormat::I16 => {
                let mut voices: Vec<Voice> = Vec::with_capacity(MAX_VOICES);
                let mut scratch: Vec<f32> = Vec::new();
                device
                    .build_output_stream(
                        &config,
                        move |data: &mut [i16], _| {
                            take_voices(&voice_rx, &mut voices);
                            scratch.resize(data.len(), 0.0);
                            render(&mut voices, &mut scratch, channels);
                            for (d, &s) in data.iter_mut().zip(scratch.iter()) {
                                *d = (s * i16::MAX as f32) as i16;
                            }
                        },
                        err_fn,
                        None,
                    )
                    .map_err(|e| e.to_string())?
            }
            fmt => {
                return Err(format!(
                    "Unsupported sample format {fmt:?}. Use an F32 or I16 device."
                ))
            }
        };

        stream.play().map_err(|e| e.to_string())?;

        thread::Builder::new()
            .name("tone-notes".into())
            .spawn(move || note_loop(rx, voice_tx, sample_rate))
            .map_err(|e| e.to_string())?;

        Ok(Self { _stream: stream })
    }
}

fn take_voices(rx: &Receiver<Voice>, voices: &mut Vec<Voice>) {
    while let Ok(v) = rx.try_recv() {
        if voices.len() >= MAX_VOICES {
            voices.remove(0);
        }
        voices.push(v);
    }
}

fn note_loop(rx: Receiver<NoteRecord>, voice_tx: Sender<Voice>, sample_rate: u32) {
    for record in rx.iter() {
        match record.event.midi() {
            Some(m) => {
                let freq = midi_to_hz(m as f64) as f32;
                let _ = voice_tx.try_send(Voice::new(freq, VELOCITY, sample_rate));
            }
            None => debug!("No pitch for {:?}, not playing", record.event.raw),
        }
    }
    info!("Tone player shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_decays_and_is_dropped() {
        let mut voices = vec![Voice::new(440.0, VELOCITY, 48000)];
        let mut buf = vec![0.0f32; 2 * 4800];
        render(&mut voices, &mut buf, 2);
        assert!(buf.iter().any(|&s| s.abs() > 0.01));
        // Stereo frames carry the same sample on both channels
        assert_eq!(buf[100], buf[101]);
        let mut long = vec![0.0f32; 48000 * 5];
        render(&mut voices, &mut long, 1);
        assert!(voices.is_empty());
    }

    #[test]
    fn test_voice_cap() {
        let (tx, rx) = crossbeam_channel::unbounded();
        for _ in 0..(MAX_VOICES + 4) {
            tx.send(Voice::new(220.0, VELOCITY, 48000)).unwrap();
        }
        let mut voices = Vec::new();
        take_voices(&rx, &mut voices);
        assert_eq!(voices.len(), MAX_VOICES);
    }
}
