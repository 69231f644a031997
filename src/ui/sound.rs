/// Sound engine: procedural sound effects via rodio.
///
/// All sounds are generated as in-memory WAV buffers at init time.
/// Playback is fire-and-forget (non-blocking) via rodio's Sink.
///
/// The engine listens to the board through `SoundCues`, an event
/// subscriber, so gameplay code never calls into audio directly.
///
/// Compile with `--no-default-features` or without "sound" feature
/// to disable audio entirely (the stub SoundEngine does nothing).

use std::rc::Rc;

use slidepath::sim::event::{GameEvent, Subscriber};

#[cfg(feature = "sound")]
mod inner {
    use std::f32::consts::PI;
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    const SAMPLE_RATE: u32 = 22050;

    /// Pre-generated WAV buffers for each sound effect.
    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_slide: Arc<Vec<u8>>,
        sfx_warp: Arc<Vec<u8>>,
        sfx_step: Arc<Vec<u8>>,
        sfx_die: Arc<Vec<u8>>,
        sfx_clear: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;

            // ── Generate all sound buffers ──
            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_slide: Arc::new(make_wav(&gen_slide())),
                sfx_warp: Arc::new(make_wav(&gen_warp())),
                sfx_step: Arc::new(make_wav(&gen_step())),
                sfx_die: Arc::new(make_wav(&gen_die())),
                sfx_clear: Arc::new(make_wav(&gen_clear())),
            })
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }

        pub fn play_slide(&self) { self.play(&self.sfx_slide); }
        pub fn play_warp(&self) { self.play(&self.sfx_warp); }
        pub fn play_step(&self) { self.play(&self.sfx_step); }
        pub fn play_die(&self) { self.play(&self.sfx_die); }
        pub fn play_clear(&self) { self.play(&self.sfx_clear); }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators, all mono f32 samples
    // ════════════════════════════════════════════════════════════

    /// Slide: soft filtered-noise swish with a low tone under it
    fn gen_slide() -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * 0.10) as usize;
        let mut rng: u32 = 40503;
        let mut smooth = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let ti = i as f32 / SAMPLE_RATE as f32;
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                smooth += (noise - smooth) * 0.15; // one-pole low-pass
                let tone = (ti * 140.0 * 2.0 * PI).sin();
                let env = (t * PI).sin();
                (smooth * 0.7 + tone * 0.3) * env * 0.3
            })
            .collect()
    }

    /// Wrap: rising shimmer that fades out and back in
    fn gen_warp() -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * 0.22) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let freq = 500.0 + t * 900.0;
                let tremolo = 0.6 + 0.4 * (ti * 30.0 * 2.0 * PI).sin();
                let env = (1.0 - (2.0 * t - 1.0).abs()).max(0.2);
                let wave = (ti * freq * 2.0 * PI).sin() * 0.7
                    + (ti * freq * 2.0 * 2.0 * PI).sin() * 0.3;
                wave * tremolo * env * 0.22
            })
            .collect()
    }

    /// Step: short woody tick
    fn gen_step() -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * 0.04) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let freq = 900.0 - t * 500.0;
                (ti * freq * 2.0 * PI).sin() * (1.0 - t).powf(2.0) * 0.25
            })
            .collect()
    }

    /// Death: sad descending tone
    fn gen_die() -> Vec<f32> {
        let notes = [440.0_f32, 370.0, 311.0, 261.0]; // A4→F#4→Eb4→C4
        let mut samples = notes_to_samples(&notes, 0.12, 0.3);
        // Final fade
        let fade_len = samples.len() / 4;
        let total = samples.len();
        for i in (total - fade_len)..total {
            samples[i] *= (total - i) as f32 / fade_len as f32;
        }
        samples
    }

    /// Level clear: ascending fanfare with a held top note
    fn gen_clear() -> Vec<f32> {
        let notes = [523.0_f32, 659.0, 784.0, 1047.0]; // C5→E5→G5→C6
        let mut samples = notes_to_samples(&notes, 0.1, 0.3);
        let n = (SAMPLE_RATE as f32 * 0.25) as usize;
        for i in 0..n {
            let t = i as f32 / SAMPLE_RATE as f32;
            let env = 1.0 - (i as f32 / n as f32);
            samples.push((t * 1047.0 * 2.0 * PI).sin() * env * 0.3);
        }
        samples
    }

    fn notes_to_samples(notes: &[f32], note_dur: f32, volume: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * note_dur) as usize;
        let mut samples = Vec::with_capacity(n * notes.len());
        for &freq in notes {
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32) * 0.3;
                let wave = (t * freq * 2.0 * PI).sin() * 0.8
                    + (t * freq * 2.0 * 2.0 * PI).sin() * 0.2;
                samples.push(wave * env * volume);
            }
        }
        samples
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder, wraps f32 samples into a valid WAV buffer
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2;
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
        buf.extend_from_slice(&1u16.to_le_bytes());  // PCM
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());

        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn wav_header_matches_payload() {
            let wav = make_wav(&gen_step());
            assert_eq!(&wav[0..4], b"RIFF");
            assert_eq!(&wav[8..12], b"WAVE");
            let data_size = u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]);
            assert_eq!(wav.len(), 44 + data_size as usize);
        }

        #[test]
        fn generators_stay_in_range() {
            for samples in [gen_slide(), gen_warp(), gen_step(), gen_die(), gen_clear()] {
                assert!(!samples.is_empty());
                assert!(samples.iter().all(|s| s.abs() <= 1.0));
            }
        }
    }
}

// ════════════════════════════════════════════════════════════
//  Public API, compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play_slide(&self) {}
    pub fn play_warp(&self) {}
    pub fn play_step(&self) {}
    pub fn play_die(&self) {}
    pub fn play_clear(&self) {}
}

/// Board subscriber that turns game events into sounds.
/// One engine is shared by the cues of every board the host loads.
pub struct SoundCues(pub Rc<SoundEngine>);

impl Subscriber for SoundCues {
    fn notify(&mut self, event: &GameEvent) {
        match event {
            GameEvent::MoveStarted { .. } => self.0.play_slide(),
            GameEvent::TileRelocated { teleport: true, .. } => self.0.play_warp(),
            GameEvent::PlayerStepped { .. } => self.0.play_step(),
            GameEvent::PlayerDied { .. } => self.0.play_die(),
            GameEvent::PlayerWon { .. } => self.0.play_clear(),
            _ => {}
        }
    }
}
