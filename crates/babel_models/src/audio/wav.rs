//! 16-bit mono PCM and its WAV container.

use babel_error::{GenerationError, GenerationErrorKind};
use std::f32::consts::PI;

/// Sample rate used for synthesized audio and Gemini speech.
pub const SAMPLE_RATE: u32 = 24_000;

/// Mono 16-bit PCM samples at a fixed rate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pcm {
    /// Samples per second
    pub sample_rate: u32,
    /// Signed samples
    pub samples: Vec<i16>,
}

impl Pcm {
    /// Sine tone at `gain_db` relative to full scale.
    pub fn sine(sample_rate: u32, frequency_hz: f32, seconds: f32, gain_db: f32) -> Self {
        let amplitude = i16::MAX as f32 * db_to_gain(gain_db);
        let count = (sample_rate as f32 * seconds.max(0.0)) as usize;
        let samples = (0..count)
            .map(|n| {
                let t = n as f32 / sample_rate as f32;
                (amplitude * (2.0 * PI * frequency_hz * t).sin()) as i16
            })
            .collect();
        Self {
            sample_rate,
            samples,
        }
    }

    /// Interpret little-endian 16-bit bytes.
    pub fn from_le_bytes(sample_rate: u32, bytes: &[u8]) -> Self {
        let samples = bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        Self {
            sample_rate,
            samples,
        }
    }

    /// Length in seconds.
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Sum another track onto this one, saturating; the other track is looped or cut
    /// to this track's length.
    pub fn overlay_looped(&mut self, other: &Pcm) {
        if other.samples.is_empty() {
            return;
        }
        for (sample, bed) in self.samples.iter_mut().zip(other.samples.iter().cycle()) {
            *sample = sample.saturating_add(*bed);
        }
    }

    /// Raise pitch and tempo together by relabelling the sample rate.
    pub fn raise_pitch(&mut self, factor: f32) {
        self.sample_rate = (self.sample_rate as f32 * factor).round() as u32;
    }

    /// Append another track.
    pub fn append(&mut self, other: &Pcm) {
        self.samples.extend_from_slice(&other.samples);
    }

    /// Encode as a WAV file.
    pub fn to_wav(&self) -> Vec<u8> {
        let data_len = (self.samples.len() * 2) as u32;
        let mut out = Vec::with_capacity(44 + data_len as usize);
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes()); // PCM
        out.extend_from_slice(&1u16.to_le_bytes()); // mono
        out.extend_from_slice(&self.sample_rate.to_le_bytes());
        out.extend_from_slice(&(self.sample_rate * 2).to_le_bytes());
        out.extend_from_slice(&2u16.to_le_bytes());
        out.extend_from_slice(&16u16.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        for sample in &self.samples {
            out.extend_from_slice(&sample.to_le_bytes());
        }
        out
    }

    /// Decode a 16-bit mono PCM WAV file.
    pub fn from_wav(bytes: &[u8]) -> Result<Self, GenerationError> {
        let invalid = |reason: &str| {
            GenerationError::new(GenerationErrorKind::Audio(format!("invalid WAV: {reason}")))
        };
        if bytes.len() < 12 || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
            return Err(invalid("missing RIFF/WAVE header"));
        }

        let mut offset = 12;
        let mut sample_rate = None;
        while offset + 8 <= bytes.len() {
            let id = &bytes[offset..offset + 4];
            let size = u32::from_le_bytes([
                bytes[offset + 4],
                bytes[offset + 5],
                bytes[offset + 6],
                bytes[offset + 7],
            ]) as usize;
            let body_start = offset + 8;
            let body_end = body_start.saturating_add(size).min(bytes.len());
            let body = &bytes[body_start..body_end];

            match id {
                b"fmt " => {
                    if body.len() < 16 {
                        return Err(invalid("short fmt chunk"));
                    }
                    let format = u16::from_le_bytes([body[0], body[1]]);
                    let channels = u16::from_le_bytes([body[2], body[3]]);
                    let bits = u16::from_le_bytes([body[14], body[15]]);
                    if format != 1 || channels != 1 || bits != 16 {
                        return Err(invalid("only 16-bit mono PCM is supported"));
                    }
                    sample_rate = Some(u32::from_le_bytes([body[4], body[5], body[6], body[7]]));
                }
                b"data" => {
                    let rate = sample_rate.ok_or_else(|| invalid("data before fmt"))?;
                    return Ok(Self::from_le_bytes(rate, body));
                }
                _ => {}
            }
            // chunks are padded to even sizes
            offset = body_start + size + (size & 1);
        }
        Err(invalid("missing data chunk"))
    }
}

/// Convert decibels to a linear gain.
pub fn db_to_gain(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

/// Sample rate from a mime type such as `audio/L16;codec=pcm;rate=24000`.
pub fn rate_from_mime(mime: &str) -> Option<u32> {
    mime.split(';')
        .filter_map(|param| param.trim().strip_prefix("rate="))
        .find_map(|rate| rate.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wav_header_and_decode() {
        let pcm = Pcm::sine(SAMPLE_RATE, 440.0, 0.5, -6.0);
        let wav = pcm.to_wav();
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(wav.len(), 44 + pcm.samples.len() * 2);

        let decoded = Pcm::from_wav(&wav).expect("decodes");
        assert_eq!(decoded, pcm);
        assert!((decoded.duration_secs() - 0.5).abs() < 0.001);
    }

    #[test]
    fn rejects_non_wav() {
        assert!(Pcm::from_wav(b"ID3\x03not a wav file").is_err());
    }

    #[test]
    fn overlay_loops_and_saturates() {
        let mut base = Pcm {
            sample_rate: 10,
            samples: vec![i16::MAX, 0, 0, 0, 0],
        };
        let bed = Pcm {
            sample_rate: 10,
            samples: vec![10, 20],
        };
        base.overlay_looped(&bed);
        assert_eq!(base.samples, vec![i16::MAX, 20, 10, 20, 10]);
    }

    #[test]
    fn raising_pitch_shortens_the_clip() {
        let mut pcm = Pcm::sine(SAMPLE_RATE, 440.0, 1.1, -6.0);
        pcm.raise_pitch(1.1);
        assert_eq!(pcm.sample_rate, 26_400);
        assert!((pcm.duration_secs() - 1.0).abs() < 0.001);
    }

    #[test]
    fn parses_rate_from_mime() {
        assert_eq!(rate_from_mime("audio/L16;codec=pcm;rate=24000"), Some(24_000));
        assert_eq!(rate_from_mime("audio/wav"), None);
    }
}
