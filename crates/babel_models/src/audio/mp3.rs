//! MP3 decoding to mono PCM.

use super::wav::Pcm;
use babel_error::{GenerationError, GenerationErrorKind};
use std::io::{Cursor, ErrorKind};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

/// Decode an MP3 stream, averaging channels down to mono.
///
/// Corrupt frames are skipped; a stream with no decodable frames is an error.
pub fn decode(bytes: &[u8]) -> Result<Pcm, GenerationError> {
    let invalid = |reason: String| {
        GenerationError::new(GenerationErrorKind::Audio(format!("invalid MP3: {reason}")))
    };

    let source = MediaSourceStream::new(
        Box::new(Cursor::new(bytes.to_vec())),
        MediaSourceStreamOptions::default(),
    );
    let mut hint = Hint::new();
    hint.with_extension("mp3");
    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            source,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| invalid(e.to_string()))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|track| track.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| invalid("no audio track".to_string()))?;
    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate;
    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| invalid(e.to_string()))?;

    let mut samples = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(invalid(e.to_string())),
        };
        if packet.track_id() != track_id {
            continue;
        }
        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(reason)) => {
                debug!(reason, "Skipping corrupt MP3 frame");
                continue;
            }
            Err(e) => return Err(invalid(e.to_string())),
        };

        let spec = *decoded.spec();
        sample_rate.get_or_insert(spec.rate);
        let channels = spec.channels.count().max(1);
        let mut buffer = SampleBuffer::<i16>::new(decoded.capacity() as u64, spec);
        buffer.copy_interleaved_ref(decoded);
        samples.extend(buffer.samples().chunks(channels).map(|frame| {
            let sum: i32 = frame.iter().map(|&s| i32::from(s)).sum();
            (sum / channels as i32) as i16
        }));
    }

    let sample_rate = sample_rate.ok_or_else(|| invalid("unknown sample rate".to_string()))?;
    if samples.is_empty() {
        return Err(invalid("no audio frames".to_string()));
    }
    Ok(Pcm {
        sample_rate,
        samples,
    })
}

/// Silent MPEG-1 Layer III frames: mono, 48 kHz, 128 kbps.
#[cfg(test)]
pub(crate) fn silent_frames(count: usize) -> Vec<u8> {
    const FRAME_LEN: usize = 384;
    let mut frame = vec![0u8; FRAME_LEN];
    frame[..4].copy_from_slice(&[0xFF, 0xFB, 0x94, 0xC0]);
    frame.repeat(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_silent_frames() {
        let pcm = decode(&silent_frames(20)).expect("decodes");
        assert_eq!(pcm.sample_rate, 48_000);
        assert!(pcm.duration_secs() > 0.3);
        assert!(pcm.samples.iter().all(|&s| s == 0));
    }

    #[test]
    fn rejects_garbage() {
        assert!(decode(b"not an mp3 stream").is_err());
    }
}
