use std::io::Cursor;
use std::sync::Arc;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::types::AudioData;
use crate::error::DecodeError;

/// Host capability that turns raw bytes into samples.
///
/// The editor owns no format logic of its own; anything that can produce
/// interleaved samples at a known rate can stand in here.
pub trait AudioDecoder: Send + Sync {
    fn decode(&self, bytes: Arc<[u8]>) -> Result<AudioData, DecodeError>;
}

/// Decoder backed by symphonia's default format and codec registries.
#[derive(Debug, Default, Clone, Copy)]
pub struct SymphoniaDecoder;

impl AudioDecoder for SymphoniaDecoder {
    fn decode(&self, bytes: Arc<[u8]>) -> Result<AudioData, DecodeError> {
        decode_bytes(bytes)
    }
}

/// Decode an in-memory audio stream into an `AudioData` struct.
pub fn decode_bytes(bytes: Arc<[u8]>) -> Result<AudioData, DecodeError> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

    let probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| DecodeError::Probe(e.to_string()))?;

    let mut format = probed.format;

    let track = format.default_track().ok_or(DecodeError::NoTrack)?.clone();

    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or(DecodeError::MissingSampleRate)?;
    let mut channels = track
        .codec_params
        .channels
        .map(|c| c.count() as u16)
        .unwrap_or(0);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| DecodeError::Codec(e.to_string()))?;

    let mut samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(DecodeError::Read(e.to_string())),
        };

        if packet.track_id() != track.id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(symphonia::core::errors::Error::DecodeError(e)) => {
                tracing::warn!(error = e, "skipping undecodable packet");
                continue;
            }
            Err(e) => return Err(DecodeError::Read(e.to_string())),
        };

        let spec = *decoded.spec();
        channels = spec.channels.count() as u16;
        let num_frames = decoded.capacity();

        let mut sample_buf = SampleBuffer::<f32>::new(num_frames as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        samples.extend_from_slice(sample_buf.samples());
    }

    if samples.is_empty() || channels == 0 {
        return Err(DecodeError::Empty);
    }

    let num_frames = samples.len() / channels as usize;
    let duration = num_frames as f64 / sample_rate as f64;

    Ok(AudioData {
        samples,
        sample_rate,
        channels,
        duration,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Render a 16-bit PCM WAV file into memory.
    pub(crate) fn wav_bytes(channels: u16, sample_rate: u32, frames: &[Vec<i16>]) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for frame in frames {
                for &sample in frame {
                    writer.write_sample(sample).unwrap();
                }
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn decodes_stereo_wav_from_memory() {
        let frames: Vec<Vec<i16>> = (0..800)
            .map(|i| vec![if i < 400 { 16_384 } else { 0 }, -8_192])
            .collect();
        let bytes = wav_bytes(2, 8_000, &frames);

        let audio = SymphoniaDecoder.decode(bytes.into()).unwrap();

        assert_eq!(audio.channels, 2);
        assert_eq!(audio.sample_rate, 8_000);
        assert_eq!(audio.num_frames(), 800);
        assert!((audio.duration - 0.1).abs() < 1e-9);

        let left = audio.channel(0);
        assert!((left[0] - 0.5).abs() < 1e-3);
        assert_eq!(left[799], 0.0);
    }

    #[test]
    fn garbage_bytes_fail_to_probe() {
        let bytes: Arc<[u8]> = vec![0x13u8; 4096].into();
        let err = SymphoniaDecoder.decode(bytes).unwrap_err();
        assert!(matches!(err, DecodeError::Probe(_)));
    }
}
