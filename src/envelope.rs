use std::fmt;
use std::sync::Arc;

use crate::audio::decoder::AudioDecoder;
use crate::audio::types::AudioData;
use crate::error::DecodeError;
use crate::source::{AudioSource, SourceId};

/// Fixed-length amplitude summary of channel 0, normalized so the loudest
/// bucket is exactly 1.0. Every value is finite and in `[0, 1]`.
#[derive(Clone, PartialEq)]
pub struct Envelope {
    buckets: Vec<f32>,
}

impl Envelope {
    /// An all-zero envelope, used before decoding finishes or after it fails.
    pub fn silent(bucket_count: usize) -> Self {
        Self {
            buckets: vec![0.0; bucket_count],
        }
    }

    /// Reduce `samples` to `bucket_count` mean absolute amplitudes.
    ///
    /// The samples are split into `bucket_count` blocks of
    /// `samples.len() / bucket_count` each. Samples past the last full block
    /// are not counted. With fewer samples than buckets every block is empty
    /// and the envelope is silent.
    pub fn from_samples(samples: Vec<f32>, bucket_count: usize) -> Self {
        let mut buckets = block_means(&samples, bucket_count);
        drop(samples);

        let max = buckets.iter().copied().fold(0.0f32, f32::max);
        if max > 0.0 && max.is_finite() {
            for value in &mut buckets {
                *value /= max;
            }
        } else {
            buckets.fill(0.0);
        }

        Self { buckets }
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn buckets(&self) -> &[f32] {
        &self.buckets
    }

    pub fn is_silent(&self) -> bool {
        self.buckets.iter().all(|&v| v == 0.0)
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("buckets", &self.buckets.len())
            .field("silent", &self.is_silent())
            .finish()
    }
}

fn block_means(samples: &[f32], bucket_count: usize) -> Vec<f32> {
    if bucket_count == 0 {
        return Vec::new();
    }

    let block_size = samples.len() / bucket_count;
    if block_size == 0 {
        return vec![0.0; bucket_count];
    }

    samples
        .chunks_exact(block_size)
        .take(bucket_count)
        .map(|block| {
            let sum: f64 = block
                .iter()
                .filter(|s| s.is_finite())
                .map(|&s| f64::from(s.abs()))
                .sum();
            (sum / block_size as f64) as f32
        })
        .collect()
}

/// Successful output of the extraction step.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub envelope: Envelope,
    /// The decoded stream, handed on to the host's playback engine. The
    /// channel-0 copy the envelope was computed from is already dropped.
    pub media: Arc<AudioData>,
}

/// Extraction outcome tagged with the source it was computed for.
#[derive(Debug, Clone)]
pub struct Extracted {
    pub source: SourceId,
    pub result: Result<Extraction, DecodeError>,
}

/// Decodes audio sources and reduces them to envelopes.
#[derive(Clone)]
pub struct EnvelopeExtractor {
    decoder: Arc<dyn AudioDecoder>,
    bucket_count: usize,
}

impl EnvelopeExtractor {
    pub fn new(decoder: Arc<dyn AudioDecoder>, bucket_count: usize) -> Self {
        Self {
            decoder,
            bucket_count,
        }
    }

    pub fn bucket_count(&self) -> usize {
        self.bucket_count
    }

    /// Decode and reduce on the calling thread.
    pub fn extract_blocking(&self, source: &AudioSource) -> Extracted {
        let result = self
            .decoder
            .decode(Arc::clone(source.bytes()))
            .map(|audio| {
                let envelope = Envelope::from_samples(audio.channel(0), self.bucket_count);
                Extraction {
                    envelope,
                    media: Arc::new(audio),
                }
            });

        match &result {
            Ok(extraction) => tracing::debug!(
                source = %source.id(),
                duration = extraction.media.duration,
                sample_rate = extraction.media.sample_rate,
                channels = extraction.media.channels,
                "envelope extracted"
            ),
            Err(e) => tracing::debug!(source = %source.id(), error = %e, "decode failed"),
        }

        Extracted {
            source: source.id(),
            result,
        }
    }

    /// Decode and reduce on a blocking worker so the event loop stays free.
    pub async fn extract(self, source: AudioSource) -> Extracted {
        let id = source.id();
        tokio::task::spawn_blocking(move || self.extract_blocking(&source))
            .await
            .unwrap_or_else(|e| Extracted {
                source: id,
                result: Err(DecodeError::Read(format!("decode task failed: {e}"))),
            })
    }
}

impl fmt::Debug for EnvelopeExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvelopeExtractor")
            .field("bucket_count", &self.bucket_count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::decoder::tests::wav_bytes;
    use crate::audio::decoder::SymphoniaDecoder;

    #[test]
    fn silent_input_gives_all_zero_envelope() {
        let envelope = Envelope::from_samples(vec![0.0; 12_000], 120);

        assert_eq!(envelope.len(), 120);
        assert!(envelope.buckets().iter().all(|&v| v == 0.0));
        assert!(envelope.buckets().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn single_loud_block_normalizes_to_one() {
        let mut samples = vec![0.0; 1200];
        for s in &mut samples[300..310] {
            *s = -0.25;
        }

        let envelope = Envelope::from_samples(samples, 120);

        assert_eq!(envelope.buckets()[30], 1.0);
        for (i, &v) in envelope.buckets().iter().enumerate() {
            if i != 30 {
                assert_eq!(v, 0.0, "bucket {i}");
            }
        }
    }

    #[test]
    fn buckets_are_relative_to_loudest_block() {
        let mut samples = vec![0.5; 40];
        samples.extend(vec![-1.0; 40]);
        samples.extend(vec![0.25; 40]);

        let envelope = Envelope::from_samples(samples, 3);

        assert_eq!(envelope.buckets(), &[0.5, 1.0, 0.25]);
    }

    #[test]
    fn remainder_samples_are_dropped() {
        // 3 buckets of 2 samples; the trailing loud sample is past the last block.
        let samples = vec![0.5, 0.5, 0.25, 0.25, 0.5, 0.5, 1.0];

        let envelope = Envelope::from_samples(samples, 3);

        assert_eq!(envelope.buckets(), &[1.0, 0.5, 1.0]);
    }

    #[test]
    fn fewer_samples_than_buckets_is_silent() {
        let envelope = Envelope::from_samples(vec![1.0; 50], 120);

        assert_eq!(envelope.len(), 120);
        assert!(envelope.is_silent());
    }

    #[test]
    fn non_finite_samples_count_as_silence() {
        let samples = vec![f32::NAN, f32::INFINITY, 0.5, 0.5];

        let envelope = Envelope::from_samples(samples, 2);

        assert_eq!(envelope.buckets(), &[0.0, 1.0]);
    }

    #[test]
    fn extraction_is_tagged_with_its_source() {
        let frames: Vec<Vec<i16>> = (0..1200).map(|i| vec![(i % 100) as i16 * 100]).collect();
        let source = AudioSource::new(SourceId::new(7), wav_bytes(1, 8_000, &frames));
        let extractor = EnvelopeExtractor::new(Arc::new(SymphoniaDecoder), 120);

        let extracted = extractor.extract_blocking(&source);

        assert_eq!(extracted.source, SourceId::new(7));
        let extraction = extracted.result.unwrap();
        assert_eq!(extraction.envelope.len(), 120);
        assert_eq!(extraction.media.num_frames(), 1200);
    }

    #[tokio::test]
    async fn corrupt_bytes_surface_decode_error() {
        let source = AudioSource::new(SourceId::new(1), vec![0xffu8; 2048]);
        let extractor = EnvelopeExtractor::new(Arc::new(SymphoniaDecoder), 120);

        let extracted = extractor.extract(source).await;

        assert_eq!(extracted.source, SourceId::new(1));
        assert!(extracted.result.is_err());
    }
}
