use super::wav_format::{self, WavSpec, WAV_HEADER_SIZE};
use crate::models::audio_models::Chunk;
use crate::models::error::RecorderError;

/// Scale applied to normalized samples.
const PCM16_SCALE: f32 = 32767.0;

/// Convert a normalized sample to 16-bit PCM.
///
/// Scales by 32767, rounds to nearest, and clamps to the full `i16` range,
/// so `1.0 → 32767`, `-1.0 → -32767`, and anything beyond unit amplitude
/// saturates instead of wrapping.
pub fn sample_to_i16(sample: f32) -> i16 {
    if sample.is_nan() {
        return 0;
    }
    (sample * PCM16_SCALE)
        .round()
        .clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

/// Decode little-endian 16-bit PCM bytes. A trailing odd byte is ignored.
pub fn decode_i16(payload: &[u8]) -> Vec<i16> {
    payload
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

/// Builds an in-memory WAV file from captured chunks.
#[derive(Debug, Clone, Copy)]
pub struct PcmEncoder {
    spec: WavSpec,
}

impl PcmEncoder {
    pub fn new(channels: u16, sample_rate: u32) -> Self {
        Self {
            spec: WavSpec::pcm16(channels, sample_rate),
        }
    }

    /// Concatenate `chunks` in order and return the complete file bytes.
    ///
    /// Fails with `EmptyCapture` before doing any work if there is nothing to
    /// encode, and with `EncodingFailed` if a chunk's layout does not match
    /// the encoder's channel count or the payload would overflow the 32-bit
    /// RIFF size fields.
    pub fn encode(&self, chunks: &[Chunk]) -> Result<Vec<u8>, RecorderError> {
        if chunks.is_empty() {
            return Err(RecorderError::EmptyCapture);
        }

        let mut sample_count = 0usize;
        for (index, chunk) in chunks.iter().enumerate() {
            if chunk.channels() != self.spec.channels || !chunk.is_well_formed() {
                return Err(RecorderError::EncodingFailed(format!(
                    "chunk {} has {} samples in {} channels, expected {} channels",
                    index,
                    chunk.samples().len(),
                    chunk.channels(),
                    self.spec.channels
                )));
            }
            sample_count += chunk.samples().len();
        }

        let data_size = u32::try_from(sample_count * 2)
            .ok()
            .filter(|size| size.checked_add(36).is_some())
            .ok_or_else(|| {
                RecorderError::EncodingFailed(format!(
                    "{} samples exceed the WAV size limit",
                    sample_count
                ))
            })?;

        let mut bytes = Vec::with_capacity(WAV_HEADER_SIZE + data_size as usize);
        bytes.extend_from_slice(&wav_format::generate_wav_header(&self.spec, data_size));
        for chunk in chunks {
            for &sample in chunk.samples() {
                bytes.extend_from_slice(&sample_to_i16(sample).to_le_bytes());
            }
        }
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_reference_values() {
        assert_eq!(sample_to_i16(0.0), 0);
        assert_eq!(sample_to_i16(1.0), 32767);
        assert_eq!(sample_to_i16(-1.0), -32767);
        assert_eq!(sample_to_i16(0.5), 16384);
        assert_eq!(sample_to_i16(-0.5), -16384);
    }

    #[test]
    fn rounds_to_nearest_instead_of_truncating() {
        // 0.1 * 32767 = 3276.7
        assert_eq!(sample_to_i16(0.1), 3277);
        assert_eq!(sample_to_i16(-0.1), -3277);
    }

    #[test]
    fn clamps_beyond_unit_amplitude() {
        assert_eq!(sample_to_i16(2.0), i16::MAX);
        assert_eq!(sample_to_i16(-3.0), i16::MIN);
        assert_eq!(sample_to_i16(f32::INFINITY), i16::MAX);
        assert_eq!(sample_to_i16(f32::NAN), 0);
    }

    #[test]
    fn empty_capture_is_rejected_up_front() {
        let encoder = PcmEncoder::new(2, 44100);
        assert_eq!(encoder.encode(&[]), Err(RecorderError::EmptyCapture));
    }

    #[test]
    fn encodes_header_and_interleaved_payload() {
        let encoder = PcmEncoder::new(2, 44100);
        let chunks = vec![
            Chunk::new(2, vec![0.5, -0.5]),
            Chunk::new(2, vec![1.0, 0.0, 0.25, -1.0]),
        ];

        let bytes = encoder.encode(&chunks).unwrap();
        let view = wav_format::parse_wav(&bytes).unwrap();

        assert_eq!(view.spec, WavSpec::pcm16(2, 44100));
        assert_eq!(view.payload.len(), 12);
        assert_eq!(
            decode_i16(view.payload),
            vec![16384, -16384, 32767, 0, 8192, -32767]
        );
    }

    #[test]
    fn payload_is_whole_frames() {
        let encoder = PcmEncoder::new(2, 44100);
        let bytes = encoder.encode(&[Chunk::filled(2, 4410, 0.1)]).unwrap();

        let payload = bytes.len() - WAV_HEADER_SIZE;
        assert_eq!(payload % 4, 0);
        assert_eq!(payload, 4410 * 4);
    }

    #[test]
    fn rejects_channel_mismatch() {
        let encoder = PcmEncoder::new(2, 44100);
        let err = encoder.encode(&[Chunk::filled(1, 10, 0.0)]).unwrap_err();
        assert!(matches!(err, RecorderError::EncodingFailed(_)));
    }

    #[test]
    fn rejects_ragged_chunk() {
        let encoder = PcmEncoder::new(2, 44100);
        let err = encoder.encode(&[Chunk::new(2, vec![0.0; 3])]).unwrap_err();
        assert!(matches!(err, RecorderError::EncodingFailed(_)));
    }

    #[test]
    fn decode_matches_hound() {
        let encoder = PcmEncoder::new(1, 44100);
        let samples: Vec<f32> = (0..100).map(|i| (i as f32 / 50.0) - 1.0).collect();
        let bytes = encoder.encode(&[Chunk::new(1, samples.clone())]).unwrap();

        let reader = hound::WavReader::new(std::io::Cursor::new(bytes)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 44100);
        assert_eq!(spec.bits_per_sample, 16);

        let decoded: Vec<i16> = reader.into_samples::<i16>().map(|s| s.unwrap()).collect();
        let expected: Vec<i16> = samples.iter().map(|&s| sample_to_i16(s)).collect();
        assert_eq!(decoded, expected);
    }
}
