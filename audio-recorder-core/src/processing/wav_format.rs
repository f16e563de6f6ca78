//! WAV (RIFF/WAVE linear PCM) container layout.
//!
//! Writing always produces the canonical 44-byte header. Reading walks the
//! RIFF chunk list so files from other writers (with `LIST` or other extra
//! chunks) parse too.

use crate::models::error::RecorderError;

/// Size of the canonical WAV header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

/// PCM format code in the `fmt ` chunk.
pub const FORMAT_PCM: u16 = 1;

/// Format fields of a PCM container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavSpec {
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
}

impl WavSpec {
    pub fn pcm16(channels: u16, sample_rate: u32) -> Self {
        Self {
            channels,
            sample_rate,
            bits_per_sample: 16,
        }
    }

    /// Bytes per interleaved frame. Parsed headers can declare any channel
    /// count, so this is computed without the 16-bit header field's limit.
    pub fn frame_bytes(&self) -> usize {
        self.channels as usize * self.bits_per_sample as usize / 8
    }

    /// Header `block_align` field; saturates if the layout does not fit.
    pub fn block_align(&self) -> u16 {
        u16::try_from(self.frame_bytes()).unwrap_or(u16::MAX)
    }

    /// Header `byte_rate` field; saturates if the layout does not fit.
    pub fn byte_rate(&self) -> u32 {
        let rate = self.sample_rate as u64 * self.frame_bytes() as u64;
        u32::try_from(rate).unwrap_or(u32::MAX)
    }
}

/// Generate a 44-byte WAV RIFF header.
///
/// Layout (little-endian):
/// ```text
/// [0-3]    "RIFF"
/// [4-7]    36 + data_size
/// [8-11]   "WAVE"
/// [12-15]  "fmt "
/// [16-19]  16 (PCM format chunk size)
/// [20-21]  1 (PCM format code)
/// [22-23]  channels
/// [24-27]  sample_rate
/// [28-31]  byte_rate = sample_rate * channels * bit_depth / 8
/// [32-33]  block_align = channels * bit_depth / 8
/// [34-35]  bit_depth
/// [36-39]  "data"
/// [40-43]  data_size
/// ```
pub fn generate_wav_header(spec: &WavSpec, data_size: u32) -> [u8; WAV_HEADER_SIZE] {
    let mut header = [0u8; WAV_HEADER_SIZE];

    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&(36 + data_size).to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");

    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes());
    header[20..22].copy_from_slice(&FORMAT_PCM.to_le_bytes());
    header[22..24].copy_from_slice(&spec.channels.to_le_bytes());
    header[24..28].copy_from_slice(&spec.sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&spec.byte_rate().to_le_bytes());
    header[32..34].copy_from_slice(&spec.block_align().to_le_bytes());
    header[34..36].copy_from_slice(&spec.bits_per_sample.to_le_bytes());

    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_size.to_le_bytes());

    header
}

/// A parsed container: format plus a borrowed view of the data chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavView<'a> {
    pub spec: WavSpec,
    pub payload: &'a [u8],
}

/// Parse a RIFF/WAVE byte buffer.
///
/// Requires a PCM `fmt ` chunk before the `data` chunk, and a `data` chunk
/// whose declared size fits in the buffer. Unknown chunks are skipped.
pub fn parse_wav(bytes: &[u8]) -> Result<WavView<'_>, RecorderError> {
    if bytes.len() < 12 || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return Err(corrupt("missing RIFF/WAVE signature"));
    }

    let mut offset = 12;
    let mut spec = None;
    while offset + 8 <= bytes.len() {
        let id = &bytes[offset..offset + 4];
        let size = read_u32(bytes, offset + 4) as usize;
        let body_start = offset + 8;
        let body_end = body_start
            .checked_add(size)
            .ok_or_else(|| corrupt("chunk size overflows"))?;

        match id {
            b"fmt " => {
                if size < 16 || body_end > bytes.len() {
                    return Err(corrupt("truncated fmt chunk"));
                }
                let format = read_u16(bytes, body_start);
                if format != FORMAT_PCM {
                    return Err(corrupt(&format!("unsupported format code {}", format)));
                }
                spec = Some(WavSpec {
                    channels: read_u16(bytes, body_start + 2),
                    sample_rate: read_u32(bytes, body_start + 4),
                    bits_per_sample: read_u16(bytes, body_start + 14),
                });
            }
            b"data" => {
                let spec = spec.ok_or_else(|| corrupt("data chunk before fmt chunk"))?;
                if body_end > bytes.len() {
                    return Err(corrupt(&format!(
                        "data chunk declares {} bytes but only {} remain",
                        size,
                        bytes.len() - body_start
                    )));
                }
                return Ok(WavView {
                    spec,
                    payload: &bytes[body_start..body_end],
                });
            }
            _ => {}
        }

        // Chunks are word aligned.
        offset = body_end + (size & 1);
    }

    Err(corrupt("no data chunk"))
}

fn read_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn corrupt(reason: &str) -> RecorderError {
    RecorderError::CorruptContainer(reason.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_u16(h: &[u8], at: usize) -> u16 {
        u16::from_le_bytes([h[at], h[at + 1]])
    }

    fn field_u32(h: &[u8], at: usize) -> u32 {
        u32::from_le_bytes([h[at], h[at + 1], h[at + 2], h[at + 3]])
    }

    #[test]
    fn header_magic_and_sizes() {
        let header = generate_wav_header(&WavSpec::pcm16(2, 44100), 17640);

        assert_eq!(&header[0..4], b"RIFF");
        assert_eq!(&header[8..12], b"WAVE");
        assert_eq!(&header[12..16], b"fmt ");
        assert_eq!(&header[36..40], b"data");
        assert_eq!(field_u32(&header, 4), 36 + 17640);
        assert_eq!(field_u32(&header, 40), 17640);
    }

    #[test]
    fn header_44k1_stereo_16bit() {
        let header = generate_wav_header(&WavSpec::pcm16(2, 44100), 0);

        assert_eq!(field_u16(&header, 20), 1);
        assert_eq!(field_u16(&header, 22), 2);
        assert_eq!(field_u32(&header, 24), 44100);
        assert_eq!(field_u32(&header, 28), 176400);
        assert_eq!(field_u16(&header, 32), 4);
        assert_eq!(field_u16(&header, 34), 16);
    }

    #[test]
    fn parse_own_header() {
        let mut bytes = generate_wav_header(&WavSpec::pcm16(1, 44100), 4).to_vec();
        bytes.extend_from_slice(&[1, 0, 2, 0]);

        let view = parse_wav(&bytes).unwrap();

        assert_eq!(view.spec, WavSpec::pcm16(1, 44100));
        assert_eq!(view.payload, &[1, 0, 2, 0]);
    }

    #[test]
    fn parse_skips_unknown_chunks() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(b"WAVE");
        bytes.extend_from_slice(&generate_wav_header(&WavSpec::pcm16(2, 48000), 0)[12..36]);
        // odd-sized LIST chunk with pad byte
        bytes.extend_from_slice(b"LIST");
        bytes.extend_from_slice(&3u32.to_le_bytes());
        bytes.extend_from_slice(&[9, 9, 9, 0]);
        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&4u32.to_le_bytes());
        bytes.extend_from_slice(&[0xff, 0x7f, 0x00, 0x80]);

        let view = parse_wav(&bytes).unwrap();

        assert_eq!(view.spec.sample_rate, 48000);
        assert_eq!(view.payload, &[0xff, 0x7f, 0x00, 0x80]);
    }

    #[test]
    fn parse_rejects_truncated_data() {
        let mut bytes = generate_wav_header(&WavSpec::pcm16(2, 44100), 400).to_vec();
        bytes.extend_from_slice(&[0u8; 100]);

        assert!(matches!(parse_wav(&bytes), Err(RecorderError::CorruptContainer(_))));
    }

    #[test]
    fn parse_rejects_non_pcm() {
        let mut header = generate_wav_header(&WavSpec::pcm16(2, 44100), 0);
        header[20..22].copy_from_slice(&3u16.to_le_bytes()); // IEEE float

        let err = parse_wav(&header).unwrap_err();
        assert!(err.to_string().contains("format code 3"));
    }

    #[test]
    fn wide_layouts_do_not_overflow() {
        let spec = WavSpec::pcm16(u16::MAX, 192000);

        assert_eq!(spec.frame_bytes(), 131070);
        assert_eq!(spec.block_align(), u16::MAX);
        assert_eq!(spec.byte_rate(), u32::MAX);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse_wav(b"not a wav file at all").is_err());
        assert!(parse_wav(&[]).is_err());
    }
}
