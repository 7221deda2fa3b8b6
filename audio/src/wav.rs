//! RIFF/WAVE container handling for 16-bit PCM.
//!
//! Only what the pipeline needs: writing a canonical 44-byte header and
//! walking the chunk list of an existing file to find `fmt ` and `data`.
//! Unknown chunks (`LIST`, `fact`, ...) are skipped.

use thiserror::Error;

use crate::Format;

/// Length of the canonical header written by [`WavHeader::to_bytes`].
pub const HEADER_LEN: usize = 44;

const FORMAT_PCM: u16 = 1;
const FORMAT_EXTENSIBLE: u16 = 0xFFFE;

/// Errors returned when parsing a WAV header.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WavError {
    #[error("wav header truncated: need {need} bytes, got {got}")]
    Truncated { need: usize, got: usize },

    #[error("not a RIFF/WAVE file")]
    NotWave,

    #[error("missing fmt chunk")]
    MissingFormat,

    #[error("missing data chunk")]
    MissingData,

    #[error("unsupported wav encoding tag {0:#06x}")]
    UnsupportedEncoding(u16),

    #[error("unsupported sample depth: {0} bits")]
    UnsupportedDepth(u16),

    #[error("unsupported channel count: {0}")]
    UnsupportedChannels(u16),
}

/// Parsed or to-be-written WAV header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub format: Format,
    /// Offset of the first PCM byte.
    pub data_offset: usize,
    /// Length of the PCM payload in bytes.
    pub data_len: u32,
}

impl WavHeader {
    /// Creates a canonical header for `data_len` bytes of PCM.
    pub fn new(format: Format, data_len: u32) -> Self {
        Self {
            format,
            data_offset: HEADER_LEN,
            data_len,
        }
    }

    /// Encodes the canonical 44-byte header.
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut h = [0u8; HEADER_LEN];
        let channels = self.format.channels();
        let block_align = self.format.frame_bytes() as u16;

        h[0..4].copy_from_slice(b"RIFF");
        h[4..8].copy_from_slice(&(36u32.wrapping_add(self.data_len)).to_le_bytes());
        h[8..12].copy_from_slice(b"WAVE");
        h[12..16].copy_from_slice(b"fmt ");
        h[16..20].copy_from_slice(&16u32.to_le_bytes());
        h[20..22].copy_from_slice(&FORMAT_PCM.to_le_bytes());
        h[22..24].copy_from_slice(&channels.to_le_bytes());
        h[24..28].copy_from_slice(&self.format.sample_rate.to_le_bytes());
        h[28..32].copy_from_slice(&self.format.bytes_rate().to_le_bytes());
        h[32..34].copy_from_slice(&block_align.to_le_bytes());
        h[34..36].copy_from_slice(&self.format.depth().to_le_bytes());
        h[36..40].copy_from_slice(b"data");
        h[40..44].copy_from_slice(&self.data_len.to_le_bytes());
        h
    }

    /// Parses the header at the start of `buf`.
    ///
    /// `buf` only needs to reach the `data` chunk header; the PCM payload
    /// itself is not inspected.
    pub fn parse(buf: &[u8]) -> Result<Self, WavError> {
        if buf.len() < 12 {
            return Err(WavError::Truncated {
                need: 12,
                got: buf.len(),
            });
        }
        if &buf[0..4] != b"RIFF" || &buf[8..12] != b"WAVE" {
            return Err(WavError::NotWave);
        }

        let mut format = None;
        let mut pos = 12;
        while pos + 8 <= buf.len() {
            let id = &buf[pos..pos + 4];
            let size = read_u32(buf, pos + 4) as usize;
            let body = pos + 8;

            match id {
                b"fmt " => {
                    if body + 16 > buf.len() {
                        return Err(WavError::Truncated {
                            need: body + 16,
                            got: buf.len(),
                        });
                    }
                    format = Some(parse_fmt(&buf[body..body + 16])?);
                }
                b"data" => {
                    let format = format.ok_or(WavError::MissingFormat)?;
                    return Ok(Self {
                        format,
                        data_offset: body,
                        data_len: size as u32,
                    });
                }
                _ => {}
            }

            // Chunks are word aligned.
            pos = body + size + (size & 1);
        }

        if format.is_none() {
            Err(WavError::MissingFormat)
        } else {
            Err(WavError::MissingData)
        }
    }
}

fn parse_fmt(b: &[u8]) -> Result<Format, WavError> {
    let tag = u16::from_le_bytes([b[0], b[1]]);
    if tag != FORMAT_PCM && tag != FORMAT_EXTENSIBLE {
        return Err(WavError::UnsupportedEncoding(tag));
    }
    let channels = u16::from_le_bytes([b[2], b[3]]);
    let sample_rate = read_u32(b, 4);
    let depth = u16::from_le_bytes([b[14], b[15]]);
    if depth != 16 {
        return Err(WavError::UnsupportedDepth(depth));
    }
    match channels {
        1 => Ok(Format::mono(sample_rate)),
        2 => Ok(Format::stereo(sample_rate)),
        n => Err(WavError::UnsupportedChannels(n)),
    }
}

fn read_u32(b: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([b[at], b[at + 1], b[at + 2], b[at + 3]])
}

/// Encodes samples as a complete WAV file.
pub fn encode_pcm(format: Format, samples: &[i16]) -> Vec<u8> {
    let data_len = (samples.len() * 2) as u32;
    let mut out = Vec::with_capacity(HEADER_LEN + samples.len() * 2);
    out.extend_from_slice(&WavHeader::new(format, data_len).to_bytes());
    for sample in samples {
        out.extend_from_slice(&sample.to_le_bytes());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        let h = WavHeader::new(Format::CANONICAL, 32000).to_bytes();
        assert_eq!(&h[0..4], b"RIFF");
        assert_eq!(read_u32(&h, 4), 36 + 32000);
        assert_eq!(&h[8..16], b"WAVEfmt ");
        assert_eq!(read_u32(&h, 24), 16000);
        assert_eq!(read_u32(&h, 28), 32000);
        assert_eq!(&h[36..40], b"data");
        assert_eq!(read_u32(&h, 40), 32000);
    }

    #[test]
    fn test_parse_canonical() {
        let wav = encode_pcm(Format::CANONICAL, &[1, -1, 2, -2]);
        let h = WavHeader::parse(&wav).unwrap();
        assert_eq!(h.format, Format::CANONICAL);
        assert_eq!(h.data_offset, HEADER_LEN);
        assert_eq!(h.data_len, 8);
    }

    #[test]
    fn test_parse_skips_list_chunk() {
        let canonical = WavHeader::new(Format::stereo(48000), 4).to_bytes();
        let mut wav = Vec::new();
        wav.extend_from_slice(&canonical[..36]);
        // Odd-sized LIST chunk followed by a pad byte.
        wav.extend_from_slice(b"LIST");
        wav.extend_from_slice(&5u32.to_le_bytes());
        wav.extend_from_slice(b"INFOx\0");
        wav.extend_from_slice(&canonical[36..]);
        wav.extend_from_slice(&[0, 0, 0, 0]);

        let h = WavHeader::parse(&wav).unwrap();
        assert_eq!(h.format, Format::stereo(48000));
        assert_eq!(h.data_offset, 36 + 14 + 8);
        assert_eq!(h.data_len, 4);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(
            WavHeader::parse(b"ID3").unwrap_err(),
            WavError::Truncated { need: 12, got: 3 }
        );
        assert_eq!(
            WavHeader::parse(b"ID3\x04\0\0\0\0\0\0\0\0\0\0").unwrap_err(),
            WavError::NotWave
        );
    }

    #[test]
    fn test_parse_requires_fmt_before_data() {
        let mut wav = Vec::new();
        wav.extend_from_slice(b"RIFF\0\0\0\0WAVE");
        wav.extend_from_slice(b"data\0\0\0\0");
        assert_eq!(WavHeader::parse(&wav).unwrap_err(), WavError::MissingFormat);
    }

    #[test]
    fn test_parse_rejects_float_and_8bit() {
        let mut h = WavHeader::new(Format::CANONICAL, 0).to_bytes();
        h[20] = 3; // IEEE float
        assert_eq!(WavHeader::parse(&h).unwrap_err(), WavError::UnsupportedEncoding(3));

        let mut h = WavHeader::new(Format::CANONICAL, 0).to_bytes();
        h[34] = 8;
        assert_eq!(WavHeader::parse(&h).unwrap_err(), WavError::UnsupportedDepth(8));
    }

    #[test]
    fn test_parse_missing_data() {
        let h = WavHeader::new(Format::CANONICAL, 0).to_bytes();
        assert_eq!(WavHeader::parse(&h[..36]).unwrap_err(), WavError::MissingData);
    }
}
