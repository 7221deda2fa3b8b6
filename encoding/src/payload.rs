use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Standard alphabet; trailing `=` padding may be present or omitted.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// `data:<type>/<subtype>[;param...];base64,`
static DATA_URI_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^data:([A-Za-z0-9][A-Za-z0-9.+\-]*/[A-Za-z0-9][A-Za-z0-9.+\-]*)",
        r"(?:;[^,;]+)*;base64,"
    ))
        .expect("data uri pattern is valid")
});

/// Errors returned by [`decode`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("payload is empty")]
    Empty,

    #[error("payload is not valid base64: {0}")]
    Malformed(String),

    #[error("payload decodes to zero bytes")]
    EmptyAudio,
}

/// Base64 text as received from a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedPayload<'a> {
    media_type: Option<&'a str>,
    body: &'a str,
}

impl<'a> EncodedPayload<'a> {
    /// Splits an optional data URI prefix from the base64 body.
    pub fn parse(text: &'a str) -> Self {
        let text = text.trim();
        match DATA_URI_PREFIX.captures(text) {
            Some(caps) => {
                let prefix = caps.get(0).map_or(0, |m| m.end());
                Self {
                    media_type: caps.get(1).map(|m| m.as_str()),
                    body: &text[prefix..],
                }
            }
            None => Self {
                media_type: None,
                body: text,
            },
        }
    }

    /// Media type declared by the data URI prefix, if any.
    pub fn media_type(&self) -> Option<&'a str> {
        self.media_type
    }

    /// The base64 text with the prefix removed.
    pub fn body(&self) -> &'a str {
        self.body
    }

    /// Decodes the body. Line breaks and other ASCII whitespace are ignored.
    pub fn decode(&self) -> Result<RawAudioBlob, DecodeError> {
        if self.body.is_empty() {
            return Err(DecodeError::Empty);
        }

        let decoded = if self.body.bytes().any(|b| b.is_ascii_whitespace()) {
            let compact: Vec<u8> = self
                .body
                .bytes()
                .filter(|b| !b.is_ascii_whitespace())
                .collect();
            LENIENT.decode(compact)
        } else {
            LENIENT.decode(self.body)
        };
        let data = decoded.map_err(|e| DecodeError::Malformed(e.to_string()))?;

        if data.is_empty() {
            return Err(DecodeError::EmptyAudio);
        }

        Ok(RawAudioBlob {
            data,
            media_type: self.media_type.map(str::to_ascii_lowercase),
        })
    }
}

/// Compressed audio bytes decoded from a payload.
///
/// Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAudioBlob {
    data: Vec<u8>,
    media_type: Option<String>,
}

impl RawAudioBlob {
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn media_type(&self) -> Option<&str> {
        self.media_type.as_deref()
    }

    /// File extension used when the blob is written to disk.
    ///
    /// ffmpeg sniffs the content itself, so this is only a hint.
    pub fn extension(&self) -> &'static str {
        match self.media_type() {
            Some("audio/wav" | "audio/wave" | "audio/x-wav" | "audio/vnd.wave") => "wav",
            Some("audio/ogg" | "audio/opus") => "ogg",
            Some("audio/flac" | "audio/x-flac") => "flac",
            Some("audio/aac") => "aac",
            Some("audio/mp4" | "audio/m4a" | "audio/x-m4a") => "m4a",
            Some("audio/webm") => "webm",
            _ => "mp3",
        }
    }
}

/// Strips an optional data URI prefix and decodes the payload.
pub fn decode(payload: &str) -> Result<RawAudioBlob, DecodeError> {
    EncodedPayload::parse(payload).decode()
}

/// Encodes bytes as standard padded base64.
pub fn encode(data: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(data)
}
