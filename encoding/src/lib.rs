//! Decoding of text-safe audio payloads.
//!
//! Callers hand audio to the service as standard Base64, optionally wrapped
//! in a data URI (`data:audio/mpeg;base64,...`). [`decode`] strips the
//! prefix, decodes the bytes and returns a [`RawAudioBlob`].
//!
//! # Example
//!
//! ```rust
//! use voxguard_encoding::decode;
//!
//! let blob = decode("data:audio/mpeg;base64,SUQzBAA=").unwrap();
//! assert_eq!(blob.as_bytes(), b"ID3\x04\x00");
//! assert_eq!(blob.media_type(), Some("audio/mpeg"));
//! assert_eq!(blob.extension(), "mp3");
//! ```

mod payload;

pub use payload::{DecodeError, EncodedPayload, RawAudioBlob, decode, encode};
