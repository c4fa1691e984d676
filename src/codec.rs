//! # Binary Codec
//!
//! WebAuthn carries binary fields (challenges, credential IDs, user handles,
//! attestation blobs) inside JSON as **unpadded base64url** strings. This
//! module is the single place where those strings become bytes and bytes
//! become strings again; nothing else in the crate touches base64 directly.
//!
//! The alphabet is `A-Z a-z 0-9 - _` with no `=` padding, matching what the
//! browser-side `Base64.fromUint8Array(data, true)` produces. Padded input,
//! `+`/`/` from the standard alphabet, and impossible lengths are all
//! rejected rather than repaired.

use base64::prelude::*;

use crate::error::CeremonyResult;

/// Decodes an unpadded base64url string into raw bytes.
///
/// Fails with [`CeremonyError::MalformedEncoding`](crate::error::CeremonyError)
/// when the input contains characters outside the base64url alphabet,
/// padding, or a length that no byte string encodes to.
pub fn decode(wire: &str) -> CeremonyResult<Vec<u8>> {
    Ok(BASE64_URL_SAFE_NO_PAD.decode(wire)?)
}

/// Encodes raw bytes as an unpadded base64url string.
///
/// Total function; every byte string has exactly one encoding.
pub fn encode(bytes: &[u8]) -> String {
    BASE64_URL_SAFE_NO_PAD.encode(bytes)
}
