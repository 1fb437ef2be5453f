//! Short fingerprints for prompts, so logs can correlate requests without
//! carrying conversation text.

use std::fmt::Write;

use sha2::{Digest, Sha256};

/// Hex digits of the digest kept in a fingerprint.
const FINGERPRINT_HEX_LEN: usize = 16;

/// Fingerprint a prompt as `<words>w:<16 hex digits of SHA-256>`.
pub fn hash_prompt(prompt: &str) -> String {
    let digest = Sha256::digest(prompt.as_bytes());
    let mut out = format!("{}w:", crate::words::word_count(prompt));
    for byte in digest.iter().take(FINGERPRINT_HEX_LEN / 2) {
        let _ = write!(out, "{:02x}", byte);
    }
    out
}
