//! Output words and call encoding.

use ciphertext::{FheUintType, Handle};

use crate::methods::selector_of;

pub const WORD: usize = 32;

pub fn encode_handle(handle: Handle) -> Vec<u8> {
    handle.0.to_vec()
}

/// 32-byte big-endian word holding `value`.
pub fn word_from_u64(value: u64) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[WORD - 8..].copy_from_slice(&value.to_be_bytes());
    word
}

pub fn encode_u64(value: u64) -> Vec<u8> {
    word_from_u64(value).to_vec()
}

/// Widest possible decrypt output, returned while estimating gas.
pub fn max_word() -> Vec<u8> {
    vec![0xFF; WORD]
}

/// Low 64 bits of a big-endian word of at most 32 bytes.
pub fn low_u64(word: &[u8]) -> u64 {
    let tail = &word[word.len().saturating_sub(8)..];
    let mut buf = [0u8; 8];
    buf[8 - tail.len()..].copy_from_slice(tail);
    u64::from_be_bytes(buf)
}

pub fn pad_to_word_multiple(mut bytes: Vec<u8>) -> Vec<u8> {
    let rem = bytes.len() % WORD;
    if rem != 0 {
        bytes.resize(bytes.len() + WORD - rem, 0);
    }
    bytes
}

/// Offset word (0x20) followed by `blob`, zero padded to a word boundary.
pub fn wrap_dynamic_bytes(blob: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(WORD + blob.len() + WORD);
    out.extend_from_slice(&word_from_u64(WORD as u64));
    out.extend_from_slice(blob);
    pad_to_word_multiple(out)
}

/// Selector of `signature` followed by the concatenated payload parts.
pub fn encode_call(signature: &str, parts: &[&[u8]]) -> Vec<u8> {
    let mut out = selector_of(signature).to_be_bytes().to_vec();
    for part in parts {
        out.extend_from_slice(part);
    }
    out
}

pub fn binary_call(signature: &str, lhs: Handle, rhs: &[u8; WORD], scalar: bool) -> Vec<u8> {
    encode_call(signature, &[&lhs.0, rhs, &[u8::from(scalar)]])
}

pub fn typed_call(signature: &str, word: &[u8; WORD], fhe_type: FheUintType) -> Vec<u8> {
    encode_call(signature, &[word, &[fhe_type.as_byte()]])
}
