//! # Document Fingerprints
//!
//! Deterministic identity of a workflow document.
//!
//! The canonical bytes are the compact JSON of the wire document. Node keys
//! are emitted in id order and edges in document order, so two equal
//! documents always produce the same bytes.
//!
//! `checksum` is FNV-1a over those bytes. It detects accidental change; it
//! is **NOT** a cryptographic hash. Enable the `crypto-hash` feature for a
//! BLAKE3 digest.

use crate::PathwayError;
use crate::document::GraphDocument;
use crate::formats::to_json_string;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Canonical byte representation of a document.
pub fn canonical_bytes(doc: &GraphDocument) -> Result<Vec<u8>, PathwayError> {
    to_json_string(doc).map(String::into_bytes)
}

/// FNV-1a checksum of the canonical bytes.
pub fn checksum(doc: &GraphDocument) -> Result<u64, PathwayError> {
    Ok(fnv1a(&canonical_bytes(doc)?))
}

/// Check a document against a previously recorded checksum.
pub fn verify_checksum(doc: &GraphDocument, expected: u64) -> Result<bool, PathwayError> {
    Ok(checksum(doc)? == expected)
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

/// BLAKE3 digest of the canonical bytes, as 64 hex characters.
///
/// Only available with the `crypto-hash` feature.
#[cfg(feature = "crypto-hash")]
pub fn blake3_hex(doc: &GraphDocument) -> Result<String, PathwayError> {
    let bytes = canonical_bytes(doc)?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}
