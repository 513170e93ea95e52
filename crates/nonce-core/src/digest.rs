//! SHA256 digest evaluation for candidate nonces.

use sha2::{Digest as _, Sha256};

/// Length of a digest in bytes.
pub const DIGEST_LEN: usize = 32;

/// Length of the encoded nonce prefix in bytes.
pub const NONCE_LEN: usize = 4;

/// A 256-bit SHA256 digest.
pub type Digest = [u8; DIGEST_LEN];

/// SHA256 of `nonce_le_bytes ++ payload`.
///
/// The nonce is always encoded as 4 little-endian bytes. This layout must
/// stay bit-exact for digests to be comparable across implementations.
#[inline]
pub fn evaluate(nonce: u32, payload: &[u8]) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(nonce.to_le_bytes());
    hasher.update(payload);
    hasher.finalize().into()
}

/// Count consecutive zero bits from the most significant bit of the digest.
///
/// Whole zero bytes are skipped first, then the leading zeros of the first
/// non-zero byte are added. An all-zero digest has 256 leading zero bits.
#[inline]
pub fn leading_zero_bits(digest: &Digest) -> u32 {
    let mut zeros = 0u32;
    for byte in digest.iter() {
        if *byte == 0 {
            zeros += 8;
        } else {
            zeros += byte.leading_zeros();
            break;
        }
    }
    zeros
}

/// Whether the digest has at least `difficulty_bits` leading zero bits.
#[inline]
pub fn matches(digest: &Digest, difficulty_bits: u32) -> bool {
    leading_zero_bits(digest) >= difficulty_bits
}

/// Hex rendering of a digest, most significant byte first.
pub fn digest_hex(digest: &Digest) -> String {
    hex::encode(digest)
}

/// Reusable hashing buffer for one payload.
///
/// Holds `nonce ++ payload` once and only rewrites the 4 nonce bytes per
/// evaluation, so the hot loop never reallocates.
#[derive(Debug, Clone)]
pub struct DigestEvaluator {
    buffer: Vec<u8>,
}

impl DigestEvaluator {
    /// Create an evaluator for the given payload.
    pub fn new(payload: &[u8]) -> Self {
        let mut buffer = Vec::with_capacity(NONCE_LEN + payload.len());
        buffer.extend_from_slice(&[0u8; NONCE_LEN]);
        buffer.extend_from_slice(payload);
        DigestEvaluator { buffer }
    }

    /// The payload this evaluator hashes.
    pub fn payload(&self) -> &[u8] {
        &self.buffer[NONCE_LEN..]
    }

    /// Digest for `nonce`; identical to [`evaluate`].
    #[inline]
    pub fn evaluate(&mut self, nonce: u32) -> Digest {
        self.buffer[..NONCE_LEN].copy_from_slice(&nonce.to_le_bytes());
        Sha256::digest(&self.buffer).into()
    }
}
