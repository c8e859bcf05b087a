//! Keystream: deterministic ChaCha20 output keyed by the derived key.
//!
//! The nonce is fixed to all-zero and a fresh cipher instance is created on
//! every call, so the stream always restarts at offset zero — two emulated
//! calls of the same size always produce the same bytes (§4.2's "per-call
//! restart" requirement; this is not a bug, the spec forbids carrying state
//! across calls).

use chacha20::cipher::{KeyIvInit, StreamCipher};
use chacha20::ChaCha20;

const NONCE: [u8; 12] = [0u8; 12];

/// Fills `out` with `out.len()` bytes of keystream, a pure function of
/// `(key, out.len())`.
pub fn fill(key: &[u8; 32], out: &mut [u8]) {
    out.fill(0);
    let mut cipher = ChaCha20::new(key.into(), NONCE.as_slice().into());
    cipher.apply_keystream(out);
}
