//! Byte utilities.

use subtle::ConstantTimeEq;

/// Reports whether `a` and `b` have the same length and
/// contents.
pub fn are_equal(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && bool::from(a.ct_eq(b))
}

/// Writes `input ^ keystream` to `output`.
///
/// All three slices are truncated to the shortest.
pub(crate) fn xor_into(output: &mut [u8], input: &[u8], keystream: &[u8]) {
    for ((out, a), b) in output.iter_mut().zip(input).zip(keystream) {
        *out = a ^ b;
    }
}

/// Returns `0, 1, 2, ...` truncated to bytes, the pattern used
/// for synthetic keys and plaintexts in symmetry self-tests.
pub(crate) fn counting_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| i as u8).collect()
}
