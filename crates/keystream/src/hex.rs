//! Constant time hexadecimal encoding and decoding.
//!
//! Encoding always produces two uppercase digits per byte, most
//! significant nibble first, with no separators. This is the
//! format used by every known-answer vector in the crate.
//! Decoding accepts either case.

use subtle::{Choice, ConditionallySelectable};

/// The hexadecimal string could not be decoded.
#[derive(Copy, Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    /// Either `dst` was too short or the length of `src` was not
    /// a multiple of two.
    #[error("invalid hexadecimal length")]
    InvalidLength,
    /// The input was not a valid hexadecimal string.
    #[error("invalid hexadecimal encoding")]
    InvalidEncoding,
}

/// Encodes `src` as an uppercase hexadecimal string.
pub fn to_hex(src: &[u8]) -> String {
    let mut dst = vec![0u8; src.len().saturating_mul(2)];
    encode_into(&mut dst, src);
    // `encode_into` only writes ASCII.
    dst.into_iter().map(char::from).collect()
}

/// Decodes a hexadecimal string of either case.
pub fn from_hex(src: &str) -> Result<Vec<u8>, Error> {
    let mut dst = vec![0u8; src.len() / 2];
    let n = ct_decode(&mut dst, src.as_bytes())?;
    dst.truncate(n);
    Ok(dst)
}

/// Encodes `src` into `dst` as uppercase hexadecimal in
/// constant time and returns the number of bytes written.
///
/// `dst` must be at least twice as long as `src`.
pub fn ct_encode(dst: &mut [u8], src: &[u8]) -> Result<usize, Error> {
    if dst.len() / 2 < src.len() {
        return Err(Error::InvalidLength);
    }
    encode_into(dst, src);
    Ok(src.len() * 2)
}

/// Encodes as much of `src` as fits in whole digit pairs of
/// `dst`.
fn encode_into(dst: &mut [u8], src: &[u8]) {
    for (v, chunk) in src.iter().zip(dst.chunks_exact_mut(2)) {
        chunk[0] = enc_nibble(v >> 4);
        chunk[1] = enc_nibble(v & 0x0f);
    }
}

#[inline(always)]
const fn enc_nibble(c: u8) -> u8 {
    // 'A' - 10 == 55. For c < 10 the mask adds 249, which
    // wraps 55 + c around to '0' + c.
    let c = c as u16;
    (55 + c + ((c.wrapping_sub(10) >> 8) & !6)) as u8
}

/// Decodes `src` into `dst` from hexadecimal in constant time
/// and returns the number of bytes written.
///
/// * The length of `src` must be a multiple of two.
/// * `dst` must be half as long (or longer) as `src`.
pub fn ct_decode(dst: &mut [u8], src: &[u8]) -> Result<usize, Error> {
    if src.len() % 2 != 0 {
        return Err(Error::InvalidLength);
    }
    if src.len() / 2 > dst.len() {
        return Err(Error::InvalidLength);
    }

    let mut valid = Choice::from(1u8);
    for (chunk, v) in src.chunks_exact(2).zip(dst.iter_mut()) {
        let (hi, hi_ok) = dec_nibble(chunk[0]);
        let (lo, lo_ok) = dec_nibble(chunk[1]);

        valid &= hi_ok & lo_ok;

        let val = (hi << 4) | (lo & 0x0f);
        // Do not update `dst` if `valid` is false.
        *v = u8::conditional_select(v, &val, valid);
    }
    if bool::from(valid) {
        Ok(src.len() / 2)
    } else {
        Err(Error::InvalidEncoding)
    }
}

/// Decode a nibble from a hexadecimal character.
#[inline(always)]
fn dec_nibble(c: u8) -> (u8, Choice) {
    let c = u16::from(c);

    // Digits: `c ^ '0'` is in [0, 9] iff `c` is in '0'..='9',
    // in which case subtracting 10 sets bits [15:8].
    let num = c ^ u16::from(b'0');
    let num_ok = num.wrapping_sub(10) >> 8;

    // Letters: clearing bit 5 folds lowercase onto uppercase,
    // and subtracting 55 maps 'A'..='F' onto [10, 15].
    let alpha = (c & !32).wrapping_sub(55);
    let alpha_ok = (alpha.wrapping_sub(10) ^ alpha.wrapping_sub(16)) >> 8;

    let ok = Choice::from(((num_ok ^ alpha_ok) & 1) as u8);
    let result = ((num_ok & num) | (alpha_ok & alpha)) & 0xf;

    (result as u8, ok)
}
