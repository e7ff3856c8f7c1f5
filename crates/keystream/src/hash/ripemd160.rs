//! RIPEMD-160.

use byteorder::{ByteOrder, LittleEndian};

use super::{BlockTransform, HashId, md_padding};
use crate::registry;

const IV: [u32; 5] = [0x67452301, 0xefcdab89, 0x98badcfe, 0x10325476, 0xc3d2e1f0];

// Message word selection.
const RL: [usize; 80] = [
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, //
    7, 4, 13, 1, 10, 6, 15, 3, 12, 0, 9, 5, 2, 14, 11, 8, //
    3, 10, 14, 4, 9, 15, 8, 1, 2, 7, 0, 6, 13, 11, 5, 12, //
    1, 9, 11, 10, 0, 8, 12, 4, 13, 3, 7, 15, 14, 5, 6, 2, //
    4, 0, 5, 9, 7, 12, 2, 10, 14, 1, 3, 8, 11, 6, 15, 13,
];
const RR: [usize; 80] = [
    5, 14, 7, 0, 9, 2, 11, 4, 13, 6, 15, 8, 1, 10, 3, 12, //
    6, 11, 3, 7, 0, 13, 5, 10, 14, 15, 8, 12, 4, 9, 1, 2, //
    15, 5, 1, 3, 7, 14, 6, 9, 11, 8, 12, 2, 10, 0, 4, 13, //
    8, 6, 4, 1, 3, 11, 15, 0, 5, 12, 2, 13, 9, 7, 10, 14, //
    12, 15, 10, 4, 1, 5, 8, 7, 6, 2, 13, 14, 0, 3, 9, 11,
];

// Left rotations.
const SL: [u32; 80] = [
    11, 14, 15, 12, 5, 8, 7, 9, 11, 13, 14, 15, 6, 7, 9, 8, //
    7, 6, 8, 13, 11, 9, 7, 15, 7, 12, 15, 9, 11, 7, 13, 12, //
    11, 13, 6, 7, 14, 9, 13, 15, 14, 8, 13, 6, 5, 12, 7, 5, //
    11, 12, 14, 15, 14, 15, 9, 8, 9, 14, 5, 6, 8, 6, 5, 12, //
    9, 15, 5, 11, 6, 8, 13, 12, 5, 12, 13, 14, 11, 8, 5, 6,
];
const SR: [u32; 80] = [
    8, 9, 9, 11, 13, 15, 15, 5, 7, 7, 8, 11, 14, 14, 12, 6, //
    9, 13, 15, 7, 12, 8, 9, 11, 7, 7, 12, 7, 6, 15, 13, 11, //
    9, 7, 15, 11, 8, 6, 6, 14, 12, 13, 5, 14, 13, 13, 7, 5, //
    15, 5, 8, 11, 14, 14, 6, 14, 6, 9, 12, 9, 12, 5, 15, 8, //
    8, 5, 12, 9, 12, 5, 14, 6, 8, 13, 6, 5, 15, 13, 11, 11,
];

const KL: [u32; 5] = [0x00000000, 0x5a827999, 0x6ed9eba1, 0x8f1bbcdc, 0xa953fd4e];
const KR: [u32; 5] = [0x50a28be6, 0x5c4dd124, 0x6d703ef3, 0x7a6d76e9, 0x00000000];

/// The RIPEMD-160 compression function.
#[derive(Clone, Debug)]
pub struct RipeMd160 {
    h: [u32; 5],
}

impl Default for RipeMd160 {
    fn default() -> Self {
        Self { h: IV }
    }
}

impl BlockTransform for RipeMd160 {
    const ID: HashId = HashId::RipeMd160;
    const NAME: &'static str = registry::RIPEMD_160_HASH;
    const HASH_SIZE: usize = 20;
    const BLOCK_SIZE: usize = 64;
    const KNOWN_ANSWER: (&'static [u8], &'static str) =
        (b"abc", "8EB208F7E05D987A9B044A8E98C6B087F15A0BFC");

    fn transform(&mut self, block: &[u8]) {
        #![allow(clippy::arithmetic_side_effects)]

        let mut x = [0u32; 16];
        LittleEndian::read_u32_into(block, &mut x);

        let mut l = self.h;
        let mut r = self.h;
        for i in 0..80 {
            let round = i / 16;
            let fl = f(round, l[1], l[2], l[3]);
            let fr = f(4 - round, r[1], r[2], r[3]);
            line(&mut l, fl, x[RL[i]], KL[round], SL[i]);
            line(&mut r, fr, x[RR[i]], KR[round], SR[i]);
        }

        let h = self.h;
        self.h = [
            h[1].wrapping_add(l[2]).wrapping_add(r[3]),
            h[2].wrapping_add(l[3]).wrapping_add(r[4]),
            h[3].wrapping_add(l[4]).wrapping_add(r[0]),
            h[4].wrapping_add(l[0]).wrapping_add(r[1]),
            h[0].wrapping_add(l[1]).wrapping_add(r[2]),
        ];
    }

    fn padding(count: u64) -> Vec<u8> {
        md_padding::<LittleEndian>(count)
    }

    fn extract(&self) -> Vec<u8> {
        let mut out = vec![0u8; Self::HASH_SIZE];
        LittleEndian::write_u32_into(&self.h, &mut out);
        out
    }
}

/// One step of either line over `v = [a, b, c, d, e]`.
#[inline(always)]
fn line(v: &mut [u32; 5], f: u32, x: u32, k: u32, s: u32) {
    let [a, b, c, d, e] = *v;
    let t = a
        .wrapping_add(f)
        .wrapping_add(x)
        .wrapping_add(k)
        .rotate_left(s)
        .wrapping_add(e);
    *v = [e, t, b, c.rotate_left(10), d];
}

/// The boolean function for `round`. The right line applies
/// them in reverse order.
#[inline(always)]
const fn f(round: usize, x: u32, y: u32, z: u32) -> u32 {
    match round {
        0 => x ^ y ^ z,
        1 => (x & y) | (!x & z),
        2 => (x | !y) ^ z,
        3 => (x & z) | (y & !z),
        _ => x ^ (y | !z),
    }
}
