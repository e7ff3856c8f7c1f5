//! SHA-160 (a.k.a. SHA-1), FIPS 180-1.

use byteorder::{BigEndian, ByteOrder};

use super::{BlockTransform, HashId, md_padding};
use crate::registry;

const IV: [u32; 5] = [0x67452301, 0xefcdab89, 0x98badcfe, 0x10325476, 0xc3d2e1f0];

/// The SHA-160 compression function.
#[derive(Clone, Debug)]
pub struct Sha160 {
    h: [u32; 5],
}

impl Default for Sha160 {
    fn default() -> Self {
        Self { h: IV }
    }
}

impl BlockTransform for Sha160 {
    const ID: HashId = HashId::Sha160;
    const NAME: &'static str = registry::SHA160_HASH;
    const HASH_SIZE: usize = 20;
    const BLOCK_SIZE: usize = 64;
    const KNOWN_ANSWER: (&'static [u8], &'static str) =
        (b"abc", "A9993E364706816ABA3E25717850C26C9CD0D89D");

    fn transform(&mut self, block: &[u8]) {
        #![allow(clippy::arithmetic_side_effects)]

        let mut w = [0u32; 80];
        BigEndian::read_u32_into(block, &mut w[..16]);
        for t in 16..80 {
            w[t] = (w[t - 3] ^ w[t - 8] ^ w[t - 14] ^ w[t - 16]).rotate_left(1);
        }

        let [mut a, mut b, mut c, mut d, mut e] = self.h;
        for (t, w) in w.iter().enumerate() {
            let (f, k) = match t / 20 {
                0 => ((b & c) | (!b & d), 0x5a827999),
                1 => (b ^ c ^ d, 0x6ed9eba1),
                2 => ((b & c) | (b & d) | (c & d), 0x8f1bbcdc),
                _ => (b ^ c ^ d, 0xca62c1d6),
            };
            let tmp = a
                .rotate_left(5)
                .wrapping_add(f)
                .wrapping_add(e)
                .wrapping_add(*w)
                .wrapping_add(k);
            e = d;
            d = c;
            c = b.rotate_left(30);
            b = a;
            a = tmp;
        }

        for (h, v) in self.h.iter_mut().zip([a, b, c, d, e]) {
            *h = h.wrapping_add(v);
        }
    }

    fn padding(count: u64) -> Vec<u8> {
        md_padding::<BigEndian>(count)
    }

    fn extract(&self) -> Vec<u8> {
        let mut out = vec![0u8; Self::HASH_SIZE];
        BigEndian::write_u32_into(&self.h, &mut out);
        out
    }
}
