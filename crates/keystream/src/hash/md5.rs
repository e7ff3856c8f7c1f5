//! MD5, RFC 1321.

use byteorder::{ByteOrder, LittleEndian};

use super::{BlockTransform, HashId, md_padding};
use crate::registry;

const IV: [u32; 4] = [0x67452301, 0xefcdab89, 0x98badcfe, 0x10325476];

/// `K[i] = floor(2^32 * abs(sin(i + 1)))`
const K: [u32; 64] = [
    0xd76aa478, 0xe8c7b756, 0x242070db, 0xc1bdceee, 0xf57c0faf, 0x4787c62a, 0xa8304613, 0xfd469501,
    0x698098d8, 0x8b44f7af, 0xffff5bb1, 0x895cd7be, 0x6b901122, 0xfd987193, 0xa679438e, 0x49b40821,
    0xf61e2562, 0xc040b340, 0x265e5a51, 0xe9b6c7aa, 0xd62f105d, 0x02441453, 0xd8a1e681, 0xe7d3fbc8,
    0x21e1cde6, 0xc33707d6, 0xf4d50d87, 0x455a14ed, 0xa9e3e905, 0xfcefa3f8, 0x676f02d9, 0x8d2a4c8a,
    0xfffa3942, 0x8771f681, 0x6d9d6122, 0xfde5380c, 0xa4beea44, 0x4bdecfa9, 0xf6bb4b60, 0xbebfbc70,
    0x289b7ec6, 0xeaa127fa, 0xd4ef3085, 0x04881d05, 0xd9d4d039, 0xe6db99e5, 0x1fa27cf8, 0xc4ac5665,
    0xf4292244, 0x432aff97, 0xab9423a7, 0xfc93a039, 0x655b59c3, 0x8f0ccc92, 0xffeff47d, 0x85845dd1,
    0x6fa87e4f, 0xfe2ce6e0, 0xa3014314, 0x4e0811a1, 0xf7537e82, 0xbd3af235, 0x2ad7d2bb, 0xeb86d391,
];

/// Left rotations, four per round.
const S: [[u32; 4]; 4] = [[7, 12, 17, 22], [5, 9, 14, 20], [4, 11, 16, 23], [6, 10, 15, 21]];

/// The MD5 compression function.
#[derive(Clone, Debug)]
pub struct Md5 {
    h: [u32; 4],
}

impl Default for Md5 {
    fn default() -> Self {
        Self { h: IV }
    }
}

impl BlockTransform for Md5 {
    const ID: HashId = HashId::Md5;
    const NAME: &'static str = registry::MD5_HASH;
    const HASH_SIZE: usize = 16;
    const BLOCK_SIZE: usize = 64;
    const KNOWN_ANSWER: (&'static [u8], &'static str) =
        (b"abc", "900150983CD24FB0D6963F7D28E17F72");

    fn transform(&mut self, block: &[u8]) {
        #![allow(clippy::arithmetic_side_effects)]

        let mut x = [0u32; 16];
        LittleEndian::read_u32_into(block, &mut x);

        let [mut a, mut b, mut c, mut d] = self.h;
        for i in 0..64 {
            let (f, g) = match i / 16 {
                0 => ((b & c) | (!b & d), i),
                1 => ((d & b) | (!d & c), (5 * i + 1) % 16),
                2 => (b ^ c ^ d, (3 * i + 5) % 16),
                _ => (c ^ (b | !d), (7 * i) % 16),
            };
            let t = a
                .wrapping_add(f)
                .wrapping_add(K[i])
                .wrapping_add(x[g])
                .rotate_left(S[i / 16][i % 4]);
            a = d;
            d = c;
            c = b;
            b = b.wrapping_add(t);
        }

        for (h, v) in self.h.iter_mut().zip([a, b, c, d]) {
            *h = h.wrapping_add(v);
        }
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
