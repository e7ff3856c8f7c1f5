//! MD4, RFC 1320.

use byteorder::{ByteOrder, LittleEndian};

use super::{BlockTransform, HashId, md_padding};
use crate::registry;

const IV: [u32; 4] = [0x67452301, 0xefcdab89, 0x98badcfe, 0x10325476];

const R2: [usize; 16] = [0, 4, 8, 12, 1, 5, 9, 13, 2, 6, 10, 14, 3, 7, 11, 15];
const R3: [usize; 16] = [0, 8, 4, 12, 2, 10, 6, 14, 1, 9, 5, 13, 3, 11, 7, 15];

/// The MD4 compression function.
#[derive(Clone, Debug)]
pub struct Md4 {
    h: [u32; 4],
}

impl Default for Md4 {
    fn default() -> Self {
        Self { h: IV }
    }
}

impl BlockTransform for Md4 {
    const ID: HashId = HashId::Md4;
    const NAME: &'static str = registry::MD4_HASH;
    const HASH_SIZE: usize = 16;
    const BLOCK_SIZE: usize = 64;
    const KNOWN_ANSWER: (&'static [u8], &'static str) = (b"", "31D6CFE0D16AE931B73C59D7E0C089C0");

    fn transform(&mut self, block: &[u8]) {
        let mut x = [0u32; 16];
        LittleEndian::read_u32_into(block, &mut x);

        let mut v = self.h;
        for i in 0..16 {
            let f = (v[1] & v[2]) | (!v[1] & v[3]);
            step(&mut v, f, x[i], [3, 7, 11, 19][i % 4]);
        }
        for i in 0..16 {
            let g = (v[1] & v[2]) | (v[1] & v[3]) | (v[2] & v[3]);
            step(
                &mut v,
                g.wrapping_add(0x5a827999),
                x[R2[i]],
                [3, 5, 9, 13][i % 4],
            );
        }
        for i in 0..16 {
            let h = v[1] ^ v[2] ^ v[3];
            step(
                &mut v,
                h.wrapping_add(0x6ed9eba1),
                x[R3[i]],
                [3, 9, 11, 15][i % 4],
            );
        }

        for (h, v) in self.h.iter_mut().zip(v) {
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

/// Updates `v[0]` and rotates the working variables right by
/// one word, so that the next step updates the previous `v[3]`.
#[inline(always)]
fn step(v: &mut [u32; 4], f: u32, x: u32, s: u32) {
    let a = v[0].wrapping_add(f).wrapping_add(x).rotate_left(s);
    *v = [v[3], a, v[1], v[2]];
}
