//! Integer Counter Mode arithmetic shared by [`crate::mode`] and
//! [`crate::prng`].
//!
//! The counter space is split into segments of
//! `256^block_index_length` blocks. Block `i` of a segment is
//! keyed by
//!
//! ```text
//! C0 = (segment_index * 256^block_index_length + offset) mod 256^block_size
//! Ci = (C0 + i) mod 256^block_size
//! ```

use num_bigint::BigUint;
use num_traits::{One, Zero};
use tracing::debug;

use crate::error::{Error, Result};

/// Returns `256^n`.
pub(crate) fn pow256(n: usize) -> Result<BigUint> {
    let exp = u32::try_from(n)
        .ok()
        .and_then(|n| n.checked_mul(8))
        .ok_or(Error::Config("counter width"))?;
    Ok(BigUint::one() << exp)
}

/// Encodes `v` as exactly `len` big-endian bytes, keeping the
/// least significant bytes.
pub(crate) fn to_be_bytes(v: &BigUint, len: usize) -> Vec<u8> {
    let bytes = v.to_bytes_be();
    let bytes = &bytes[bytes.len().saturating_sub(len)..];
    let mut out = vec![0u8; len];
    out[len.saturating_sub(bytes.len())..].copy_from_slice(bytes);
    out
}

/// The running counter of one ICM segment.
#[derive(Clone, Debug)]
pub(crate) struct IcmCounter {
    c0: BigUint,
    block_index: BigUint,
    max_blocks: BigUint,
    counter_range: BigUint,
    block_size: usize,
}

impl IcmCounter {
    pub(crate) fn new(
        offset: &BigUint,
        segment_index: &BigUint,
        block_index_length: usize,
        block_size: usize,
    ) -> Result<Self> {
        let counter_range = pow256(block_size)?;
        let max_blocks = pow256(block_index_length)?;
        let c0 = (segment_index * &max_blocks + offset) % &counter_range;
        Ok(Self {
            c0,
            block_index: BigUint::zero(),
            max_blocks,
            counter_range,
            block_size,
        })
    }

    /// Returns the counter block for the current block index
    /// and advances the index.
    pub(crate) fn next_counter_block(&mut self) -> Result<Vec<u8>> {
        if self.block_index >= self.max_blocks {
            debug!(max_blocks = %self.max_blocks, "ICM segment exhausted");
            return Err(Error::LimitReached);
        }
        let ci = (&self.c0 + &self.block_index) % &self.counter_range;
        self.block_index += 1u32;
        Ok(to_be_bytes(&ci, self.block_size))
    }

    /// The index of the next block.
    #[cfg(test)]
    pub(crate) fn block_index(&self) -> &BigUint {
        &self.block_index
    }

    /// The number of blocks in a segment.
    #[cfg(test)]
    pub(crate) fn max_blocks(&self) -> &BigUint {
        &self.max_blocks
    }
}
