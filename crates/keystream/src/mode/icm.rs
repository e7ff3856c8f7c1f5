use num_bigint::BigUint;
use num_traits::Zero;

use super::Transform;
use crate::{
    attrs::Attr,
    cipher::BlockCipher,
    counter::IcmCounter,
    error::{Error, Result},
    util::xor_into,
};

/// Integer counter mode.
///
/// The IV is the big-endian offset, the segment index is
/// always zero, and the block index takes half of the block,
/// so a single `init` covers `256^(block_size / 2)` blocks.
#[derive(Clone, Debug)]
pub(super) struct Icm {
    counter: IcmCounter,
}

impl Icm {
    fn apply<C: BlockCipher>(&mut self, cipher: &C, input: &[u8], output: &mut [u8]) -> Result<()> {
        let mut keystream = self.counter.next_counter_block()?;
        cipher.encrypt_block(&mut keystream)?;
        xor_into(output, input, &keystream);
        Ok(())
    }
}

impl Transform for Icm {
    fn setup(iv: &[u8], mode_block_size: usize, cipher_block_size: usize) -> Result<Self> {
        if mode_block_size != cipher_block_size {
            return Err(Error::Config(Attr::ModeBlockSize.name()));
        }
        let counter = IcmCounter::new(
            &BigUint::from_bytes_be(iv),
            &BigUint::zero(),
            cipher_block_size / 2,
            cipher_block_size,
        )?;
        Ok(Self { counter })
    }

    fn encrypt_block<C: BlockCipher>(
        &mut self,
        cipher: &C,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<()> {
        self.apply(cipher, input, output)
    }

    fn decrypt_block<C: BlockCipher>(
        &mut self,
        cipher: &C,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<()> {
        self.apply(cipher, input, output)
    }
}
