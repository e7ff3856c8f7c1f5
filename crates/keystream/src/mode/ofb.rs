use super::Transform;
use crate::{
    attrs::Attr,
    cipher::BlockCipher,
    error::{Error, Result},
    util::xor_into,
};

/// Output feedback.
///
/// The keystream is `E(IV), E(E(IV)), ...` and is independent
/// of the data, so decryption is the same operation as
/// encryption.
#[derive(Clone, Debug)]
pub(super) struct Ofb {
    output_block: Vec<u8>,
}

impl Ofb {
    fn apply<C: BlockCipher>(&mut self, cipher: &C, input: &[u8], output: &mut [u8]) -> Result<()> {
        cipher.encrypt_block(&mut self.output_block)?;
        xor_into(output, input, &self.output_block);
        Ok(())
    }
}

impl Transform for Ofb {
    fn setup(iv: &[u8], mode_block_size: usize, cipher_block_size: usize) -> Result<Self> {
        if mode_block_size != cipher_block_size {
            return Err(Error::Config(Attr::ModeBlockSize.name()));
        }
        if iv.len() != mode_block_size {
            return Err(Error::Config(Attr::Iv.name()));
        }
        Ok(Self {
            output_block: iv.to_vec(),
        })
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
