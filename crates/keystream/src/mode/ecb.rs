use super::Transform;
use crate::{
    attrs::Attr,
    cipher::BlockCipher,
    error::{Error, Result},
};

/// Electronic codebook: each block goes straight through the
/// cipher.
#[derive(Clone, Debug)]
pub(super) struct Ecb;

impl Transform for Ecb {
    fn setup(_iv: &[u8], mode_block_size: usize, cipher_block_size: usize) -> Result<Self> {
        if mode_block_size != cipher_block_size {
            return Err(Error::Config(Attr::ModeBlockSize.name()));
        }
        Ok(Self)
    }

    fn encrypt_block<C: BlockCipher>(
        &mut self,
        cipher: &C,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<()> {
        output.copy_from_slice(input);
        cipher.encrypt_block(output)
    }

    fn decrypt_block<C: BlockCipher>(
        &mut self,
        cipher: &C,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<()> {
        output.copy_from_slice(input);
        cipher.decrypt_block(output)
    }
}
