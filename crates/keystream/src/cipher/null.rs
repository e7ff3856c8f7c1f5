use super::{BlockCipher, CipherId, read_key};
use crate::{
    attrs::Attributes,
    error::{Error, Result},
};

const BLOCK_SIZES: [usize; 3] = [16, 24, 32];

/// The identity cipher.
///
/// It accepts (and ignores) keys of 8 through 63 bytes. Useful
/// for exercising modes of operation without a real cipher in
/// the way.
#[derive(Clone, Debug, Default)]
pub struct NullCipher {
    /// The block size, once keyed.
    keyed: Option<usize>,
}

impl NullCipher {
    fn check(&self, block: &[u8]) -> Result<()> {
        let bs = self.current_block_size()?;
        if block.len() != bs {
            return Err(Error::Config("block length"));
        }
        Ok(())
    }
}

impl BlockCipher for NullCipher {
    fn id(&self) -> CipherId {
        CipherId::Null
    }

    fn default_block_size(&self) -> usize {
        16
    }

    fn default_key_size(&self) -> usize {
        16
    }

    fn block_sizes(&self) -> Vec<usize> {
        BLOCK_SIZES.to_vec()
    }

    fn key_sizes(&self) -> Vec<usize> {
        (8..64).collect()
    }

    fn init(&mut self, attrs: &Attributes) -> Result<()> {
        if self.keyed.is_some() {
            return Err(Error::State("cipher already keyed"));
        }
        let (_, bs) = read_key(
            attrs,
            self.default_block_size(),
            &BLOCK_SIZES,
            &self.key_sizes(),
        )?;
        self.keyed = Some(bs);
        Ok(())
    }

    fn current_block_size(&self) -> Result<usize> {
        self.keyed.ok_or(Error::State("cipher not keyed"))
    }

    fn reset(&mut self) {
        self.keyed = None;
    }

    fn encrypt_block(&self, block: &mut [u8]) -> Result<()> {
        self.check(block)
    }

    fn decrypt_block(&self, block: &mut [u8]) -> Result<()> {
        self.check(block)
    }

    fn clone_structure(&self) -> Self {
        Self::default()
    }
}
