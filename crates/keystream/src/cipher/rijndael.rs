use core::fmt;

use aes::{
    Aes128, Aes192, Aes256, Block,
    cipher::{BlockDecrypt, BlockEncrypt, KeyInit},
};

use buggy::BugExt;

use super::{BlockCipher, CipherId, read_key};
use crate::{
    attrs::Attributes,
    error::{Error, Result},
};

const BLOCK_SIZES: [usize; 1] = [16];
const KEY_SIZES: [usize; 3] = [16, 24, 32];

/// Rijndael restricted to 128-bit blocks, i.e., AES-128,
/// AES-192, or AES-256 depending on the key length.
#[derive(Clone, Default)]
pub struct Rijndael {
    key: Option<Schedule>,
}

#[derive(Clone)]
enum Schedule {
    Aes128(Aes128),
    Aes192(Aes192),
    Aes256(Aes256),
}

impl Rijndael {
    fn schedule(&self) -> Result<&Schedule> {
        self.key.as_ref().ok_or(Error::State("cipher not keyed"))
    }
}

fn block(buf: &mut [u8]) -> Result<&mut Block> {
    if buf.len() != BLOCK_SIZES[0] {
        return Err(Error::Config("block length"));
    }
    Ok(Block::from_mut_slice(buf))
}

impl BlockCipher for Rijndael {
    fn id(&self) -> CipherId {
        CipherId::Rijndael
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
        KEY_SIZES.to_vec()
    }

    fn init(&mut self, attrs: &Attributes) -> Result<()> {
        if self.key.is_some() {
            return Err(Error::State("cipher already keyed"));
        }
        let (key, _) = read_key(attrs, self.default_block_size(), &BLOCK_SIZES, &KEY_SIZES)?;
        let schedule = match key.len() {
            16 => Aes128::new_from_slice(key).map(Schedule::Aes128),
            24 => Aes192::new_from_slice(key).map(Schedule::Aes192),
            _ => Aes256::new_from_slice(key).map(Schedule::Aes256),
        }
        .assume("`read_key` only accepts AES key lengths")?;
        self.key = Some(schedule);
        Ok(())
    }

    fn current_block_size(&self) -> Result<usize> {
        self.schedule().map(|_| BLOCK_SIZES[0])
    }

    fn reset(&mut self) {
        self.key = None;
    }

    fn encrypt_block(&self, buf: &mut [u8]) -> Result<()> {
        let b = block(buf)?;
        match self.schedule()? {
            Schedule::Aes128(k) => k.encrypt_block(b),
            Schedule::Aes192(k) => k.encrypt_block(b),
            Schedule::Aes256(k) => k.encrypt_block(b),
        }
        Ok(())
    }

    fn decrypt_block(&self, buf: &mut [u8]) -> Result<()> {
        let b = block(buf)?;
        match self.schedule()? {
            Schedule::Aes128(k) => k.decrypt_block(b),
            Schedule::Aes192(k) => k.decrypt_block(b),
            Schedule::Aes256(k) => k.decrypt_block(b),
        }
        Ok(())
    }

    fn clone_structure(&self) -> Self {
        Self::default()
    }
}

impl fmt::Debug for Rijndael {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rijndael")
            .field("keyed", &self.key.is_some())
            .finish()
    }
}
