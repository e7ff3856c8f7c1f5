use core::fmt;

use super::BlockSource;
use crate::{
    attrs::{Attr, Attributes},
    cipher::{self, BlockCipher, Cipher},
    error::{Error, Result},
    registry,
};

/// The UMAC key derivation function.
///
/// The state starts as one cipher block of zeros with the
/// index in the last byte. Each block of output is the state
/// encrypted in place, so the output is `E(s), E(E(s)), ...`.
///
/// There is no output limit. Derivations only ever draw a few
/// blocks, but nothing enforces that.
#[derive(Clone)]
pub struct UMacGenerator {
    cipher: Cipher,
    state: Vec<u8>,
}

impl BlockSource for UMacGenerator {
    /// Reads [`Attr::Cipher`] (default `aes`),
    /// [`Attr::KeyMaterial`], and [`Attr::Index`] (0 through
    /// 255, default 255).
    fn setup(attrs: &Attributes) -> Result<Self> {
        let name = attrs.name(Attr::Cipher)?.unwrap_or(registry::AES_CIPHER);
        let mut cipher = cipher::get_instance(name).ok_or(Error::Config(Attr::Cipher.name()))?;

        let index = attrs
            .int(Attr::Index)?
            .map_or(Ok(u8::MAX), u8::try_from)
            .map_err(|_| Error::Config(Attr::Index.name()))?;

        cipher.init(attrs)?;
        let mut state = vec![0u8; cipher.current_block_size()?];
        if let Some(last) = state.last_mut() {
            *last = index;
        }
        Ok(Self { cipher, state })
    }

    fn fill_block(&mut self) -> Result<Vec<u8>> {
        self.cipher.encrypt_block(&mut self.state)?;
        Ok(self.state.clone())
    }
}

impl fmt::Debug for UMacGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UMacGenerator")
            .field("cipher", &self.cipher)
            .finish_non_exhaustive()
    }
}
