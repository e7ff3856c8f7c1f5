use super::BlockSource;
use crate::{
    attrs::{Attr, Attributes},
    error::{Error, Result},
    hash::{self, Hash, MessageDigest, StreamingHash},
    registry,
};

/// A hash chain generator.
///
/// Each block is the digest of everything absorbed so far,
/// and is then itself absorbed, so block `n + 1` depends on
/// the seed and every earlier block.
#[derive(Clone, Debug)]
pub struct MdGenerator {
    hash: Hash,
}

impl MdGenerator {
    /// A SHA-160 chain seeded with `seed`.
    pub(super) fn sha160(seed: &[u8]) -> Self {
        Self::with_hash(Hash::Sha160(StreamingHash::checked()), seed)
    }

    fn with_hash(mut hash: Hash, seed: &[u8]) -> Self {
        hash.update(seed);
        Self { hash }
    }
}

impl BlockSource for MdGenerator {
    /// Reads [`Attr::HashName`] (default `sha-160`) and
    /// [`Attr::Seed`] (default empty).
    fn setup(attrs: &Attributes) -> Result<Self> {
        let name = attrs
            .name(Attr::HashName)?
            .unwrap_or(registry::SHA160_HASH);
        let hash = hash::get_instance(name).ok_or(Error::Config(Attr::HashName.name()))?;
        let seed = attrs.bytes(Attr::Seed)?.unwrap_or_default();
        Ok(Self::with_hash(hash, seed))
    }

    fn fill_block(&mut self) -> Result<Vec<u8>> {
        let block = self.hash.clone().digest();
        self.hash.update(&block);
        Ok(block)
    }
}
