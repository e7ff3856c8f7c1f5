use num_bigint::BigUint;

use super::BlockSource;
use crate::{
    attrs::{Attr, Attributes, Value},
    cipher::{self, BlockCipher, Cipher},
    counter::{IcmCounter, pow256},
    error::{Error, Result},
    registry,
};

/// An Integer Counter Mode keystream generator.
///
/// Block `i` is `E(C0 + i)`, where `C0` is derived from the
/// offset and the segment index. A segment holds
/// `256^block_index_length` blocks. Past that the generator
/// fails with [`Error::LimitReached`].
#[derive(Clone, Debug)]
pub struct IcmGenerator {
    cipher: Cipher,
    counter: IcmCounter,
}

/// Resolves the block and segment index lengths.
///
/// At least one must be given and a given one must be
/// non-zero. A missing one takes the rest of the half block.
fn index_lengths(attrs: &Attributes, block_size: usize) -> Result<(usize, usize)> {
    let bil_err = || Error::Config(Attr::BlockIndexLength.name());
    let sil_err = || Error::Config(Attr::SegmentIndexLength.name());

    let limit = block_size / 2;
    let bil = attrs.int(Attr::BlockIndexLength)?;
    let sil = attrs.int(Attr::SegmentIndexLength)?;
    match (bil, sil) {
        (Some(0), _) | (None, None) => Err(bil_err()),
        (_, Some(0)) => Err(sil_err()),
        (Some(b), None) => Ok((b, limit.checked_sub(b).ok_or_else(bil_err)?)),
        (None, Some(s)) => Ok((limit.checked_sub(s).ok_or_else(sil_err)?, s)),
        (Some(b), Some(s)) => match b.checked_add(s) {
            Some(n) if n <= limit => Ok((b, s)),
            _ => Err(bil_err()),
        },
    }
}

impl BlockSource for IcmGenerator {
    /// Reads [`Attr::Cipher`] (default `rijndael`),
    /// [`Attr::CipherBlockSize`], [`Attr::KeyMaterial`],
    /// [`Attr::BlockIndexLength`], [`Attr::SegmentIndexLength`],
    /// [`Attr::Offset`] (required), and [`Attr::SegmentIndex`]
    /// (default zero).
    fn setup(attrs: &Attributes) -> Result<Self> {
        let name = attrs
            .name(Attr::Cipher)?
            .unwrap_or(registry::RIJNDAEL_CIPHER);
        let mut cipher = cipher::get_instance(name).ok_or(Error::Config(Attr::Cipher.name()))?;
        cipher.init(attrs)?;
        let bs = cipher.current_block_size()?;

        let (bil, sil) = index_lengths(attrs, bs)?;

        let offset = match attrs.get(Attr::Offset) {
            Some(Value::BigInt(v)) => v.clone(),
            Some(Value::Int(v)) => BigUint::from(*v),
            Some(Value::Bytes(v)) if v.len() == bs => BigUint::from_bytes_be(v),
            _ => return Err(Error::Config(Attr::Offset.name())),
        };

        let segment_index = attrs.big_int(Attr::SegmentIndex)?.unwrap_or_default();
        if segment_index > pow256(sil)? {
            return Err(Error::Config(Attr::SegmentIndex.name()));
        }

        let counter = IcmCounter::new(&offset, &segment_index, bil, bs)?;
        Ok(Self { cipher, counter })
    }

    fn fill_block(&mut self) -> Result<Vec<u8>> {
        let mut block = self.counter.next_counter_block()?;
        self.cipher.encrypt_block(&mut block)?;
        Ok(block)
    }
}
