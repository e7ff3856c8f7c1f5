//! Block ciphers.
//!
//! Modes of operation and cipher-based generators only need
//! the small [`BlockCipher`] surface: key it, ask for its sizes,
//! and transform one block in place.

mod null;
mod rijndael;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

pub use self::{null::NullCipher, rijndael::Rijndael};
use crate::{
    attrs::{Attr, Attributes},
    error::{Error, Result, self_test_failed},
    registry,
    util::{are_equal, counting_bytes},
};

/// Block cipher identifiers.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum CipherId {
    /// The identity cipher.
    Null,
    /// Rijndael with 128-bit blocks, i.e., AES.
    Rijndael,
}

impl CipherId {
    /// Looks up a cipher by name.
    ///
    /// Surrounding whitespace and ASCII case are ignored.
    pub fn from_name(name: &str) -> Option<Self> {
        if registry::matches(name, &[registry::NULL_CIPHER]) {
            Some(Self::Null)
        } else if registry::matches(name, &[registry::RIJNDAEL_CIPHER, registry::AES_CIPHER]) {
            Some(Self::Rijndael)
        } else {
            None
        }
    }

    /// Returns the canonical name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Null => registry::NULL_CIPHER,
            Self::Rijndael => registry::RIJNDAEL_CIPHER,
        }
    }

    fn self_test_cache(self) -> &'static spin::Once<bool> {
        static NULL: spin::Once<bool> = spin::Once::new();
        static RIJNDAEL: spin::Once<bool> = spin::Once::new();

        match self {
            Self::Null => &NULL,
            Self::Rijndael => &RIJNDAEL,
        }
    }
}

/// A keyed permutation over fixed-size blocks.
///
/// A cipher starts out unkeyed. [`init`][Self::init] keys it
/// for one block size and [`reset`][Self::reset] forgets the
/// key.
pub trait BlockCipher: Clone {
    /// Returns the algorithm identifier.
    fn id(&self) -> CipherId;

    /// Returns the name and block size in bits, e.g.,
    /// `rijndael-128`.
    fn name(&self) -> String {
        let bs = self
            .current_block_size()
            .unwrap_or_else(|_| self.default_block_size());
        format!("{}-{}", self.id().name(), bs.saturating_mul(8))
    }

    /// The block size used when none is requested.
    fn default_block_size(&self) -> usize;

    /// The key size in bytes used by the self-tests.
    fn default_key_size(&self) -> usize;

    /// Every supported block size in bytes.
    fn block_sizes(&self) -> Vec<usize>;

    /// Every supported key size in bytes.
    fn key_sizes(&self) -> Vec<usize>;

    /// Keys the cipher from [`Attr::KeyMaterial`] and the
    /// optional [`Attr::CipherBlockSize`].
    fn init(&mut self, attrs: &Attributes) -> Result<()>;

    /// Returns the block size the cipher was keyed for.
    fn current_block_size(&self) -> Result<usize>;

    /// Forgets the key.
    fn reset(&mut self);

    /// Encrypts one block in place.
    fn encrypt_block(&self, block: &mut [u8]) -> Result<()>;

    /// Decrypts one block in place.
    fn decrypt_block(&self, block: &mut [u8]) -> Result<()>;

    /// Returns an unkeyed cipher of the same algorithm.
    ///
    /// Unlike [`Clone::clone`] the result never carries key
    /// material.
    fn clone_structure(&self) -> Self;

    /// Checks that decryption inverts encryption for every
    /// supported key and block size.
    fn self_test(&self) -> bool {
        self.key_sizes().into_iter().all(|ks| {
            self.block_sizes()
                .into_iter()
                .all(|bs| symmetry_test(self, ks, bs))
        })
    }
}

fn symmetry_test<C: BlockCipher>(cipher: &C, key_size: usize, block_size: usize) -> bool {
    let mut c = cipher.clone_structure();
    let attrs = Attributes::new()
        .with(Attr::KeyMaterial, counting_bytes(key_size))
        .with(Attr::CipherBlockSize, block_size);
    if c.init(&attrs).is_err() {
        return false;
    }
    let pt = counting_bytes(block_size);
    let mut buf = pt.clone();
    c.encrypt_block(&mut buf).is_ok() && c.decrypt_block(&mut buf).is_ok() && are_equal(&pt, &buf)
}

/// Validates and reads the key and block size attributes.
pub(crate) fn read_key<'a>(
    attrs: &'a Attributes,
    default_block_size: usize,
    block_sizes: &[usize],
    key_sizes: &[usize],
) -> Result<(&'a [u8], usize)> {
    let bs = attrs
        .int(Attr::CipherBlockSize)?
        .unwrap_or(default_block_size);
    if !block_sizes.contains(&bs) {
        return Err(Error::Config(Attr::CipherBlockSize.name()));
    }
    let key = attrs
        .bytes(Attr::KeyMaterial)?
        .ok_or(Error::Config(Attr::KeyMaterial.name()))?;
    if !key_sizes.contains(&key.len()) {
        return Err(Error::Config(Attr::KeyMaterial.name()));
    }
    Ok((key, bs))
}

/// One of the built-in block ciphers.
#[derive(Clone, Debug)]
pub enum Cipher {
    /// The identity cipher.
    Null(NullCipher),
    /// AES.
    Rijndael(Rijndael),
}

macro_rules! dispatch {
    ($self:expr, $c:ident => $body:expr) => {
        match $self {
            Cipher::Null($c) => $body,
            Cipher::Rijndael($c) => $body,
        }
    };
}

impl Cipher {
    /// Returns an unkeyed instance without running its
    /// self-test.
    pub fn new(id: CipherId) -> Self {
        match id {
            CipherId::Null => Self::Null(NullCipher::default()),
            CipherId::Rijndael => Self::Rijndael(Rijndael::default()),
        }
    }

    /// Returns an unkeyed instance after verifying that the
    /// algorithm passes its self-test.
    ///
    /// # Panics
    ///
    /// If the self-test fails.
    pub fn checked(id: CipherId) -> Self {
        let c = Self::new(id);
        let ok = *id.self_test_cache().call_once(|| {
            let ok = c.self_test();
            trace!(cipher = id.name(), ok, "ran symmetry test");
            ok
        });
        if !ok {
            self_test_failed(id.name())
        }
        c
    }
}

impl BlockCipher for Cipher {
    fn id(&self) -> CipherId {
        dispatch!(self, c => c.id())
    }

    fn default_block_size(&self) -> usize {
        dispatch!(self, c => c.default_block_size())
    }

    fn default_key_size(&self) -> usize {
        dispatch!(self, c => c.default_key_size())
    }

    fn block_sizes(&self) -> Vec<usize> {
        dispatch!(self, c => c.block_sizes())
    }

    fn key_sizes(&self) -> Vec<usize> {
        dispatch!(self, c => c.key_sizes())
    }

    fn init(&mut self, attrs: &Attributes) -> Result<()> {
        dispatch!(self, c => c.init(attrs))
    }

    fn current_block_size(&self) -> Result<usize> {
        dispatch!(self, c => c.current_block_size())
    }

    fn reset(&mut self) {
        dispatch!(self, c => c.reset())
    }

    fn encrypt_block(&self, block: &mut [u8]) -> Result<()> {
        dispatch!(self, c => c.encrypt_block(block))
    }

    fn decrypt_block(&self, block: &mut [u8]) -> Result<()> {
        dispatch!(self, c => c.decrypt_block(block))
    }

    fn clone_structure(&self) -> Self {
        match self {
            Self::Null(c) => Self::Null(c.clone_structure()),
            Self::Rijndael(c) => Self::Rijndael(c.clone_structure()),
        }
    }

    fn self_test(&self) -> bool {
        dispatch!(self, c => c.self_test())
    }
}

/// Returns a self-tested, unkeyed instance of the named
/// cipher, or `None` if the name is unknown.
///
/// # Panics
///
/// If the algorithm fails its self-test.
pub fn get_instance(name: &str) -> Option<Cipher> {
    let id = CipherId::from_name(name)?;
    let c = Cipher::checked(id);
    debug!(cipher = id.name(), "created cipher");
    Some(c)
}

/// Returns the names of the built-in ciphers, aliases
/// included.
pub fn names() -> &'static [&'static str] {
    &[
        registry::NULL_CIPHER,
        registry::RIJNDAEL_CIPHER,
        registry::AES_CIPHER,
    ]
}
