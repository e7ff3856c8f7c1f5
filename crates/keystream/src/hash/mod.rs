//! Streaming message digests.
//!
//! [`StreamingHash`] owns the buffering: it accepts input of any
//! length, hands complete blocks to a [`BlockTransform`], and
//! on [`StreamingHash::digest`] pads the message, extracts the
//! result, and resets itself so the instance can be reused.
//! The transform only ever sees whole blocks.
//!
//! # Example
//!
//! ```
//! use keystream::{
//!     hash::{self, MessageDigest},
//!     hex,
//! };
//!
//! let mut h = hash::get_instance("sha-1").expect("sha-1 is built in");
//! h.update(b"abc");
//! assert_eq!(
//!     hex::to_hex(&h.digest()),
//!     "A9993E364706816ABA3E25717850C26C9CD0D89D",
//! );
//! ```

mod md4;
mod md5;
mod ripemd160;
mod sha160;

use core::fmt;

use byteorder::ByteOrder;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

pub use self::{md4::Md4, md5::Md5, ripemd160::RipeMd160, sha160::Sha160};
use crate::{error::self_test_failed, hex, registry};

/// Hash algorithm identifiers.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum HashId {
    /// MD4.
    Md4,
    /// MD5.
    Md5,
    /// SHA-160.
    Sha160,
    /// RIPEMD-160.
    RipeMd160,
    /// Some other hash function.
    Other(u16),
}

impl HashId {
    /// Looks up a built-in algorithm by name.
    ///
    /// Surrounding whitespace and ASCII case are ignored.
    pub fn from_name(name: &str) -> Option<Self> {
        if registry::matches(name, &[registry::MD4_HASH]) {
            Some(Self::Md4)
        } else if registry::matches(name, &[registry::MD5_HASH]) {
            Some(Self::Md5)
        } else if registry::matches(
            name,
            &[
                registry::SHA160_HASH,
                registry::SHA_1_HASH,
                registry::SHA1_HASH,
                registry::SHA_HASH,
            ],
        ) {
            Some(Self::Sha160)
        } else if registry::matches(name, &[registry::RIPEMD_160_HASH, registry::RIPEMD160_HASH])
        {
            Some(Self::RipeMd160)
        } else {
            None
        }
    }

    /// Returns the canonical name, if this is a built-in
    /// algorithm.
    pub const fn name(self) -> Option<&'static str> {
        match self {
            Self::Md4 => Some(registry::MD4_HASH),
            Self::Md5 => Some(registry::MD5_HASH),
            Self::Sha160 => Some(registry::SHA160_HASH),
            Self::RipeMd160 => Some(registry::RIPEMD_160_HASH),
            Self::Other(_) => None,
        }
    }

    /// The process-wide self-test result for the algorithm.
    ///
    /// Unknown algorithms are never cached.
    fn self_test_cache(self) -> Option<&'static spin::Once<bool>> {
        static MD4: spin::Once<bool> = spin::Once::new();
        static MD5: spin::Once<bool> = spin::Once::new();
        static SHA160: spin::Once<bool> = spin::Once::new();
        static RIPEMD160: spin::Once<bool> = spin::Once::new();

        match self {
            Self::Md4 => Some(&MD4),
            Self::Md5 => Some(&MD5),
            Self::Sha160 => Some(&SHA160),
            Self::RipeMd160 => Some(&RIPEMD160),
            Self::Other(_) => None,
        }
    }
}

/// The compression function and chaining state of an iterated
/// hash.
///
/// [`Default`] must return the initial chaining state.
pub trait BlockTransform: Clone + Default {
    /// Uniquely identifies the algorithm.
    const ID: HashId;
    /// The canonical name of the algorithm.
    const NAME: &'static str;
    /// The size in bytes of the digest.
    const HASH_SIZE: usize;
    /// The size in bytes of a block.
    const BLOCK_SIZE: usize;
    /// A message and its expected digest as uppercase hex.
    const KNOWN_ANSWER: (&'static [u8], &'static str);

    /// Compresses one block into the chaining state.
    ///
    /// `block` is exactly [`BLOCK_SIZE`][Self::BLOCK_SIZE]
    /// bytes long.
    fn transform(&mut self, block: &[u8]);

    /// Returns the padding for a message of `count` bytes.
    ///
    /// `count` plus the length of the padding must be
    /// a multiple of [`BLOCK_SIZE`][Self::BLOCK_SIZE].
    fn padding(count: u64) -> Vec<u8>;

    /// Serializes the chaining state as the digest.
    fn extract(&self) -> Vec<u8>;

    /// Restores the initial chaining state.
    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Merkle-Damgård strengthening for 64-byte blocks: a single
/// `0x80`, zeros, then the message length in bits as a 64-bit
/// integer in the byte order `B`.
pub(crate) fn md_padding<B: ByteOrder>(count: u64) -> Vec<u8> {
    #![allow(clippy::arithmetic_side_effects)]

    // The remainder is always less than 64.
    let n = (count % 64) as usize;
    let padding = if n < 56 { 56 - n } else { 120 - n };
    let mut pad = vec![0u8; padding + 8];
    pad[0] = 0x80;
    B::write_u64(&mut pad[padding..], count.wrapping_mul(8));
    pad
}

/// A generic buffering engine around a [`BlockTransform`].
///
/// Between calls the buffer holds exactly
/// `count mod BLOCK_SIZE` pending bytes.
#[derive(Clone)]
pub struct StreamingHash<T> {
    /// Total bytes processed since the last reset.
    count: u64,
    buffer: Vec<u8>,
    state: T,
}

impl<T: BlockTransform> StreamingHash<T> {
    /// Creates a hash in its initial state.
    ///
    /// This does not run the self-test. Use
    /// [`checked`][Self::checked] or [`get_instance`] for that.
    pub fn new() -> Self {
        Self {
            count: 0,
            buffer: vec![0u8; T::BLOCK_SIZE],
            state: T::default(),
        }
    }

    /// Creates a hash after verifying that the algorithm
    /// passes its known-answer test.
    ///
    /// # Panics
    ///
    /// If the self-test fails.
    pub fn checked() -> Self {
        let h = Self::new();
        if !h.self_test() {
            self_test_failed(T::NAME)
        }
        h
    }

    /// Returns the canonical name of the algorithm.
    pub const fn name(&self) -> &'static str {
        T::NAME
    }

    /// Returns the size in bytes of the digest.
    pub const fn hash_size(&self) -> usize {
        T::HASH_SIZE
    }

    /// Returns the size in bytes of a block.
    pub const fn block_size(&self) -> usize {
        T::BLOCK_SIZE
    }

    /// Returns the number of bytes processed since the last
    /// reset.
    pub const fn count(&self) -> u64 {
        self.count
    }

    /// The number of pending bytes in the buffer.
    fn buffered(&self) -> usize {
        // BLOCK_SIZE fits in a usize, so the remainder does
        // too.
        (self.count % T::BLOCK_SIZE as u64) as usize
    }

    /// Adds one byte to the running hash.
    pub fn update_byte(&mut self, b: u8) {
        self.update(&[b]);
    }

    /// Adds `data` to the running hash.
    pub fn update(&mut self, mut data: &[u8]) {
        #![allow(clippy::arithmetic_side_effects)]

        let n = self.buffered();
        self.count = self.count.wrapping_add(data.len() as u64);

        if n > 0 {
            // `n < BLOCK_SIZE`
            let take = (T::BLOCK_SIZE - n).min(data.len());
            let (head, rest) = data.split_at(take);
            self.buffer[n..n + take].copy_from_slice(head);
            if n + take < T::BLOCK_SIZE {
                return;
            }
            self.state.transform(&self.buffer);
            data = rest;
        }

        let mut blocks = data.chunks_exact(T::BLOCK_SIZE);
        for block in &mut blocks {
            self.state.transform(block);
        }
        let rem = blocks.remainder();
        self.buffer[..rem.len()].copy_from_slice(rem);
    }

    /// Pads the message, returns its digest, and resets the
    /// hash.
    pub fn digest(&mut self) -> Vec<u8> {
        let pad = T::padding(self.count);
        self.update(&pad);
        debug_assert_eq!(self.buffered(), 0);
        let out = self.state.extract();
        self.reset();
        out
    }

    /// Restores the initial state.
    pub fn reset(&mut self) {
        self.count = 0;
        self.buffer.fill(0);
        self.state.reset();
    }

    /// Runs the algorithm's known-answer test.
    ///
    /// The outcome is computed on a fresh instance, so the
    /// state of `self` is irrelevant. Results for built-in
    /// algorithms are cached for the life of the process.
    pub fn self_test(&self) -> bool {
        let run = || {
            let (msg, want) = T::KNOWN_ANSWER;
            let mut h = Self::new();
            h.update(msg);
            let ok = hex::to_hex(&h.digest()) == want;
            trace!(algorithm = T::NAME, ok, "ran known-answer test");
            ok
        };
        match T::ID.self_test_cache() {
            Some(once) => *once.call_once(run),
            None => run(),
        }
    }
}

impl<T: BlockTransform> Default for StreamingHash<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: BlockTransform> fmt::Debug for StreamingHash<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamingHash")
            .field("name", &T::NAME)
            .field("count", &self.count)
            .finish_non_exhaustive()
    }
}

/// An object safe message digest.
pub trait MessageDigest {
    /// Returns the canonical name of the algorithm.
    fn name(&self) -> &'static str;
    /// Returns the size in bytes of the digest.
    fn hash_size(&self) -> usize;
    /// Returns the size in bytes of a block.
    fn block_size(&self) -> usize;
    /// Adds one byte to the running hash.
    fn update_byte(&mut self, b: u8);
    /// Adds `data` to the running hash.
    fn update(&mut self, data: &[u8]);
    /// Returns the digest and resets the hash.
    fn digest(&mut self) -> Vec<u8>;
    /// Restores the initial state.
    fn reset(&mut self);
    /// Runs the algorithm's known-answer test.
    fn self_test(&self) -> bool;
}

impl<T: BlockTransform> MessageDigest for StreamingHash<T> {
    fn name(&self) -> &'static str {
        T::NAME
    }

    fn hash_size(&self) -> usize {
        T::HASH_SIZE
    }

    fn block_size(&self) -> usize {
        T::BLOCK_SIZE
    }

    fn update_byte(&mut self, b: u8) {
        Self::update_byte(self, b)
    }

    fn update(&mut self, data: &[u8]) {
        Self::update(self, data)
    }

    fn digest(&mut self) -> Vec<u8> {
        Self::digest(self)
    }

    fn reset(&mut self) {
        Self::reset(self)
    }

    fn self_test(&self) -> bool {
        Self::self_test(self)
    }
}

/// One of the built-in message digests.
#[derive(Clone, Debug)]
pub enum Hash {
    /// MD4.
    Md4(StreamingHash<Md4>),
    /// MD5.
    Md5(StreamingHash<Md5>),
    /// SHA-160.
    Sha160(StreamingHash<Sha160>),
    /// RIPEMD-160.
    RipeMd160(StreamingHash<RipeMd160>),
}

macro_rules! dispatch {
    ($self:expr, $h:ident => $body:expr) => {
        match $self {
            Hash::Md4($h) => $body,
            Hash::Md5($h) => $body,
            Hash::Sha160($h) => $body,
            Hash::RipeMd160($h) => $body,
        }
    };
}

impl Hash {
    /// Creates a self-tested instance of the algorithm.
    ///
    /// Returns `None` for [`HashId::Other`].
    ///
    /// # Panics
    ///
    /// If the self-test fails.
    pub fn checked(id: HashId) -> Option<Self> {
        let h = match id {
            HashId::Md4 => Self::Md4(StreamingHash::checked()),
            HashId::Md5 => Self::Md5(StreamingHash::checked()),
            HashId::Sha160 => Self::Sha160(StreamingHash::checked()),
            HashId::RipeMd160 => Self::RipeMd160(StreamingHash::checked()),
            HashId::Other(_) => return None,
        };
        Some(h)
    }

    /// Returns the algorithm identifier.
    pub const fn id(&self) -> HashId {
        match self {
            Self::Md4(_) => HashId::Md4,
            Self::Md5(_) => HashId::Md5,
            Self::Sha160(_) => HashId::Sha160,
            Self::RipeMd160(_) => HashId::RipeMd160,
        }
    }
}

impl MessageDigest for Hash {
    fn name(&self) -> &'static str {
        dispatch!(self, h => h.name())
    }

    fn hash_size(&self) -> usize {
        dispatch!(self, h => h.hash_size())
    }

    fn block_size(&self) -> usize {
        dispatch!(self, h => h.block_size())
    }

    fn update_byte(&mut self, b: u8) {
        dispatch!(self, h => h.update_byte(b))
    }

    fn update(&mut self, data: &[u8]) {
        dispatch!(self, h => h.update(data))
    }

    fn digest(&mut self) -> Vec<u8> {
        dispatch!(self, h => h.digest())
    }

    fn reset(&mut self) {
        dispatch!(self, h => h.reset())
    }

    fn self_test(&self) -> bool {
        dispatch!(self, h => h.self_test())
    }
}

/// Returns a self-tested instance of the named hash, or `None`
/// if the name is unknown.
///
/// # Panics
///
/// If the algorithm fails its self-test.
pub fn get_instance(name: &str) -> Option<Hash> {
    let id = HashId::from_name(name)?;
    let h = Hash::checked(id)?;
    debug!(algorithm = h.name(), "created hash");
    Some(h)
}

/// Returns the canonical names of the built-in hashes.
pub fn names() -> &'static [&'static str] {
    &[
        registry::MD4_HASH,
        registry::MD5_HASH,
        registry::SHA160_HASH,
        registry::RIPEMD_160_HASH,
    ]
}
