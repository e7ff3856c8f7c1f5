//! Pseudorandom generators.
//!
//! [`Prng`] serves bytes out of blocks produced by a
//! [`Generator`]. When the current block runs out it asks the
//! generator for another one, which fails with
//! [`Error::LimitReached`] once the generator's configured
//! keystream is exhausted. That error is distinct from
//! [`Error::State`]: the fix is to reseed or reconfigure, not
//! to call `init` that was forgotten.
//!
//! # Cloning
//!
//! [`Clone`] copies everything, including keys and the
//! position in the keystream, so the clone replays the same
//! output. [`Prng::clone_structure`] copies only the choice of
//! generator and must be initialized again before use.

mod icm;
mod md;
mod umac;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

pub use self::{icm::IcmGenerator, md::MdGenerator, umac::UMacGenerator};
use crate::{
    attrs::{Attr, Attributes},
    error::{Error, Result, self_test_failed},
    hex, registry,
};

/// A source of pseudorandom bytes.
///
/// Code that needs randomness takes one of these from its
/// caller instead of reaching for a global.
pub trait RandomSource {
    /// Returns the next byte.
    fn next_byte(&mut self) -> Result<u8> {
        let mut b = [0u8; 1];
        self.next_bytes(&mut b)?;
        Ok(b[0])
    }

    /// Fills `out` with the next `out.len()` bytes.
    fn next_bytes(&mut self, out: &mut [u8]) -> Result<()>;
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_byte(&mut self) -> Result<u8> {
        (**self).next_byte()
    }

    fn next_bytes(&mut self, out: &mut [u8]) -> Result<()> {
        (**self).next_bytes(out)
    }
}

/// Generator identifiers.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum PrngId {
    /// A hash chain.
    Md,
    /// An ICM keystream.
    Icm,
    /// The UMAC key derivation function.
    UMac,
}

impl PrngId {
    /// Looks up a generator by name.
    ///
    /// Surrounding whitespace and ASCII case are ignored.
    pub fn from_name(name: &str) -> Option<Self> {
        if registry::matches(name, &[registry::MD_PRNG]) {
            Some(Self::Md)
        } else if registry::matches(name, &[registry::ICM_PRNG]) {
            Some(Self::Icm)
        } else if registry::matches(name, &[registry::UMAC_PRNG]) {
            Some(Self::UMac)
        } else {
            None
        }
    }

    /// Returns the canonical name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Md => registry::MD_PRNG,
            Self::Icm => registry::ICM_PRNG,
            Self::UMac => registry::UMAC_PRNG,
        }
    }

    /// A configuration and the expected first block, as
    /// uppercase hex.
    fn known_answer(self) -> (Attributes, &'static str) {
        match self {
            // SHA-160 of the empty string.
            Self::Md => (
                Attributes::new(),
                "DA39A3EE5E6B4B0D3255BFEF95601890AFD80709",
            ),
            // McGrew and Fluhrer, "Integer Counter Mode", test
            // vector one.
            Self::Icm => (
                Attributes::new()
                    .with(Attr::KeyMaterial, counting_key())
                    .with(Attr::Offset, counting_key())
                    .with(Attr::SegmentIndexLength, 4usize)
                    .with(Attr::BlockIndexLength, 4usize),
                "0A940BB5416EF045F1C39458C653EA5A",
            ),
            // AES-128 of the zero block under the zero key.
            Self::UMac => (
                Attributes::new()
                    .with(Attr::KeyMaterial, [0u8; 16])
                    .with(Attr::Index, 0usize),
                "66E94BD4EF8A2C3B884CFA59CA342B2E",
            ),
        }
    }

    fn self_test_cache(self) -> &'static spin::Once<bool> {
        static MD: spin::Once<bool> = spin::Once::new();
        static ICM: spin::Once<bool> = spin::Once::new();
        static UMAC: spin::Once<bool> = spin::Once::new();

        match self {
            Self::Md => &MD,
            Self::Icm => &ICM,
            Self::UMac => &UMAC,
        }
    }
}

fn counting_key() -> [u8; 16] {
    core::array::from_fn(|i| i as u8)
}

/// The block producing half of a [`Prng`].
trait BlockSource: Sized {
    /// Validates `attrs` and builds a ready generator.
    fn setup(attrs: &Attributes) -> Result<Self>;

    /// Produces the next block of output.
    fn fill_block(&mut self) -> Result<Vec<u8>>;
}

/// A configured generator.
#[derive(Clone, Debug)]
pub enum Generator {
    /// A hash chain.
    Md(MdGenerator),
    /// An ICM keystream.
    Icm(IcmGenerator),
    /// The UMAC key derivation function.
    UMac(UMacGenerator),
}

impl Generator {
    fn setup(id: PrngId, attrs: &Attributes) -> Result<Self> {
        Ok(match id {
            PrngId::Md => Self::Md(MdGenerator::setup(attrs)?),
            PrngId::Icm => Self::Icm(IcmGenerator::setup(attrs)?),
            PrngId::UMac => Self::UMac(UMacGenerator::setup(attrs)?),
        })
    }

    fn fill_block(&mut self) -> Result<Vec<u8>> {
        match self {
            Self::Md(g) => g.fill_block(),
            Self::Icm(g) => g.fill_block(),
            Self::UMac(g) => g.fill_block(),
        }
    }

    /// Returns the generator identifier.
    pub const fn id(&self) -> PrngId {
        match self {
            Self::Md(_) => PrngId::Md,
            Self::Icm(_) => PrngId::Icm,
            Self::UMac(_) => PrngId::UMac,
        }
    }
}

/// A buffered pseudorandom generator.
#[derive(Clone, Debug)]
pub struct Prng {
    id: PrngId,
    /// `None` until `init`.
    generator: Option<Generator>,
    buffer: Vec<u8>,
    /// The next unread byte of `buffer`.
    ndx: usize,
}

impl Prng {
    /// Creates an uninitialized generator.
    ///
    /// This does not run the self-test. Use [`get_instance`]
    /// for that.
    pub const fn new(id: PrngId) -> Self {
        Self {
            id,
            generator: None,
            buffer: Vec::new(),
            ndx: 0,
        }
    }

    /// A SHA-160 hash chain with an empty seed.
    ///
    /// The output is the same in every process. It is meant
    /// for tests and other places where reproducibility is the
    /// point; never use it where unpredictability matters.
    pub fn reproducible() -> Self {
        Self::seeded(&[])
    }

    /// A SHA-160 hash chain seeded with `seed`.
    ///
    /// The output is only as unpredictable as `seed`.
    pub fn seeded(seed: &[u8]) -> Self {
        Self {
            generator: Some(Generator::Md(MdGenerator::sha160(seed))),
            ..Self::new(PrngId::Md)
        }
    }

    /// Returns the generator identifier.
    pub const fn id(&self) -> PrngId {
        self.id
    }

    /// Returns the canonical name of the generator.
    pub const fn name(&self) -> &'static str {
        self.id.name()
    }

    /// Reports whether `init` has succeeded.
    pub const fn is_initialized(&self) -> bool {
        self.generator.is_some()
    }

    /// Configures the generator, replacing any previous
    /// configuration and discarding buffered output.
    ///
    /// On error the generator is left uninitialized.
    pub fn init(&mut self, attrs: &Attributes) -> Result<()> {
        self.generator = None;
        self.buffer.clear();
        self.ndx = 0;
        self.generator = Some(Generator::setup(self.id, attrs)?);
        trace!(prng = self.name(), "initialized generator");
        Ok(())
    }

    /// Returns the next byte.
    pub fn next_byte(&mut self) -> Result<u8> {
        let mut b = [0u8; 1];
        self.next_bytes(&mut b)?;
        Ok(b[0])
    }

    /// Fills `out` with the next `out.len()` bytes.
    ///
    /// If the generator's limit is reached part way through,
    /// the bytes before the limit have already been written.
    pub fn next_bytes(&mut self, mut out: &mut [u8]) -> Result<()> {
        #![allow(clippy::arithmetic_side_effects)]

        let generator = self
            .generator
            .as_mut()
            .ok_or(Error::State("generator not initialized"))?;
        while !out.is_empty() {
            if self.ndx >= self.buffer.len() {
                self.buffer = generator.fill_block()?;
                self.ndx = 0;
            }
            // `ndx < buffer.len()`
            let avail = &self.buffer[self.ndx..];
            let n = avail.len().min(out.len());
            let (head, rest) = out.split_at_mut(n);
            head.copy_from_slice(&avail[..n]);
            self.ndx += n;
            out = rest;
        }
        Ok(())
    }

    /// Returns an uninitialized generator of the same kind.
    ///
    /// No keys, seeds, or output are copied.
    pub const fn clone_structure(&self) -> Self {
        Self::new(self.id)
    }

    /// Runs the generator's known-answer test.
    ///
    /// The outcome does not depend on the state of `self` and
    /// is cached for the life of the process.
    pub fn self_test(&self) -> bool {
        let id = self.id;
        *id.self_test_cache().call_once(|| {
            let (attrs, want) = id.known_answer();
            let ok = Generator::setup(id, &attrs)
                .and_then(|mut g| g.fill_block())
                .is_ok_and(|block| hex::to_hex(&block) == want);
            trace!(prng = id.name(), ok, "ran known-answer test");
            ok
        })
    }
}

impl RandomSource for Prng {
    fn next_byte(&mut self) -> Result<u8> {
        Self::next_byte(self)
    }

    fn next_bytes(&mut self, out: &mut [u8]) -> Result<()> {
        Self::next_bytes(self, out)
    }
}

/// Returns a self-tested, uninitialized generator, or `None`
/// if the name is unknown.
///
/// # Panics
///
/// If the generator fails its self-test.
pub fn get_instance(name: &str) -> Option<Prng> {
    let id = PrngId::from_name(name)?;
    let prng = Prng::new(id);
    if !prng.self_test() {
        self_test_failed(id.name())
    }
    debug!(prng = id.name(), "created generator");
    Some(prng)
}

/// Returns the canonical names of the built-in generators.
pub fn names() -> &'static [&'static str] {
    &[registry::MD_PRNG, registry::ICM_PRNG, registry::UMAC_PRNG]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_instance() {
        for name in names() {
            let prng = get_instance(name).unwrap_or_else(|| panic!("{name} should exist"));
            assert_eq!(prng.name(), *name);
            assert!(!prng.is_initialized(), "{name}");
        }
        assert!(get_instance(" UMAC-KDF ").is_some());
        assert!(get_instance("fortuna").is_none());
    }

    #[test]
    fn test_uninitialized() {
        let mut prng = get_instance("md").expect("built in");
        assert!(prng.next_byte().is_err_and(|e| e.is_state()));
        let mut buf = [0u8; 4];
        assert!(prng.next_bytes(&mut buf).is_err_and(|e| e.is_state()));
    }

    #[test]
    fn test_reproducible_is_sha160_chain() {
        let mut prng = Prng::reproducible();
        let mut block = [0u8; 20];
        prng.next_bytes(&mut block).expect("no limit");
        assert_eq!(
            hex::to_hex(&block),
            "DA39A3EE5E6B4B0D3255BFEF95601890AFD80709"
        );
    }

    #[test]
    fn test_byte_and_block_reads_agree() {
        let mut a = Prng::seeded(b"seed");
        let mut b = a.clone();

        let mut want = [0u8; 77];
        a.next_bytes(&mut want).expect("no limit");
        let got = (0..want.len())
            .map(|_| b.next_byte().expect("no limit"))
            .collect::<Vec<_>>();
        assert_eq!(got, want);
    }

    #[test]
    fn test_clone_replays_output() {
        let mut a = Prng::seeded(b"secret");
        let mut skip = [0u8; 7];
        a.next_bytes(&mut skip).expect("no limit");

        let mut b = a.clone();
        let mut x = [0u8; 50];
        let mut y = [0u8; 50];
        a.next_bytes(&mut x).expect("no limit");
        b.next_bytes(&mut y).expect("no limit");
        assert_eq!(x, y);
    }

    #[test]
    fn test_clone_structure_requires_init() {
        let a = Prng::seeded(b"secret");
        let mut b = a.clone_structure();
        assert_eq!(b.id(), PrngId::Md);
        assert!(!b.is_initialized());
        assert!(b.next_byte().is_err_and(|e| e.is_state()));

        b.init(&Attributes::new().with(Attr::Seed, b"secret".as_slice()))
            .expect("should init");
        let mut x = [0u8; 32];
        let mut y = [0u8; 32];
        a.clone().next_bytes(&mut x).expect("no limit");
        b.next_bytes(&mut y).expect("no limit");
        assert_eq!(x, y);
    }

    #[test]
    fn test_failed_init_leaves_uninitialized() {
        let mut prng = Prng::seeded(b"seed");
        let err = prng
            .init(&Attributes::new().with(Attr::HashName, "whirlpool"))
            .expect_err("unknown hash");
        assert_eq!(err, Error::Config(Attr::HashName.name()));
        assert!(!prng.is_initialized());
    }

    #[test]
    fn test_random_source_is_object_safe() {
        let mut prng = Prng::reproducible();
        let src: &mut dyn RandomSource = &mut prng;
        let mut buf = [0u8; 3];
        src.next_bytes(&mut buf).expect("no limit");
        assert_eq!(buf, [0xda, 0x39, 0xa3]);
    }
}
