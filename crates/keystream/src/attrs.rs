//! Attribute maps.
//!
//! Ciphers, modes, and generators are all configured through an
//! open key-value map. Each component reads the keys it
//! recognizes and ignores the rest, so one map can configure a
//! mode and its underlying cipher at the same time.

use std::{collections::HashMap, fmt};

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// An attribute key.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Attr {
    /// Raw symmetric key bytes.
    KeyMaterial,
    /// The requested cipher block size in bytes.
    CipherBlockSize,
    /// The direction of a mode of operation.
    State,
    /// The initialization vector of a mode of operation.
    Iv,
    /// The operating block size of a mode of operation.
    ModeBlockSize,
    /// The ICM offset, as bytes or as an integer.
    Offset,
    /// The ICM segment index.
    SegmentIndex,
    /// The ICM block index length in octets.
    BlockIndexLength,
    /// The ICM segment index length in octets.
    SegmentIndexLength,
    /// The UMAC-KDF index, 0 through 255.
    Index,
    /// The name of an underlying block cipher.
    Cipher,
    /// The name of an underlying message digest.
    HashName,
    /// Seed material for a hash-based generator.
    Seed,
}

impl Attr {
    /// Returns the canonical name of the attribute.
    pub const fn name(self) -> &'static str {
        match self {
            Self::KeyMaterial => "keystream.cipher.key.material",
            Self::CipherBlockSize => "keystream.cipher.block.size",
            Self::State => "keystream.mode.state",
            Self::Iv => "keystream.mode.iv",
            Self::ModeBlockSize => "keystream.mode.block.size",
            Self::Offset => "keystream.prng.icm.offset",
            Self::SegmentIndex => "keystream.prng.icm.segment.index",
            Self::BlockIndexLength => "keystream.prng.icm.block.index.length",
            Self::SegmentIndexLength => "keystream.prng.icm.segment.index.length",
            Self::Index => "keystream.prng.umac.kdf.index",
            Self::Cipher => "keystream.prng.cipher.name",
            Self::HashName => "keystream.prng.md.hash.name",
            Self::Seed => "keystream.prng.md.seed",
        }
    }
}

impl fmt::Display for Attr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The direction of a mode of operation.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Direction {
    /// Encryption.
    Encrypt = 1,
    /// Decryption.
    Decrypt = 2,
}

impl TryFrom<usize> for Direction {
    type Error = Error;

    fn try_from(v: usize) -> Result<Self> {
        match v {
            1 => Ok(Self::Encrypt),
            2 => Ok(Self::Decrypt),
            _ => Err(Error::Config(Attr::State.name())),
        }
    }
}

/// An attribute value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Value {
    /// A byte string.
    Bytes(Vec<u8>),
    /// A small non-negative integer.
    Int(usize),
    /// An arbitrary precision non-negative integer.
    BigInt(BigUint),
    /// An algorithm name.
    Name(String),
    /// A mode direction.
    Direction(Direction),
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Self::Bytes(v.to_vec())
    }
}

impl<const N: usize> From<[u8; N]> for Value {
    fn from(v: [u8; N]) -> Self {
        Self::Bytes(v.to_vec())
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Self::Int(v)
    }
}

impl From<BigUint> for Value {
    fn from(v: BigUint) -> Self {
        Self::BigInt(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Name(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Name(v)
    }
}

impl From<Direction> for Value {
    fn from(v: Direction) -> Self {
        Self::Direction(v)
    }
}

/// An open map of configuration attributes.
#[derive(Clone, Default, Eq, PartialEq)]
pub struct Attributes(HashMap<Attr, Value>);

impl Attributes {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value` and returns the map.
    #[must_use]
    pub fn with(mut self, key: Attr, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Sets `key` to `value`, returning the previous value.
    pub fn set(&mut self, key: Attr, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key, value.into())
    }

    /// Removes `key`, returning its value.
    pub fn remove(&mut self, key: Attr) -> Option<Value> {
        self.0.remove(&key)
    }

    /// Returns the raw value of `key`.
    pub fn get(&self, key: Attr) -> Option<&Value> {
        self.0.get(&key)
    }

    /// Reports whether `key` is set.
    pub fn contains(&self, key: Attr) -> bool {
        self.0.contains_key(&key)
    }

    /// Returns `key` as a byte string.
    pub fn bytes(&self, key: Attr) -> Result<Option<&[u8]>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Bytes(v)) => Ok(Some(v.as_slice())),
            Some(_) => Err(Error::Config(key.name())),
        }
    }

    /// Returns `key` as a small integer.
    pub fn int(&self, key: Attr) -> Result<Option<usize>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Int(v)) => Ok(Some(*v)),
            Some(_) => Err(Error::Config(key.name())),
        }
    }

    /// Returns `key` as an arbitrary precision integer.
    ///
    /// Small integers are widened.
    pub fn big_int(&self, key: Attr) -> Result<Option<BigUint>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::BigInt(v)) => Ok(Some(v.clone())),
            Some(Value::Int(v)) => Ok(Some(BigUint::from(*v))),
            Some(_) => Err(Error::Config(key.name())),
        }
    }

    /// Returns `key` as an algorithm name.
    pub fn name(&self, key: Attr) -> Result<Option<&str>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Name(v)) => Ok(Some(v.as_str())),
            Some(_) => Err(Error::Config(key.name())),
        }
    }

    /// Returns `key` as a mode direction.
    ///
    /// The integers `1` and `2` are accepted for
    /// [`Direction::Encrypt`] and [`Direction::Decrypt`].
    pub fn direction(&self, key: Attr) -> Result<Option<Direction>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Direction(v)) => Ok(Some(*v)),
            Some(Value::Int(v)) => Direction::try_from(*v)
                .map(Some)
                .map_err(|_| Error::Config(key.name())),
            Some(_) => Err(Error::Config(key.name())),
        }
    }
}

// Attribute maps routinely carry key material, so only the keys
// are printed.
impl fmt::Debug for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.keys()).finish()
    }
}
