//! Streaming hashes, block cipher modes of operation, and
//! pseudorandom generators.
//!
//! # Overview
//!
//! The crate is organized around three small engines, each
//! parameterized by a capability:
//!
//! - [`hash::StreamingHash`] buffers arbitrary input into fixed
//!   size blocks and hands each block to a
//!   [`hash::BlockTransform`] (MD4, MD5, SHA-160, RIPEMD-160).
//! - [`mode::Mode`] drives a [`cipher::BlockCipher`] one block at
//!   a time under ECB, OFB, or Integer Counter Mode (ICM).
//! - [`prng::Prng`] serves bytes from blocks produced by a
//!   [`prng::Generator`] (hash chain, ICM keystream, or the
//!   UMAC key derivation function).
//!
//! Every algorithm carries a known-answer or symmetry self-test.
//! The name-keyed factories ([`hash::get_instance`],
//! [`mode::get_instance`], [`prng::get_instance`],
//! [`cipher::get_instance`]) run it before handing out an
//! instance and abort the process if it fails: a primitive that
//! cannot reproduce its own test vectors is never returned.
//!
//! Configuration is passed as an open [`Attributes`] map, the
//! same way for ciphers, modes, and generators.
//!
//! # Randomness
//!
//! There is no hidden global generator. Code that needs
//! randomness, such as [`prime::is_probable_prime`], takes a
//! [`prng::RandomSource`] from its caller.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod attrs;
pub mod cipher;
mod counter;
mod error;
pub mod hash;
pub mod hex;
pub mod mode;
pub mod prime;
pub mod prng;
pub mod registry;
pub mod test_util;
pub mod util;

pub use attrs::{Attr, Attributes, Direction, Value};
pub use buggy;
pub use error::*;
