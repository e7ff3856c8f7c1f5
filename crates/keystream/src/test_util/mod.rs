//! Utilities for testing [`BlockTransform`][crate::hash::BlockTransform]
//! and [`BlockCipher`][crate::cipher::BlockCipher]
//! implementations.
//!
//! If you implement either trait outside of this crate it is
//! **very highly** recommended that you use these tests.

#![allow(clippy::arithmetic_side_effects)]
#![allow(clippy::panic)]
#![cfg(any(test, feature = "test_util"))]
#![cfg_attr(docsrs, doc(cfg(feature = "test_util")))]

pub mod hash;
pub mod mode;

pub use hash::test_hash;
pub use mode::test_mode;

#[macro_export]
#[doc(hidden)]
macro_rules! __apply {
    ($callback:ident, $($tt:tt),* $(,)?) => {
        $(
            $callback!($tt);
        )*
    };
}
pub use __apply;
