//! [`BlockTransform`] tests.

use crate::{
    hash::{BlockTransform, StreamingHash},
    hex,
};

/// Invokes `callback` for each hash test.
///
/// # Example
///
/// ```
/// use keystream::hash::Md4;
///
/// macro_rules! run_test {
///     ($test:ident) => {
///         keystream::test_util::hash::$test::<Md4>();
///     };
/// }
/// keystream::for_each_hash_test!(run_test);
/// ```
#[macro_export]
macro_rules! for_each_hash_test {
    ($callback:ident) => {
        $crate::__apply! {
            $callback,
            test_known_answer,
            test_basic,
            test_reset,
            test_clone_is_independent,
            test_block_boundaries,
        }
    };
}
pub use for_each_hash_test;

/// Performs all of the tests in this module.
///
/// This macro expands into a bunch of individual `#[test]`
/// functions.
///
/// # Example
///
/// ```
/// use keystream::{hash::Sha160, test_hash};
///
/// test_hash!(sha160, Sha160);
/// ```
#[macro_export]
macro_rules! test_hash {
    ($name:ident, $hash:ty) => {
        mod $name {
            #[allow(unused_imports)]
            use super::*;

            $crate::test_hash!($hash);
        }
    };
    ($hash:ty) => {
        macro_rules! __hash_test {
            ($test:ident) => {
                #[test]
                fn $test() {
                    $crate::test_util::hash::$test::<$hash>()
                }
            };
        }
        $crate::for_each_hash_test!(__hash_test);
    };
}
pub use test_hash;

const INPUT: &[u8] = br#"
It was the best of times, it was the worst of times, it was
the age of wisdom, it was the age of foolishness, it was the
epoch of belief, it was the epoch of incredulity, it was the
season of Light, it was the season of Darkness ...
"#;

fn hash<T: BlockTransform>(data: &[u8]) -> Vec<u8> {
    let mut h = StreamingHash::<T>::new();
    h.update(data);
    h.digest()
}

/// The algorithm reproduces its own test vector.
pub fn test_known_answer<T: BlockTransform>() {
    let (msg, want) = T::KNOWN_ANSWER;
    let got = hash::<T>(msg);
    assert_eq!(got.len(), T::HASH_SIZE);
    assert_eq!(hex::to_hex(&got), want);
    assert!(StreamingHash::<T>::new().self_test());
}

/// A basic test for a [`BlockTransform`].
pub fn test_basic<T: BlockTransform>() {
    let want = hash::<T>(INPUT);

    let got = {
        // Repeated calls to `update_byte` should be the same
        // as a single call to `update`.
        let mut h = StreamingHash::<T>::new();
        for c in INPUT {
            h.update_byte(*c);
        }
        assert_eq!(h.count(), INPUT.len() as u64);
        h.digest()
    };
    assert_eq!(want, got);

    // Hashing the same input should result in the same
    // output.
    assert_eq!(want, hash::<T>(INPUT));

    // A modified input should have a different hash, though.
    let mut modified = INPUT.to_vec();
    modified[0] += 1;
    assert_ne!(want, hash::<T>(&modified));
}

/// `digest` and `reset` both return the hash to its initial
/// state.
pub fn test_reset<T: BlockTransform>() {
    let empty = hash::<T>(&[]);

    let mut h = StreamingHash::<T>::new();
    h.update(INPUT);
    h.reset();
    assert_eq!(h.count(), 0);
    assert_eq!(h.digest(), empty);

    h.update(INPUT);
    let first = h.digest();
    assert_eq!(h.count(), 0);
    h.update(INPUT);
    assert_eq!(h.digest(), first);
}

/// A clone carries the pending state but is otherwise
/// independent of the original.
pub fn test_clone_is_independent<T: BlockTransform>() {
    let (head, tail) = INPUT.split_at(INPUT.len() / 3);

    let mut h = StreamingHash::<T>::new();
    h.update(head);
    let mut c = h.clone();
    h.update(tail);
    assert_eq!(c.count(), head.len() as u64);
    assert_eq!(h.digest(), hash::<T>(INPUT));

    c.update(b"something else");
    let mut want = head.to_vec();
    want.extend_from_slice(b"something else");
    assert_eq!(c.digest(), hash::<T>(&want));
}

/// Inputs that end on, just before, and just after a block
/// boundary hash the same whether written at once or in
/// uneven pieces.
pub fn test_block_boundaries<T: BlockTransform>() {
    let data = INPUT.repeat(2);
    let max = (T::BLOCK_SIZE * 2 + 2).min(data.len());
    for len in 0..=max {
        let msg = &data[..len];
        let want = hash::<T>(msg);

        let mut h = StreamingHash::<T>::new();
        let mut rest = msg;
        let mut step = 1;
        while !rest.is_empty() {
            let (a, b) = rest.split_at(step.min(rest.len()));
            h.update(a);
            rest = b;
            step += 7;
        }
        assert_eq!(h.digest(), want, "length {len}");
        assert_eq!(want.len(), T::HASH_SIZE, "length {len}");
    }
}
