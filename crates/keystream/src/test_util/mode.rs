//! [`Mode`] tests.
//!
//! Each test takes a mode name and a cipher name and goes
//! through the factories, so the tests apply to any pairing
//! [`get_instance`] knows about.

use crate::{
    attrs::{Attr, Attributes, Direction},
    cipher::{self, BlockCipher},
    error::Error,
    mode::{Mode, ModeId, get_instance},
    util::counting_bytes,
};

/// Invokes `callback` for each mode test.
///
/// # Example
///
/// ```
/// macro_rules! run_test {
///     ($test:ident) => {
///         keystream::test_util::mode::$test("ofb", "aes");
///     };
/// }
/// keystream::for_each_mode_test!(run_test);
/// ```
#[macro_export]
macro_rules! for_each_mode_test {
    ($callback:ident) => {
        $crate::__apply! {
            $callback,
            test_round_trip,
            test_block_sizes,
            test_uninitialized,
            test_reset_and_reinit,
            test_self_test,
            test_keystream_symmetry,
        }
    };
}
pub use for_each_mode_test;

/// Performs all of the tests in this module.
///
/// This macro expands into a bunch of individual `#[test]`
/// functions.
///
/// # Example
///
/// ```
/// use keystream::test_mode;
///
/// test_mode!(ofb_aes, "ofb", "aes");
/// ```
#[macro_export]
macro_rules! test_mode {
    ($name:ident, $mode:literal, $cipher:literal) => {
        mod $name {
            $crate::test_mode!($mode, $cipher);
        }
    };
    ($mode:literal, $cipher:literal) => {
        macro_rules! __mode_test {
            ($test:ident) => {
                #[test]
                fn $test() {
                    $crate::test_util::mode::$test($mode, $cipher)
                }
            };
        }
        $crate::for_each_mode_test!(__mode_test);
    };
}
pub use test_mode;

const BLOCKS: usize = 8;

fn new_mode(mode: &str, cipher: &str, block_size: usize) -> Mode {
    get_instance(mode, cipher, block_size)
        .unwrap_or_else(|err| panic!("{mode}({cipher}): {err}"))
        .unwrap_or_else(|| panic!("{mode}({cipher}): unknown name"))
}

fn default_block_size(cipher: &str) -> usize {
    cipher::get_instance(cipher)
        .unwrap_or_else(|| panic!("{cipher}: unknown name"))
        .default_block_size()
}

fn attrs(key_size: usize, direction: Direction) -> Attributes {
    let mut key = counting_bytes(key_size);
    key.reverse();
    Attributes::new()
        .with(Attr::KeyMaterial, key)
        .with(Attr::Iv, counting_bytes(32))
        .with(Attr::State, direction)
}

/// Runs `BLOCKS` blocks through `m`.
fn run(m: &mut Mode, input: &[u8]) -> Vec<u8> {
    let bs = m.current_block_size().expect("mode should be initialized");
    let mut out = vec![0u8; input.len()];
    for (i, o) in input.chunks_exact(bs).zip(out.chunks_exact_mut(bs)) {
        m.update(i, o).expect("update should succeed");
    }
    out
}

/// Fixes the IV length to the block size.
fn with_block_size(mut attrs: Attributes, bs: usize) -> Attributes {
    attrs.set(Attr::Iv, counting_bytes(bs));
    attrs
}

/// Decryption inverts encryption for every supported key
/// size.
pub fn test_round_trip(mode: &str, cipher: &str) {
    let bs = default_block_size(cipher);
    let mut m = new_mode(mode, cipher, bs);
    let pt = counting_bytes(bs * BLOCKS);

    for ks in m.key_sizes() {
        m.init(&with_block_size(attrs(ks, Direction::Encrypt), bs))
            .unwrap_or_else(|err| panic!("key size {ks}: {err}"));
        assert_eq!(m.direction(), Some(Direction::Encrypt));
        let ct = run(&mut m, &pt);
        m.reset();

        m.init(&with_block_size(attrs(ks, Direction::Decrypt), bs))
            .unwrap_or_else(|err| panic!("key size {ks}: {err}"));
        assert_eq!(m.direction(), Some(Direction::Decrypt));
        assert_eq!(run(&mut m, &ct), pt, "key size {ks}");
        m.reset();
    }
}

/// Decryption inverts encryption for every block size the
/// cipher supports.
pub fn test_block_sizes(mode: &str, cipher: &str) {
    let c = cipher::get_instance(cipher).unwrap_or_else(|| panic!("{cipher}: unknown name"));
    let ks = c.default_key_size();

    for bs in c.block_sizes() {
        let mut m = new_mode(mode, cipher, bs);
        assert_eq!(m.default_block_size(), bs);
        let pt = counting_bytes(bs * BLOCKS);

        m.init(&with_block_size(attrs(ks, Direction::Encrypt), bs))
            .unwrap_or_else(|err| panic!("block size {bs}: {err}"));
        assert_eq!(m.current_block_size(), Ok(bs));
        let ct = run(&mut m, &pt);
        m.reset();

        m.init(&with_block_size(attrs(ks, Direction::Decrypt), bs))
            .unwrap_or_else(|err| panic!("block size {bs}: {err}"));
        assert_eq!(run(&mut m, &ct), pt, "block size {bs}");
    }
}

/// Nothing can be transformed before `init` or after `reset`.
pub fn test_uninitialized(mode: &str, cipher: &str) {
    let bs = default_block_size(cipher);
    let mut m = new_mode(mode, cipher, bs);
    let input = vec![0u8; bs];
    let mut output = vec![0u8; bs];

    assert_eq!(m.direction(), None);
    assert!(m.current_block_size().is_err());
    let err = m.update(&input, &mut output).expect_err("not initialized");
    assert!(err.is_state(), "{err}");

    let ks = m.default_key_size();
    m.init(&with_block_size(attrs(ks, Direction::Encrypt), bs))
        .expect("should init");
    m.update(&input, &mut output).expect("should encrypt");
    m.reset();

    let err = m.update(&input, &mut output).expect_err("reset");
    assert!(err.is_state(), "{err}");
    assert_eq!(m.direction(), None);
}

/// After `reset`, the same attributes produce the same output.
pub fn test_reset_and_reinit(mode: &str, cipher: &str) {
    let bs = default_block_size(cipher);
    let mut m = new_mode(mode, cipher, bs);
    let a = with_block_size(attrs(m.default_key_size(), Direction::Encrypt), bs);
    let pt = counting_bytes(bs * BLOCKS);

    m.init(&a).expect("should init");
    let first = run(&mut m, &pt);

    let err = m.init(&a).expect_err("already initialized");
    assert_eq!(err, Error::State("mode already initialized"));

    m.reset();
    m.init(&a).expect("should init after reset");
    assert_eq!(run(&mut m, &pt), first);
}

/// The mode's own self-test passes and leaves it untouched.
pub fn test_self_test(mode: &str, cipher: &str) {
    let bs = default_block_size(cipher);
    let m = new_mode(mode, cipher, bs);
    assert!(m.self_test());
    assert_eq!(m.direction(), None);
    assert!(m.name().starts_with(&format!("{mode}(")), "{}", m.name());
}

/// For keystream modes, decryption is encryption.
pub fn test_keystream_symmetry(mode: &str, cipher: &str) {
    let bs = default_block_size(cipher);
    let mut m = new_mode(mode, cipher, bs);
    if m.id() == ModeId::Ecb {
        return;
    }
    let pt = counting_bytes(bs * BLOCKS);
    let ks = m.default_key_size();

    m.init(&with_block_size(attrs(ks, Direction::Encrypt), bs))
        .expect("should init");
    let ct = run(&mut m, &pt);
    m.reset();

    // Running the ciphertext through a second encryption
    // recovers the plaintext.
    m.init(&with_block_size(attrs(ks, Direction::Encrypt), bs))
        .expect("should init");
    assert_eq!(run(&mut m, &ct), pt);
}
