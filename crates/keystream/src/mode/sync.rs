use spin::Mutex;

use super::Mode;
use crate::{
    attrs::{Attributes, Direction},
    cipher::{BlockCipher, Cipher},
    error::Result,
};

/// A [`Mode`] that can be shared between threads.
///
/// `init`, `update`, and `reset` are mutually exclusive. There
/// is no ordering guarantee between waiting callers.
#[derive(Debug)]
pub struct SyncMode<C = Cipher> {
    inner: Mutex<Mode<C>>,
}

impl<C: BlockCipher> SyncMode<C> {
    /// Wraps `mode`.
    pub const fn new(mode: Mode<C>) -> Self {
        Self {
            inner: Mutex::new(mode),
        }
    }

    /// See [`Mode::name`].
    pub fn name(&self) -> String {
        self.inner.lock().name()
    }

    /// See [`Mode::direction`].
    pub fn direction(&self) -> Option<Direction> {
        self.inner.lock().direction()
    }

    /// See [`Mode::init`].
    pub fn init(&self, attrs: &Attributes) -> Result<()> {
        self.inner.lock().init(attrs)
    }

    /// See [`Mode::update`].
    pub fn update(&self, input: &[u8], output: &mut [u8]) -> Result<()> {
        self.inner.lock().update(input, output)
    }

    /// See [`Mode::reset`].
    pub fn reset(&self) {
        self.inner.lock().reset()
    }

    /// Returns the wrapped mode.
    pub fn into_inner(self) -> Mode<C> {
        self.inner.into_inner()
    }
}

impl<C: BlockCipher> From<Mode<C>> for SyncMode<C> {
    fn from(mode: Mode<C>) -> Self {
        Self::new(mode)
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread};

    use super::*;
    use crate::{attrs::Attr, mode};

    #[test]
    fn test_concurrent_updates_consume_distinct_blocks() {
        const THREADS: usize = 4;
        const BLOCKS: usize = 64;

        let m = mode::get_instance("ofb", "aes", 16)
            .expect("valid block size")
            .expect("built in");
        let mut serial = m.clone();
        let attrs = Attributes::new()
            .with(Attr::KeyMaterial, [9u8; 16])
            .with(Attr::State, Direction::Encrypt);

        let shared = Arc::new(SyncMode::new(m));
        shared.init(&attrs).expect("should init");
        let handles = (0..THREADS)
            .map(|_| {
                let shared = Arc::clone(&shared);
                thread::spawn(move || {
                    let mut out = Vec::new();
                    for _ in 0..BLOCKS {
                        let mut ks = [0u8; 16];
                        shared.update(&[0u8; 16], &mut ks).expect("should encrypt");
                        out.push(ks);
                    }
                    out
                })
            })
            .collect::<Vec<_>>();
        let mut got = handles
            .into_iter()
            .flat_map(|h| h.join().expect("thread should not panic"))
            .collect::<Vec<_>>();

        serial.init(&attrs).expect("should init");
        let mut want = (0..THREADS * BLOCKS)
            .map(|_| {
                let mut ks = [0u8; 16];
                serial.update(&[0u8; 16], &mut ks).expect("should encrypt");
                ks
            })
            .collect::<Vec<_>>();

        // Each keystream block is handed out exactly once.
        got.sort_unstable();
        want.sort_unstable();
        assert_eq!(got, want);
    }

    #[test]
    fn test_reset_then_reinit() {
        let m = mode::get_instance("ecb", "null", 16)
            .expect("valid block size")
            .expect("built in");
        let s = SyncMode::from(m);
        let attrs = Attributes::new()
            .with(Attr::KeyMaterial, [0u8; 8])
            .with(Attr::State, Direction::Decrypt);
        s.init(&attrs).expect("should init");
        assert_eq!(s.direction(), Some(Direction::Decrypt));
        s.reset();
        assert_eq!(s.direction(), None);
        s.init(&attrs).expect("should init again");
        assert_eq!(s.into_inner().direction(), Some(Direction::Decrypt));
    }
}
