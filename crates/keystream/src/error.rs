use buggy::Bug;
use tracing::error;

use crate::hex;

/// Shorthand for `Result`s that use [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Encompasses the different errors directly returned by this
/// crate.
///
/// The variants are coarse enough that callers can
/// decide how to recover without inspecting messages:
///
/// - [`Error::Config`]: fix the configuration and retry.
/// - [`Error::State`]: a logic error in the caller.
/// - [`Error::LimitReached`]: reseed or reconfigure the
///   generator before asking for more output.
#[derive(Debug, Eq, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An attribute was missing, had the wrong type, or had an
    /// unsupported value.
    ///
    /// It names the offending attribute or parameter.
    #[error("invalid configuration: {0}")]
    Config(&'static str),
    /// The operation is not valid in the current lifecycle
    /// state, e.g., it was attempted before `init`.
    #[error("invalid state: {0}")]
    State(&'static str),
    /// The keystream for the current configuration has been
    /// exhausted.
    #[error("keystream limit reached")]
    LimitReached,
    /// A hexadecimal string could not be decoded.
    #[error(transparent)]
    Hex(#[from] hex::Error),
    /// An internal bug was discovered.
    #[error(transparent)]
    Bug(#[from] Bug),
}

impl Error {
    /// Reports whether this is a configuration error.
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Reports whether this is a lifecycle state error.
    pub const fn is_state(&self) -> bool {
        matches!(self, Self::State(_))
    }

    /// Reports whether the keystream capacity was exhausted.
    pub const fn is_limit_reached(&self) -> bool {
        matches!(self, Self::LimitReached)
    }
}

/// Aborts instance creation after a failed self-test.
///
/// This is not an [`Error`]: a primitive that fails its own
/// known-answer test must never reach a caller.
#[cold]
#[track_caller]
#[allow(clippy::panic)]
pub(crate) fn self_test_failed(name: &str) -> ! {
    error!(algorithm = name, "self-test failed");
    panic!("self-test failed: {name}")
}
