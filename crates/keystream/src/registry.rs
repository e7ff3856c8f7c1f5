//! Canonical algorithm names.
//!
//! Factory lookups trim their input and compare these names
//! case-insensitively.

/// The identity cipher.
pub const NULL_CIPHER: &str = "null";
/// AES.
pub const AES_CIPHER: &str = "aes";
/// Rijndael restricted to 128-bit blocks, i.e., AES.
pub const RIJNDAEL_CIPHER: &str = "rijndael";

/// MD4.
pub const MD4_HASH: &str = "md4";
/// MD5.
pub const MD5_HASH: &str = "md5";
/// SHA-160, i.e., SHA-1.
pub const SHA160_HASH: &str = "sha-160";
/// Alias for [`SHA160_HASH`].
pub const SHA_1_HASH: &str = "sha-1";
/// Alias for [`SHA160_HASH`].
pub const SHA1_HASH: &str = "sha1";
/// Alias for [`SHA160_HASH`].
pub const SHA_HASH: &str = "sha";
/// RIPEMD-160.
pub const RIPEMD_160_HASH: &str = "ripemd-160";
/// Alias for [`RIPEMD_160_HASH`].
pub const RIPEMD160_HASH: &str = "ripemd160";

/// Electronic codebook.
pub const ECB_MODE: &str = "ecb";
/// Output feedback.
pub const OFB_MODE: &str = "ofb";
/// Integer counter mode.
pub const ICM_MODE: &str = "icm";

/// Hash chain generator.
pub const MD_PRNG: &str = "md";
/// Integer counter mode generator.
pub const ICM_PRNG: &str = "icm";
/// UMAC key derivation function.
pub const UMAC_PRNG: &str = "umac-kdf";

/// Reports whether `name` matches any of `names`, ignoring
/// surrounding whitespace and ASCII case.
pub(crate) fn matches(name: &str, names: &[&str]) -> bool {
    let name = name.trim();
    names.iter().any(|n| n.eq_ignore_ascii_case(name))
}
