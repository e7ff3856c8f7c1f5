//! Probabilistic primality testing.
//!
//! [`is_probable_prime`] trial divides by the first 1000 primes,
//! applies a base 2 Euler criterion with strong pseudoprime
//! tests to the first 13 primes, and optionally finishes with
//! Miller-Rabin rounds drawn from a caller supplied
//! [`RandomSource`].
//!
//! # Example
//!
//! ```
//! use keystream::{prime, prng::Prng};
//! use num_bigint::BigUint;
//!
//! let mut rng = Prng::reproducible();
//! let p = BigUint::from(2_147_483_647u32);
//! assert!(prime::is_probable_prime(&p, Some(&mut rng)).expect("source never runs dry"));
//! assert!(!prime::is_probable_prime(&BigUint::from(561u32), None).expect("no source"));
//! ```

use num_bigint::BigUint;
use num_traits::{One, ToPrimitive, Zero};
use spin::Once;
use tracing::{debug, trace, warn};

use crate::{error::Result, prng::RandomSource};

/// The number of entries in [`small_primes`].
pub const SMALL_PRIME_COUNT: usize = 1000;

/// The number of primes used as strong pseudoprime bases by
/// [`passes_euler_criterion`].
const EULER_BASES: usize = 13;

/// Returns the first [`SMALL_PRIME_COUNT`] primes, 2 through
/// 7919.
pub fn small_primes() -> &'static [u32] {
    static PRIMES: Once<Vec<u32>> = Once::new();
    PRIMES.call_once(build_small_primes)
}

fn build_small_primes() -> Vec<u32> {
    #![allow(clippy::arithmetic_side_effects)]

    let mut primes = Vec::with_capacity(SMALL_PRIME_COUNT);
    primes.push(2u32);
    let mut n = 3u32;
    while primes.len() < SMALL_PRIME_COUNT {
        if primes
            .iter()
            .take_while(|&&p| p * p <= n)
            .all(|&p| n % p != 0)
        {
            primes.push(n);
        }
        n += 2;
    }
    trace!(count = primes.len(), "built small prime table");
    primes
}

/// Reports whether any of the [`small_primes`] divides `w`.
///
/// A small prime divides itself, so this is true for every
/// entry of the table as well as for zero.
pub fn has_small_prime_divisor(w: &BigUint) -> bool {
    let hit = small_primes().iter().find(|&&p| (w % p).is_zero());
    if let Some(p) = hit {
        trace!(%w, p, "found small prime divisor");
    }
    hit.is_some()
}

fn is_small_prime(w: &BigUint) -> bool {
    w.to_u32()
        .is_some_and(|v| small_primes().binary_search(&v).is_ok())
}

/// Applies the base 2 Euler criterion followed by strong
/// pseudoprime tests to the first 13 prime bases.
///
/// `w` should be odd and free of small prime divisors. Even
/// numbers and numbers below 3 fail.
pub fn passes_euler_criterion(w: &BigUint) -> bool {
    #![allow(clippy::arithmetic_side_effects)]

    let one = BigUint::one();
    let two = BigUint::from(2u32);
    if *w < BigUint::from(3u32) || !w.bit(0) {
        return false;
    }
    let w1 = w - 1u32;

    // `w` is odd, so the low three bits of `w - 1` are 0, 2, 4,
    // or 6.
    let low = (&w1 % 8u32).to_u32().unwrap_or_default();
    let mut e;
    // The number of squarings allowed in the strong tests.
    let k;
    // The first base to run a strong test for.
    let mut first = 1;

    if low != 0 {
        e = &w1 >> 1u32;
        let a = two.modpow(&e, w);
        if low == 6 {
            // `w = 7 mod 8`: 2 is a quadratic residue.
            if a != one {
                trace!(%w, "fails Euler criterion for w = 7 mod 8");
                return false;
            }
            k = 1;
        } else {
            // `w = 3 or 5 mod 8`: 2 is a non-residue.
            if a != w1 {
                trace!(%w, "fails Euler criterion for w = 3, 5 mod 8");
                return false;
            }
            if low & 4 != 0 {
                e >>= 1u32;
                k = 2;
            } else {
                k = 1;
            }
        }
    } else {
        // `w = 1 mod 8`: expect `2^((w-1)/4) = ±1`.
        e = &w1 >> 2u32;
        let a = two.modpow(&e, w);
        if a == one {
            first = 0;
        } else if a != w1 {
            trace!(%w, "fails Euler criterion for w = 1 mod 8");
            return false;
        }
        let tz = e.trailing_zeros().unwrap_or_default();
        e >>= tz;
        k = tz.saturating_add(2);
    }

    for &p in &small_primes()[first..EULER_BASES] {
        let mut a = BigUint::from(p).modpow(&e, w);
        if a == one {
            continue;
        }
        let mut left = k;
        while a != w1 {
            left -= 1;
            if left == 0 {
                trace!(%w, p, "fails strong test: never reached -1");
                return false;
            }
            a = a.modpow(&two, w);
            if a == one {
                trace!(%w, p, "fails strong test: non-trivial square root of 1");
                return false;
            }
        }
    }
    true
}

/// Checks Fermat's little theorem to base 2, i.e.,
/// `2^(w-1) = 1 mod w`.
///
/// This is a weak test: Carmichael numbers and base 2
/// pseudoprimes pass, and 2 itself fails.
pub fn passes_fermat(w: &BigUint) -> bool {
    if *w < BigUint::from(2u32) {
        return false;
    }
    let w1 = w - 1u32;
    BigUint::from(2u32).modpow(&w1, w).is_one()
}

/// The number of Miller-Rabin rounds for a `bits` long
/// candidate.
fn miller_rabin_rounds(bits: u64) -> usize {
    match bits {
        0..500 => 18,
        500..550 => 6,
        550..650 => 5,
        650..850 => 4,
        _ => 3,
    }
}

/// Runs Miller-Rabin with witnesses drawn from `rng`.
///
/// The number of rounds shrinks as `w` grows, from 18 below
/// 500 bits down to 3 from 850 bits on. Fails only if `rng`
/// does.
pub fn passes_miller_rabin(w: &BigUint, rng: &mut dyn RandomSource) -> Result<bool> {
    #![allow(clippy::arithmetic_side_effects)]

    let one = BigUint::one();
    let two = BigUint::from(2u32);
    if *w < two {
        return Ok(false);
    }
    if *w <= BigUint::from(3u32) {
        return Ok(true);
    }
    if !w.bit(0) {
        return Ok(false);
    }

    let w1 = w - 1u32;
    let a = w1.trailing_zeros().unwrap_or_default();
    let m = &w1 >> a;
    // Witnesses are reduced into [2, w - 2].
    let span = w - 3u32;

    let bits = w.bits();
    let rounds = miller_rabin_rounds(bits);
    let mut buf = vec![0u8; usize::try_from(bits.div_ceil(8)).unwrap_or(usize::MAX)];

    for _ in 0..rounds {
        rng.next_bytes(&mut buf)?;
        let b = BigUint::from_bytes_be(&buf) % &span + 2u32;

        let mut z = b.modpow(&m, w);
        let mut j = 0u64;
        while !((j == 0 && z == one) || z == w1) {
            j += 1;
            if (j > 1 && z == one) || j >= a {
                trace!(%w, %b, "fails Miller-Rabin");
                return Ok(false);
            }
            z = z.modpow(&two, w);
        }
    }
    Ok(true)
}

/// Reports whether `w` is probably prime.
///
/// Zero and one are not prime, and the [`small_primes`] are.
/// Anything else must survive trial division and
/// [`passes_euler_criterion`]. If `rng` is supplied it must
/// also pass [`passes_miller_rabin`].
///
/// Candidates below `2^64` are cross-checked against a
/// deterministic test. A disagreement is logged but does not
/// change the verdict.
pub fn is_probable_prime(w: &BigUint, rng: Option<&mut dyn RandomSource>) -> Result<bool> {
    let verdict = probable_prime(w, rng)?;
    if let Some(n) = w.to_u64() {
        if is_prime_u64(n) != verdict {
            warn!(
                %w,
                verdict,
                "probabilistic and deterministic primality tests disagree"
            );
        }
    }
    Ok(verdict)
}

fn probable_prime(w: &BigUint, rng: Option<&mut dyn RandomSource>) -> Result<bool> {
    if *w <= BigUint::one() {
        return Ok(false);
    }
    if is_small_prime(w) {
        return Ok(true);
    }
    if has_small_prime_divisor(w) || !passes_euler_criterion(w) {
        return Ok(false);
    }
    if let Some(rng) = rng {
        if !passes_miller_rabin(w, rng)? {
            return Ok(false);
        }
    }
    debug!(%w, "accepted probable prime");
    Ok(true)
}

/// A deterministic Miller-Rabin for 64-bit integers.
///
/// The first twelve primes are a sufficient set of witnesses
/// below `2^64`.
fn is_prime_u64(n: u64) -> bool {
    #![allow(clippy::arithmetic_side_effects)]

    const WITNESSES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

    fn mul_mod(a: u64, b: u64, m: u64) -> u64 {
        ((u128::from(a) * u128::from(b)) % u128::from(m)) as u64
    }

    fn pow_mod(mut b: u64, mut e: u64, m: u64) -> u64 {
        let mut r = 1;
        b %= m;
        while e > 0 {
            if e & 1 == 1 {
                r = mul_mod(r, b, m);
            }
            b = mul_mod(b, b, m);
            e >>= 1;
        }
        r
    }

    if n < 2 {
        return false;
    }
    for p in WITNESSES {
        if n % p == 0 {
            return n == p;
        }
    }
    let s = (n - 1).trailing_zeros();
    let d = (n - 1) >> s;
    WITNESSES.iter().all(|&a| {
        let mut x = pow_mod(a, d, n);
        if x == 1 || x == n - 1 {
            return true;
        }
        for _ in 1..s {
            x = mul_mod(x, x, n);
            if x == n - 1 {
                return true;
            }
        }
        false
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prng::Prng;

    fn big(n: u64) -> BigUint {
        BigUint::from(n)
    }

    // Carmichael numbers, all of which pass Fermat's test to
    // base 2.
    const CARMICHAEL: [u64; 8] = [561, 1105, 1729, 2465, 2821, 6601, 8911, 41041];

    #[test]
    fn test_small_primes() {
        let p = small_primes();
        assert_eq!(p.len(), SMALL_PRIME_COUNT);
        assert_eq!(&p[..10], &[2, 3, 5, 7, 11, 13, 17, 19, 23, 29]);
        assert_eq!(p[EULER_BASES - 1], 41);
        assert_eq!(p.last(), Some(&7919));
        assert!(p.iter().all(|&v| is_prime_u64(u64::from(v))));
    }

    #[test]
    fn test_has_small_prime_divisor() {
        assert!(has_small_prime_divisor(&big(7919 * 7907)));
        assert!(has_small_prime_divisor(&big(7919)));
        assert!(has_small_prime_divisor(&big(0)));
        assert!(!has_small_prime_divisor(&big(7927)));
        assert!(!has_small_prime_divisor(&big(7927 * 7933)));
    }

    #[test]
    fn test_trivial_inputs() {
        assert!(!is_probable_prime(&big(0), None).expect("no source"));
        assert!(!is_probable_prime(&big(1), None).expect("no source"));
        assert!(is_probable_prime(&big(2), None).expect("no source"));
        assert!(is_probable_prime(&big(3), None).expect("no source"));
        assert!(!is_probable_prime(&big(4), None).expect("no source"));
        assert!(is_probable_prime(&big(7919), None).expect("no source"));
    }

    #[test]
    fn test_euler_criterion() {
        // One prime from each residue class mod 8.
        for p in [7927u64, 7933, 7937, 7963, 1_000_000_007, 2_305_843_009_213_693_951] {
            assert!(passes_euler_criterion(&big(p)), "{p}");
        }
        for c in CARMICHAEL {
            assert!(!passes_euler_criterion(&big(c)), "{c}");
        }
        assert!(!passes_euler_criterion(&big(2)));
        assert!(!passes_euler_criterion(&big(7927 * 2)));
    }

    #[test]
    fn test_fermat() {
        assert!(passes_fermat(&big(7927)));
        assert!(!passes_fermat(&big(7927 * 7933)));
        for c in CARMICHAEL {
            assert!(passes_fermat(&big(c)), "{c}");
        }
    }

    #[test]
    fn test_miller_rabin() {
        let mut rng = Prng::reproducible();
        for p in [5u64, 7, 7927, 1_000_000_007, 2_305_843_009_213_693_951] {
            assert!(passes_miller_rabin(&big(p), &mut rng).expect("no limit"), "{p}");
        }
        for c in CARMICHAEL {
            assert!(!passes_miller_rabin(&big(c), &mut rng).expect("no limit"), "{c}");
        }
        assert!(!passes_miller_rabin(&big(7927 * 7933), &mut rng).expect("no limit"));
    }

    #[test]
    fn test_miller_rabin_rounds() {
        assert_eq!(miller_rabin_rounds(160), 18);
        assert_eq!(miller_rabin_rounds(512), 6);
        assert_eq!(miller_rabin_rounds(640), 5);
        assert_eq!(miller_rabin_rounds(768), 4);
        assert_eq!(miller_rabin_rounds(1024), 3);
    }

    #[test]
    fn test_agrees_with_deterministic_test() {
        let mut rng = Prng::seeded(b"primality");
        for n in 7900u64..9000 {
            let w = big(n);
            assert_eq!(
                is_probable_prime(&w, Some(&mut rng)).expect("no limit"),
                is_prime_u64(n),
                "{n}"
            );
            assert_eq!(
                is_probable_prime(&w, None).expect("no source"),
                is_prime_u64(n),
                "{n}"
            );
        }
    }

    #[test]
    fn test_large_values() {
        let mut rng = Prng::reproducible();

        // 2^127 - 1 and 2^521 - 1 are Mersenne primes.
        let m127 = (BigUint::one() << 127u32) - 1u32;
        let m521 = (BigUint::one() << 521u32) - 1u32;
        assert!(is_probable_prime(&m127, Some(&mut rng)).expect("no limit"));
        assert!(is_probable_prime(&m521, Some(&mut rng)).expect("no limit"));

        // 2^128 + 1 = 59649589127497217 * 5704689200685129054721.
        let f7 = (BigUint::one() << 128u32) + 1u32;
        assert!(!is_probable_prime(&f7, Some(&mut rng)).expect("no limit"));
        assert!(!is_probable_prime(&(&m127 * &m127), None).expect("no source"));
    }
}
