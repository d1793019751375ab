//! Hashing helpers shared by the unique subtables and the operation cache.
//!
//! Both tables are addressed by masking the low bits of a 64-bit hash, so
//! the pairing functions below finish with a mixing step.

/// [Szudzik pairing function][szudzik-pairing].
///
/// ```text
/// (a, b) -> if (a<b) then (b^2 + a) else (a^2 + a + b)
/// ```
///
/// Arithmetic wraps, so the result is only injective for inputs below 2^32.
///
/// [szudzik-pairing]: http://szudzik.com/ElegantPairing.pdf
pub fn pairing_szudzik(a: u64, b: u64) -> u64 {
    if a < b {
        b.wrapping_mul(b).wrapping_add(a)
    } else {
        a.wrapping_mul(a).wrapping_add(a).wrapping_add(b)
    }
}

/// SplitMix64 finalizer.
#[inline]
pub fn mix64(mut x: u64) -> u64 {
    x ^= x >> 30;
    x = x.wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x ^= x >> 27;
    x = x.wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^= x >> 31;
    x
}

pub fn pairing2(a: u64, b: u64) -> u64 {
    mix64(pairing_szudzik(a, b))
}

pub fn pairing3(a: u64, b: u64, c: u64) -> u64 {
    pairing2(pairing2(a, b), c)
}

pub fn pairing4(a: u64, b: u64, c: u64, d: u64) -> u64 {
    pairing2(pairing2(a, b), pairing2(c, d))
}

/// Hash used to pick a slot in a power-of-two table.
///
/// Equal values must hash equally; the low bits must be well spread.
pub trait BucketHash {
    fn hash(&self) -> u64;
}
