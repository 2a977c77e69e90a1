//! Deterministic seed derivation.
//!
//! Every simulated run owns its own generator, seeded from the experiment
//! seed and the run's coordinates (epoch, run index, ...). Results are
//! therefore independent of the order in which rayon executes the runs.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// SplitMix64 finalizer (Vigna, 2017).
#[inline]
fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}

/// Mixes `base` with each index in turn.
///
/// Distinct index paths give unrelated seeds; the same path always gives
/// the same seed.
pub fn derive_seed(base: u64, indices: &[u64]) -> u64 {
    indices
        .iter()
        .fold(splitmix64(base), |acc, &i| splitmix64(acc ^ splitmix64(i)))
}

/// A generator seeded with [`derive_seed`].
pub fn derived_rng(base: u64, indices: &[u64]) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(derive_seed(base, indices))
}
