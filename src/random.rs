//! Seeded random number generation.
//!
//! Every run owns exactly one generator created here from its seed and
//! passes it by `&mut` into every operator. There is no process-wide
//! generator, so runs are reproducible in isolation and may execute
//! concurrently.
//!
//! [`RunRng`] is PCG64, whose output stream is fixed by the algorithm
//! rather than by the `rand` release.

use rand::SeedableRng;
pub use rand_pcg::Pcg64 as RunRng;

/// Creates the generator for a run (or for subset sampling) from `seed`.
pub fn create_rng(seed: u64) -> RunRng {
    RunRng::seed_from_u64(seed)
}
