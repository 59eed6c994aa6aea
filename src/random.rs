use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

/// Uniform generator owned by exactly one worker. Workers never share an
/// instance, so draws need no synchronization and no worker perturbs
/// another's stream.
pub struct RandomSource {
    rng: StdRng,
}

impl RandomSource {
    /// Production seeding: OS entropy, different for every worker.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Deterministic seeding, for tests that assert on draw sequences.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Uniform integer in `[min, max]`, inclusive on both ends.
    pub fn uniform_int(&mut self, min: u64, max: u64) -> u64 {
        self.rng.random_range(min..=max)
    }

    /// Uniform real in `[min, max)`.
    pub fn uniform_real(&mut self, min: f64, max: f64) -> f64 {
        self.rng.random_range(min..max)
    }

    /// Index in `[0, n]`, used to pick one of the preloaded keys.
    pub fn random_index(&mut self, n: u64) -> u64 {
        self.uniform_int(0, n)
    }

    /// Synthesize an append payload of `len` random bytes.
    pub fn fill_value(&mut self, len: usize) -> Vec<u8> {
        let mut value = vec![0u8; len];
        self.rng.fill_bytes(&mut value);
        value
    }
}
