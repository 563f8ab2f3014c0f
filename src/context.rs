use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seeded source of randomness shared by a training run.
///
/// Weight initialization, exploration, replay sampling and environment resets
/// all draw from this generator, so a run is reproducible for a fixed seed.
#[derive(Clone, Debug)]
pub struct TrainingContext {
    seed: u64,
    rng: StdRng,
}

impl TrainingContext {
    pub fn new(seed: u64) -> Self {
        TrainingContext {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Draw a fresh seed for a component that owns its own generator
    /// (e.g. the dropout masks inside a network).
    pub fn derive_seed(&mut self) -> u64 {
        self.rng.gen()
    }
}
