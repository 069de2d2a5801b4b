use log::debug;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// RandMode controls random generator behaviour. May be predictable for testing or truly random for gameplay
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RandMode {
    Predictable(u64),
    RandomUniform,
}

pub struct ZRand {
    rng: StdRng,
    rand_mode: RandMode,
}

impl ZRand {
    pub fn new(rm: RandMode) -> ZRand {
        debug!("random generator: {:?}", rm);
        let rng = match rm {
            RandMode::Predictable(seed) => StdRng::seed_from_u64(seed),
            RandMode::RandomUniform => StdRng::from_entropy(),
        };
        ZRand { rng, rand_mode: rm }
    }

    pub fn new_uniform() -> ZRand {
        ZRand::new(RandMode::RandomUniform)
    }

    pub fn new_predictable(seed: u64) -> ZRand {
        ZRand::new(RandMode::Predictable(seed))
    }

    pub fn mode(&self) -> RandMode {
        self.rand_mode
    }

    /// Uniform value in 1..=range; `range` must be positive
    pub fn gen_range(&mut self, range: u16) -> u16 {
        self.rng.gen_range(1..=range.max(1))
    }
}
