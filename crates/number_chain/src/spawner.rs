use crate::error::ChainError;
use crate::graph::CellPosition;

/// Source of fresh holder values for the initial fill and for refills.
pub trait ValueSpawner {
    fn spawn_value(&mut self, position: CellPosition) -> u32;
}

impl<F: FnMut(CellPosition) -> u32> ValueSpawner for F {
    fn spawn_value(&mut self, position: CellPosition) -> u32 {
        self(position)
    }
}

/// Draws powers of two with an exponent in `min..=max`.
#[derive(Debug, Clone)]
pub struct RandomSpawner {
    rng: fastrand::Rng,
    min_exponent: u32,
    max_exponent: u32,
}

impl RandomSpawner {
    pub fn new(min_exponent: u32, max_exponent: u32) -> Result<Self, ChainError> {
        Self::with_rng(fastrand::Rng::new(), min_exponent, max_exponent)
    }

    pub fn with_seed(seed: u64, min_exponent: u32, max_exponent: u32) -> Result<Self, ChainError> {
        Self::with_rng(fastrand::Rng::with_seed(seed), min_exponent, max_exponent)
    }

    fn with_rng(
        rng: fastrand::Rng,
        min_exponent: u32,
        max_exponent: u32,
    ) -> Result<Self, ChainError> {
        if min_exponent > max_exponent || max_exponent > 31 {
            return Err(ChainError::InvalidSpawnRange {
                min: min_exponent,
                max: max_exponent,
            });
        }
        Ok(Self {
            rng,
            min_exponent,
            max_exponent,
        })
    }
}

impl ValueSpawner for RandomSpawner {
    fn spawn_value(&mut self, _position: CellPosition) -> u32 {
        1 << self.rng.u32(self.min_exponent..=self.max_exponent)
    }
}
