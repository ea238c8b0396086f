use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::ChainError;
use crate::spawner::RandomSpawner;
use crate::topology::GridLayout;
use crate::value::LabelFormat;

#[derive(Resource, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Column count of each row, top row first.
    pub layout: Vec<u32>,
    /// Fresh holders get `2^e` with `e` in this inclusive range.
    pub spawn_exponents: (u32, u32),
    pub label: LabelFormat,
    /// Log every selection step at `info` level.
    pub debug: bool,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            layout: vec![5; 5],
            spawn_exponents: (1, 3), // 2, 4 and 8
            label: LabelFormat::default(),
            debug: false,
        }
    }
}

impl BoardConfig {
    pub fn grid_layout(&self) -> GridLayout {
        GridLayout::new(self.layout.clone())
    }

    pub fn validate(&self) -> Result<(), ChainError> {
        if self.layout.is_empty() {
            return Err(ChainError::EmptyLayout);
        }
        if let Some(row) = self.layout.iter().position(|&columns| columns == 0) {
            return Err(ChainError::EmptyRow(row));
        }
        self.spawner().map(|_| ())
    }

    pub fn spawner(&self) -> Result<RandomSpawner, ChainError> {
        let (min, max) = self.spawn_exponents;
        RandomSpawner::new(min, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(BoardConfig::default().validate(), Ok(()), "defaults must be usable");
    }

    #[test]
    fn validation_catches_bad_layouts() {
        let empty = BoardConfig {
            layout: Vec::new(),
            ..default()
        };
        assert_eq!(empty.validate(), Err(ChainError::EmptyLayout), "no rows");

        let hole = BoardConfig {
            layout: vec![3, 0, 3],
            ..default()
        };
        assert_eq!(hole.validate(), Err(ChainError::EmptyRow(1)), "zero-width row");

        let inverted = BoardConfig {
            spawn_exponents: (5, 2),
            ..default()
        };
        assert_eq!(
            inverted.validate(),
            Err(ChainError::InvalidSpawnRange { min: 5, max: 2 }),
            "inverted spawn range"
        );
    }
}
