// epfinder/src/calib/truncation.rs
//
// sEPD tile saturation: a per-centrality, per-ring ceiling on tile energy.
// Rows are 10% centrality classes, columns are rings 0..=15.

use serde::{Deserialize, Serialize};

use crate::error::FatalError;

/// Ring of an sEPD tile. Tile 0 is the innermost full-sector tile, the rest
/// come in pairs per ring.
pub fn ring_of(tile: u32) -> u32 {
    if tile == 0 { 0 } else { (tile + 1) / 2 }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TruncationTable {
    rows: Vec<Vec<f32>>,
}

impl TruncationTable {
    pub fn new(rows: Vec<Vec<f32>>) -> Self {
        Self { rows }
    }

    /// eMax for a centrality class and ring.
    pub fn max_weight(&self, class: usize, ring: u32) -> Result<f32, FatalError> {
        self.rows
            .get(class)
            .and_then(|row| row.get(ring as usize))
            .copied()
            .ok_or(FatalError::TruncationOutOfRange { class, ring })
    }

    pub fn n_classes(&self) -> usize {
        self.rows.len()
    }
}
