// epfinder/src/calib/geometry.rs
//
// Geometry lookups consumed by the extraction workers.
//   EpdGeom         sEPD channel key → (side, sector, tile, phi)
//   TowerGeomTable  barrel tower key → phi
// Tables are filled from the calibration bundle; nothing here derives
// geometry on its own.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::events::Calorimeter;

/// Structural position of one sEPD tile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpdTile {
    pub key:    u32,
    pub side:   u32,
    pub sector: u32,
    pub tile:   u32,
    pub phi:    f64,
}

#[derive(Debug, Clone, Default)]
pub struct EpdGeom {
    tiles: HashMap<u32, EpdTile>,
}

impl EpdGeom {
    pub fn new(tiles: impl IntoIterator<Item = EpdTile>) -> Self {
        Self { tiles: tiles.into_iter().map(|t| (t.key, t)).collect() }
    }

    pub fn tile(&self, key: u32) -> Option<&EpdTile> {
        self.tiles.get(&key)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }
}

/// One barrel tower as listed in the bundle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TowerGeom {
    pub eta_bin: u32,
    pub phi_bin: u32,
    pub phi:     f64,
}

#[derive(Debug, Clone)]
pub struct TowerGeomTable {
    towers: HashMap<u32, f64>,
}

impl TowerGeomTable {
    pub fn new(calo: Calorimeter, towers: impl IntoIterator<Item = TowerGeom>) -> Self {
        let towers = towers
            .into_iter()
            .map(|t| (calo.encode_tower_key(t.eta_bin, t.phi_bin), t.phi))
            .collect();
        Self { towers }
    }

    /// Tower azimuth for an encoded tower key.
    pub fn phi(&self, tower_key: u32) -> Option<f64> {
        self.towers.get(&tower_key).copied()
    }
}
