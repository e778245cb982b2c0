// epfinder/src/calib/mod.rs
//
// Run-level calibration context: detector geometry and the sEPD truncation
// table. Loaded once from a JSON bundle before the first event.
//
// Bundle layout (every section optional):
//   {
//     "epd_geometry":   [ { "key", "side", "sector", "tile", "phi" }, ... ],
//     "tower_geometry": { "CEMC": [ { "eta_bin", "phi_bin", "phi" }, ... ] },
//     "epd_truncation": [ [ eMax ring 0..15 ], ... one row per 10% class ]
//   }
//
// A missing section only matters once a mode asks for it, and then it is
// fatal for the run.

pub mod geometry;
pub mod truncation;

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::error::{ConfigError, FatalError};
use crate::events::{Calorimeter, DetectorMode};
use geometry::{EpdGeom, EpdTile, TowerGeom, TowerGeomTable};
use truncation::TruncationTable;

#[derive(Debug, Deserialize)]
struct Bundle {
    #[serde(default)]
    epd_geometry:   Option<Vec<EpdTile>>,
    #[serde(default)]
    tower_geometry: HashMap<String, Vec<TowerGeom>>,
    #[serde(default)]
    epd_truncation: Option<TruncationTable>,
}

#[derive(Debug, Clone, Default)]
pub struct CalibContext {
    pub epd_geom:   Option<EpdGeom>,
    pub tower_geom: HashMap<Calorimeter, TowerGeomTable>,
    pub epd_trunc:  Option<TruncationTable>,
}

impl CalibContext {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let ctx = Self::from_json(&raw)?;
        info!(
            "Calibration {}: epd_tiles={} barrel_tables={} trunc_classes={}",
            path.display(),
            ctx.epd_geom.as_ref().map(EpdGeom::len).unwrap_or(0),
            ctx.tower_geom.len(),
            ctx.epd_trunc.as_ref().map(TruncationTable::n_classes).unwrap_or(0),
        );
        Ok(ctx)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let bundle: Bundle = serde_json::from_str(raw)?;

        let mut tower_geom = HashMap::new();
        for (name, towers) in bundle.tower_geometry {
            let calo = match name.parse::<DetectorMode>() {
                Ok(DetectorMode::Barrel(calo)) => calo,
                _ => return Err(ConfigError::UnknownGeometryDetector(name)),
            };
            tower_geom.insert(calo, TowerGeomTable::new(calo, towers));
        }

        Ok(Self {
            epd_geom:  bundle.epd_geometry.map(EpdGeom::new),
            tower_geom,
            epd_trunc: bundle.epd_truncation,
        })
    }

    pub fn epd_geom(&self) -> Result<&EpdGeom, FatalError> {
        self.epd_geom
            .as_ref()
            .ok_or_else(|| FatalError::MissingGeometry(DetectorMode::Wheel.geometry_node()))
    }

    pub fn tower_geom(&self, calo: Calorimeter) -> Result<&TowerGeomTable, FatalError> {
        self.tower_geom
            .get(&calo)
            .ok_or_else(|| FatalError::MissingGeometry(DetectorMode::Barrel(calo).geometry_node()))
    }

    pub fn epd_trunc(&self) -> Result<&TruncationTable, FatalError> {
        self.epd_trunc
            .as_ref()
            .ok_or(FatalError::MissingTruncation(DetectorMode::Wheel))
    }
}
