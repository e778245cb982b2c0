// epfinder/src/workers/barrel.rs
//
// Barrel calorimeter worker (CEMC / HCALIN / HCALOUT).
// Raw tower energy, tower azimuth, one subgroup. Towers missing from the
// geometry table are expected and dropped quietly, as are towers the
// calibration left with negative energy.

use tracing::debug;

use super::Extraction;
use crate::calib::CalibContext;
use crate::error::FatalError;
use crate::events::{Calorimeter, DetectorMode, EventSnapshot, Hit, Subgroup};

pub fn extract(
    calo:  Calorimeter,
    event: &EventSnapshot,
    calib: &CalibContext,
) -> Result<Extraction, FatalError> {
    let node   = DetectorMode::Barrel(calo).tower_node();
    let towers = event.tower_container(&node).ok_or(FatalError::MissingTowers(node))?;
    let geom   = calib.tower_geom(calo)?;

    let hits: Vec<Hit> = towers
        .iter()
        .filter(|tower| tower.energy >= 0.0)
        .filter_map(|tower| {
            let key = calo.position_key(tower.channel)?;
            let phi = geom.phi(key)?;
            Some(Hit::new(f64::from(tower.energy), phi))
        })
        .collect();

    debug!("{} event={} hits={}/{}", calo.name(), event.event_id, hits.len(), towers.len());
    Ok(vec![(Subgroup::Full, hits)])
}
