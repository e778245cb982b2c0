// epfinder/src/workers/epd.rs
//
// sEPD worker: south/north wheel hits with per-ring energy truncation.
// One pass over the calibrated tile container; tiles are independent.
//
// Per tile:
//   geometry → (side, tile, phi), ring from tile
//   eMax from (centrality class, ring)
//   energy below the MIP floor → skipped
//   energy clipped to eMax, routed by arm (0 south, 1 north)

use tracing::{debug, trace};

use super::Extraction;
use crate::calib::{truncation::ring_of, CalibContext};
use crate::error::FatalError;
use crate::events::{DetectorMode, EventSnapshot, Hit, Subgroup};

/// Tiles under this energy are noise.
pub const MIN_TILE_ENERGY: f32 = 0.2;

pub fn extract(event: &EventSnapshot, calib: &CalibContext) -> Result<Extraction, FatalError> {
    let cent  = event.centrality.ok_or(FatalError::MissingCentrality)?;
    let class = cent.class_index();

    let node  = DetectorMode::Wheel.tower_node();
    let tiles = event.tower_container(&node).ok_or(FatalError::MissingTowers(node))?;
    let geom  = calib.epd_geom()?;
    let trunc = calib.epd_trunc()?;

    let mut south = Vec::new();
    let mut north = Vec::new();

    for tower in tiles {
        let Some(tile) = geom.tile(tower.channel) else {
            trace!("EPD channel {} has no tile geometry", tower.channel);
            continue;
        };
        let e_max = trunc.max_weight(class, ring_of(tile.tile))?;

        if tower.energy < MIN_TILE_ENERGY { continue; }
        let energy = tower.energy.min(e_max);

        let hit = Hit::new(f64::from(energy), tile.phi);
        match Subgroup::from_arm(tile.side) {
            Some(Subgroup::South) => south.push(hit),
            Some(Subgroup::North) => north.push(hit),
            _ => {}
        }
    }

    debug!(
        "EPD event={} class={} south={} north={}",
        event.event_id, class, south.len(), north.len()
    );
    Ok(vec![(Subgroup::South, south), (Subgroup::North, north)])
}
