// epfinder/src/workers/tracking.rs
//
// Tracking worker: unweighted soft-track azimuths.

use tracing::debug;

use super::Extraction;
use crate::error::FatalError;
use crate::events::{EventSnapshot, Hit, Subgroup};

/// Only tracks strictly below this pT enter the plane.
pub const MAX_TRACK_PT: f64 = 1.0;

pub const TRACK_MAP_NODE: &str = "SvtxTrackMap";

pub fn extract(event: &EventSnapshot) -> Result<Extraction, FatalError> {
    let tracks = event
        .tracks
        .as_deref()
        .ok_or_else(|| FatalError::MissingTracks(TRACK_MAP_NODE.to_string()))?;

    let hits: Vec<Hit> = tracks
        .iter()
        .filter(|t| t.pt() < MAX_TRACK_PT)
        .map(|t| Hit::new(1.0, t.phi()))
        .collect();

    debug!("TRACKING event={} hits={}/{}", event.event_id, hits.len(), tracks.len());
    Ok(vec![(Subgroup::Full, hits)])
}
