// epfinder/src/error.rs
//
// Error taxonomy.
//   FatalError   a collaborator the active mode needs is absent or
//                inconsistent; the run cannot produce meaningful planes.
//   ConfigError  bad CLI values or an unreadable calibration bundle.
// A missing result slot is not an error: process_event reports it as
// EventStatus::AbortEvent and the next event is tried.

use thiserror::Error;

use crate::events::{DetectorMode, Subgroup};

#[derive(Debug, Error)]
pub enum FatalError {
    #[error("could not locate CentralityInfo node")]
    MissingCentrality,

    #[error("could not locate tower container {0}")]
    MissingTowers(String),

    #[error("could not locate geometry node {0}")]
    MissingGeometry(String),

    #[error("no truncation table loaded for {0}")]
    MissingTruncation(DetectorMode),

    #[error("truncation table has no entry for class {class} ring {ring}")]
    TruncationOutOfRange { class: usize, ring: u32 },

    #[error("could not locate track map {0}")]
    MissingTracks(String),

    #[error("{mode} produced subgroup {subgroup} which has no result slot")]
    UndeclaredSubgroup { mode: DetectorMode, subgroup: Subgroup },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown detector {0:?} (expected EPD, CEMC, HCALIN, HCALOUT, TRACKING or BBC)")]
    UnknownDetector(String),

    #[error("reading calibration bundle: {0}")]
    Io(#[from] std::io::Error),

    #[error("parsing calibration bundle: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("tower geometry listed for unknown detector {0:?}")]
    UnknownGeometryDetector(String),
}
