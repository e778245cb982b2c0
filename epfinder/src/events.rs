// epfinder/src/events.rs
//
// Shared domain types flowing through epfinder.
// Per-event inputs (towers, tracks, centrality) arrive as one EventSnapshot
// per JSONL line; results leave as EpInfo records held in the registry.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::f64::consts::PI;
use std::str::FromStr;

use crate::error::ConfigError;

// ── Hits ──────────────────────────────────────────────────────────────────────

/// One accepted channel: weight plus azimuth, ready for the Q-vector sum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    pub weight: f64,
    pub phi:    f64,
}

impl Hit {
    /// Builds a hit with `phi` wrapped into (−π, π]. Workers only emit
    /// non-negative weights.
    pub fn new(weight: f64, phi: f64) -> Self {
        debug_assert!(weight >= 0.0, "negative hit weight {weight}");
        Self { weight, phi: wrap_phi(phi) }
    }
}

pub fn wrap_phi(phi: f64) -> f64 {
    if phi > -PI && phi <= PI {
        return phi;
    }
    let wrapped = (phi + PI).rem_euclid(2.0 * PI) - PI;
    if wrapped <= -PI { wrapped + 2.0 * PI } else { wrapped }
}

// ── Detector modes ────────────────────────────────────────────────────────────

/// Barrel calorimeters with their RawTowerDefs id and eta × phi binning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Calorimeter {
    Cemc,
    HcalIn,
    HcalOut,
}

impl Calorimeter {
    pub fn name(self) -> &'static str {
        match self {
            Self::Cemc    => "CEMC",
            Self::HcalIn  => "HCALIN",
            Self::HcalOut => "HCALOUT",
        }
    }

    pub fn calo_id(self) -> u32 {
        match self {
            Self::Cemc    => 1,
            Self::HcalOut => 2,
            Self::HcalIn  => 3,
        }
    }

    /// (eta bins, phi bins)
    pub fn binning(self) -> (u32, u32) {
        match self {
            Self::Cemc                 => (96, 256),
            Self::HcalIn | Self::HcalOut => (24, 64),
        }
    }

    /// Tower id as the geometry table knows it.
    pub fn encode_tower_key(self, eta_bin: u32, phi_bin: u32) -> u32 {
        (self.calo_id() << 24) | ((eta_bin & 0xfff) << 12) | (phi_bin & 0xfff)
    }

    /// Channels are laid out row-major over (eta, phi). Channels past the
    /// last tower have no position.
    pub fn position_key(self, channel: u32) -> Option<u32> {
        let (n_eta, n_phi) = self.binning();
        let eta_bin = channel / n_phi;
        if eta_bin >= n_eta {
            return None;
        }
        Some(self.encode_tower_key(eta_bin, channel % n_phi))
    }
}

/// The detector the event plane is reconstructed from. Fixed for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetectorMode {
    /// sEPD forward wheels, split into south and north arms.
    Wheel,
    Barrel(Calorimeter),
    Tracking,
    /// BBC/MBD. Slots exist but no hits are produced yet.
    BeamCounter,
}

impl DetectorMode {
    pub fn name(self) -> &'static str {
        match self {
            Self::Wheel       => "EPD",
            Self::Barrel(c)   => c.name(),
            Self::Tracking    => "TRACKING",
            Self::BeamCounter => "BBC",
        }
    }

    /// Slots declared for this mode, in subgroup order. Workers emit a
    /// subset of these.
    pub fn subgroups(self) -> &'static [Subgroup] {
        match self {
            Self::Wheel | Self::BeamCounter  => &[Subgroup::South, Subgroup::North],
            Self::Barrel(_) | Self::Tracking => &[Subgroup::Full],
        }
    }

    /// Name of the calibrated tower container this mode reads.
    pub fn tower_node(self) -> String {
        format!("TOWERINFO_CALIB_{}", self.name())
    }

    pub fn geometry_node(self) -> String {
        format!("TOWERGEOM_{}", self.name())
    }
}

impl std::fmt::Display for DetectorMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for DetectorMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "EPD"      => Ok(Self::Wheel),
            "CEMC"     => Ok(Self::Barrel(Calorimeter::Cemc)),
            "HCALIN"   => Ok(Self::Barrel(Calorimeter::HcalIn)),
            "HCALOUT"  => Ok(Self::Barrel(Calorimeter::HcalOut)),
            "TRACKING" => Ok(Self::Tracking),
            "BBC"      => Ok(Self::BeamCounter),
            _          => Err(ConfigError::UnknownDetector(s.to_string())),
        }
    }
}

/// Which slice of the detector a hit collection covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Subgroup {
    South, // arm 0
    North, // arm 1
    Full,
}

impl Subgroup {
    /// Arm index from the wheel geometry; anything but 0/1 has no subgroup.
    pub fn from_arm(arm: u32) -> Option<Self> {
        match arm {
            0 => Some(Self::South),
            1 => Some(Self::North),
            _ => None,
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            Self::South => "_South",
            Self::North => "_North",
            Self::Full  => "",
        }
    }
}

impl std::fmt::Display for Subgroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::South => write!(f, "south"),
            Self::North => write!(f, "north"),
            Self::Full  => write!(f, "full"),
        }
    }
}

/// Registry key of the result slot for one subgroup of a mode.
pub fn slot_key(mode: DetectorMode, subgroup: Subgroup) -> String {
    format!("EpInfo_{}{}", mode.name(), subgroup.suffix())
}

// ── Per-event inputs ──────────────────────────────────────────────────────────

/// Calibrated channel record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TowerInfo {
    pub channel: u32,
    pub energy:  f32,
}

/// Reconstructed track momentum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub px: f64,
    pub py: f64,
    #[serde(default)]
    pub pz: f64,
}

impl Track {
    pub fn pt(&self) -> f64 {
        self.px.hypot(self.py)
    }

    pub fn phi(&self) -> f64 {
        self.py.atan2(self.px)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CentralityInfo {
    /// Impact-parameter centile, 0–100.
    pub bimp: f32,
}

impl CentralityInfo {
    /// Coarse 10% bucket used as the row of the truncation table.
    pub fn class_index(&self) -> usize {
        (self.bimp / 10.0).floor().max(0.0) as usize
    }
}

/// Everything the pipeline may read for one event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventSnapshot {
    pub event_id: u64,
    #[serde(default)]
    pub centrality: Option<CentralityInfo>,
    /// Keyed by container name, e.g. TOWERINFO_CALIB_EPD.
    #[serde(default)]
    pub towers: HashMap<String, Vec<TowerInfo>>,
    #[serde(default)]
    pub tracks: Option<Vec<Track>>,
}

impl EventSnapshot {
    pub fn tower_container(&self, node: &str) -> Option<&[TowerInfo]> {
        self.towers.get(node).map(Vec::as_slice)
    }
}

// ── Results ───────────────────────────────────────────────────────────────────

/// Per-order Q-vector and event-plane angle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Harmonic {
    pub order: u32,
    pub qx:    f64,
    pub qy:    f64,
    /// None when the subgroup carried no weight.
    pub psi:   Option<f64>,
}

/// Content of one result slot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EpInfo {
    pub n_hits:       usize,
    pub total_weight: f64,
    pub harmonics:    Vec<Harmonic>,
}

impl EpInfo {
    pub fn psi(&self, order: u32) -> Option<f64> {
        self.harmonics.iter().find(|h| h.order == order).and_then(|h| h.psi)
    }

    pub fn clear(&mut self) {
        self.n_hits = 0;
        self.total_weight = 0.0;
        self.harmonics.clear();
    }
}
