// epfinder/src/engine/reco.rs
//
// Event-plane reconstruction module. One instance per run, bound to a
// single detector mode.
//
// Lifecycle:
//   init           create one EpInfo slot per subgroup of the mode
//   process_event  resolve slots → extract hits → accumulate per subgroup
//   updated_slots  slots the last event wrote, for the sink
//   reset_event    clear per-event accumulator state
//   end            log run counters
//
// Status:
//   Ok(EventStatus::Ok)         event done, slots updated
//   Ok(EventStatus::AbortEvent) a slot was missing, nothing was touched
//   Err(FatalError)             the run cannot continue

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::calib::CalibContext;
use crate::engine::qvector::Accumulator;
use crate::error::FatalError;
use crate::events::{slot_key, DetectorMode, EpInfo, EventSnapshot, Subgroup};
use crate::registry::{Registry, SlotHandle};
use crate::workers;

/// Event-class bin handed to the accumulator. The estimator is configured
/// with a single class.
pub const EVENT_TYPE_BIN: u32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStatus {
    Ok,
    AbortEvent,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunCounters {
    pub processed: u64,
    pub aborted:   u64,
    pub hits:      u64,
}

pub struct EventPlaneReco<A: Accumulator> {
    mode:        DetectorMode,
    registry:    Arc<Registry>,
    calib:       CalibContext,
    accumulator: A,
    counters:    RunCounters,
    updated:     Vec<String>,
}

impl<A: Accumulator> EventPlaneReco<A> {
    pub fn new(
        mode:        DetectorMode,
        registry:    Arc<Registry>,
        calib:       CalibContext,
        accumulator: A,
    ) -> Self {
        Self {
            mode,
            registry,
            calib,
            accumulator,
            counters: RunCounters::default(),
            updated:  Vec::new(),
        }
    }

    pub fn accumulator(&self) -> &A {
        &self.accumulator
    }

    pub fn counters(&self) -> RunCounters {
        self.counters
    }

    /// Slot names of this mode, in subgroup order.
    pub fn slot_keys(&self) -> Vec<String> {
        self.mode.subgroups().iter().map(|&s| slot_key(self.mode, s)).collect()
    }

    pub fn init(&self) -> Vec<String> {
        let keys = self.slot_keys();
        for key in &keys {
            self.registry.create(key, EpInfo::default());
        }
        info!(
            "Event plane module: detector={} node={} slots=[{}]",
            self.mode,
            self.registry.namespace(),
            keys.join(", ")
        );
        keys
    }

    /// Slots written by the last `process_event`. Empty after an abort and
    /// for modes that produce no hits.
    pub fn updated_slots(&self) -> &[String] {
        &self.updated
    }

    pub fn process_event(&mut self, event: &EventSnapshot) -> Result<EventStatus, FatalError> {
        self.updated.clear();
        let Some(slots) = self.resolve_slots() else {
            self.counters.aborted += 1;
            return Ok(EventStatus::AbortEvent);
        };

        let extraction = workers::extract(self.mode, event, &self.calib)?;

        for (subgroup, _) in &extraction {
            if !slots.contains_key(subgroup) {
                return Err(FatalError::UndeclaredSubgroup { mode: self.mode, subgroup: *subgroup });
            }
        }

        for (subgroup, hits) in &extraction {
            let key  = slot_key(self.mode, *subgroup);
            let slot = &slots[subgroup];
            self.accumulator.accumulate(hits, EVENT_TYPE_BIN, &mut slot.write());
            self.counters.hits += hits.len() as u64;
            debug!("event={} {} {} hits", event.event_id, key, hits.len());
            self.updated.push(key);
        }

        self.counters.processed += 1;
        Ok(EventStatus::Ok)
    }

    pub fn reset_event(&mut self) {
        self.updated.clear();
        self.accumulator.reset_event();
    }

    pub fn end(&self) -> RunCounters {
        info!(
            "Event plane module done: detector={} processed={} aborted={} hits={}",
            self.mode, self.counters.processed, self.counters.aborted, self.counters.hits
        );
        self.counters
    }

    fn resolve_slots(&self) -> Option<HashMap<Subgroup, SlotHandle>> {
        let mut slots = HashMap::new();
        for &subgroup in self.mode.subgroups() {
            let key = slot_key(self.mode, subgroup);
            match self.registry.lookup(&key) {
                Some(handle) => { slots.insert(subgroup, handle); }
                None => {
                    warn!("Could not find node {}/{}, aborting event", self.registry.namespace(), key);
                    return None;
                }
            }
        }
        Some(slots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calib::geometry::{EpdGeom, EpdTile, TowerGeom, TowerGeomTable};
    use crate::calib::truncation::TruncationTable;
    use crate::engine::qvector::QVectorAccumulator;
    use crate::events::{Calorimeter, CentralityInfo, Hit, TowerInfo, Track};

    /// Records every call and marks the slot with the hit count.
    #[derive(Default)]
    struct Recorder {
        calls:  Vec<(Vec<Hit>, u32)>,
        resets: u32,
    }

    impl Accumulator for Recorder {
        fn accumulate(&mut self, hits: &[Hit], event_type: u32, slot: &mut EpInfo) {
            self.calls.push((hits.to_vec(), event_type));
            slot.n_hits = hits.len();
        }

        fn reset_event(&mut self) {
            self.resets += 1;
        }
    }

    fn epd_calib() -> CalibContext {
        let mut rows = vec![vec![10.0; 16]; 11];
        rows[3][2] = 2.0;
        CalibContext {
            epd_geom: Some(EpdGeom::new([
                EpdTile { key: 0, side: 0, sector: 1, tile: 3, phi: 0.9 },
                EpdTile { key: 1, side: 1, sector: 1, tile: 0, phi: -1.1 },
            ])),
            epd_trunc: Some(TruncationTable::new(rows)),
            ..Default::default()
        }
    }

    fn epd_event(towers: Vec<TowerInfo>) -> EventSnapshot {
        let mut ev = EventSnapshot {
            event_id: 11,
            centrality: Some(CentralityInfo { bimp: 31.0 }),
            ..Default::default()
        };
        ev.towers.insert("TOWERINFO_CALIB_EPD".into(), towers);
        ev
    }

    fn reco<A: Accumulator>(mode: DetectorMode, calib: CalibContext, acc: A) -> EventPlaneReco<A> {
        let reco = EventPlaneReco::new(mode, Arc::new(Registry::new("EVENT_PLANE")), calib, acc);
        reco.init();
        reco
    }

    #[test]
    fn init_creates_one_slot_per_subgroup() {
        let r = reco(DetectorMode::Wheel, CalibContext::default(), Recorder::default());
        assert_eq!(r.registry.keys(), vec!["EpInfo_EPD_North", "EpInfo_EPD_South"]);

        let r = reco(DetectorMode::Barrel(Calorimeter::Cemc), CalibContext::default(), Recorder::default());
        assert_eq!(r.registry.keys(), vec!["EpInfo_CEMC"]);
    }

    #[test]
    fn wheel_truncates_and_splits_arms() {
        let mut r = reco(DetectorMode::Wheel, epd_calib(), Recorder::default());
        let status = r.process_event(&epd_event(vec![TowerInfo { channel: 0, energy: 5.0 }])).unwrap();

        assert_eq!(status, EventStatus::Ok);
        let calls = &r.accumulator().calls;
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], (vec![Hit::new(2.0, 0.9)], EVENT_TYPE_BIN));
        assert_eq!(calls[1], (Vec::<Hit>::new(), EVENT_TYPE_BIN));
        assert_eq!(r.registry.lookup("EpInfo_EPD_South").unwrap().read().n_hits, 1);
        assert_eq!(r.registry.lookup("EpInfo_EPD_North").unwrap().read().n_hits, 0);
    }

    #[test]
    fn barrel_uses_raw_energy_and_drops_unknown_towers() {
        let calo = Calorimeter::Cemc;
        let mut calib = CalibContext::default();
        calib.tower_geom.insert(
            calo,
            TowerGeomTable::new(calo, [TowerGeom { eta_bin: 0, phi_bin: 5, phi: 1.2 }]),
        );
        let mut ev = EventSnapshot::default();
        ev.towers.insert("TOWERINFO_CALIB_CEMC".into(), vec![
            TowerInfo { channel: 5, energy: 4.5 },
            TowerInfo { channel: 6, energy: 3.0 },
        ]);

        let mut r = reco(DetectorMode::Barrel(calo), calib, Recorder::default());
        assert_eq!(r.process_event(&ev).unwrap(), EventStatus::Ok);
        assert_eq!(r.accumulator().calls, vec![(vec![Hit::new(4.5, 1.2)], EVENT_TYPE_BIN)]);
    }

    #[test]
    fn missing_slot_aborts_event_without_accumulating() {
        // registry only ever got the south slot
        let registry = Arc::new(Registry::new("EVENT_PLANE"));
        registry.create("EpInfo_EPD_South", EpInfo::default());
        let mut r = EventPlaneReco::new(DetectorMode::Wheel, registry, epd_calib(), Recorder::default());

        let ev = epd_event(vec![TowerInfo { channel: 0, energy: 5.0 }]);
        assert_eq!(r.process_event(&ev).unwrap(), EventStatus::AbortEvent);
        assert!(r.accumulator().calls.is_empty());
        assert!(r.updated_slots().is_empty());
        assert_eq!(r.counters().aborted, 1);

        // later events still run once the slot is back
        r.registry.create("EpInfo_EPD_North", EpInfo::default());
        assert_eq!(r.process_event(&ev).unwrap(), EventStatus::Ok);
        assert_eq!(r.accumulator().calls.len(), 2);
        assert_eq!(r.updated_slots(), ["EpInfo_EPD_South", "EpInfo_EPD_North"]);
    }

    #[test]
    fn empty_inputs_give_one_empty_call_per_subgroup() {
        let mut r = reco(DetectorMode::Wheel, epd_calib(), Recorder::default());
        r.process_event(&epd_event(vec![])).unwrap();
        let none = Vec::<Hit>::new();
        assert_eq!(r.accumulator().calls, vec![(none.clone(), 0), (none.clone(), 0)]);

        let calo = Calorimeter::HcalIn;
        let mut calib = CalibContext::default();
        calib.tower_geom.insert(calo, TowerGeomTable::new(calo, Vec::<TowerGeom>::new()));
        let mut ev = EventSnapshot::default();
        ev.towers.insert("TOWERINFO_CALIB_HCALIN".into(), vec![]);
        let mut r = reco(DetectorMode::Barrel(calo), calib, Recorder::default());
        r.process_event(&ev).unwrap();
        assert_eq!(r.accumulator().calls, vec![(Vec::<Hit>::new(), 0)]);

        let ev = EventSnapshot { tracks: Some(vec![]), ..Default::default() };
        let mut r = reco(DetectorMode::Tracking, CalibContext::default(), Recorder::default());
        r.process_event(&ev).unwrap();
        assert_eq!(r.accumulator().calls, vec![(Vec::<Hit>::new(), 0)]);
    }

    #[test]
    fn tracking_keeps_soft_tracks_only() {
        let ev = EventSnapshot {
            tracks: Some(vec![
                Track { px: 0.2, py: 0.1, pz: 0.0 },
                Track { px: 2.0, py: 0.0, pz: 0.0 },
            ]),
            ..Default::default()
        };
        let mut r = reco(DetectorMode::Tracking, CalibContext::default(), Recorder::default());
        r.process_event(&ev).unwrap();
        assert_eq!(r.accumulator().calls, vec![(vec![Hit::new(1.0, 0.1f64.atan2(0.2))], 0)]);
    }

    #[test]
    fn beam_counter_leaves_slots_untouched() {
        let mut r = reco(DetectorMode::BeamCounter, CalibContext::default(), Recorder::default());
        r.registry.lookup("EpInfo_BBC_South").unwrap().write().n_hits = 7;

        assert_eq!(r.process_event(&EventSnapshot::default()).unwrap(), EventStatus::Ok);
        assert!(r.accumulator().calls.is_empty());
        assert!(r.updated_slots().is_empty());
        assert_eq!(r.registry.lookup("EpInfo_BBC_South").unwrap().read().n_hits, 7);
    }

    #[test]
    fn repeated_snapshot_repeats_calls() {
        let mut r = reco(DetectorMode::Wheel, epd_calib(), Recorder::default());
        let ev = epd_event(vec![
            TowerInfo { channel: 0, energy: 0.8 },
            TowerInfo { channel: 1, energy: 3.0 },
            TowerInfo { channel: 1, energy: 0.1 },
        ]);
        r.process_event(&ev).unwrap();
        r.reset_event();
        r.process_event(&ev).unwrap();

        let calls = &r.accumulator().calls;
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[0..2], calls[2..4]);
        assert_eq!(r.accumulator().resets, 1);
    }

    #[test]
    fn missing_geometry_is_fatal() {
        let mut r = reco(DetectorMode::Wheel, CalibContext::default(), Recorder::default());
        let err = r.process_event(&epd_event(vec![])).unwrap_err();
        assert!(matches!(err, FatalError::MissingGeometry(_)));
        assert!(r.accumulator().calls.is_empty());
    }

    #[test]
    fn q_vectors_land_in_registry() {
        let mut r = reco(DetectorMode::Wheel, epd_calib(), QVectorAccumulator::default());
        r.process_event(&epd_event(vec![TowerInfo { channel: 1, energy: 1.5 }])).unwrap();

        let north = r.registry.lookup("EpInfo_EPD_North").unwrap();
        let north = north.read();
        assert_eq!(north.n_hits, 1);
        assert!((north.psi(1).unwrap() + 1.1).abs() < 1e-9);

        let south = r.registry.lookup("EpInfo_EPD_South").unwrap();
        assert!(south.read().psi(1).is_none());

        assert_eq!(r.end(), RunCounters { processed: 1, aborted: 0, hits: 1 });
    }
}
