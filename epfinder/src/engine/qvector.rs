// epfinder/src/engine/qvector.rs
//
// Q-vector accumulation: the estimator the reconstruction feeds.
//
//   Q_n = Σ w·(cos nφ, sin nφ) / Σ w        n = 1..=max_order
//   Ψ_n = atan2(Qy_n, Qx_n) / n
//
// Raw planes only: no resolution correction, phi weighting or shift
// flattening. Any estimator implementing Accumulator can stand in.

use crate::events::{EpInfo, Harmonic, Hit};

/// Orders computed by the default accumulator.
pub const MAX_ORDER: u32 = 3;

/// Estimator interface. `accumulate` receives the hits of one subgroup and
/// the event-class bin, and overwrites `slot`. It must accept an empty slice
/// and keep no reference to `hits` after returning.
pub trait Accumulator {
    fn accumulate(&mut self, hits: &[Hit], event_type: u32, slot: &mut EpInfo);

    /// Called between events.
    fn reset_event(&mut self) {}
}

pub struct QVectorAccumulator {
    max_order: u32,
}

impl QVectorAccumulator {
    pub fn new(max_order: u32) -> Self {
        Self { max_order }
    }
}

impl Default for QVectorAccumulator {
    fn default() -> Self {
        Self::new(MAX_ORDER)
    }
}

impl Accumulator for QVectorAccumulator {
    // Raw planes are the same for every event class.
    fn accumulate(&mut self, hits: &[Hit], _event_type: u32, slot: &mut EpInfo) {
        slot.clear();
        slot.n_hits = hits.len();
        slot.total_weight = hits.iter().map(|h| h.weight).sum();

        for order in 1..=self.max_order {
            let n = f64::from(order);
            let (mut qx, mut qy) = (0.0f64, 0.0f64);
            for h in hits {
                qx += h.weight * (n * h.phi).cos();
                qy += h.weight * (n * h.phi).sin();
            }

            let harmonic = if slot.total_weight > 0.0 {
                qx /= slot.total_weight;
                qy /= slot.total_weight;
                Harmonic { order, qx, qy, psi: Some(qy.atan2(qx) / n) }
            } else {
                Harmonic { order, ..Default::default() }
            };
            slot.harmonics.push(harmonic);
        }
    }
}
