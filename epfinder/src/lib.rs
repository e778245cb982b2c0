//! Event-plane hit extraction.
//!
//! Per event: resolve the EpInfo slots of the configured detector, turn its
//! calibrated channels (or tracks) into weighted azimuthal hits, and hand
//! each subgroup to a Q-vector [`engine::qvector::Accumulator`].

pub mod calib;
pub mod engine;
pub mod error;
pub mod events;
pub mod registry;
pub mod workers;
