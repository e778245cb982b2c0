// epfinder/src/workers/bbc.rs
//
// BBC worker. Not wired to the beam counters yet: no reads, no hits, no
// subgroups. The south/north slots exist and keep their previous content.

use super::Extraction;
use crate::events::EventSnapshot;

pub fn extract(_event: &EventSnapshot) -> Extraction {
    Vec::new()
}
