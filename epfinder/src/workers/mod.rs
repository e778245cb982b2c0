pub mod barrel;
pub mod bbc;
pub mod epd;
pub mod tracking;

use crate::calib::CalibContext;
use crate::error::FatalError;
use crate::events::{DetectorMode, EventSnapshot, Hit, Subgroup};

/// Hit collections of one event, one entry per subgroup in emission order.
pub type Extraction = Vec<(Subgroup, Vec<Hit>)>;

/// Run the extraction worker bound to `mode` on one event.
/// Workers keep no state between events.
pub fn extract(
    mode:  DetectorMode,
    event: &EventSnapshot,
    calib: &CalibContext,
) -> Result<Extraction, FatalError> {
    match mode {
        DetectorMode::Wheel       => epd::extract(event, calib),
        DetectorMode::Barrel(c)   => barrel::extract(c, event, calib),
        DetectorMode::Tracking    => tracking::extract(event),
        DetectorMode::BeamCounter => Ok(bbc::extract(event)),
    }
}
