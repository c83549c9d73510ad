//! Merging per-source arrival lists into the views handed to the renderer.

use crate::arrival::ArrivalRecord;

/// Drops records without an ETA and caps each source.
///
/// Bus records keep the stop-monitoring API's order and train records the
/// epoch order produced by the train normalizer. An empty view is a normal
/// "nothing coming" result.
pub fn aggregate(
    bus: Vec<ArrivalRecord>,
    train: Vec<ArrivalRecord>,
    max_bus: usize,
    max_train: usize,
) -> (Vec<ArrivalRecord>, Vec<ArrivalRecord>) {
    (view(bus, max_bus), view(train, max_train))
}

fn view(records: Vec<ArrivalRecord>, max: usize) -> Vec<ArrivalRecord> {
    records
        .into_iter()
        .filter(|r| r.eta_minutes.is_some())
        .take(max)
        .collect()
}
