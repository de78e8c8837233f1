use std::collections::BTreeMap;

use crate::modules::models::lap::{LapRecord, TrackLedger};

/// # rank a track
/// build the leaderboard of a track: the personal best clean lap of every
/// driver, fastest first, cut off at `limit` entries.
///
/// drivers with the same best time are ordered by driver guid. when a driver
/// has the same time twice the first driven lap is used.
///
/// ## Arguments
/// * `ledger` - the laps of the track
/// * `limit` - the maximum amount of entries
///
/// ## Returns
/// * `Vec<LapRecord>` - at most `limit` laps, one per driver
pub fn rank(ledger: &TrackLedger, limit: usize) -> Vec<LapRecord> {
    let mut personal_bests: BTreeMap<u64, &LapRecord> = BTreeMap::new();

    for lap in ledger.records().filter(|lap| lap.is_clean()) {
        personal_bests
            .entry(lap.driver_guid)
            .and_modify(|best| {
                if lap.lap_time_ms < best.lap_time_ms {
                    *best = lap;
                }
            })
            .or_insert(lap);
    }

    let mut ranked: Vec<LapRecord> = personal_bests.into_values().cloned().collect();

    // stable sort, guid order from the map is the tie-break
    ranked.sort_by_key(|lap| lap.lap_time_ms);
    ranked.truncate(limit);
    ranked
}

/// # check if a lap made the leaderboard
/// a lap qualifies when, with the lap already stored, it is the personal best
/// of its driver and that personal best ranks within the top `limit`.
pub fn qualifies(ledger: &TrackLedger, limit: usize, candidate: &LapRecord) -> bool {
    rank(ledger, limit).iter().any(|lap| {
        lap.driver_guid == candidate.driver_guid && lap.lap_time_ms == candidate.lap_time_ms
    })
}
