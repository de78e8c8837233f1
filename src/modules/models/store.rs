use std::collections::HashMap;

use log::{debug, info};
use snafu::ensure;

use crate::errors::{CustomResult, InvalidLapTimeSnafu};
use crate::modules::models::lap::{LapRecord, NewLap, TrackLedger};

/// the result of handing a lap to the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedLap {
    /// the lap was new and has been appended
    Accepted(LapRecord),
    /// the driver already had this lap, holds the stored copy
    Duplicate(LapRecord),
}

impl RecordedLap {
    pub fn accepted(&self) -> bool {
        matches!(self, RecordedLap::Accepted(_))
    }

    pub fn record(&self) -> &LapRecord {
        match self {
            RecordedLap::Accepted(record) | RecordedLap::Duplicate(record) => record,
        }
    }
}

/// every lap of every track, keyed by sanitized track name
#[derive(Debug, Default)]
pub struct LapStore {
    tracks: HashMap<String, TrackLedger>,
}

impl LapStore {
    pub fn new() -> LapStore {
        LapStore::default()
    }

    pub fn from_tracks(tracks: HashMap<String, TrackLedger>) -> LapStore {
        LapStore { tracks }
    }

    /// # record a lap
    /// store a lap for a driver on a track. the track and the driver history
    /// are created when this is the first lap seen for them.
    ///
    /// this does not persist anything, saving the ledger is up to the caller.
    ///
    /// ## Arguments
    /// * `track_key` - the sanitized track name
    /// * `lap` - the lap to store
    ///
    /// ## Returns
    /// * `RecordedLap` - whether the lap was new or a duplicate
    /// * `Error::InvalidLapTimeError` - the lap time was 0
    pub fn record_lap(&mut self, track_key: &str, lap: NewLap) -> CustomResult<RecordedLap> {
        ensure!(lap.lap_time_ms != 0, InvalidLapTimeSnafu);

        if !self.tracks.contains_key(track_key) {
            info!(target: "models/store:record_lap", "initialized lap storage for track: {}", track_key);
        }
        let ledger = self.tracks.entry(track_key.to_string()).or_default();

        match ledger.insert(LapRecord::from(lap)) {
            Ok(record) => {
                debug!(target: "models/store:record_lap", "recorded new lap for {} on {}: {}ms", record.driver_name, track_key, record.lap_time_ms);
                Ok(RecordedLap::Accepted(record))
            }
            Err(existing) => {
                debug!(target: "models/store:record_lap", "duplicate lap for {} on {}, skipping", existing.driver_name, track_key);
                Ok(RecordedLap::Duplicate(existing))
            }
        }
    }

    pub fn track(&self, track_key: &str) -> Option<&TrackLedger> {
        self.tracks.get(track_key)
    }
}
