use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// a lap as reported by the host, before it is checked against the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLap {
    pub driver_guid: u64,
    pub driver_name: String,
    pub car_name: String,
    pub lap_time_ms: u32,
    pub cuts: u32,
}

/// a single recorded lap. never mutated after it is stored.
///
/// the field names match the json files written by the server plugin so
/// existing lap data keeps loading.
#[derive(Serialize, Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct LapRecord {
    pub driver_guid: u64,
    pub driver_name: String,
    pub car_name: String,
    pub lap_time_ms: u32,
    pub cuts: u32,
}

impl LapRecord {
    /// # is clean
    /// a lap is clean when the driver did not cut the track
    pub fn is_clean(&self) -> bool {
        self.cuts == 0
    }

    /// # same lap
    /// check if two laps are the same lap for deduplication purposes.
    /// the driver name is not part of this, it may change between laps.
    pub fn is_same_lap(&self, other: &LapRecord) -> bool {
        self.lap_time_ms == other.lap_time_ms
            && self.cuts == other.cuts
            && self.car_name == other.car_name
    }
}

impl From<NewLap> for LapRecord {
    fn from(lap: NewLap) -> Self {
        LapRecord {
            driver_guid: lap.driver_guid,
            driver_name: lap.driver_name,
            car_name: lap.car_name,
            lap_time_ms: lap.lap_time_ms,
            cuts: lap.cuts,
        }
    }
}

/// all laps of one driver on one track, in the order they were driven
pub type DriverLapHistory = Vec<LapRecord>;

/// all laps driven on a single track, grouped by driver guid
#[derive(Serialize, Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(transparent)]
pub struct TrackLedger {
    drivers: BTreeMap<u64, DriverLapHistory>,
}

impl TrackLedger {
    pub fn new() -> TrackLedger {
        TrackLedger::default()
    }

    /// # insert a lap
    /// append the lap to the history of its driver unless the driver already
    /// has the same lap.
    ///
    /// ## Returns
    /// * `Ok(LapRecord)` - the lap was appended
    /// * `Err(LapRecord)` - the equal lap that was already stored
    pub fn insert(&mut self, lap: LapRecord) -> Result<LapRecord, LapRecord> {
        let history = self.drivers.entry(lap.driver_guid).or_default();

        if let Some(existing) = history.iter().find(|stored| stored.is_same_lap(&lap)) {
            return Err(existing.clone());
        }

        history.push(lap.clone());
        Ok(lap)
    }

    pub fn laps_of(&self, driver_guid: u64) -> &[LapRecord] {
        self.drivers
            .get(&driver_guid)
            .map(|history| history.as_slice())
            .unwrap_or_default()
    }

    /// iterate the drivers with their laps, ordered by driver guid
    pub fn drivers(&self) -> impl Iterator<Item = (u64, &[LapRecord])> {
        self.drivers
            .iter()
            .map(|(guid, history)| (*guid, history.as_slice()))
    }

    pub fn records(&self) -> impl Iterator<Item = &LapRecord> {
        self.drivers.values().flatten()
    }

    /// total amount of laps on the track
    pub fn len(&self) -> usize {
        self.drivers.values().map(|history| history.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// # get the best laps of a driver
    /// get the fastest clean laps of a single driver, fastest first.
    /// laps with the same time keep the order they were driven in.
    ///
    /// ## Arguments
    /// * `driver_guid` - the driver to get the laps for
    /// * `amount` - the maximum amount of laps to return
    ///
    /// ## Returns
    /// * `Vec<LapRecord>` - at most `amount` clean laps
    pub fn driver_best_laps(&self, driver_guid: u64, amount: usize) -> Vec<LapRecord> {
        let mut clean: Vec<LapRecord> = self
            .laps_of(driver_guid)
            .iter()
            .filter(|lap| lap.is_clean())
            .cloned()
            .collect();

        clean.sort_by_key(|lap| lap.lap_time_ms);
        clean.truncate(amount);
        clean
    }
}
