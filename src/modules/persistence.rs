use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use log::{debug, error, info};
use snafu::ResultExt;

use crate::errors::{
    CreateLapDataFolderSnafu, CustomResult, ParseLapDataSnafu, ReadLapDataSnafu,
    SerializeLapDataSnafu, WriteLapDataSnafu,
};
use crate::modules::models::lap::TrackLedger;

const FILE_EXTENSION: &str = "json";

/// the folder holding one json file of laps per track
#[derive(Debug, Clone)]
pub struct LapDataFolder {
    dir: PathBuf,
}

impl LapDataFolder {
    pub fn new(dir: impl Into<PathBuf>) -> LapDataFolder {
        LapDataFolder { dir: dir.into() }
    }

    /// the file a track is stored in
    pub fn track_path(&self, track_key: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", track_key.replace(' ', "_"), FILE_EXTENSION))
    }

    /// # load all tracks
    /// load every track file in the folder. the folder is created when it
    /// does not exist yet. files that can't be read are logged and skipped
    /// over as empty tracks.
    ///
    /// ## Returns
    /// * `HashMap<String, TrackLedger>` - the laps of every track, keyed by track key
    pub fn load_all(&self) -> HashMap<String, TrackLedger> {
        let mut tracks = HashMap::new();

        if let Err(error) = self.ensure_exists() {
            error!(target: "persistence:load_all", "{}", error);
            return tracks;
        }

        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(error) => {
                error!(target: "persistence:load_all", "failed listing lap data folder {}: {}", self.dir.display(), error);
                return tracks;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(FILE_EXTENSION) {
                continue;
            }

            let Some(track_key) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };

            let ledger = self.load_track(track_key);
            info!(target: "persistence:load_all", "loaded lap data for track: {} ({} laps)", track_key, ledger.len());
            tracks.insert(track_key.to_string(), ledger);
        }

        tracks
    }

    /// # load a track
    /// a missing file is a track without laps. a corrupt file is logged and
    /// also treated as a track without laps.
    pub fn load_track(&self, track_key: &str) -> TrackLedger {
        match self.read_track(track_key) {
            Ok(Some(ledger)) => ledger,
            Ok(None) => TrackLedger::new(),
            Err(error) => {
                error!(target: "persistence:load_track", "failed to load lap data for track {}: {}", track_key, error);
                TrackLedger::new()
            }
        }
    }

    /// # save a track
    /// write the laps of a track as pretty printed json.
    /// the data is written to a temporary file first and then moved over
    /// the old file, so a failed write leaves the previous data intact.
    ///
    /// callers must not save the same track concurrently, they share the
    /// temporary file.
    pub async fn save_track(&self, track_key: &str, ledger: &TrackLedger) -> CustomResult<()> {
        let json = serde_json::to_string_pretty(ledger)
            .context(SerializeLapDataSnafu { track: track_key })?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .context(CreateLapDataFolderSnafu { path: &self.dir })?;

        let path = self.track_path(track_key);
        let tmp_path = path.with_extension(format!("{FILE_EXTENSION}.tmp"));

        tokio::fs::write(&tmp_path, json)
            .await
            .context(WriteLapDataSnafu { path: &tmp_path })?;
        tokio::fs::rename(&tmp_path, &path)
            .await
            .context(WriteLapDataSnafu { path: &path })?;

        debug!(target: "persistence:save_track", "saved lap data for track: {}", track_key);
        Ok(())
    }

    fn read_track(&self, track_key: &str) -> CustomResult<Option<TrackLedger>> {
        let path = self.track_path(track_key);

        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(error).context(ReadLapDataSnafu { path }),
        };

        let ledger = serde_json::from_str(&json).context(ParseLapDataSnafu { path })?;
        Ok(Some(ledger))
    }

    fn ensure_exists(&self) -> CustomResult<()> {
        if self.dir.is_dir() {
            return Ok(());
        }

        fs::create_dir_all(&self.dir).context(CreateLapDataFolderSnafu { path: &self.dir })?;
        info!(target: "persistence:ensure_exists", "created lap data folder {}", self.dir.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;
    use crate::modules::models::lap::LapRecord;

    fn lap(driver_guid: u64, lap_time_ms: u32, cuts: u32) -> LapRecord {
        LapRecord {
            driver_guid,
            driver_name: format!("driver {driver_guid}"),
            car_name: "ks_porsche_911_gt3_r_2016".to_string(),
            lap_time_ms,
            cuts,
        }
    }

    #[tokio::test]
    async fn save_then_load_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let folder = LapDataFolder::new(dir.path());

        let mut ledger = TrackLedger::new();
        for (driver, time, cuts) in [(76561198000000001, 99_000, 0), (2, 91_000, 1), (76561198000000001, 95_000, 0)] {
            ledger.insert(lap(driver, time, cuts)).unwrap();
        }

        folder.save_track("monza", &ledger).await.unwrap();
        let loaded = folder.load_track("monza");

        assert_eq!(loaded, ledger);
        let times: Vec<u32> = loaded
            .laps_of(76561198000000001)
            .iter()
            .map(|l| l.lap_time_ms)
            .collect();
        assert_eq!(times, vec![99_000, 95_000]);
    }

    #[test]
    fn missing_file_is_empty_track() {
        let dir = tempfile::tempdir().unwrap();
        let folder = LapDataFolder::new(dir.path());

        assert!(folder.load_track("nowhere").is_empty());
    }

    #[test]
    fn corrupt_file_is_empty_track() {
        let dir = tempfile::tempdir().unwrap();
        let folder = LapDataFolder::new(dir.path());
        fs::write(folder.track_path("spa"), "{ not json").unwrap();

        assert!(folder.load_track("spa").is_empty());
        assert!(folder.read_track("spa").is_err());
    }

    #[test]
    fn reads_plugin_file_format() {
        let dir = tempfile::tempdir().unwrap();
        let folder = LapDataFolder::new(dir.path());
        let json = r#"{
  "76561198000000001": [
    {
      "DriverGuid": 76561198000000001,
      "DriverName": "Alice",
      "CarName": "ks_ferrari_488_gt3",
      "LapTimeMs": 95432,
      "Cuts": 0
    }
  ]
}"#;
        fs::write(folder.track_path("imola"), json).unwrap();

        let ledger = folder.load_track("imola");
        let laps = ledger.laps_of(76561198000000001);
        assert_eq!(laps.len(), 1);
        assert_eq!(laps[0].driver_name, "Alice");
        assert_eq!(laps[0].lap_time_ms, 95_432);
    }

    #[tokio::test]
    async fn load_all_creates_folder_and_reads_every_track() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("LapData");
        let folder = LapDataFolder::new(&data_dir);

        assert!(folder.load_all().is_empty());
        assert!(data_dir.is_dir());

        let mut ledger = TrackLedger::new();
        ledger.insert(lap(1, 90_000, 0)).unwrap();
        folder.save_track("monza", &ledger).await.unwrap();
        folder.save_track("spa", &TrackLedger::new()).await.unwrap();
        fs::write(data_dir.join("notes.txt"), "ignored").unwrap();
        fs::write(folder.track_path("broken"), "[").unwrap();

        let tracks = folder.load_all();
        assert_eq!(tracks.len(), 3);
        assert_eq!(tracks["monza"], ledger);
        assert!(tracks["spa"].is_empty());
        assert!(tracks["broken"].is_empty());
    }

    #[tokio::test]
    async fn saved_file_is_pretty_printed() {
        let dir = tempfile::tempdir().unwrap();
        let folder = LapDataFolder::new(dir.path());
        let mut ledger = TrackLedger::new();
        ledger.insert(lap(1, 90_000, 0)).unwrap();

        folder.save_track("monza", &ledger).await.unwrap();
        let contents = fs::read_to_string(folder.track_path("monza")).unwrap();

        assert!(contents.contains("\n  \"1\": ["));
        assert!(contents.contains("\"LapTimeMs\": 90000"));
        assert!(!dir.path().join("monza.json.tmp").exists());
    }

    #[tokio::test]
    async fn failed_save_keeps_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let folder = LapDataFolder::new(dir.path());

        let mut ledger = TrackLedger::new();
        ledger.insert(lap(1, 90_000, 0)).unwrap();
        folder.save_track("monza", &ledger).await.unwrap();

        // a directory in the way of the temporary file makes the write fail
        fs::create_dir(dir.path().join("monza.json.tmp")).unwrap();
        ledger.insert(lap(2, 89_000, 0)).unwrap();

        let result = folder.save_track("monza", &ledger).await;
        assert!(matches!(result, Err(Error::WriteLapDataError { .. })));

        let on_disk = folder.load_track("monza");
        assert_eq!(on_disk.len(), 1);
        assert_eq!(on_disk.laps_of(1)[0].lap_time_ms, 90_000);
        assert!(on_disk.laps_of(2).is_empty());
    }

    #[tokio::test]
    async fn save_into_a_file_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let not_a_dir = dir.path().join("LapData");
        fs::write(&not_a_dir, "i am a file").unwrap();
        let folder = LapDataFolder::new(&not_a_dir);

        let result = folder.save_track("monza", &TrackLedger::new()).await;
        assert!(matches!(result, Err(Error::CreateLapDataFolderError { .. })));
        assert!(folder.load_all().is_empty());
    }
}
