use std::sync::Arc;

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Mutex};

use crate::modules::config::LapTimesConfig;
use crate::modules::helpers::format::{
    build_lap_message, build_leaderboard_message, build_personal_laps_message, MessageStyle,
};
use crate::modules::helpers::track_name::{sanitize_track_name, UNKNOWN_TRACK};
use crate::modules::leaderboard;
use crate::modules::models::lap::{LapRecord, NewLap};
use crate::modules::models::store::{LapStore, RecordedLap};
use crate::modules::notifications::{ChatSender, ChatTarget, Notifier, WebhookSender};
use crate::modules::persistence::LapDataFolder;

pub const UNKNOWN_DRIVER: &str = "UnknownDriver";
pub const UNKNOWN_CAR: &str = "UnknownCar";

/// amount of laps shown by `/laptimes`
pub const PERSONAL_LAPS_SHOWN: usize = 3;

/// a driver crossed the line, as reported by the host
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LapCompleted {
    /// the raw track name the server is running
    pub track: Option<String>,
    pub driver_guid: u64,
    pub driver_name: Option<String>,
    pub car_name: Option<String>,
    pub lap_time_ms: u32,
    #[serde(default)]
    pub cuts: u32,
}

/// a chat line typed by a driver
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub track: Option<String>,
    pub driver_guid: u64,
    pub driver_name: Option<String>,
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    LapCompleted(LapCompleted),
    ChatMessage(ChatMessage),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LapOutcome {
    /// plugin disabled or the lap was invalid
    Ignored,
    /// the driver already had this lap
    Duplicate,
    /// a new lap, `qualified` when it made the leaderboard
    Recorded { qualified: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatCommand {
    Leaderboard,
    LapTimes,
}

impl ChatCommand {
    pub fn parse(message: &str) -> Option<ChatCommand> {
        let command = message.trim().to_lowercase();
        match command.as_str() {
            "/leaderboard" => Some(ChatCommand::Leaderboard),
            "/laptimes" => Some(ChatCommand::LapTimes),
            _ => None,
        }
    }
}

/// keeps the lap records of the session and announces new records
pub struct LapTracker<C, W> {
    config: LapTimesConfig,
    folder: LapDataFolder,
    store: Mutex<LapStore>,
    notifier: Notifier<C, W>,
}

impl<C: ChatSender, W: WebhookSender> LapTracker<C, W> {
    /// # create a lap tracker
    /// creates the tracker and loads all lap data stored in the configured
    /// data folder.
    pub fn new(config: LapTimesConfig, chat: Arc<C>, webhook: Arc<W>) -> LapTracker<C, W> {
        let folder = LapDataFolder::new(config.data_dir.clone());
        let store = LapStore::from_tracks(folder.load_all());

        let notifier = Notifier::new(
            chat,
            webhook,
            config.webhook_url.clone(),
            config.message_interval,
            config.max_line_length,
        );

        if !config.enabled {
            warn!(target: "lap_tracker:new", "lap times disabled via config");
        }
        if !config.webhook_enabled() {
            info!(target: "lap_tracker:new", "no webhook url configured, webhook messages are skipped");
        }

        LapTracker {
            config,
            folder,
            store: Mutex::new(store),
            notifier,
        }
    }

    pub fn config(&self) -> &LapTimesConfig {
        &self.config
    }

    /// # handle a completed lap
    /// record the lap, save the track and announce the lap. when the lap
    /// puts the driver on the leaderboard the leaderboard is announced too.
    ///
    /// storing, ranking and saving happen under one lock so two laps arriving
    /// at the same time can't miss each other. the file is written with
    /// async io while the lock is held. the messages are sent after the lock
    /// is released.
    ///
    /// ## Arguments
    /// * `event` - the lap as reported by the host
    ///
    /// ## Returns
    /// * `LapOutcome` - what happened with the lap
    pub async fn on_lap_completed(&self, event: LapCompleted) -> LapOutcome {
        info!(target: "lap_tracker:on_lap_completed", "lap completed event received for driver guid: {}", event.driver_guid);

        if !self.config.enabled || event.lap_time_ms == 0 {
            debug!(target: "lap_tracker:on_lap_completed", "plugin disabled or invalid lap time, skipping lap");
            return LapOutcome::Ignored;
        }

        let track_key = track_key_of(event.track.as_deref());
        let new_lap = NewLap {
            driver_guid: event.driver_guid,
            driver_name: event.driver_name.unwrap_or_else(|| UNKNOWN_DRIVER.to_string()),
            car_name: event.car_name.unwrap_or_else(|| UNKNOWN_CAR.to_string()),
            lap_time_ms: event.lap_time_ms,
            cuts: event.cuts,
        };

        let (qualified, chat_lines, webhook_messages) = {
            let mut store = self.store.lock().await;

            let record = match store.record_lap(&track_key, new_lap) {
                Ok(RecordedLap::Accepted(record)) => record,
                Ok(RecordedLap::Duplicate(_)) => return LapOutcome::Duplicate,
                Err(error) => {
                    warn!(target: "lap_tracker:on_lap_completed", "lap rejected: {}", error);
                    return LapOutcome::Ignored;
                }
            };

            let Some(ledger) = store.track(&track_key) else {
                return LapOutcome::Ignored;
            };

            if let Err(error) = self.folder.save_track(&track_key, ledger).await {
                error!(target: "lap_tracker:on_lap_completed", "failed to save lap data for track {}: {}", track_key, error);
            }

            let mut chat_lines = vec![build_lap_message(&record, &track_key, MessageStyle::Plain)];
            let mut webhook_messages = vec![build_lap_message(&record, &track_key, MessageStyle::Decorated)];

            let limit = self.config.max_top_times;
            let qualified = record.is_clean() && leaderboard::qualifies(ledger, limit, &record);

            if !record.is_clean() {
                debug!(target: "lap_tracker:on_lap_completed", "lap has {} cuts, not updating leaderboard", record.cuts);
            } else if qualified && self.config.broadcast_messages {
                let ranked = leaderboard::rank(ledger, limit);
                chat_lines.push(build_leaderboard_message(&track_key, limit, &ranked, MessageStyle::Plain));
                webhook_messages.push(build_leaderboard_message(&track_key, limit, &ranked, MessageStyle::Decorated));
                info!(target: "lap_tracker:on_lap_completed", "{} made the top {} on {}", record.driver_name, limit, track_key);
            }

            (qualified, chat_lines, webhook_messages)
        };

        self.notifier.send_throttled(ChatTarget::All, &chat_lines);
        self.notifier.post_webhook(webhook_messages);

        LapOutcome::Recorded { qualified }
    }

    /// # handle a chat message
    /// answer `/leaderboard` and `/laptimes` to the driver that asked.
    /// anything else is ignored.
    ///
    /// ## Returns
    /// * `Option<ChatCommand>` - the command that was answered
    pub async fn on_chat_message(&self, event: ChatMessage) -> Option<ChatCommand> {
        if !self.config.enabled {
            return None;
        }

        let command = ChatCommand::parse(&event.message)?;
        let track_key = track_key_of(event.track.as_deref());
        let limit = self.config.max_top_times;

        let reply = {
            let store = self.store.lock().await;
            let ledger = store.track(&track_key);

            match command {
                ChatCommand::Leaderboard => {
                    let ranked = ledger
                        .map(|ledger| leaderboard::rank(ledger, limit))
                        .unwrap_or_default();
                    build_leaderboard_message(&track_key, limit, &ranked, MessageStyle::Plain)
                }
                ChatCommand::LapTimes => {
                    let laps = ledger
                        .map(|ledger| ledger.driver_best_laps(event.driver_guid, PERSONAL_LAPS_SHOWN))
                        .unwrap_or_default();
                    let driver_name = event
                        .driver_name
                        .as_deref()
                        .or_else(|| laps.first().map(|lap| lap.driver_name.as_str()))
                        .unwrap_or(UNKNOWN_DRIVER);
                    build_personal_laps_message(&track_key, driver_name, &laps, MessageStyle::Plain)
                }
            }
        };

        debug!(target: "lap_tracker:on_chat_message", "answering {:?} for driver guid {}", command, event.driver_guid);
        self.notifier.send_throttled(ChatTarget::Driver(event.driver_guid), &[reply]);

        Some(command)
    }

    /// the current leaderboard of a track
    pub async fn leaderboard(&self, raw_track: &str) -> Vec<LapRecord> {
        let store = self.store.lock().await;
        store
            .track(&sanitize_track_name(raw_track))
            .map(|ledger| leaderboard::rank(ledger, self.config.max_top_times))
            .unwrap_or_default()
    }

    /// all laps a driver has on a track, in the order they were driven
    pub async fn driver_laps(&self, raw_track: &str, driver_guid: u64) -> Vec<LapRecord> {
        let store = self.store.lock().await;
        store
            .track(&sanitize_track_name(raw_track))
            .map(|ledger| ledger.laps_of(driver_guid).to_vec())
            .unwrap_or_default()
    }

    pub async fn handle(&self, event: HostEvent) {
        match event {
            HostEvent::LapCompleted(lap) => {
                self.on_lap_completed(lap).await;
            }
            HostEvent::ChatMessage(message) => {
                self.on_chat_message(message).await;
            }
        }
    }

    /// # run
    /// handle host events one at a time until the sending side is dropped
    pub async fn run(&self, mut events: mpsc::Receiver<HostEvent>) {
        while let Some(event) = events.recv().await {
            self.handle(event).await;
        }
        info!(target: "lap_tracker:run", "event channel closed, stopping");
    }
}

fn track_key_of(raw_track: Option<&str>) -> String {
    sanitize_track_name(raw_track.unwrap_or(UNKNOWN_TRACK))
}
