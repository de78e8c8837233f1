use std::env;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::sync::Arc;

use log::{error, info, warn};
use tokio::sync::mpsc;

use laptimes_leaderboard::errors::CustomResult;
use laptimes_leaderboard::modules::config::LapTimesConfig;
use laptimes_leaderboard::modules::helpers::logging::setup_logging;
use laptimes_leaderboard::modules::lap_tracker::{HostEvent, LapTracker};
use laptimes_leaderboard::modules::notifications::{ChatSender, ChatTarget, DiscordWebhook};

/// stands in for the server chat, prints every line
struct ConsoleChat;

impl ChatSender for ConsoleChat {
    fn send(&self, target: ChatTarget, message: &str) -> CustomResult<()> {
        match target {
            ChatTarget::All => println!("[chat -> all] {message}"),
            ChatTarget::Driver(guid) => println!("[chat -> {guid}] {message}"),
        }
        Ok(())
    }
}

/// replays host events, one json object per line, from a file or stdin
#[tokio::main]
async fn main() {
    let config = match LapTimesConfig::from_env() {
        Ok(config) => config,
        Err(error) => {
            eprintln!("invalid configuration: {error}");
            return;
        }
    };

    if let Err(error) = setup_logging(config.logging_level) {
        eprintln!("failed to setup logging: {error}");
        return;
    }

    let reader: Box<dyn BufRead + Send> = match env::args().nth(1) {
        Some(path) => match File::open(&path) {
            Ok(file) => Box::new(BufReader::new(file)),
            Err(error) => {
                error!(target: "replay", "could not open {}: {}", path, error);
                return;
            }
        },
        None => Box::new(BufReader::new(io::stdin())),
    };

    let tracker = LapTracker::new(config, Arc::new(ConsoleChat), Arc::new(DiscordWebhook::new()));
    let (sender, receiver) = mpsc::channel::<HostEvent>(64);

    let reader_task = tokio::task::spawn_blocking(move || {
        for (number, line) in reader.lines().enumerate() {
            let line = match line {
                Ok(line) => line,
                Err(error) => {
                    error!(target: "replay", "failed reading input: {}", error);
                    break;
                }
            };

            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<HostEvent>(&line) {
                Ok(event) => {
                    if sender.blocking_send(event).is_err() {
                        break;
                    }
                }
                Err(error) => {
                    warn!(target: "replay", "skipping line {}: {}", number + 1, error);
                }
            }
        }
    });

    tracker.run(receiver).await;
    if let Err(error) = reader_task.await {
        error!(target: "replay", "input reader stopped unexpectedly: {}", error);
    }

    // the longest batch is the lap line, the leaderboard header and one line per entry
    let pending_lines = tracker.config().max_top_times as u32 + 2;
    tokio::time::sleep(tracker.config().message_interval.saturating_mul(pending_lines)).await;

    info!(target: "replay", "replay finished");
}
