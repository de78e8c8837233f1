use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use dotenvy::dotenv;
use snafu::ensure;

use crate::errors::{CustomResult, InvalidConfigSnafu};

pub const MAX_TOP_TIMES_LIMIT: usize = 100;
pub const MAX_MESSAGE_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq)]
pub struct LapTimesConfig {
    pub enabled: bool,
    /// empty disables posting to the webhook
    pub webhook_url: String,
    pub max_top_times: usize,
    /// gates the leaderboard announcements
    pub broadcast_messages: bool,
    pub data_dir: PathBuf,
    /// delay between two chat lines of the same message
    pub message_interval: Duration,
    pub max_line_length: usize,
    pub logging_level: log::LevelFilter,
}

impl Default for LapTimesConfig {
    fn default() -> Self {
        LapTimesConfig {
            enabled: true,
            webhook_url: String::new(),
            max_top_times: 5,
            broadcast_messages: true,
            data_dir: PathBuf::from("LapData"),
            message_interval: Duration::from_secs(1),
            max_line_length: 200,
            logging_level: log::LevelFilter::Info,
        }
    }
}

impl LapTimesConfig {
    /// # load the config
    /// read the config from the environment, a `.env` file is loaded first
    /// when there is one. unset variables keep their default.
    pub fn from_env() -> CustomResult<LapTimesConfig> {
        dotenv().ok();
        LapTimesConfig::from_lookup(|key| env::var(key).ok())
    }

    /// build the config from any key/value source
    pub fn from_lookup<F>(lookup: F) -> CustomResult<LapTimesConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = LapTimesConfig::default();

        let config = LapTimesConfig {
            enabled: parse_bool(&lookup, "LAPTIMES_ENABLED", defaults.enabled)?,
            webhook_url: lookup("LAPTIMES_WEBHOOK_URL")
                .map(|url| url.trim().to_string())
                .unwrap_or(defaults.webhook_url),
            max_top_times: parse_value(&lookup, "LAPTIMES_MAX_TOP_TIMES", defaults.max_top_times)?,
            broadcast_messages: parse_bool(
                &lookup,
                "LAPTIMES_BROADCAST_MESSAGES",
                defaults.broadcast_messages,
            )?,
            data_dir: lookup("LAPTIMES_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            message_interval: Duration::from_millis(parse_value(
                &lookup,
                "LAPTIMES_MESSAGE_INTERVAL_MS",
                defaults.message_interval.as_millis() as u64,
            )?),
            max_line_length: parse_value(&lookup, "LAPTIMES_MAX_LINE_LENGTH", defaults.max_line_length)?,
            logging_level: parse_level(&lookup, defaults.logging_level)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// # validate the config
    /// the leaderboard size must be within 1 and 100, chat lines need room
    /// for at least one character and lines can't be spaced more than a
    /// minute apart.
    pub fn validate(&self) -> CustomResult<()> {
        ensure!(
            (1..=MAX_TOP_TIMES_LIMIT).contains(&self.max_top_times),
            InvalidConfigSnafu {
                key: "LAPTIMES_MAX_TOP_TIMES",
                value: self.max_top_times.to_string(),
                reason: format!("must be between 1 and {MAX_TOP_TIMES_LIMIT}"),
            }
        );
        ensure!(
            self.max_line_length > 0,
            InvalidConfigSnafu {
                key: "LAPTIMES_MAX_LINE_LENGTH",
                value: self.max_line_length.to_string(),
                reason: "must be greater than 0",
            }
        );
        ensure!(
            self.message_interval <= MAX_MESSAGE_INTERVAL,
            InvalidConfigSnafu {
                key: "LAPTIMES_MESSAGE_INTERVAL_MS",
                value: self.message_interval.as_millis().to_string(),
                reason: format!("must be at most {}ms", MAX_MESSAGE_INTERVAL.as_millis()),
            }
        );

        Ok(())
    }

    pub fn webhook_enabled(&self) -> bool {
        !self.webhook_url.is_empty()
    }
}

fn parse_value<F, T>(lookup: &F, key: &str, default: T) -> CustomResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };

    match raw.trim().parse::<T>() {
        Ok(value) => Ok(value),
        Err(_) => InvalidConfigSnafu {
            key,
            value: raw,
            reason: "could not be parsed",
        }
        .fail(),
    }
}

fn parse_bool<F>(lookup: &F, key: &str, default: bool) -> CustomResult<bool>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };

    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => InvalidConfigSnafu {
            key,
            value: raw,
            reason: "expected true or false",
        }
        .fail(),
    }
}

fn parse_level<F>(lookup: &F, default: log::LevelFilter) -> CustomResult<log::LevelFilter>
where
    F: Fn(&str) -> Option<String>,
{
    let level = match lookup("LOGGING_LEVEL") {
        Some(level) => level,
        None => return Ok(default),
    };

    Ok(match level.trim().to_ascii_uppercase().as_str() {
        "OFF" => log::LevelFilter::Off,
        "ERROR" => log::LevelFilter::Error,
        "WARN" => log::LevelFilter::Warn,
        "DEBUG" => log::LevelFilter::Debug,
        "TRACE" => log::LevelFilter::Trace,
        // default to info
        _ => log::LevelFilter::Info,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::errors::Error;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = LapTimesConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, LapTimesConfig::default());
        assert!(!config.webhook_enabled());
    }

    #[test]
    fn reads_every_variable() {
        let config = LapTimesConfig::from_lookup(lookup_from(&[
            ("LAPTIMES_ENABLED", "false"),
            ("LAPTIMES_WEBHOOK_URL", " https://discord.com/api/webhooks/1/abc "),
            ("LAPTIMES_MAX_TOP_TIMES", "10"),
            ("LAPTIMES_BROADCAST_MESSAGES", "0"),
            ("LAPTIMES_DATA_DIR", "/var/lib/laps"),
            ("LAPTIMES_MESSAGE_INTERVAL_MS", "250"),
            ("LAPTIMES_MAX_LINE_LENGTH", "120"),
            ("LOGGING_LEVEL", "debug"),
        ]))
        .unwrap();

        assert!(!config.enabled);
        assert!(config.webhook_enabled());
        assert_eq!(config.webhook_url, "https://discord.com/api/webhooks/1/abc");
        assert_eq!(config.max_top_times, 10);
        assert!(!config.broadcast_messages);
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/laps"));
        assert_eq!(config.message_interval, Duration::from_millis(250));
        assert_eq!(config.max_line_length, 120);
        assert_eq!(config.logging_level, log::LevelFilter::Debug);
    }

    #[test]
    fn top_times_out_of_range() {
        for value in ["0", "101"] {
            let result = LapTimesConfig::from_lookup(lookup_from(&[("LAPTIMES_MAX_TOP_TIMES", value)]));
            assert!(matches!(result, Err(Error::InvalidConfigError { .. })));
        }

        let config = LapTimesConfig::from_lookup(lookup_from(&[("LAPTIMES_MAX_TOP_TIMES", "100")])).unwrap();
        assert_eq!(config.max_top_times, 100);
    }

    #[test]
    fn garbage_values_are_errors() {
        assert!(LapTimesConfig::from_lookup(lookup_from(&[("LAPTIMES_MAX_TOP_TIMES", "five")])).is_err());
        assert!(LapTimesConfig::from_lookup(lookup_from(&[("LAPTIMES_ENABLED", "maybe")])).is_err());
        assert!(LapTimesConfig::from_lookup(lookup_from(&[("LAPTIMES_MAX_LINE_LENGTH", "0")])).is_err());
    }

    #[test]
    fn message_interval_is_capped_at_a_minute() {
        for value in ["60001", "18446744073709551615"] {
            let result = LapTimesConfig::from_lookup(lookup_from(&[("LAPTIMES_MESSAGE_INTERVAL_MS", value)]));
            assert!(matches!(result, Err(Error::InvalidConfigError { .. })));
        }

        let config = LapTimesConfig::from_lookup(lookup_from(&[("LAPTIMES_MESSAGE_INTERVAL_MS", "60000")])).unwrap();
        assert_eq!(config.message_interval, MAX_MESSAGE_INTERVAL);
    }
}
