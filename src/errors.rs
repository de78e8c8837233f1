use std::path::PathBuf;

use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// a lap with a time of 0ms, the host sends these for invalidated laps
    #[snafu(display("lap time of 0ms is not a valid lap"))]
    InvalidLapTimeError {},

    #[snafu(display("could not create lap data folder {}: {}", path.display(), source))]
    CreateLapDataFolderError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("could not read lap data file {}: {}", path.display(), source))]
    ReadLapDataError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("lap data file {} is corrupt: {}", path.display(), source))]
    ParseLapDataError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[snafu(display("could not serialize lap data for track {}: {}", track, source))]
    SerializeLapDataError {
        track: String,
        source: serde_json::Error,
    },

    #[snafu(display("could not write lap data file {}: {}", path.display(), source))]
    WriteLapDataError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("invalid value for {}: `{}` ({})", key, value, reason))]
    InvalidConfigError {
        key: String,
        value: String,
        reason: String,
    },

    #[snafu(display("chat message could not be sent: {}", reason))]
    ChatSendError { reason: String },

    #[snafu(display("webhook request failed: {}", source))]
    WebhookRequestError { source: reqwest::Error },

    #[snafu(display("webhook responded with status {}", status))]
    WebhookStatusError { status: u16 },
}

pub type CustomResult<T> = Result<T, Error>;
