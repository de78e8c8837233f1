use crate::modules::models::lap::LapRecord;

/// how a message is rendered
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageStyle {
    /// plain text for the in-game chat
    Plain,
    /// markdown and emojis for the webhook
    Decorated,
}

/// # format a lap time
/// format milliseconds as `mm:ss.fff`. minutes keep counting past the hour.
pub fn format_lap_time(lap_time_ms: u32) -> String {
    let minutes = lap_time_ms / 60_000;
    let seconds = (lap_time_ms / 1_000) % 60;
    let millis = lap_time_ms % 1_000;

    format!("{minutes:02}:{seconds:02}.{millis:03}")
}

/// # build a lap message
/// the announcement for a single recorded lap.
///
/// ## Arguments
/// * `lap` - the lap to announce
/// * `track` - the track key
/// * `style` - plain for chat, decorated for the webhook
///
/// ## Returns
/// * `String` - a single line message
pub fn build_lap_message(lap: &LapRecord, track: &str, style: MessageStyle) -> String {
    let time = format_lap_time(lap.lap_time_ms);

    match style {
        MessageStyle::Plain => {
            let status = if lap.is_clean() {
                "Clean Lap".to_string()
            } else {
                format!("{} Cuts", lap.cuts)
            };
            format!("{} on {} in {} {} {}", lap.driver_name, track, lap.car_name, time, status)
        }
        MessageStyle::Decorated => {
            let status = if lap.is_clean() {
                "✅ Clean Lap".to_string()
            } else {
                format!("⚠️ **{} Cuts**", lap.cuts)
            };
            format!(
                "🏁 **{}** on **{}** in **{}** `{}` {}",
                lap.driver_name, track, lap.car_name, time, status
            )
        }
    }
}

/// # build a leaderboard message
/// a header naming the track and the configured size followed by one line
/// per entry. one line per entry so chat delivery can send them apart.
///
/// ## Arguments
/// * `track` - the track key
/// * `limit` - the configured leaderboard size
/// * `entries` - the ranked laps, fastest first
/// * `style` - plain for chat, decorated for the webhook
///
/// ## Returns
/// * `String` - the message, lines separated by `\n`
pub fn build_leaderboard_message(
    track: &str,
    limit: usize,
    entries: &[LapRecord],
    style: MessageStyle,
) -> String {
    let mut lines = Vec::with_capacity(entries.len() + 1);

    lines.push(match style {
        MessageStyle::Plain => format!("Track: {track} - Top {limit} Lap Times"),
        MessageStyle::Decorated => format!("🏁🏁🏁 **Track: {track}** - Top {limit} Lap Times 👑"),
    });

    if entries.is_empty() {
        lines.push(format!("No clean laps recorded on {track} yet."));
    }

    for (index, lap) in entries.iter().enumerate() {
        let time = format_lap_time(lap.lap_time_ms);
        lines.push(match style {
            MessageStyle::Plain => {
                format!("{}) {} in {} — {}", index + 1, lap.driver_name, lap.car_name, time)
            }
            MessageStyle::Decorated => format!(
                "{}) **{}** in **{}** — `{}`",
                index + 1,
                lap.driver_name,
                lap.car_name,
                time
            ),
        });
    }

    lines.join("\n")
}

/// the answer to `/laptimes`, the fastest clean laps of one driver
pub fn build_personal_laps_message(
    track: &str,
    driver_name: &str,
    laps: &[LapRecord],
    style: MessageStyle,
) -> String {
    if laps.is_empty() {
        return format!("No clean laps recorded for {driver_name} on {track} yet.");
    }

    let mut lines = vec![match style {
        MessageStyle::Plain => format!("{driver_name} - Top {} Laps on {track}", laps.len()),
        MessageStyle::Decorated => format!("🏁 **{driver_name}** - Top {} Laps on **{track}**", laps.len()),
    }];

    for (index, lap) in laps.iter().enumerate() {
        let time = format_lap_time(lap.lap_time_ms);
        lines.push(match style {
            MessageStyle::Plain => format!("{}) {} — {}", index + 1, lap.car_name, time),
            MessageStyle::Decorated => format!("{}) **{}** — `{}`", index + 1, lap.car_name, time),
        });
    }

    lines.join("\n")
}
