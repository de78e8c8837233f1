use std::sync::OnceLock;

use regex::Regex;

pub const UNKNOWN_TRACK: &str = "UnknownTrack";

fn disallowed_chars() -> &'static Regex {
    static DISALLOWED: OnceLock<Regex> = OnceLock::new();
    DISALLOWED.get_or_init(|| Regex::new(r"[^\w\-]").expect("static regex is valid"))
}

/// # sanitize a track name
/// turn the raw track identifier reported by the server into a key that is
/// safe to use as a file name and as a map key.
///
/// only the last path segment is kept, a leading `ks_` is removed and
/// anything that is not a word character or `-` becomes `_`.
///
/// ## Arguments
/// * `raw` - the track identifier as reported by the server
///
/// ## Returns
/// * `String` - the track key, never empty
pub fn sanitize_track_name(raw: &str) -> String {
    if raw.trim().is_empty() {
        return UNKNOWN_TRACK.to_string();
    }

    let segment = raw
        .split(['/', '\\'])
        .filter(|segment| !segment.is_empty())
        .last()
        .unwrap_or(raw);

    let segment = match segment.get(..3) {
        Some(prefix) if prefix.eq_ignore_ascii_case("ks_") => &segment[3..],
        _ => segment,
    };

    let replaced = disallowed_chars().replace_all(segment, "_");
    let key = replaced.replace("..", "");

    if key.trim().is_empty() {
        return UNKNOWN_TRACK.to_string();
    }

    key
}
